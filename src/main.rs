//! termbot - an LLM-backed pseudo-terminal with intent routing.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use termbot::codegen::CodeGenerator;
use termbot::commands::CommandDispatcher;
use termbot::config::loader::{get_config_path, get_data_dir, load_config};
use termbot::config::schema::Config;
use termbot::providers::base::LlmProvider;
use termbot::providers::openai_compat::OpenAICompatProvider;
use termbot::query::context::HeuristicExtractor;
use termbot::query::registry::HandlerRegistry;
use termbot::query::router::QueryRouter;
use termbot::query::session::SessionState;
use termbot::repl;
use termbot::sandbox::exec::ProcessRunner;
use termbot::sandbox::fs::SandboxFs;
use termbot::stock::client::StockClient;
use termbot::stock::StockHandler;
use termbot::weather::client::WeatherClient;
use termbot::weather::WeatherHandler;

const VERSION: &str = "0.1.0";

#[derive(Parser)]
#[command(name = "termbot", about = "termbot - LLM terminal", version = VERSION)]
struct Cli {
    /// Path to a config file (defaults to ~/.termbot/config.json).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive terminal session.
    Shell,
    /// Ask a single question and exit.
    Ask {
        /// The question text.
        question: Vec<String>,
    },
    /// Show configuration status.
    Status,
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,hyper=warn,reqwest=warn,rustyline=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Assemble the dispatcher: sandbox, providers, handler registry, router.
/// Duplicate handler registration is the one fatal startup error.
async fn build_dispatcher(config: &Config) -> Result<CommandDispatcher> {
    let sandbox_root = if config.sandbox.root.is_empty() {
        get_data_dir().join("sandbox")
    } else {
        PathBuf::from(&config.sandbox.root)
    };
    let fs = Arc::new(
        SandboxFs::init(sandbox_root)
            .await
            .context("failed to initialize sandbox filesystem")?,
    );

    let provider: Arc<dyn LlmProvider> = Arc::new(OpenAICompatProvider::new(
        &config.llm_api_key(),
        &config.llm.api_base,
        &config.llm.model,
        config.llm.max_tokens,
        config.llm.temperature,
    ));
    debug!(model = provider.default_model(), "llm provider ready");

    let mut registry = HandlerRegistry::new();
    registry
        .register(Box::new(WeatherHandler::new(WeatherClient::new())))
        .context("handler registration failed")?;
    registry
        .register(Box::new(StockHandler::new(StockClient::new(
            config.stock_api_key(),
        ))))
        .context("handler registration failed")?;

    let router = QueryRouter::new(registry, Box::new(HeuristicExtractor));
    let executor = Arc::new(ProcessRunner::new(config.sandbox.exec_timeout_secs));
    let codegen = CodeGenerator::new(provider.clone(), fs.clone(), executor);

    Ok(CommandDispatcher::new(fs, router, provider, codegen))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Shell => {
            let dispatcher = build_dispatcher(&config).await?;
            repl::run(&dispatcher).await
        }
        Commands::Ask { question } => {
            let question = question.join(" ");
            if question.is_empty() {
                println!("Error: Please provide a question");
                return Ok(());
            }
            let dispatcher = build_dispatcher(&config).await?;
            let mut session = SessionState::new();
            let result = dispatcher
                .execute(&format!("ask {question}"), &mut session)
                .await;
            if let Some(output) = result.output {
                println!("{output}");
            }
            Ok(())
        }
        Commands::Status => {
            println!("Config path: {}", get_config_path().display());
            println!("Model: {}", config.llm.model);
            println!(
                "LLM API key: {}",
                if config.llm_api_key().is_empty() {
                    "not set"
                } else {
                    "set"
                }
            );
            println!(
                "Stock API key: {}",
                if config.stock_api_key().is_empty() {
                    "not set"
                } else {
                    "set"
                }
            );
            println!("Sandbox root: {}", get_data_dir().join("sandbox").display());
            Ok(())
        }
    }
}
