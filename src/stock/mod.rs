//! Stock question handler.
//!
//! Handles direct price lookups, "is it promising" follow-ups, and market
//! overview requests. Keeps a single-slot session cache of the last
//! resolved symbol for follow-up reuse; a newly named entity always
//! invalidates it.

pub mod analysis;
pub mod client;
pub mod symbols;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::query::context::{EntityExtractor, HeuristicExtractor};
use crate::query::handler::QueryHandler;
use crate::query::session::SessionState;
use analysis::{MarketEntry, ScoreInputs};
use client::{Fundamentals, Quote, StockClient};
use symbols::SymbolResolution;

/// Last resolved symbol with its data, cached per session for follow-ups.
#[derive(Debug, Clone)]
pub struct StockSession {
    pub symbol: String,
    pub quote: Quote,
    pub fundamentals: Option<Fundamentals>,
}

/// Curated multi-sector list backing the market overview.
const TOP_STOCKS: &[(&str, &str)] = &[
    ("AAPL", "Technology"),
    ("MSFT", "Technology"),
    ("GOOGL", "Technology"),
    ("NVDA", "Technology"),
    ("JNJ", "Healthcare"),
    ("PFE", "Healthcare"),
    ("JPM", "Financial"),
    ("BAC", "Financial"),
    ("AMZN", "Consumer Discretionary"),
    ("TSLA", "Consumer Discretionary"),
    ("META", "Communication Services"),
    ("NFLX", "Communication Services"),
];

static OVERVIEW_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)what.*(?:is|are)\s+(?:the\s+)?(?:current\s+)?(?:best|top|promising)\s+(?:stocks?|market)").unwrap(),
        Regex::new(r"(?i)how.*(?:is|are)\s+(?:the\s+)?stock\s+market\s+(?:doing|performing)").unwrap(),
        Regex::new(r"(?i)(?:give\s+me|show)\s+(?:the\s+)?stock\s+market\s+overview").unwrap(),
        Regex::new(r"(?i)which\s+stocks?\s+(?:are\s+)?(?:promising|performing\s+well)").unwrap(),
        Regex::new(r"(?i)compare\s+(?:current\s+)?stock\s+performance").unwrap(),
    ]
});

pub struct StockHandler {
    client: StockClient,
    extractor: HeuristicExtractor,
    patterns: Vec<Regex>,
}

impl StockHandler {
    pub fn new(client: StockClient) -> Self {
        let mut patterns = vec![
            Regex::new(r"(?i)stock.*(?:price|value).*(?:of|for)\s+([A-Za-z\s.]+)\??$").unwrap(),
            Regex::new(r"(?i)how.*(?:is|are)\s+([A-Za-z\s.]+)\s+stock.*(?:doing|performing)\??$")
                .unwrap(),
            Regex::new(r"(?i)what.*(?:is|are).*([A-Za-z\s.]+)\s+stock.*(?:price|value)\??$")
                .unwrap(),
            Regex::new(r"(?i)show.*([A-Za-z\s.]+)\s+stock.*(?:price|value)\??$").unwrap(),
            Regex::new(r"(?i)(?:is|looks?)\s+(?:it|this stock)\s+promising").unwrap(),
            Regex::new(r"(?i)how.*(?:promising|perform(?:ing)?)\s+is\s+(?:it|this stock)")
                .unwrap(),
        ];
        patterns.extend(OVERVIEW_PATTERNS.iter().cloned());

        Self {
            client,
            extractor: HeuristicExtractor,
            patterns,
        }
    }

    async fn market_overview(&self) -> String {
        let fetches = TOP_STOCKS.iter().map(|(symbol, sector)| async move {
            let (quote, fundamentals) = futures_util::join!(
                self.client.quote(symbol),
                self.client.fundamentals(symbol)
            );
            // A failed symbol drops out of the batch rather than aborting it.
            let quote = match quote {
                Ok(Some(q)) => q,
                Ok(None) => return None,
                Err(e) => {
                    warn!(symbol, error = %e, "overview quote fetch failed");
                    return None;
                }
            };
            let fundamentals = match fundamentals {
                Ok(f) => f,
                Err(e) => {
                    warn!(symbol, error = %e, "overview fundamentals fetch failed");
                    None
                }
            };

            let (company_name, industry, pe, dividend_yield, market_cap) = match &fundamentals {
                Some(f) => (
                    f.company_name.clone(),
                    if f.industry.is_empty() {
                        sector.to_string()
                    } else {
                        f.industry.clone()
                    },
                    f.pe_ratio_f64(),
                    f.dividend_yield_pct(),
                    f.market_cap_u64(),
                ),
                None => (symbol.to_string(), sector.to_string(), 0.0, 0.0, 0),
            };

            let score = analysis::performance_score(ScoreInputs {
                percent_change: quote.percent_change_f64(),
                pe_ratio: pe,
                dividend_yield,
                market_cap,
            });

            Some(MarketEntry {
                symbol: symbol.to_string(),
                company_name,
                current_price: quote.price_f64(),
                price_change: quote.change_f64(),
                percent_change: quote.percent_change_f64(),
                industry,
                score,
            })
        });

        let entries: Vec<MarketEntry> = join_all(fetches).await.into_iter().flatten().collect();

        if entries.is_empty() {
            return "Sorry, I couldn't retrieve current stock market information at the moment."
                .to_string();
        }
        analysis::format_market_overview(entries)
    }

    async fn single_symbol(&self, symbol: &str, session: &mut SessionState) -> Result<String> {
        let (quote, fundamentals) = futures_util::join!(
            self.client.quote(symbol),
            self.client.fundamentals(symbol)
        );

        let Some(quote) = quote? else {
            return Ok(format!(
                "Sorry, I couldn't find stock information for {symbol}. Please check if the symbol is correct."
            ));
        };
        let fundamentals = fundamentals.unwrap_or_else(|e| {
            warn!(symbol, error = %e, "fundamentals fetch failed");
            None
        });

        session.stock_cache = Some(StockSession {
            symbol: symbol.to_string(),
            quote: quote.clone(),
            fundamentals: fundamentals.clone(),
        });

        Ok(analysis::format_quote_report(
            &quote,
            fundamentals.as_ref(),
            symbol,
        ))
    }
}

#[async_trait]
impl QueryHandler for StockHandler {
    fn name(&self) -> &str {
        "Stock Market"
    }

    fn description(&self) -> &str {
        "Get real-time stock market information and prices, including comparative analysis"
    }

    fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    async fn handle(&self, question: &str, session: &mut SessionState) -> Result<Option<String>> {
        // Overview requests never go through symbol resolution.
        if OVERVIEW_PATTERNS.iter().any(|p| p.is_match(question)) {
            return Ok(Some(self.market_overview().await));
        }

        let candidates = self.extractor.extract(question).candidates;
        let cached = session.stock_cache.as_ref().map(|c| c.symbol.clone());
        let Some(resolution) = symbols::resolve_symbol(question, &candidates, cached.as_deref())
        else {
            debug!("no stock symbol resolved");
            return Ok(None);
        };

        // A newly named entity invalidates stale follow-up context; a
        // cached reuse leaves the slot untouched until refreshed below.
        if let SymbolResolution::New(_) = resolution {
            session.stock_cache = None;
        }

        let symbol = resolution.symbol().to_string();
        self.single_symbol(&symbol, session).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> StockHandler {
        StockHandler::new(StockClient::new("demo".to_string()))
    }

    #[test]
    fn test_claims_price_questions() {
        let h = handler();
        assert!(h.claims("what is the stock price of Apple?"));
        assert!(h.claims("how is Tesla stock doing?"));
        assert!(h.claims("show me Apple stock price"));
    }

    #[test]
    fn test_claims_follow_ups() {
        let h = handler();
        assert!(h.claims("is it promising?"));
        assert!(h.claims("how promising is this stock"));
    }

    #[test]
    fn test_claims_overview_questions() {
        let h = handler();
        assert!(h.claims("give me the stock market overview"));
        assert!(h.claims("which stocks are performing well"));
        assert!(h.claims("what are the best stocks"));
    }

    #[test]
    fn test_does_not_claim_weather() {
        let h = handler();
        assert!(!h.claims("what's the weather in Tokyo?"));
    }

    #[test]
    fn test_overview_pattern_precedence() {
        // Overview text also contains "stock" words that could resolve a
        // symbol; the overview check must come first.
        assert!(OVERVIEW_PATTERNS
            .iter()
            .any(|p| p.is_match("compare current stock performance")));
    }
}
