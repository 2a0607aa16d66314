//! Ordered handler registry.

use crate::errors::ConfigError;
use crate::query::handler::QueryHandler;

/// Holds handlers in registration order. Order is the routing priority:
/// when two handlers claim the same question, the one registered first is
/// tried first.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn QueryHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Duplicate names are a wiring bug and fail fast.
    pub fn register(&mut self, handler: Box<dyn QueryHandler>) -> Result<(), ConfigError> {
        if self.handlers.iter().any(|h| h.name() == handler.name()) {
            return Err(ConfigError::DuplicateHandler(handler.name().to_string()));
        }
        self.handlers.push(handler);
        Ok(())
    }

    /// Handlers claiming this question, in registration order.
    pub fn matching(&self, question: &str) -> Vec<&dyn QueryHandler> {
        self.handlers
            .iter()
            .filter(|h| h.claims(question))
            .map(|h| h.as_ref())
            .collect()
    }

    /// "Name: description" lines for every registered handler.
    pub fn available_categories(&self) -> Vec<String> {
        self.handlers
            .iter()
            .map(|h| format!("{}: {}", h.name(), h.description()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
