//! Pattern-based intent routing.

use tracing::{debug, warn};

use crate::query::context::{extract_context, is_follow_up, EntityExtractor};
use crate::query::registry::HandlerRegistry;
use crate::query::session::SessionState;

/// A reply produced by a handler, tagged with the handler that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedReply {
    pub response: String,
    pub category: String,
}

/// Routes questions through the registered handlers in priority order.
pub struct QueryRouter {
    registry: HandlerRegistry,
    extractor: Box<dyn EntityExtractor>,
}

impl QueryRouter {
    pub fn new(registry: HandlerRegistry, extractor: Box<dyn EntityExtractor>) -> Self {
        Self {
            registry,
            extractor,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Route a question to the first handler that claims and answers it.
    ///
    /// Context is extracted before dispatch so handlers see the current
    /// question's entities. Follow-up questions keep the previous context:
    /// a pronoun cannot name a new subject, so overwriting would destroy
    /// the referent it points at.
    ///
    /// A handler error is logged and routing continues with the next
    /// candidate. `None` means no handler answered and the caller should
    /// fall back to the general model.
    pub async fn route(
        &self,
        question: &str,
        session: &mut SessionState,
    ) -> Option<RoutedReply> {
        if !is_follow_up(question) || session.context.is_none() {
            session.context = Some(extract_context(question, self.extractor.as_ref()));
        }

        for handler in self.registry.matching(question) {
            debug!(handler = handler.name(), "trying handler");
            match handler.handle(question, session).await {
                Ok(Some(response)) if !response.is_empty() => {
                    if let Some(ctx) = session.context.as_mut() {
                        ctx.category = handler.name().to_string();
                    }
                    return Some(RoutedReply {
                        response,
                        category: handler.name().to_string(),
                    });
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!(handler = handler.name(), error = %e, "handler failed, trying next");
                    continue;
                }
            }
        }
        None
    }
}
