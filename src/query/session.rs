//! Per-session mutable state.
//!
//! One `SessionState` exists per logical terminal session and is threaded
//! by reference through the dispatcher, router, and handlers. Nothing in
//! the crate keeps conversational state in globals, so multiple sessions
//! can run side by side.

use crate::query::context::QuestionContext;
use crate::sandbox::fs::HOME_DIR;
use crate::stock::StockSession;

/// State owned by one terminal session.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Virtual working directory for shell builtins.
    pub current_dir: String,
    /// Shared conversational context, replaced wholesale on each
    /// newly-resolved (non-follow-up) query.
    pub context: Option<QuestionContext>,
    /// Stock handler's private single-slot cache for follow-up questions.
    /// Independent of `context`; cleared whenever a new entity is named.
    pub stock_cache: Option<StockSession>,
}

impl SessionState {
    /// Fresh session starting in the home directory.
    pub fn new() -> Self {
        Self {
            current_dir: HOME_DIR.to_string(),
            context: None,
            stock_cache: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_at_home() {
        let session = SessionState::new();
        assert_eq!(session.current_dir, "/home/user");
        assert!(session.context.is_none());
        assert!(session.stock_cache.is_none());
    }
}
