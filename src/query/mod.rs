//! Query routing core: pattern registry, context extraction, and the
//! first-match-wins router that sits behind the `ask` command.

pub mod context;
pub mod handler;
pub mod registry;
pub mod router;
pub mod session;
