//! termbot library — exposes internal modules for integration tests.

pub mod codegen;
pub mod commands;
pub mod config;
pub mod errors;
pub mod providers;
pub mod query;
pub mod repl;
pub mod sandbox;
pub mod stock;
pub mod weather;
