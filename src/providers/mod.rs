pub mod base;
pub mod openai_compat;
