// src/llm/mod.rs

pub mod provider;

pub use provider::{LlmProvider, Message, Response};
