//! A prompt-engineering toolkit over multiple completion providers.
//!
//! This library provides a consistent API for interacting with OpenAI and Google
//! Gemini, with few-shot prompting, structured JSON output, context-grounded
//! answers, streaming responses and rudimentary function calling.

pub mod error;
pub mod types;
pub mod provider;
pub mod providers;
pub mod response;
pub mod sse_stream;
pub mod accumulator;
pub mod config;
pub mod factory;
pub mod structured;
pub mod functions;
pub mod client;

// Re-export core types for easy usage
pub use error::Error;
pub use types::*;
pub use provider::TextProvider;
pub use providers::*;
pub use response::*;
pub use sse_stream::SseEvent;
pub use accumulator::*;
pub use config::{ProviderKind, Settings};
pub use factory::ProviderFactory;
pub use structured::Answer;
pub use functions::FunctionRegistry;
pub use client::Client;
