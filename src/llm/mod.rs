//! LLM provider adapter: one chat exchange against a pluggable backend.
//!
//! `client` holds the reqwest wrapper and the [`ChatModel`] seam used by the
//! agent dispatcher; `types` holds the wire envelopes of each backend.

pub mod client;
pub mod types;

pub use client::{ChatModel, LlmClient, Provider};
pub use types::ChatMessage;
