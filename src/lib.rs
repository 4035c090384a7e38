//! factoryctl: cell and organ lifecycle orchestration for the factory control plane.
//!
//! Two ways in, one way out:
//! - direct verbs (`create-cell`, `rollback-cell`, ...) build an [`commands::Invocation`]
//! - `agent` asks an LLM for a single tool call and validates it against the
//!   [`tools::ToolRegistry`]
//!
//! Both end in the [`commands::CommandRouter`], which passes sensitive tools
//! through the [`confirm::ConfirmationGate`] and issues exactly one request.

pub mod agent;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod error;
pub mod http;
pub mod llm;
pub mod tools;

pub use error::{ErrorKind, FactoryError, FactoryResult};
