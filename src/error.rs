//! Error taxonomy for factoryctl.
//!
//! Every failure is terminal for the invocation. Nothing here is retried,
//! and payloads from the control plane or the model are kept intact so the
//! operator can see exactly what came back.

use crate::http::ResponseBody;
use crate::tools::Tool;

/// Coarse classification of a [`FactoryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid CLI argument or specification file.
    Input,
    /// Transport failure before a status was received.
    Network,
    /// Non-success status from the control plane or LLM provider.
    Http,
    /// Body or model output that is not the expected JSON.
    Decode,
    /// Unsupported provider or unusable configuration.
    Config,
    /// Operator declined or aborted the confirmation prompt.
    Cancelled,
    /// Sensitive tool selected by the agent without consent.
    Refused,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Input => "input",
            ErrorKind::Network => "network",
            ErrorKind::Http => "http",
            ErrorKind::Decode => "decode",
            ErrorKind::Config => "config",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Refused => "refused",
        };
        f.write_str(name)
    }
}

/// Errors from factoryctl operations.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("{0}")]
    Input(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}")]
    Http { status: u16, body: ResponseBody },

    #[error("{provider} provider returned HTTP {status}")]
    Provider {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("invalid JSON in {context}: {message}")]
    Decode {
        context: String,
        message: String,
        raw: String,
    },

    #[error("LLM did not return a valid tool call: {reason}")]
    InvalidToolCall { reason: String, output: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("refusing to execute {0} without --yes")]
    Refused(String),
}

/// Convenience alias used throughout the crate.
pub type FactoryResult<T> = Result<T, FactoryError>;

impl FactoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FactoryError::Input(_) => ErrorKind::Input,
            FactoryError::Network(_) => ErrorKind::Network,
            FactoryError::Http { .. } | FactoryError::Provider { .. } => ErrorKind::Http,
            FactoryError::Decode { .. } | FactoryError::InvalidToolCall { .. } => ErrorKind::Decode,
            FactoryError::Config(_) => ErrorKind::Config,
            FactoryError::Cancelled(_) => ErrorKind::Cancelled,
            FactoryError::Refused(_) => ErrorKind::Refused,
        }
    }

    /// Process exit status for this error.
    ///
    /// Rejected model output and refused consent get their own codes so
    /// automation can tell them apart from ordinary failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            FactoryError::InvalidToolCall { .. } => 2,
            FactoryError::Refused(_) => 3,
            _ => 1,
        }
    }

    /// Build a `Decode` error, keeping the raw text.
    pub fn decode(context: impl Into<String>, err: impl std::fmt::Display, raw: &str) -> Self {
        FactoryError::Decode {
            context: context.into(),
            message: err.to_string(),
            raw: raw.to_string(),
        }
    }

    /// Consent refusal for a sensitive tool. Both invocation paths use this
    /// wording.
    pub fn refused(tool: Tool) -> Self {
        FactoryError::Refused(format!("sensitive tool {}", tool.name()))
    }

    /// Diagnostic detail to print after the one-line message, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            FactoryError::Http { body, .. } => Some(body.to_pretty()),
            FactoryError::Provider { body, .. } if !body.is_empty() => Some(body.clone()),
            FactoryError::Decode { raw, .. } if !raw.is_empty() => Some(raw.clone()),
            FactoryError::InvalidToolCall { output, .. } => Some(format!("Output:\n{output}")),
            _ => None,
        }
    }
}
