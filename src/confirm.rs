//! Confirmation gate for destructive operations.
//!
//! A sensitive action runs only after an affirmative signal: the operator
//! typing `yes` at the prompt, or an explicit `--yes` on the command line.
//! The gate waits as long as it takes; timeouts belong to the caller.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::error::{FactoryError, FactoryResult};
use crate::tools::Tool;

/// Source of operator answers.
#[async_trait]
pub trait ConfirmationPrompt: Send {
    /// Show `question` and wait for one line of input.
    /// Returns `None` when the input stream is closed.
    async fn ask(&mut self, question: &str) -> std::io::Result<Option<String>>;
}

/// Prompt that writes the question to `writer` and reads one line from `reader`.
pub struct LinePrompt<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> LinePrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

/// The production prompt: question on stderr, answer from stdin.
///
/// Stderr keeps stdout reserved for the JSON result.
pub fn terminal_prompt() -> LinePrompt<BufReader<tokio::io::Stdin>, tokio::io::Stderr> {
    LinePrompt::new(BufReader::new(tokio::io::stdin()), tokio::io::stderr())
}

#[async_trait]
impl<R, W> ConfirmationPrompt for LinePrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn ask(&mut self, question: &str) -> std::io::Result<Option<String>> {
        self.writer
            .write_all(format!("{question}: confirm with 'yes': ").as_bytes())
            .await?;
        self.writer.flush().await?;

        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }
}

/// Exact-match acceptance: trimmed, case-folded, equal to `yes`.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().to_lowercase() == "yes"
}

enum Mode {
    Prompt(Box<dyn ConfirmationPrompt>),
    PreApproved,
    Refuse,
}

/// Blocks a sensitive action until the operator agrees.
pub struct ConfirmationGate {
    mode: Mode,
}

impl ConfirmationGate {
    /// Ask through `prompt` on every sensitive action.
    pub fn interactive(prompt: impl ConfirmationPrompt + 'static) -> Self {
        Self {
            mode: Mode::Prompt(Box::new(prompt)),
        }
    }

    /// Consent already given by an explicit `--yes`. Never construct this
    /// from anything other than that flag.
    pub fn pre_approved() -> Self {
        Self {
            mode: Mode::PreApproved,
        }
    }

    /// No consent and nobody to ask: every sensitive action is refused.
    pub fn refusing() -> Self {
        Self { mode: Mode::Refuse }
    }

    /// Pick the gate for a direct command: `--yes` pre-approves, otherwise
    /// ask on the terminal.
    pub fn for_flag(yes: bool) -> Self {
        if yes {
            Self::pre_approved()
        } else {
            Self::interactive(terminal_prompt())
        }
    }

    pub fn is_pre_approved(&self) -> bool {
        matches!(self.mode, Mode::PreApproved)
    }

    /// Succeed only on an affirmative answer; anything else is `Cancelled`.
    /// `action` is the question shown to the operator.
    pub async fn confirm(&mut self, tool: Tool, action: &str) -> FactoryResult<()> {
        let prompt = match &mut self.mode {
            Mode::PreApproved => {
                info!(%action, "confirmation satisfied by --yes");
                return Ok(());
            }
            Mode::Refuse => return Err(FactoryError::refused(tool)),
            Mode::Prompt(prompt) => prompt,
        };

        match prompt.ask(action).await {
            Ok(Some(answer)) if is_affirmative(&answer) => {
                info!(%action, "operator confirmed");
                Ok(())
            }
            Ok(Some(_)) => Err(FactoryError::Cancelled(format!("{action} not confirmed"))),
            Ok(None) => Err(FactoryError::Cancelled(format!(
                "{action}: input closed before confirmation"
            ))),
            Err(e) => {
                warn!(%action, error = %e, "confirmation prompt failed");
                Err(FactoryError::Cancelled(format!("{action}: {e}")))
            }
        }
    }
}
