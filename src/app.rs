//! Runs one parsed [`Request`] and renders its outcome.
//!
//! Standard output carries only the JSON result. The agent's selection echo
//! and error diagnostics go to the error writer. Both writers are passed in
//! so the binary's whole output contract runs under test.

use std::io::Write;

use serde::Serialize;
use tracing::warn;

use crate::agent::AgentDispatcher;
use crate::cli::Request;
use crate::commands::CommandRouter;
use crate::config::Config;
use crate::confirm::ConfirmationGate;
use crate::error::{FactoryError, FactoryResult};
use crate::http::FactoryClient;
use crate::llm::LlmClient;
use crate::tools::ToolRegistry;

/// Execute `request`. Configuration is loaded only by requests that talk
/// to the control plane; `tools` never touches it.
pub async fn run<F>(
    request: Request,
    load_config: F,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> FactoryResult<()>
where
    F: FnOnce() -> FactoryResult<Config>,
{
    match request {
        Request::ListTools => write_json(stdout, ToolRegistry::builtin().definitions()),
        Request::Run { invocation, yes } => {
            let config = load_config()?;
            let router = CommandRouter::new(FactoryClient::new(&config.factory)?);
            let mut gate = ConfirmationGate::for_flag(yes);
            let result = router.execute(&invocation, &mut gate).await?;
            write_json(stdout, &result)
        }
        Request::Agent { goal, yes } => {
            let config = load_config()?;
            let router = CommandRouter::new(FactoryClient::new(&config.factory)?);
            let llm = LlmClient::new(&config.llm)?;
            let outcome = AgentDispatcher::new(&llm, &router)
                .dispatch(&goal, yes, stderr)
                .await?;
            write_json(stdout, &outcome)
        }
    }
}

/// Print `Error: <message>` and any preserved detail, then return the
/// process exit status for `err`.
pub fn report(err: &FactoryError, stderr: &mut dyn Write) -> i32 {
    let mut text = format!("Error: {err}\n");
    if let Some(detail) = err.detail() {
        text.push_str(&detail);
        text.push('\n');
    }
    if let Err(e) = stderr.write_all(text.as_bytes()) {
        warn!(error = %e, "cannot write diagnostic");
    }
    err.exit_code()
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> FactoryResult<()> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| FactoryError::decode("result", e, ""))?;
    if let Err(e) = writeln!(out, "{text}") {
        warn!(error = %e, "cannot write result");
    }
    Ok(())
}
