//! Agent dispatcher: the model picks one tool, the registry decides if it runs.
//!
//! ## Pipeline
//!
//! 1. Build the system instruction from the tool registry (`prompts`)
//! 2. Send {instruction, goal} to the chat model, exactly once
//! 3. Parse the trimmed reply as a strict JSON tool call (`tool_call`)
//! 4. Resolve the tool name in the registry and validate its arguments
//! 5. Refuse sensitive tools unless the invocation carried `--yes`
//! 6. Hand the typed invocation to the command router
//!
//! Steps 3-5 fail before any control-plane call. The router receives a
//! refusing gate when consent is absent, so the agent path can never reach
//! a sensitive request without the same consent direct use requires.

pub mod prompts;
pub mod tool_call;

use std::io::Write;

use serde_json::Value;
use tracing::{info, warn};

use crate::commands::{CommandResult, CommandRouter, Invocation};
use crate::confirm::ConfirmationGate;
use crate::error::{FactoryError, FactoryResult};
use crate::llm::{ChatMessage, ChatModel};
use crate::tools::ToolRegistry;

pub use tool_call::{parse_tool_call, ToolCall};

/// A validated tool selection, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub invocation: Invocation,
    pub reason: String,
}

impl Selection {
    pub fn tool_name(&self) -> &'static str {
        self.invocation.tool().name()
    }
}

/// Orchestrates one goal → one tool call.
pub struct AgentDispatcher<'a> {
    model: &'a dyn ChatModel,
    router: &'a CommandRouter,
    registry: ToolRegistry,
}

impl<'a> AgentDispatcher<'a> {
    pub fn new(model: &'a dyn ChatModel, router: &'a CommandRouter) -> Self {
        Self {
            model,
            router,
            registry: ToolRegistry::builtin(),
        }
    }

    /// Ask the model for a tool and validate the answer. No side effects
    /// beyond the single chat request.
    pub async fn select(&self, goal: &str) -> FactoryResult<Selection> {
        if goal.trim().is_empty() {
            return Err(FactoryError::Input("--goal \"...\" is required".into()));
        }

        let messages = [
            ChatMessage::system(prompts::build_system_prompt(&self.registry)),
            ChatMessage::user(goal),
        ];
        let reply = self.model.chat(&messages).await?;
        self.resolve(&reply)
    }

    /// Turn raw model output into a validated selection.
    pub fn resolve(&self, reply: &str) -> FactoryResult<Selection> {
        let call = parse_tool_call(reply)?;

        let Some(def) = self.registry.lookup(&call.tool) else {
            warn!(tool = %call.tool, "model selected unknown tool");
            return Err(FactoryError::InvalidToolCall {
                reason: format!("unknown tool \"{}\"", call.tool),
                output: reply.to_string(),
            });
        };

        let invocation = Invocation::from_args(def, &call.args).map_err(|problems| {
            let fields: Vec<String> = problems.iter().map(ToString::to_string).collect();
            FactoryError::InvalidToolCall {
                reason: format!("invalid args for {}: {}", def.name, fields.join(", ")),
                output: reply.to_string(),
            }
        })?;

        Ok(Selection {
            invocation,
            reason: call.reason,
        })
    }

    /// Execute a selection. Sensitive tools need `consent` (the `--yes` flag);
    /// without it nothing is sent.
    pub async fn execute(&self, selection: &Selection, consent: bool) -> FactoryResult<Value> {
        let tool = selection.invocation.tool();
        if tool.is_sensitive() && !consent {
            warn!(tool = tool.name(), "sensitive tool refused without consent");
            return Err(FactoryError::refused(tool));
        }

        let mut gate = if consent {
            ConfirmationGate::pre_approved()
        } else {
            ConfirmationGate::refusing()
        };
        self.router.execute(&selection.invocation, &mut gate).await
    }

    /// Full pipeline: select, then execute, wrapped as a [`CommandResult`].
    ///
    /// The selection is echoed to `echo` before anything is executed.
    pub async fn dispatch(
        &self,
        goal: &str,
        consent: bool,
        echo: &mut dyn Write,
    ) -> FactoryResult<CommandResult> {
        let selection = self.select(goal).await?;
        info!(tool = selection.tool_name(), reason = %selection.reason, "model selected tool");
        if let Err(e) = writeln!(
            echo,
            "LLM selected: {} ({})",
            selection.tool_name(),
            selection.reason
        ) {
            warn!(error = %e, "cannot echo tool selection");
        }
        let result = self.execute(&selection, consent).await?;
        Ok(CommandResult {
            ok: true,
            tool: selection.tool_name(),
            reason: Some(selection.reason),
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use httpmock::MockServer;
    use serde_json::json;

    use super::*;
    use crate::config::FactoryConfig;
    use crate::error::ErrorKind;
    use crate::http::FactoryClient;

    /// Returns one canned reply and counts how often it was asked.
    struct CannedModel {
        reply: String,
        calls: AtomicUsize,
    }

    impl CannedModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.into(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn chat(&self, messages: &[ChatMessage]) -> FactoryResult<String> {
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[0].role, "system");
            assert_eq!(messages[1].role, "user");
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    fn router_for(server: &MockServer) -> CommandRouter {
        CommandRouter::new(
            FactoryClient::new(&FactoryConfig {
                base_url: server.base_url(),
                token: None,
                timeout_secs: 5,
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected_without_network() {
        let server = MockServer::start();
        let any = server.mock(|_, then| {
            then.status(200).json_body(json!({}));
        });
        let router = router_for(&server);
        let model = CannedModel::new(r#"{"tool":"delete_cluster","args":{},"reason":"x"}"#);

        let err = AgentDispatcher::new(&model, &router)
            .dispatch("wipe it", true, &mut std::io::sink())
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("unknown tool"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        any.assert_hits(0);
    }

    #[tokio::test]
    async fn invalid_args_are_rejected_with_field_names() {
        let server = MockServer::start();
        let router = router_for(&server);
        let model = CannedModel::new(r#"{"tool":"create_cell","args":{"hitl":"yes"}}"#);

        let err = AgentDispatcher::new(&model, &router)
            .select("make a cell")
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("spec (missing)"), "{msg}");
        assert!(msg.contains("hitl (expected boolean)"), "{msg}");
    }

    #[tokio::test]
    async fn sensitive_tool_refused_without_consent() {
        let server = MockServer::start();
        let any = server.mock(|_, then| {
            then.status(200).json_body(json!({}));
        });
        let router = router_for(&server);
        let model = CannedModel::new(r#"{"tool":"disable_cell","args":{"id":"c1"},"reason":"r"}"#);

        let err = AgentDispatcher::new(&model, &router)
            .dispatch("disable c1", false, &mut std::io::sink())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Refused);
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.to_string(),
            "refusing to execute sensitive tool disable_cell without --yes"
        );
        any.assert_hits(0);
    }

    #[tokio::test]
    async fn router_gate_refusal_matches_dispatcher_wording() {
        let server = MockServer::start();
        let router = router_for(&server);
        let err = router
            .execute(
                &Invocation::DisableCell { id: "c1".into() },
                &mut ConfirmationGate::refusing(),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "refusing to execute sensitive tool disable_cell without --yes"
        );
    }

    #[tokio::test]
    async fn selection_is_echoed_before_execution() {
        let server = MockServer::start();
        let status = server.mock(|when, then| {
            when.path("/organs/x/status");
            then.status(200).json_body(json!({"phase": "ready"}));
        });
        let router = router_for(&server);
        let model = CannedModel::new(r#"{"tool":"organ_status","args":{"id":"x"},"reason":"asked"}"#);

        let mut echo = Vec::new();
        let outcome = AgentDispatcher::new(&model, &router)
            .dispatch("status of x", false, &mut echo)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(echo).unwrap(),
            "LLM selected: organ_status (asked)\n"
        );
        assert_eq!(outcome.result, json!({"phase": "ready"}));
        status.assert_hits(1);
    }

    #[tokio::test]
    async fn empty_goal_never_reaches_model() {
        let server = MockServer::start();
        let router = router_for(&server);
        let model = CannedModel::new("{}");

        let err = AgentDispatcher::new(&model, &router)
            .select("   ")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn resolve_keeps_reason() {
        let server = MockServer::start();
        let router = router_for(&server);
        let model = CannedModel::new("");
        let selection = AgentDispatcher::new(&model, &router)
            .resolve(r#"{"tool":"organ_build","args":{"template":"organ.json","dryrun":true},"reason":"validate first"}"#)
            .unwrap();
        assert_eq!(selection.tool_name(), "organ_build");
        assert_eq!(selection.reason, "validate first");
        assert_eq!(
            selection.invocation,
            Invocation::OrganBuild {
                template: "organ.json".into(),
                dryrun: true
            }
        );
    }
}
