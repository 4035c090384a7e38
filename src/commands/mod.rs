//! Command router: turns a validated tool invocation into one control-plane call.
//!
//! Cell lifecycle as the verbs assume it (the control plane is authoritative,
//! nothing is enforced here):
//!
//! ```text
//! unknown --dryrun--> validated (not persisted)
//! unknown --create--> pending | approved
//! pending --approve--> active --disable--> disabled
//! {active, disabled} --rollback--> previous | baseline
//! ```
//!
//! Sensitive invocations pass the [`ConfirmationGate`] before the request is
//! built, so a declined prompt never reaches the network.

pub mod spec_file;

use std::path::PathBuf;

use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::confirm::ConfirmationGate;
use crate::error::FactoryResult;
use crate::http::FactoryClient;
use crate::tools::{ArgProblem, Tool, ToolDefinition, ToolRegistry};

/// A fully-typed request for one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    DryrunCell { spec: PathBuf },
    CreateCell { spec: PathBuf, hitl: bool },
    ApproveCell { id: String },
    DisableCell { id: String },
    RollbackCell { id: String },
    OrganBuild { template: PathBuf, dryrun: bool },
    OrganStatus { id: String },
    OrganCancel { id: String },
}

impl Invocation {
    pub fn tool(&self) -> Tool {
        match self {
            Invocation::DryrunCell { .. } => Tool::DryrunCell,
            Invocation::CreateCell { .. } => Tool::CreateCell,
            Invocation::ApproveCell { .. } => Tool::ApproveCell,
            Invocation::DisableCell { .. } => Tool::DisableCell,
            Invocation::RollbackCell { .. } => Tool::RollbackCell,
            Invocation::OrganBuild { .. } => Tool::OrganBuild,
            Invocation::OrganStatus { .. } => Tool::OrganStatus,
            Invocation::OrganCancel { .. } => Tool::OrganCancel,
        }
    }

    /// Validate untyped arguments against `def` and build the invocation.
    /// Blank identifiers count as missing.
    pub fn from_args(def: &ToolDefinition, args: &Value) -> Result<Self, Vec<ArgProblem>> {
        ToolRegistry::validate_args(def, args)?;

        let text = |name: &'static str| -> Result<String, Vec<ArgProblem>> {
            match args.get(name).and_then(Value::as_str).map(str::trim) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => Err(vec![ArgProblem::Missing(name)]),
            }
        };
        let flag = |name: &str| args.get(name).and_then(Value::as_bool).unwrap_or(false);

        let invocation = match def.tool {
            Tool::DryrunCell => Invocation::DryrunCell {
                spec: text("spec")?.into(),
            },
            Tool::CreateCell => Invocation::CreateCell {
                spec: text("spec")?.into(),
                hitl: flag("hitl"),
            },
            Tool::ApproveCell => Invocation::ApproveCell { id: text("id")? },
            Tool::DisableCell => Invocation::DisableCell { id: text("id")? },
            Tool::RollbackCell => Invocation::RollbackCell { id: text("id")? },
            Tool::OrganBuild => Invocation::OrganBuild {
                template: text("template")?.into(),
                dryrun: flag("dryrun"),
            },
            Tool::OrganStatus => Invocation::OrganStatus { id: text("id")? },
            Tool::OrganCancel => Invocation::OrganCancel { id: text("id")? },
        };
        Ok(invocation)
    }

    /// Human-readable action, used as the confirmation question.
    pub fn action(&self) -> String {
        match self {
            Invocation::DryrunCell { spec } => format!("Dry-run cell {}", spec.display()),
            Invocation::CreateCell { spec, .. } => format!("Create cell {}", spec.display()),
            Invocation::ApproveCell { id } => format!("Approve cell {id}"),
            Invocation::DisableCell { id } => format!("Disable cell {id}"),
            Invocation::RollbackCell { id } => format!("Rollback cell {id}"),
            Invocation::OrganBuild { template, .. } => {
                format!("Build organ {}", template.display())
            }
            Invocation::OrganStatus { id } => format!("Status of organ {id}"),
            Invocation::OrganCancel { id } => format!("Cancel build of organ {id}"),
        }
    }
}

/// The single HTTP call an invocation resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPlan {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl RequestPlan {
    fn post(path: String, body: Option<Value>) -> Self {
        Self {
            method: Method::POST,
            path,
            body,
        }
    }
}

fn seg(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Resolve an invocation to its request, reading specification files as needed.
pub async fn plan_request(invocation: &Invocation) -> FactoryResult<RequestPlan> {
    let plan = match invocation {
        Invocation::DryrunCell { spec } => {
            let mut body = Map::new();
            body.insert("backend".into(), json!("adapter"));
            body.extend(spec_file::load_cell_spec(spec).await?);
            RequestPlan::post("/factory/cells/dryrun".into(), Some(Value::Object(body)))
        }
        Invocation::CreateCell { spec, hitl } => {
            let mut body = spec_file::load_cell_spec(spec).await?;
            if *hitl {
                body.insert("hitl".into(), json!(true));
            }
            RequestPlan::post("/factory/cells".into(), Some(Value::Object(body)))
        }
        Invocation::ApproveCell { id } => {
            RequestPlan::post(format!("/factory/cells/{}/approve", seg(id)), None)
        }
        Invocation::DisableCell { id } => {
            RequestPlan::post(format!("/factory/cells/{}/disable", seg(id)), None)
        }
        Invocation::RollbackCell { id } => {
            RequestPlan::post(format!("/factory/cells/{}/rollback", seg(id)), None)
        }
        Invocation::OrganBuild { template, dryrun } => {
            let organ_template = spec_file::load_document(template).await?;
            RequestPlan::post(
                "/organs/build".into(),
                Some(json!({ "organ_template": organ_template, "dryrun": dryrun })),
            )
        }
        Invocation::OrganStatus { id } => RequestPlan {
            method: Method::GET,
            path: format!("/organs/{}/status", seg(id)),
            body: None,
        },
        Invocation::OrganCancel { id } => RequestPlan {
            method: Method::DELETE,
            path: format!("/organs/{}/build", seg(id)),
            body: None,
        },
    };
    Ok(plan)
}

/// Terminal value of an agent-driven command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    pub ok: bool,
    pub tool: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub result: Value,
}

/// Executes invocations against the control plane.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    client: FactoryClient,
}

impl CommandRouter {
    pub fn new(client: FactoryClient) -> Self {
        Self { client }
    }

    /// Run one invocation: confirm if sensitive, then issue exactly one request.
    pub async fn execute(
        &self,
        invocation: &Invocation,
        gate: &mut ConfirmationGate,
    ) -> FactoryResult<Value> {
        let tool = invocation.tool();
        if tool.is_sensitive() {
            gate.confirm(tool, &invocation.action()).await?;
        }

        let plan = plan_request(invocation).await?;
        info!(tool = tool.name(), method = %plan.method, path = %plan.path, "dispatching");
        self.client
            .request(plan.method, &plan.path, plan.body.as_ref())
            .await
    }
}
