//! Tool registry: the fixed capability set shared by CLI verbs and the agent.
//!
//! Each entry carries its name, argument schema and sensitivity flag. The
//! table is static: nothing can be registered or removed at runtime, so a
//! tool name coming out of a model either resolves to one of these entries
//! or the call is rejected before any side effect.

use serde::Serialize;
use serde_json::Value;

/// Closed set of executable tools. The router dispatches on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    DryrunCell,
    CreateCell,
    ApproveCell,
    DisableCell,
    RollbackCell,
    OrganBuild,
    OrganStatus,
    OrganCancel,
}

/// Primitive argument types the registry validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Boolean,
    Object,
}

impl FieldType {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Object => write!(f, "object"),
        }
    }
}

/// One named argument in a tool's input schema.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub ty: FieldType,
    pub required: bool,
}

const fn required(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec {
        name,
        ty,
        required: true,
    }
}

const fn optional(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec {
        name,
        ty,
        required: false,
    }
}

/// A registry entry.
#[derive(Debug, Serialize)]
pub struct ToolDefinition {
    #[serde(skip)]
    pub tool: Tool,
    pub name: &'static str,
    pub description: &'static str,
    /// Requires explicit operator consent on every invocation path.
    pub sensitive: bool,
    pub fields: &'static [FieldSpec],
}

static DEFINITIONS: [ToolDefinition; 8] = [
    ToolDefinition {
        tool: Tool::DryrunCell,
        name: "dryrun_cell",
        description: "Validate a cell specification file without persisting anything",
        sensitive: false,
        fields: &[required("spec", FieldType::String)],
    },
    ToolDefinition {
        tool: Tool::CreateCell,
        name: "create_cell",
        description: "Create a cell from a specification file, optionally gated by human approval",
        sensitive: false,
        fields: &[
            required("spec", FieldType::String),
            optional("hitl", FieldType::Boolean),
        ],
    },
    ToolDefinition {
        tool: Tool::ApproveCell,
        name: "approve_cell",
        description: "Approve a pending cell so it becomes active",
        sensitive: true,
        fields: &[required("id", FieldType::String)],
    },
    ToolDefinition {
        tool: Tool::DisableCell,
        name: "disable_cell",
        description: "Disable an active cell",
        sensitive: true,
        fields: &[required("id", FieldType::String)],
    },
    ToolDefinition {
        tool: Tool::RollbackCell,
        name: "rollback_cell",
        description: "Roll a cell back to its previous or baseline version",
        sensitive: true,
        fields: &[required("id", FieldType::String)],
    },
    ToolDefinition {
        tool: Tool::OrganBuild,
        name: "organ_build",
        description: "Build an organ from a template file, optionally as a dry run",
        sensitive: false,
        fields: &[
            required("template", FieldType::String),
            optional("dryrun", FieldType::Boolean),
        ],
    },
    ToolDefinition {
        tool: Tool::OrganStatus,
        name: "organ_status",
        description: "Fetch the build status of an organ",
        sensitive: false,
        fields: &[required("id", FieldType::String)],
    },
    ToolDefinition {
        tool: Tool::OrganCancel,
        name: "organ_cancel",
        description: "Cancel an in-flight organ build",
        sensitive: true,
        fields: &[required("id", FieldType::String)],
    },
];

impl Tool {
    /// Registry entry for this tool. `DEFINITIONS` is laid out in variant order.
    pub fn definition(self) -> &'static ToolDefinition {
        &DEFINITIONS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.definition().name
    }

    pub fn is_sensitive(self) -> bool {
        self.definition().sensitive
    }
}

/// A problem found while validating tool arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgProblem {
    NotAnObject,
    Missing(&'static str),
    WrongType {
        field: &'static str,
        expected: FieldType,
    },
}

impl std::fmt::Display for ArgProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgProblem::NotAnObject => write!(f, "args (expected object)"),
            ArgProblem::Missing(field) => write!(f, "{field} (missing)"),
            ArgProblem::WrongType { field, expected } => {
                write!(f, "{field} (expected {expected})")
            }
        }
    }
}

/// Read-only view over the static tool table.
#[derive(Debug, Clone, Copy)]
pub struct ToolRegistry {
    tools: &'static [ToolDefinition],
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ToolRegistry {
    /// The built-in registry.
    pub fn builtin() -> Self {
        Self {
            tools: &DEFINITIONS,
        }
    }

    pub fn definitions(&self) -> &'static [ToolDefinition] {
        self.tools
    }

    pub fn lookup(&self, name: &str) -> Option<&'static ToolDefinition> {
        self.tools.iter().find(|def| def.name == name)
    }

    /// Check required fields are present and every declared field has its
    /// primitive type. `null` on an optional field counts as absent;
    /// undeclared fields are ignored.
    pub fn validate_args(def: &ToolDefinition, args: &Value) -> Result<(), Vec<ArgProblem>> {
        let Some(map) = args.as_object() else {
            return Err(vec![ArgProblem::NotAnObject]);
        };

        let mut problems = Vec::new();
        for field in def.fields {
            match map.get(field.name) {
                None | Some(Value::Null) if field.required => {
                    problems.push(ArgProblem::Missing(field.name))
                }
                None | Some(Value::Null) => {}
                Some(value) if !field.ty.matches(value) => problems.push(ArgProblem::WrongType {
                    field: field.name,
                    expected: field.ty,
                }),
                Some(_) => {}
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Prompt fragment listing tool names and argument shapes.
    ///
    /// Only names and types are listed, never sample values.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for def in self.tools {
            let fields: Vec<String> = def
                .fields
                .iter()
                .map(|f| {
                    let need = if f.required { "required" } else { "optional" };
                    format!("{} ({}, {need})", f.name, f.ty)
                })
                .collect();
            out.push_str(&format!(
                "- {}: {}. args: {}\n",
                def.name,
                def.description,
                fields.join(", ")
            ));
        }
        out
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|def| def.name).collect()
    }
}
