//! System instruction for the tool-selecting model.
//!
//! The model gets the tool names and argument shapes and must answer with a
//! single JSON object. No example values are included, so nothing in the
//! prompt can be read as a safe default.

use crate::tools::ToolRegistry;

/// Fixed preamble of the system instruction.
pub const ORCHESTRATOR_PROMPT: &str = "\
You are a factory orchestrator for cell and organ lifecycle operations. \
Choose exactly one tool for the operator's goal.

Reply rules:
1. Reply with ONLY one JSON object and nothing else. No prose, no markdown, no code fences.
2. The object has exactly these fields: \"tool\" (string, one of the tool names below), \
\"args\" (object with that tool's arguments), \"reason\" (short string).
3. Use only argument values the operator gave you. Never invent identifiers or file paths.";

/// Build the full system instruction from the registry.
pub fn build_system_prompt(registry: &ToolRegistry) -> String {
    let mut prompt = ORCHESTRATOR_PROMPT.to_string();
    prompt.push_str(&format!(
        "\n\nTool names: [{}]\n\nTools:\n",
        registry.names().join(", ")
    ));
    prompt.push_str(&registry.describe());
    prompt
}
