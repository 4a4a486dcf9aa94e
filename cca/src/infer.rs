//! Structure inference: description text to project name and module path.
//!
//! The model is asked once for a small JSON object. Anything that goes wrong
//! on that path (transport error, fenced or malformed JSON, schema mismatch,
//! an unsafe module path) selects the deterministic fallback instead, so
//! inference itself never fails.

use anyhow::{Context, Result, bail};
use jsonschema::Draft;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::core::fence::first_fenced_block;
use crate::core::naming::{
    fallback_structure, is_contained_relative_path, normalize_module_path,
    project_name_or_default,
};
use crate::core::types::{InferenceOutcome, ProjectStructure};
use crate::io::completion::{Completion, OllamaClient, Strategy};
use crate::io::prompt::structure_prompt;

const STRUCTURE_SCHEMA: &str = include_str!("../schemas/project_structure.schema.json");

#[derive(Debug, Deserialize)]
struct RawStructure {
    project_name: String,
    module_path: String,
}

/// Infer the project structure with `client`, falling back to the heuristic.
#[instrument(skip_all)]
pub fn infer_project_structure<C: Completion>(client: &C, description: &str) -> InferenceOutcome {
    match ask_model(client, description) {
        Ok(structure) => {
            info!(
                project_name = %structure.project_name,
                module_path = %structure.module_path,
                "inferred project structure"
            );
            InferenceOutcome::Inferred(structure)
        }
        Err(err) => fallback(description, format!("{err:#}")),
    }
}

/// Infer against the service at `host`, always sampling at temperature 0.
pub fn infer_with_service(
    model: &str,
    host: &str,
    strategy: Strategy,
    description: &str,
) -> InferenceOutcome {
    match OllamaClient::new(model, host, 0.0) {
        Ok(client) => infer_project_structure(&strategy.wrap(client), description),
        Err(err) => fallback(description, format!("build completion client: {err}")),
    }
}

fn fallback(description: &str, reason: String) -> InferenceOutcome {
    let structure = fallback_structure(description);
    warn!(
        reason = %reason,
        project_name = %structure.project_name,
        module_path = %structure.module_path,
        "structure inference failed, using fallback"
    );
    InferenceOutcome::Fallback { structure, reason }
}

fn ask_model<C: Completion>(client: &C, description: &str) -> Result<ProjectStructure> {
    let prompt = structure_prompt(description);
    debug!(%prompt, "structure prompt");
    let response = client
        .generate(&prompt)
        .context("structure inference request")?;
    debug!(%response, "structure response");
    parse_structure_response(&response)
}

/// Parse and normalize the model's JSON answer.
///
/// A leading fenced block is unwrapped first. The project name is sanitized
/// and the module path normalized to `src/<name>.py`.
pub fn parse_structure_response(response: &str) -> Result<ProjectStructure> {
    let body = first_fenced_block(response);
    let value: Value = serde_json::from_str(&body).context("parse structure json")?;
    validate_schema(&value)?;
    let raw: RawStructure = serde_json::from_value(value).context("decode structure json")?;

    let module_path = normalize_module_path(&raw.module_path);
    if !is_contained_relative_path(&module_path) {
        bail!("module path escapes the repository: {}", raw.module_path);
    }
    Ok(ProjectStructure {
        project_name: project_name_or_default(&raw.project_name),
        module_path,
    })
}

fn validate_schema(instance: &Value) -> Result<()> {
    let schema: Value =
        serde_json::from_str(STRUCTURE_SCHEMA).context("parse structure schema")?;
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .context("compile structure schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("structure json does not match schema:\n- {}", messages.join("\n- "));
    }
    Ok(())
}
