//! Reading blueprint documents and writing compile results.

use std::path::Path;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::blueprint_parser::DocumentFormat;
use crate::error::{BlueprintError, BlueprintResult};
use crate::types::{CompileOutcome, FailureDiagnostic, HealedBlueprint};

/// Key under which the healing audit is attached to an emitted blueprint.
pub const HEALING_KEY: &str = "healing";

fn io_error(path: &Path, source: std::io::Error) -> BlueprintError {
  BlueprintError::Io {
    path: path.display().to_string(),
    source,
  }
}

/// Reads a document from `path`.
#[instrument(level = "trace", skip(path))]
pub fn load_document(path: &Path) -> BlueprintResult<String> {
  std::fs::read_to_string(path).map_err(|e| io_error(path, e))
}

/// Writes `contents` to `path`, creating parent directories.
#[instrument(level = "trace", skip(path, contents))]
pub fn save_document(path: &Path, contents: &str) -> BlueprintResult<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
  }
  std::fs::write(path, contents).map_err(|e| io_error(path, e))
}

/// The healed blueprint with its `healing` audit section.
#[instrument(level = "trace", skip(healed))]
pub fn healed_document(healed: &HealedBlueprint) -> BlueprintResult<Value> {
  let mut doc = serde_json::to_value(&healed.blueprint)?;
  if let Value::Object(m) = &mut doc {
    m.insert(
      HEALING_KEY.to_string(),
      json!({
        "attempts": healed.attempts,
        "operations": healed.history,
        "warnings": healed.warnings,
      }),
    );
  }
  Ok(doc)
}

#[instrument(level = "trace", skip(diag))]
pub fn diagnostic_document(diag: &FailureDiagnostic) -> BlueprintResult<Value> {
  Ok(serde_json::to_value(diag)?)
}

/// Serializes any value as pretty JSON or YAML.
#[instrument(level = "trace", skip(value))]
pub fn render<T: Serialize>(value: &T, format: DocumentFormat) -> BlueprintResult<String> {
  match format {
    DocumentFormat::Json => {
      let mut s = serde_json::to_string_pretty(value)?;
      s.push('\n');
      Ok(s)
    }
    DocumentFormat::Yaml => Ok(serde_yaml::to_string(value)?),
  }
}

/// Renders the healed document on success, the diagnostic on failure.
pub fn render_outcome(outcome: &CompileOutcome, format: DocumentFormat) -> BlueprintResult<String> {
  let doc = match outcome {
    CompileOutcome::Valid(h) => healed_document(h)?,
    CompileOutcome::Failed(d) => diagnostic_document(d)?,
  };
  render(&doc, format)
}
