//! Parses YAML/JSON blueprint documents into a [`Blueprint`].
//!
//! Documents are read into a `serde_json::Value` tree first so both formats
//! share one path. Bindings go through the binding normalizer; entries it
//! rejects are returned next to the blueprint as validation errors rather than
//! failing the parse.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::binding_normalizer::normalize_bindings;
use crate::error::{BlueprintError, BlueprintResult};
use crate::types::{Blueprint, Component, Policy, ValidationError};

/// Serialization format of a blueprint document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
  #[default]
  Yaml,
  Json,
}

impl DocumentFormat {
  /// JSON if the first non-blank character opens an object, YAML otherwise.
  pub fn detect(raw: &str) -> Self {
    match raw.trim_start().chars().next() {
      Some('{') => DocumentFormat::Json,
      _ => DocumentFormat::Yaml,
    }
  }

  /// Format implied by a file extension, if it names one.
  pub fn from_path(path: &Path) -> Option<Self> {
    path.extension()?.to_str()?.parse().ok()
  }
}

impl fmt::Display for DocumentFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DocumentFormat::Yaml => write!(f, "yaml"),
      DocumentFormat::Json => write!(f, "json"),
    }
  }
}

impl FromStr for DocumentFormat {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "yaml" | "yml" => Ok(DocumentFormat::Yaml),
      "json" => Ok(DocumentFormat::Json),
      other => Err(format!("unknown document format '{}' (expected yaml or json)", other)),
    }
  }
}

/// A parsed document: the blueprint, binding entries that could not be
/// normalized, and the format it was written in.
#[derive(Debug, Clone)]
pub struct ParsedBlueprint {
  pub blueprint: Blueprint,
  pub binding_errors: Vec<ValidationError>,
  pub format: DocumentFormat,
}

/// Reads raw text into a value tree, detecting the format.
#[instrument(level = "trace", skip(raw))]
pub fn parse_document(raw: &str) -> BlueprintResult<(Value, DocumentFormat)> {
  let format = DocumentFormat::detect(raw);
  let value = match format {
    DocumentFormat::Json => serde_json::from_str(raw)?,
    DocumentFormat::Yaml => serde_yaml::from_str(raw)?,
  };
  Ok((value, format))
}

fn kind_name(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "a list",
    Value::Object(_) => "a map",
  }
}

fn schema_version(v: Option<Value>) -> BlueprintResult<Option<String>> {
  match v {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) => Ok(Some(s)),
    Some(Value::Number(n)) => Ok(Some(n.to_string())),
    Some(_) => Err(BlueprintError::invalid_field("schema_version", "a string")),
  }
}

fn list(key: &str, v: Option<Value>) -> BlueprintResult<Vec<Value>> {
  match v {
    None | Some(Value::Null) => Ok(Vec::new()),
    Some(Value::Array(items)) => Ok(items),
    Some(_) => Err(BlueprintError::invalid_field(key, "a list")),
  }
}

#[instrument(level = "trace", skip(v))]
fn component(index: usize, v: Value) -> BlueprintResult<Component> {
  if !v.is_object() {
    return Err(BlueprintError::InvalidComponent {
      index,
      message: format!("expected a map, found {}", kind_name(&v)),
    });
  }
  let c: Component = serde_json::from_value(v).map_err(|e| BlueprintError::InvalidComponent {
    index,
    message: e.to_string(),
  })?;
  if c.name.trim().is_empty() {
    return Err(BlueprintError::InvalidComponent {
      index,
      message: "component name must not be empty".to_string(),
    });
  }
  Ok(c)
}

/// Builds a blueprint from an already-decoded document.
///
/// Fails only when the document cannot be mapped onto the data model at all.
#[instrument(level = "trace", skip(value))]
pub fn blueprint_from_value(value: Value) -> BlueprintResult<(Blueprint, Vec<ValidationError>)> {
  let mut root: Map<String, Value> = match value {
    Value::Object(m) => m,
    other => return Err(BlueprintError::NotAMap(kind_name(&other))),
  };

  let schema_version = schema_version(root.remove("schema_version"))?;
  let components = list("components", root.remove("components"))?
    .into_iter()
    .enumerate()
    .map(|(i, v)| component(i, v))
    .collect::<BlueprintResult<Vec<_>>>()?;
  let raw_bindings = list("bindings", root.remove("bindings"))?;
  let (bindings, binding_errors) = normalize_bindings(&raw_bindings);
  let schemas = match root.remove("schemas") {
    None | Some(Value::Null) => Map::new(),
    Some(Value::Object(m)) => m,
    Some(_) => return Err(BlueprintError::invalid_field("schemas", "a map")),
  };
  let policy = match root.remove("policy") {
    None | Some(Value::Null) => None,
    Some(v @ Value::Object(_)) => Some(serde_json::from_value::<Policy>(v)?),
    Some(_) => return Err(BlueprintError::invalid_field("policy", "a map")),
  };

  debug!(
    components = components.len(),
    bindings = bindings.len(),
    binding_errors = binding_errors.len(),
    "parsed blueprint"
  );
  let blueprint = Blueprint {
    schema_version,
    components,
    bindings,
    schemas,
    policy,
    extra: root,
  };
  Ok((blueprint, binding_errors))
}

/// Parses a YAML or JSON document.
#[instrument(level = "trace", skip(raw))]
pub fn parse_blueprint(raw: &str) -> BlueprintResult<ParsedBlueprint> {
  let (value, format) = parse_document(raw)?;
  let (blueprint, binding_errors) = blueprint_from_value(value)?;
  Ok(ParsedBlueprint {
    blueprint,
    binding_errors,
    format,
  })
}
