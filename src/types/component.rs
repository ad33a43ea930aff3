//! A typed component of a blueprint and its ports.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ComponentType;

/// Schema ref of a port that declares no schema; compatible with every schema.
pub const ANY_SCHEMA: &str = "any";

/// Port name used when a component declares no input ports.
pub const DEFAULT_INPUT_PORT: &str = "input";

/// Port name used when a component declares no output ports.
pub const DEFAULT_OUTPUT_PORT: &str = "output";

fn any_schema() -> String {
  ANY_SCHEMA.to_string()
}

fn is_false(b: &bool) -> bool {
  !*b
}

/// Surface forms of a port: a bare name or a `{name, schema}` map.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPort {
  Name(String),
  Full {
    name: String,
    #[serde(default = "any_schema", alias = "schema_ref")]
    schema: String,
  },
}

/// A named input or output port and the schema of the payload it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPort")]
pub struct Port {
  pub name: String,
  #[serde(rename = "schema")]
  pub schema_ref: String,
}

impl From<RawPort> for Port {
  fn from(raw: RawPort) -> Self {
    match raw {
      RawPort::Name(name) => Port::new(name),
      RawPort::Full { name, schema } => Port {
        name,
        schema_ref: schema,
      },
    }
  }
}

impl Port {
  /// Untyped port (`any` schema).
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      schema_ref: any_schema(),
    }
  }

  pub fn typed(name: impl Into<String>, schema_ref: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      schema_ref: schema_ref.into(),
    }
  }
}

/// A component of a blueprint.
///
/// `config` is opaque and passed through untouched. Ports are whatever the
/// author declared until the port deriver fills them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
  pub name: String,
  #[serde(rename = "type", alias = "declared_type")]
  pub declared_type: ComponentType,
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub config: Map<String, Value>,
  #[serde(
    rename = "inputs",
    alias = "input_ports",
    default,
    skip_serializing_if = "Vec::is_empty"
  )]
  pub input_ports: Vec<Port>,
  #[serde(
    rename = "outputs",
    alias = "output_ports",
    default,
    skip_serializing_if = "Vec::is_empty"
  )]
  pub output_ports: Vec<Port>,
  /// Exempt from the reachability check.
  #[serde(default, skip_serializing_if = "is_false")]
  pub standalone: bool,
  /// Created by the structural healer rather than the author.
  #[serde(default, skip_serializing_if = "is_false")]
  pub synthesized: bool,
  /// Unknown keys, re-emitted unchanged.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl Component {
  pub fn new(name: impl Into<String>, declared_type: ComponentType) -> Self {
    Self {
      name: name.into(),
      declared_type,
      config: Map::new(),
      input_ports: Vec::new(),
      output_ports: Vec::new(),
      standalone: false,
      synthesized: false,
      extra: Map::new(),
    }
  }

  pub fn with_input(mut self, port: Port) -> Self {
    self.input_ports.push(port);
    self
  }

  pub fn with_output(mut self, port: Port) -> Self {
    self.output_ports.push(port);
    self
  }

  pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
    self.config.insert(key.into(), value);
    self
  }

  pub fn input_port(&self, name: &str) -> Option<&Port> {
    self.input_ports.iter().find(|p| p.name == name)
  }

  pub fn output_port(&self, name: &str) -> Option<&Port> {
    self.output_ports.iter().find(|p| p.name == name)
  }

  /// First declared output port name, or [`DEFAULT_OUTPUT_PORT`].
  pub fn primary_output(&self) -> &str {
    self
      .output_ports
      .first()
      .map(|p| p.name.as_str())
      .unwrap_or(DEFAULT_OUTPUT_PORT)
  }

  /// First declared input port name, or [`DEFAULT_INPUT_PORT`].
  pub fn primary_input(&self) -> &str {
    self
      .input_ports
      .first()
      .map(|p| p.name.as_str())
      .unwrap_or(DEFAULT_INPUT_PORT)
  }

  /// Reads a string config value, accepting numbers as their decimal text.
  pub fn config_str(&self, key: &str) -> Option<String> {
    match self.config.get(key)? {
      Value::String(s) => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      _ => None,
    }
  }
}
