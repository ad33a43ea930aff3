//! A directed binding between two component ports.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a registered schema adapter.
pub type TransformationId = String;

/// One schema-to-schema conversion step attached to a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transformation {
  pub id: TransformationId,
  pub from_schema: String,
  pub to_schema: String,
}

impl Transformation {
  pub fn new(
    id: impl Into<TransformationId>,
    from_schema: impl Into<String>,
    to_schema: impl Into<String>,
  ) -> Self {
    Self {
      id: id.into(),
      from_schema: from_schema.into(),
      to_schema: to_schema.into(),
    }
  }

  pub fn converts(&self, from_schema: &str, to_schema: &str) -> bool {
    self.from_schema == from_schema && self.to_schema == to_schema
  }
}

/// A binding in normalized form: always fully split and fully qualified.
///
/// Fan-out is represented as several bindings sharing `from_component` and
/// `from_port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
  pub from_component: String,
  pub from_port: String,
  pub to_component: String,
  pub to_port: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub transformations: Vec<Transformation>,
}

impl Binding {
  pub fn new(
    from_component: impl Into<String>,
    from_port: impl Into<String>,
    to_component: impl Into<String>,
    to_port: impl Into<String>,
  ) -> Self {
    Self {
      from_component: from_component.into(),
      from_port: from_port.into(),
      to_component: to_component.into(),
      to_port: to_port.into(),
      transformations: Vec::new(),
    }
  }

  pub fn with_transformation(mut self, t: Transformation) -> Self {
    self.transformations.push(t);
    self
  }

  /// True if both bindings connect the same two endpoints.
  pub fn same_endpoints(&self, other: &Binding) -> bool {
    self.from_component == other.from_component
      && self.from_port == other.from_port
      && self.to_component == other.to_component
      && self.to_port == other.to_port
  }

  pub fn touches(&self, component: &str) -> bool {
    self.from_component == component || self.to_component == component
  }
}

impl fmt::Display for Binding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}.{} -> {}.{}",
      self.from_component, self.from_port, self.to_component, self.to_port
    )
  }
}
