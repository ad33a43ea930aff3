//! Typed defects reported by the architectural validator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a validation defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValidationErrorKind {
  InvalidConnection,
  MissingBinding,
  SchemaMismatch,
  OrphanedComponent,
  MissingPolicy,
  InvalidEndpointSpec,
  DuplicateName,
  ResourceConflict,
  MissingSource,
  MissingSink,
}

impl fmt::Display for ValidationErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// Whether a defect blocks the blueprint from being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
  Error,
  Warning,
}

/// One defect, with enough context for a caller to render it without re-deriving anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
  pub kind: ValidationErrorKind,
  pub severity: Severity,
  /// Component the defect is attached to; `None` for whole-blueprint checks.
  pub component_ref: Option<String>,
  /// Other component involved (consumer of an invalid connection, second claimant of a resource).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub related_component: Option<String>,
  pub message: String,
}

impl ValidationError {
  pub fn error(kind: ValidationErrorKind, component_ref: Option<&str>, message: impl Into<String>) -> Self {
    Self {
      kind,
      severity: Severity::Error,
      component_ref: component_ref.map(str::to_string),
      related_component: None,
      message: message.into(),
    }
  }

  pub fn warning(kind: ValidationErrorKind, component_ref: Option<&str>, message: impl Into<String>) -> Self {
    Self {
      severity: Severity::Warning,
      ..Self::error(kind, component_ref, message)
    }
  }

  pub fn with_related(mut self, component: impl Into<String>) -> Self {
    self.related_component = Some(component.into());
    self
  }

  pub fn is_error(&self) -> bool {
    self.severity == Severity::Error
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let level = match self.severity {
      Severity::Error => "error",
      Severity::Warning => "warning",
    };
    match &self.component_ref {
      Some(c) => write!(f, "{} [{}] {}: {}", level, self.kind, c, self.message),
      None => write!(f, "{} [{}] {}", level, self.kind, self.message),
    }
  }
}
