//! Terminal results of a compilation.

use serde::Serialize;

use super::{Blueprint, HealingOperation, ValidationError};

/// Successful compilation: the healed blueprint and everything done to it.
#[derive(Debug, Clone, Serialize)]
pub struct HealedBlueprint {
  pub blueprint: Blueprint,
  /// Attempts used, including the one that validated.
  pub attempts: u32,
  pub history: Vec<HealingOperation>,
  /// Warning-severity findings (relaxed-mode shape checks).
  pub warnings: Vec<ValidationError>,
}

/// Failed compilation. Never carries a partially healed blueprint.
#[derive(Debug, Clone, Serialize)]
pub struct FailureDiagnostic {
  pub attempts_made: u32,
  pub stagnation_detected: bool,
  pub errors: Vec<ValidationError>,
  pub operations_applied: Vec<HealingOperation>,
}

impl FailureDiagnostic {
  /// True if any error has this kind.
  pub fn has_kind(&self, kind: super::ValidationErrorKind) -> bool {
    self.errors.iter().any(|e| e.kind == kind)
  }
}

/// Result of `compile`: either a valid blueprint or a complete diagnostic.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompileOutcome {
  Valid(HealedBlueprint),
  Failed(FailureDiagnostic),
}

impl CompileOutcome {
  pub fn is_valid(&self) -> bool {
    matches!(self, CompileOutcome::Valid(_))
  }

  pub fn valid(self) -> Option<HealedBlueprint> {
    match self {
      CompileOutcome::Valid(h) => Some(h),
      CompileOutcome::Failed(_) => None,
    }
  }

  pub fn failed(self) -> Option<FailureDiagnostic> {
    match self {
      CompileOutcome::Valid(_) => None,
      CompileOutcome::Failed(d) => Some(d),
    }
  }

  /// Operation history regardless of outcome.
  pub fn history(&self) -> &[HealingOperation] {
    match self {
      CompileOutcome::Valid(h) => &h.history,
      CompileOutcome::Failed(d) => &d.operations_applied,
    }
  }
}
