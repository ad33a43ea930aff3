//! Audit record of one repair applied by a healer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which healer produced an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealingPhase {
  Structural,
  Schema,
}

/// What an operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealingKind {
  SetSchemaVersion,
  InjectedPolicy,
  AddedTerminalComponent,
  GeneratedBinding,
  RemovedComponent,
  AddedTransformation,
}

impl fmt::Display for HealingKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      HealingKind::SetSchemaVersion => "SetSchemaVersion",
      HealingKind::InjectedPolicy => "InjectedPolicy",
      HealingKind::AddedTerminalComponent => "AddedTerminalComponent",
      HealingKind::GeneratedBinding => "GeneratedBinding",
      HealingKind::RemovedComponent => "RemovedComponent",
      HealingKind::AddedTransformation => "AddedTransformation",
    };
    f.write_str(s)
  }
}

/// Immutable record of a repair.
///
/// `description` is deterministic for a given repair; the orchestrator compares
/// description multisets across attempts to detect stagnation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealingOperation {
  pub phase: HealingPhase,
  pub kind: HealingKind,
  pub description: String,
  pub affected_components: Vec<String>,
  /// 1-based attempt that produced the operation (0 when applied outside the orchestrator).
  pub attempt: u32,
}

impl HealingOperation {
  pub fn structural(
    kind: HealingKind,
    description: impl Into<String>,
    affected_components: Vec<String>,
  ) -> Self {
    Self {
      phase: HealingPhase::Structural,
      kind,
      description: description.into(),
      affected_components,
      attempt: 0,
    }
  }

  pub fn schema(
    kind: HealingKind,
    description: impl Into<String>,
    affected_components: Vec<String>,
  ) -> Self {
    Self {
      phase: HealingPhase::Schema,
      kind,
      description: description.into(),
      affected_components,
      attempt: 0,
    }
  }

  pub fn in_attempt(mut self, attempt: u32) -> Self {
    self.attempt = attempt;
    self
  }
}

impl fmt::Display for HealingOperation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}] {}", self.kind, self.description)
  }
}
