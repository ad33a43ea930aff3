//! Strict vs relaxed validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Validation strictness, passed explicitly to every validation call.
///
/// Relaxed mode downgrades the canonical-shape checks (missing source,
/// missing sink) to warnings so minimal development blueprints validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
  Strict,
  #[default]
  Relaxed,
}

impl fmt::Display for ValidationMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationMode::Strict => write!(f, "strict"),
      ValidationMode::Relaxed => write!(f, "relaxed"),
    }
  }
}

impl FromStr for ValidationMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "strict" => Ok(ValidationMode::Strict),
      "relaxed" => Ok(ValidationMode::Relaxed),
      other => Err(format!("unknown validation mode '{}' (expected strict or relaxed)", other)),
    }
  }
}
