//! Document-level errors.
//!
//! These cover input that cannot be turned into a blueprint at all. Defects in
//! a well-formed blueprint are `ValidationError` values, not Rust errors.

use thiserror::Error;

/// Result alias for document-level operations.
pub type BlueprintResult<T> = Result<T, BlueprintError>;

#[derive(Debug, Error)]
pub enum BlueprintError {
  #[error("invalid YAML: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("invalid JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("blueprint document must be a map at the top level, found {0}")]
  NotAMap(&'static str),

  #[error("'{key}' must be {expected}")]
  InvalidField { key: String, expected: &'static str },

  #[error("component #{index}: {message}")]
  InvalidComponent { index: usize, message: String },

  #[error("I/O error on {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

impl BlueprintError {
  pub(crate) fn invalid_field(key: impl Into<String>, expected: &'static str) -> Self {
    BlueprintError::InvalidField {
      key: key.into(),
      expected,
    }
  }
}
