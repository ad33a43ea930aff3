//! Declared component type (the fixed role enumeration).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declared type of a blueprint component.
///
/// The same enumeration doubles as the role set of the connectivity matrix;
/// a component's *effective* role is always one of these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComponentType {
  Source,
  Sink,
  Transformer,
  Store,
  Controller,
  APIEndpoint,
  StreamProcessor,
  Router,
  Aggregator,
  Filter,
  WebSocket,
  Model,
  Accumulator,
}

impl ComponentType {
  /// Every role, in declaration order.
  pub const ALL: [ComponentType; 13] = [
    ComponentType::Source,
    ComponentType::Sink,
    ComponentType::Transformer,
    ComponentType::Store,
    ComponentType::Controller,
    ComponentType::APIEndpoint,
    ComponentType::StreamProcessor,
    ComponentType::Router,
    ComponentType::Aggregator,
    ComponentType::Filter,
    ComponentType::WebSocket,
    ComponentType::Model,
    ComponentType::Accumulator,
  ];

  /// Canonical spelling used when emitting documents.
  pub fn as_str(&self) -> &'static str {
    match self {
      ComponentType::Source => "Source",
      ComponentType::Sink => "Sink",
      ComponentType::Transformer => "Transformer",
      ComponentType::Store => "Store",
      ComponentType::Controller => "Controller",
      ComponentType::APIEndpoint => "APIEndpoint",
      ComponentType::StreamProcessor => "StreamProcessor",
      ComponentType::Router => "Router",
      ComponentType::Aggregator => "Aggregator",
      ComponentType::Filter => "Filter",
      ComponentType::WebSocket => "WebSocket",
      ComponentType::Model => "Model",
      ComponentType::Accumulator => "Accumulator",
    }
  }
}

impl fmt::Display for ComponentType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Lowercases and drops `_`, `-` and spaces so `api_endpoint` matches `APIEndpoint`.
fn fold_type_name(s: &str) -> String {
  s.chars()
    .filter(|c| !matches!(c, '_' | '-' | ' '))
    .flat_map(|c| c.to_lowercase())
    .collect()
}

impl FromStr for ComponentType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let folded = fold_type_name(s.trim());
    ComponentType::ALL
      .iter()
      .find(|t| fold_type_name(t.as_str()) == folded)
      .copied()
      .ok_or_else(|| format!("unknown component type '{}'", s))
  }
}

impl TryFrom<String> for ComponentType {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<ComponentType> for String {
  fn from(value: ComponentType) -> Self {
    value.as_str().to_string()
  }
}
