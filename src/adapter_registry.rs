//! Schema adapter lookup used by the schema healer.

use std::collections::HashMap;

use tracing::instrument;

use crate::types::TransformationId;

/// Finds a transformation converting `source` payloads into `target` payloads.
pub trait SchemaAdapterRegistry: Send + Sync {
  fn lookup(&self, source: &str, target: &str) -> Option<TransformationId>;
}

/// In-memory registry keyed by `(source, target)` schema refs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAdapterRegistry {
  adapters: HashMap<(String, String), TransformationId>,
}

impl InMemoryAdapterRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registry preloaded with the text/bytes/json/record conversions.
  pub fn builtin() -> Self {
    let mut r = Self::new();
    r.register("bytes", "string", "utf8_decode");
    r.register("string", "bytes", "utf8_encode");
    r.register("json", "string", "json_serialize");
    r.register("string", "json", "json_parse");
    r.register("record", "json", "record_to_json");
    r.register("json", "record", "json_to_record");
    r
  }

  /// Adds or replaces the adapter for a schema pair.
  pub fn register(
    &mut self,
    source: impl Into<String>,
    target: impl Into<String>,
    id: impl Into<TransformationId>,
  ) -> &mut Self {
    self.adapters.insert((source.into(), target.into()), id.into());
    self
  }

  pub fn len(&self) -> usize {
    self.adapters.len()
  }

  pub fn is_empty(&self) -> bool {
    self.adapters.is_empty()
  }
}

impl SchemaAdapterRegistry for InMemoryAdapterRegistry {
  #[instrument(level = "trace", skip(self))]
  fn lookup(&self, source: &str, target: &str) -> Option<TransformationId> {
    self
      .adapters
      .get(&(source.to_string(), target.to_string()))
      .cloned()
  }
}
