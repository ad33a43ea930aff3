//! The root blueprint document.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{Binding, Component, Policy};

/// Schema version assigned to blueprints that do not declare one.
pub const CANONICAL_SCHEMA_VERSION: &str = "1.0.0";

/// A parsed blueprint: components, normalized bindings, named schemas and policy.
///
/// Unknown top-level keys are kept in `extra` and emitted unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Blueprint {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub schema_version: Option<String>,
  pub components: Vec<Component>,
  pub bindings: Vec<Binding>,
  #[serde(skip_serializing_if = "Map::is_empty")]
  pub schemas: Map<String, Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub policy: Option<Policy>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl Blueprint {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_component(mut self, c: Component) -> Self {
    self.components.push(c);
    self
  }

  pub fn with_binding(mut self, b: Binding) -> Self {
    self.bindings.push(b);
    self
  }

  pub fn with_policy(mut self, p: Policy) -> Self {
    self.policy = Some(p);
    self
  }

  pub fn with_schema_version(mut self, v: impl Into<String>) -> Self {
    self.schema_version = Some(v.into());
    self
  }

  /// First component with this name.
  pub fn component(&self, name: &str) -> Option<&Component> {
    self.components.iter().find(|c| c.name == name)
  }

  pub fn contains_component(&self, name: &str) -> bool {
    self.component(name).is_some()
  }

  pub fn outgoing_bindings<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Binding> + 'a {
    self.bindings.iter().filter(move |b| b.from_component == name)
  }

  pub fn incoming_bindings<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Binding> + 'a {
    self.bindings.iter().filter(move |b| b.to_component == name)
  }

  pub fn has_outgoing(&self, name: &str) -> bool {
    self.outgoing_bindings(name).next().is_some()
  }

  pub fn has_incoming(&self, name: &str) -> bool {
    self.incoming_bindings(name).next().is_some()
  }

  /// True if a binding with the same endpoints already exists.
  pub fn has_binding(&self, b: &Binding) -> bool {
    self.bindings.iter().any(|x| x.same_endpoints(b))
  }

  /// `base` if unused, otherwise `base_2`, `base_3`, ...
  pub fn unique_component_name(&self, base: &str) -> String {
    if !self.contains_component(base) {
      return base.to_string();
    }
    let mut n = 2;
    loop {
      let candidate = format!("{}_{}", base, n);
      if !self.contains_component(&candidate) {
        return candidate;
      }
      n += 1;
    }
  }

  /// Removes every component with this name plus all bindings that reference it.
  /// Returns the removed bindings, or `None` if no such component existed.
  pub fn remove_component(&mut self, name: &str) -> Option<Vec<Binding>> {
    if !self.contains_component(name) {
      return None;
    }
    self.components.retain(|c| c.name != name);
    let (removed, kept): (Vec<Binding>, Vec<Binding>) =
      self.bindings.drain(..).partition(|b| b.touches(name));
    self.bindings = kept;
    Some(removed)
  }
}
