//! Tests for `Blueprint`.

use serde_json::json;

use super::{Binding, Blueprint, Component, ComponentType};

fn pipeline() -> Blueprint {
  Blueprint::new()
    .with_component(Component::new("src", ComponentType::Source))
    .with_component(Component::new("xf", ComponentType::Transformer))
    .with_component(Component::new("out", ComponentType::Sink))
    .with_binding(Binding::new("src", "output", "xf", "input"))
    .with_binding(Binding::new("xf", "output", "out", "input"))
}

#[test]
fn outgoing_and_incoming() {
  let bp = pipeline();
  assert_eq!(bp.outgoing_bindings("src").count(), 1);
  assert_eq!(bp.incoming_bindings("out").count(), 1);
  assert!(bp.has_outgoing("xf"));
  assert!(!bp.has_outgoing("out"));
  assert!(!bp.has_incoming("src"));
}

#[test]
fn unique_component_name_appends_suffix() {
  let bp = pipeline();
  assert_eq!(bp.unique_component_name("fresh"), "fresh");
  assert_eq!(bp.unique_component_name("out"), "out_2");
  let bp = bp.with_component(Component::new("out_2", ComponentType::Sink));
  assert_eq!(bp.unique_component_name("out"), "out_3");
}

#[test]
fn remove_component_drops_its_bindings() {
  let mut bp = pipeline();
  let removed = bp.remove_component("xf").unwrap();
  assert_eq!(removed.len(), 2);
  assert!(bp.bindings.is_empty());
  assert!(!bp.contains_component("xf"));
  assert!(bp.remove_component("xf").is_none());
}

#[test]
fn has_binding_matches_endpoints() {
  let bp = pipeline();
  assert!(bp.has_binding(&Binding::new("src", "output", "xf", "input")));
  assert!(!bp.has_binding(&Binding::new("src", "output", "out", "input")));
}

#[test]
fn serialize_flattens_extra_keys() {
  let mut bp = Blueprint::new().with_schema_version("1.0.0");
  bp.extra.insert("metadata".to_string(), json!({"owner": "data-team"}));
  let v = serde_json::to_value(&bp).unwrap();
  assert_eq!(v["schema_version"], "1.0.0");
  assert_eq!(v["metadata"]["owner"], "data-team");
  assert!(v.get("policy").is_none());
  assert_eq!(v["components"], json!([]));
}
