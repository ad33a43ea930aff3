//! Tests for `compiler`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;
use serde_json::json;

use crate::adapter_registry::InMemoryAdapterRegistry;
use crate::compiler::{CompileOptions, Compiler, DEFAULT_MAX_ATTEMPTS, compile};
use crate::phases::{DefaultPortDeriver, PortDeriver};
use crate::types::{
  Binding, Blueprint, CompileOutcome, ComponentType, HealingKind, Transformation, ValidationError,
  ValidationErrorKind, ValidationMode,
};

const SOURCE_AND_STORE: &str = r#"
components:
  - name: s1
    type: Source
  - name: st1
    type: Store
"#;

const API_TO_STREAM: &str = r#"
components:
  - name: api
    type: APIEndpoint
  - name: proc
    type: StreamProcessor
bindings:
  - from: api.output
    to: proc.input
"#;

/// Fully specified blueprint whose only defect has no adapter.
const UNFIXABLE_SCHEMA: &str = r#"
schema_version: "1.0.0"
policy: {}
components:
  - name: src
    type: Source
    outputs: [{name: output, schema: bytes}]
  - name: out
    type: Sink
    inputs: [{name: input, schema: record}]
bindings:
  - src.output -> out.input
"#;

/// True if the defect names `component` at either end.
fn mentions(e: &ValidationError, component: &str) -> bool {
  e.component_ref.as_deref() == Some(component) || e.related_component.as_deref() == Some(component)
}

#[test]
fn source_and_store_heal_to_one_generated_binding() {
  let outcome = compile(SOURCE_AND_STORE, ValidationMode::Relaxed, 4).unwrap();
  let healed = outcome.valid().expect("valid");
  assert_eq!(
    healed.blueprint.bindings,
    vec![Binding::new("s1", "output", "st1", "input")]
  );
  assert_eq!(healed.attempts, 1);
  assert!(
    healed
      .history
      .iter()
      .any(|op| op.kind == HealingKind::GeneratedBinding && op.attempt == 1)
  );
  assert_eq!(healed.blueprint.schema_version.as_deref(), Some("1.0.0"));
  assert!(healed.blueprint.policy.is_some());
  assert!(healed.warnings.is_empty());
}

#[test]
fn forbidden_connection_fails_with_both_ends_named() {
  let outcome = compile(API_TO_STREAM, ValidationMode::Relaxed, 4).unwrap();
  let diag = outcome.failed().expect("failed");
  assert!(diag.attempts_made <= 4);
  assert!(diag.stagnation_detected);
  let e = diag
    .errors
    .iter()
    .find(|e| e.kind == ValidationErrorKind::InvalidConnection)
    .expect("invalid connection reported");
  assert!(mentions(&e, "api") && mentions(&e, "proc"));
  // The sink synthesized in attempt 1 is still bound in the reported blueprint.
  assert!(!diag.has_kind(ValidationErrorKind::MissingBinding));

  let mut seen: HashMap<&str, usize> = HashMap::new();
  for op in &diag.operations_applied {
    *seen.entry(op.description.as_str()).or_default() += 1;
  }
  assert!(seen.values().all(|n| *n <= 2), "{:?}", seen);
}

#[test]
fn forbidden_connection_fails_in_strict_mode_too() {
  let diag = compile(API_TO_STREAM, ValidationMode::Strict, 4)
    .unwrap()
    .failed()
    .expect("failed");
  assert!(diag.has_kind(ValidationErrorKind::InvalidConnection));
}

#[test]
fn single_unfixable_defect_stagnates_within_two_attempts() {
  let diag = compile(UNFIXABLE_SCHEMA, ValidationMode::Relaxed, 10)
    .unwrap()
    .failed()
    .expect("failed");
  assert!(diag.stagnation_detected);
  assert_eq!(diag.attempts_made, 2);
  assert!(diag.operations_applied.is_empty());
  assert!(diag.has_kind(ValidationErrorKind::SchemaMismatch));
}

#[test]
fn registered_adapter_heals_the_same_defect() {
  let registry = {
    let mut r = InMemoryAdapterRegistry::builtin();
    r.register("bytes", "record", "decode_record");
    r
  };
  let healed = Compiler::new()
    .with_registry(registry)
    .compile(UNFIXABLE_SCHEMA)
    .unwrap()
    .valid()
    .expect("valid");
  assert_eq!(
    healed.blueprint.bindings[0].transformations,
    vec![Transformation::new("decode_record", "bytes", "record")]
  );
  assert_eq!(healed.history.len(), 1);
  assert_eq!(healed.history[0].kind, HealingKind::AddedTransformation);
}

#[test]
fn max_attempts_below_one_runs_once() {
  let diag = compile(API_TO_STREAM, ValidationMode::Relaxed, 0)
    .unwrap()
    .failed()
    .expect("failed");
  assert_eq!(diag.attempts_made, 1);
  assert!(!diag.stagnation_detected);
}

#[test]
fn store_with_only_outputs_acts_as_a_source() {
  let doc = r#"
schema_version: "1.0.0"
policy: {}
components:
  - {name: db, type: Store, outputs: [out]}
  - {name: k, type: Sink}
bindings:
  - db.out -> k.input
"#;
  let healed = compile(doc, ValidationMode::Strict, 4)
    .unwrap()
    .valid()
    .expect("valid");
  assert_eq!(healed.attempts, 1);
  assert!(healed.history.is_empty());
  assert!(healed.warnings.is_empty());
  assert!(healed.blueprint.component("db").unwrap().input_ports.is_empty());
}

#[test]
fn structural_failure_still_reports_every_defect() {
  let doc = json!({
    "components": [
      {"name": "a", "type": "Source"},
      {"name": "a", "type": "Transformer"},
      {"name": "k", "type": "Sink"}
    ],
    "bindings": [{"from": "a.output", "to": "ghost.input"}]
  });
  let diag = Compiler::new()
    .compile_value(doc)
    .unwrap()
    .failed()
    .expect("failed");
  assert!(diag.has_kind(ValidationErrorKind::DuplicateName));
  assert!(diag.has_kind(ValidationErrorKind::InvalidEndpointSpec));
  assert!(diag.stagnation_detected);
}

#[test]
fn unparseable_bindings_block_validity() {
  let doc = r#"
components:
  - {name: s, type: Source}
  - {name: k, type: Sink}
bindings:
  - s.output -> k.input
  - {from: s, to: k.input}
"#;
  let diag = compile(doc, ValidationMode::Relaxed, 4)
    .unwrap()
    .failed()
    .expect("failed");
  let e = &diag.errors[0];
  assert_eq!(e.kind, ValidationErrorKind::InvalidEndpointSpec);
  assert!(e.message.starts_with("binding #1"));
}

#[test]
fn relaxed_mode_warns_about_shape() {
  let doc = r#"
components:
  - {name: a, type: Source}
"#;
  let healed = compile(doc, ValidationMode::Relaxed, 4)
    .unwrap()
    .valid()
    .expect("valid");
  assert!(healed.blueprint.component("a_sink").is_some());
  assert!(healed.warnings.is_empty());

  let doc = r#"
components:
  - {name: api, type: APIEndpoint, standalone: true}
"#;
  let healed = compile(doc, ValidationMode::Relaxed, 4)
    .unwrap()
    .valid()
    .expect("valid");
  assert_eq!(healed.warnings.len(), 1);
  assert_eq!(healed.warnings[0].kind, ValidationErrorKind::MissingSink);
  assert!(
    compile(doc, ValidationMode::Strict, 4)
      .unwrap()
      .failed()
      .is_some_and(|d| d.has_kind(ValidationErrorKind::MissingSink))
  );
}

#[test]
fn document_errors_are_rust_errors() {
  assert!(compile("components: [", ValidationMode::Relaxed, 4).is_err());
  assert!(compile("- 1\n- 2\n", ValidationMode::Relaxed, 4).is_err());
}

#[test]
fn options_default_and_builder() {
  let o = CompileOptions::default();
  assert_eq!(o.mode, ValidationMode::Relaxed);
  assert_eq!(o.max_attempts, DEFAULT_MAX_ATTEMPTS);
  let c = Compiler::new()
    .with_options(o)
    .with_mode(ValidationMode::Strict)
    .with_max_attempts(2);
  assert_eq!(
    c.options(),
    CompileOptions {
      mode: ValidationMode::Strict,
      max_attempts: 2
    }
  );
}

/// Deriver that counts its calls and delegates to the default one.
struct Counting(Arc<AtomicUsize>);

impl PortDeriver for Counting {
  fn derive(&self, blueprint: &Blueprint) -> Blueprint {
    self.0.fetch_add(1, Ordering::SeqCst);
    DefaultPortDeriver.derive(blueprint)
  }
}

#[test]
fn custom_deriver_is_used() {
  let calls = Arc::new(AtomicUsize::new(0));
  let healed = Compiler::new()
    .with_deriver(Counting(Arc::clone(&calls)))
    .compile(SOURCE_AND_STORE)
    .unwrap()
    .valid()
    .expect("valid");
  assert_eq!(healed.blueprint.bindings.len(), 1);
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

fn arb_type() -> impl Strategy<Value = ComponentType> {
  (0..ComponentType::ALL.len()).prop_map(|i| ComponentType::ALL[i])
}

fn arb_document() -> impl Strategy<Value = serde_json::Value> {
  (
    prop::collection::vec(arb_type(), 0..7),
    prop::collection::vec((0usize..7, 0usize..7), 0..5),
    any::<bool>(),
  )
    .prop_map(|(types, edges, with_policy)| {
      let components: Vec<_> = types
        .iter()
        .enumerate()
        .map(|(i, t)| json!({"name": format!("c{}", i), "type": t.as_str()}))
        .collect();
      let n = types.len().max(1);
      let bindings: Vec<_> = edges
        .into_iter()
        .map(|(a, b)| format!("c{}.output -> c{}.input", a % n, b % n))
        .collect();
      let mut doc = json!({"components": components, "bindings": bindings});
      if with_policy {
        doc["policy"] = json!({});
      }
      doc
    })
}

proptest! {
  #[test]
  fn prop_compile_terminates_within_bound(doc in arb_document(), max in 1u32..6) {
    let outcome = Compiler::new().with_max_attempts(max).compile_value(doc).unwrap();
    match outcome {
      CompileOutcome::Valid(h) => prop_assert!(h.attempts <= max),
      CompileOutcome::Failed(d) => prop_assert!(d.attempts_made <= max),
    }
  }

  #[test]
  fn prop_generated_bindings_survive_to_the_output(doc in arb_document()) {
    let outcome = Compiler::new().with_max_attempts(4).compile_value(doc).unwrap();
    if let CompileOutcome::Valid(h) = outcome {
      for op in h.history.iter().filter(|op| op.kind == HealingKind::GeneratedBinding) {
        let generated = op.description.trim_start_matches("generated binding ");
        prop_assert!(h.blueprint.bindings.iter().any(|b| b.to_string() == generated));
      }
    }
  }
}
