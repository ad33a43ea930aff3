//! End-to-end library tests on the documents in tests/fixtures/.

use std::path::{Path, PathBuf};

use blueprint_healer::blueprint_io::{HEALING_KEY, healed_document, load_document};
use blueprint_healer::{
  Binding, BlueprintError, CompileOutcome, Compiler, DocumentFormat, HealingKind,
  InMemoryAdapterRegistry, ValidationError, ValidationErrorKind, ValidationMode, compile,
  parse_blueprint,
};

/// True if the defect names `component` at either end.
fn mentions(e: &ValidationError, component: &str) -> bool {
  e.component_ref.as_deref() == Some(component) || e.related_component.as_deref() == Some(component)
}

fn fixture(name: &str) -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

fn read(name: &str) -> String {
  load_document(&fixture(name)).expect("fixture")
}

#[test]
fn source_store_heals_with_generated_binding() {
  let healed = compile(&read("source_store.yaml"), ValidationMode::Relaxed, 4)
    .unwrap()
    .valid()
    .expect("valid");
  assert_eq!(
    healed.blueprint.bindings,
    vec![Binding::new("s1", "output", "st1", "input")]
  );
  let generated: Vec<_> = healed
    .history
    .iter()
    .filter(|op| op.kind == HealingKind::GeneratedBinding)
    .collect();
  assert_eq!(generated.len(), 1);
  assert_eq!(generated[0].affected_components, vec!["s1", "st1"]);

  let doc = healed_document(&healed).unwrap();
  assert_eq!(doc["owner"], "ingest-team");
  assert!(doc[HEALING_KEY]["operations"].is_array());
}

#[test]
fn api_stream_fails_naming_both_components() {
  for mode in [ValidationMode::Relaxed, ValidationMode::Strict] {
    let diag = compile(&read("api_stream.yaml"), mode, 4)
      .unwrap()
      .failed()
      .expect("failed");
    assert!(diag.attempts_made <= 4);
    assert!(diag.stagnation_detected);
    assert!(
      diag
        .errors
        .iter()
        .any(|e| e.kind == ValidationErrorKind::InvalidConnection
          && mentions(&e, "api")
          && mentions(&e, "proc"))
    );
  }
}

#[test]
fn mixed_binding_syntaxes_compile_with_an_adapter() {
  let parsed = parse_blueprint(&read("mixed_bindings.json")).unwrap();
  assert_eq!(parsed.format, DocumentFormat::Json);
  assert!(parsed.binding_errors.is_empty());
  assert_eq!(parsed.blueprint.bindings.len(), 4);

  let outcome = Compiler::new()
    .with_mode(ValidationMode::Strict)
    .compile(&read("mixed_bindings.json"))
    .unwrap();
  let CompileOutcome::Valid(healed) = outcome else {
    panic!("expected valid outcome");
  };
  let kinds: Vec<_> = healed.history.iter().map(|op| op.kind).collect();
  assert_eq!(
    kinds,
    vec![HealingKind::InjectedPolicy, HealingKind::AddedTransformation]
  );
  let decode = healed
    .blueprint
    .bindings
    .iter()
    .find(|b| b.to_component == "decode")
    .unwrap();
  assert_eq!(decode.transformations[0].id, "utf8_decode");
  assert_eq!(healed.blueprint.schemas.len(), 1);
}

#[test]
fn schema_mismatch_stagnates_then_heals_with_registered_adapter() {
  let raw = read("schema_mismatch.yaml");
  let diag = compile(&raw, ValidationMode::Relaxed, 8)
    .unwrap()
    .failed()
    .expect("failed");
  assert!(diag.stagnation_detected);
  assert_eq!(diag.attempts_made, 2);
  assert!(diag.has_kind(ValidationErrorKind::SchemaMismatch));

  let mut registry = InMemoryAdapterRegistry::builtin();
  registry.register("bytes", "record", "bytes_to_record");
  let healed = Compiler::new()
    .with_registry(registry)
    .compile(&raw)
    .unwrap()
    .valid()
    .expect("valid");
  assert_eq!(healed.blueprint.policy.unwrap().retry.max_attempts, 5);
}

#[test]
fn broken_document_is_an_error() {
  assert!(matches!(
    compile(&read("broken.yaml"), ValidationMode::Relaxed, 4),
    Err(BlueprintError::Yaml(_))
  ));
}

#[test]
fn compilers_are_shareable_across_threads() {
  let compiler = std::sync::Arc::new(Compiler::new());
  let handles: Vec<_> = ["source_store.yaml", "api_stream.yaml"]
    .into_iter()
    .map(|name| {
      let c = std::sync::Arc::clone(&compiler);
      let raw = read(name);
      std::thread::spawn(move || c.compile(&raw).map(|o| o.is_valid()))
    })
    .collect();
  let results: Vec<bool> = handles
    .into_iter()
    .map(|h| h.join().unwrap().unwrap())
    .collect();
  assert_eq!(results, vec![true, false]);
}
