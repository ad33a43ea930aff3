//! Tests for `CompileOutcome`.

use super::{
  Blueprint, CompileOutcome, FailureDiagnostic, HealedBlueprint, HealingKind, HealingOperation,
  ValidationError, ValidationErrorKind,
};

fn failed() -> CompileOutcome {
  CompileOutcome::Failed(FailureDiagnostic {
    attempts_made: 2,
    stagnation_detected: true,
    errors: vec![
      ValidationError::error(ValidationErrorKind::InvalidConnection, Some("api"), "nope")
        .with_related("proc"),
    ],
    operations_applied: vec![HealingOperation::structural(
      HealingKind::InjectedPolicy,
      "injected canonical policy",
      vec![],
    )],
  })
}

#[test]
fn accessors() {
  let ok = CompileOutcome::Valid(HealedBlueprint {
    blueprint: Blueprint::new(),
    attempts: 1,
    history: vec![],
    warnings: vec![],
  });
  assert!(ok.is_valid());
  assert!(ok.clone().failed().is_none());
  assert!(ok.valid().is_some());

  let f = failed();
  assert!(!f.is_valid());
  assert_eq!(f.history().len(), 1);
  let d = f.failed().unwrap();
  assert!(d.has_kind(ValidationErrorKind::InvalidConnection));
  assert!(!d.has_kind(ValidationErrorKind::DuplicateName));
}

#[test]
fn failed_serializes_with_status_tag() {
  let v = serde_json::to_value(failed()).unwrap();
  assert_eq!(v["status"], "failed");
  assert_eq!(v["attempts_made"], 2);
  assert_eq!(v["stagnation_detected"], true);
  assert_eq!(v["errors"][0]["related_component"], "proc");
  assert_eq!(v["operations_applied"][0]["kind"], "InjectedPolicy");
}
