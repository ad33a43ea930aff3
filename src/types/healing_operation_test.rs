//! Tests for `HealingOperation`.

use super::{HealingKind, HealingOperation, HealingPhase};

#[test]
fn constructors_set_phase() {
  let op = HealingOperation::structural(HealingKind::InjectedPolicy, "injected policy", vec![]);
  assert_eq!(op.phase, HealingPhase::Structural);
  assert_eq!(op.attempt, 0);
  let op = HealingOperation::schema(
    HealingKind::AddedTransformation,
    "added json_parse",
    vec!["a".to_string(), "b".to_string()],
  )
  .in_attempt(3);
  assert_eq!(op.phase, HealingPhase::Schema);
  assert_eq!(op.attempt, 3);
}

#[test]
fn display_includes_kind() {
  let op = HealingOperation::structural(
    HealingKind::GeneratedBinding,
    "generated binding s1.output -> st1.input",
    vec!["s1".to_string(), "st1".to_string()],
  );
  assert_eq!(
    op.to_string(),
    "[GeneratedBinding] generated binding s1.output -> st1.input"
  );
}

#[test]
fn serializes_phase_snake_case_and_kind_pascal_case() {
  let op = HealingOperation::structural(HealingKind::SetSchemaVersion, "x", vec![]);
  let v = serde_json::to_value(&op).unwrap();
  assert_eq!(v["phase"], "structural");
  assert_eq!(v["kind"], "SetSchemaVersion");
}
