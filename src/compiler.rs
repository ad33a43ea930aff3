//! Healing orchestrator: the bounded, stagnation-aware compile loop.
//!
//! Each attempt runs `StructuralHeal → Validating(structural) → Deriving →
//! SchemaHeal → Validating(semantic)` on a deep copy of the working
//! blueprint. The copy is committed when the attempt ends, so retries always
//! continue from the last repairs and never from the raw document.

use std::collections::{BTreeMap, VecDeque};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::adapter_registry::{InMemoryAdapterRegistry, SchemaAdapterRegistry};
use crate::blueprint_parser::{blueprint_from_value, parse_blueprint};
use crate::error::BlueprintResult;
use crate::phases::{
  DefaultPortDeriver, PortDeriver, heal_schemas, heal_structure, validate, validate_structure,
};
use crate::types::{
  Blueprint, CompileOutcome, FailureDiagnostic, HealedBlueprint, HealingOperation, ValidationError,
  ValidationMode,
};

/// Attempts allowed when the caller does not say otherwise.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Number of per-attempt operation multisets compared for stagnation.
const STAGNATION_WINDOW: usize = 2;

/// Knobs for one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
  pub mode: ValidationMode,
  /// Upper bound on attempts; values below 1 are treated as 1.
  pub max_attempts: u32,
}

impl Default for CompileOptions {
  fn default() -> Self {
    Self {
      mode: ValidationMode::default(),
      max_attempts: DEFAULT_MAX_ATTEMPTS,
    }
  }
}

/// Orchestrator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Parsing,
  StructuralHeal,
  ValidatingStructure,
  Deriving,
  SchemaHeal,
  ValidatingSemantics,
  Valid,
  Failed,
}

/// Multiset of operation descriptions produced by one attempt.
type OperationFingerprint = BTreeMap<String, usize>;

fn fingerprint(ops: &[HealingOperation]) -> OperationFingerprint {
  let mut m = OperationFingerprint::new();
  for op in ops {
    *m.entry(op.description.clone()).or_insert(0) += 1;
  }
  m
}

/// Cross-attempt state owned by a single compile call.
#[derive(Debug, Clone)]
pub struct AttemptState {
  /// 1-based number of the current attempt.
  pub attempt_number: u32,
  /// Last committed blueprint.
  pub working: Blueprint,
  /// Every operation applied so far, in order.
  pub history: Vec<HealingOperation>,
  /// Binding entries rejected at parse time; reported on every validation.
  pub parse_errors: Vec<ValidationError>,
  window: VecDeque<OperationFingerprint>,
}

impl AttemptState {
  pub fn new(working: Blueprint, parse_errors: Vec<ValidationError>) -> Self {
    Self {
      attempt_number: 1,
      working,
      history: Vec::new(),
      parse_errors,
      window: VecDeque::with_capacity(STAGNATION_WINDOW),
    }
  }

  /// Records an attempt's operations and the blueprint it produced.
  fn commit(&mut self, candidate: Blueprint, ops: Vec<HealingOperation>) {
    if self.window.len() == STAGNATION_WINDOW {
      self.window.pop_front();
    }
    self.window.push_back(fingerprint(&ops));
    self.working = candidate;
    self.history.extend(ops);
  }

  /// True if the last two attempts applied the same multiset of operations.
  pub fn is_stagnant(&self) -> bool {
    self.window.len() == STAGNATION_WINDOW && self.window[0] == self.window[1]
  }

  fn with_parse_errors(&self, mut errors: Vec<ValidationError>) -> Vec<ValidationError> {
    let mut all = self.parse_errors.clone();
    all.append(&mut errors);
    all
  }
}

fn has_errors(errors: &[ValidationError]) -> bool {
  errors.iter().any(ValidationError::is_error)
}

/// Scratch data of the attempt in flight.
struct Attempt {
  candidate: Blueprint,
  ops: Vec<HealingOperation>,
  errors: Vec<ValidationError>,
}

/// Loop state: a [`Phase`] plus the attempt it is working on.
enum Step {
  Parsing,
  StructuralHeal,
  ValidatingStructure(Attempt),
  Deriving(Attempt),
  SchemaHeal(Attempt),
  ValidatingSemantics(Attempt),
  Valid(Attempt),
  Failed,
}

impl Step {
  fn phase(&self) -> Phase {
    match self {
      Step::Parsing => Phase::Parsing,
      Step::StructuralHeal => Phase::StructuralHeal,
      Step::ValidatingStructure(_) => Phase::ValidatingStructure,
      Step::Deriving(_) => Phase::Deriving,
      Step::SchemaHeal(_) => Phase::SchemaHeal,
      Step::ValidatingSemantics(_) => Phase::ValidatingSemantics,
      Step::Valid(_) => Phase::Valid,
      Step::Failed => Phase::Failed,
    }
  }
}

/// Compiles blueprints with a configurable deriver, adapter registry and options.
pub struct Compiler {
  deriver: Box<dyn PortDeriver>,
  registry: Box<dyn SchemaAdapterRegistry>,
  options: CompileOptions,
}

impl Default for Compiler {
  fn default() -> Self {
    Self {
      deriver: Box::new(DefaultPortDeriver),
      registry: Box::new(InMemoryAdapterRegistry::builtin()),
      options: CompileOptions::default(),
    }
  }
}

impl Compiler {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_deriver(mut self, deriver: impl PortDeriver + 'static) -> Self {
    self.deriver = Box::new(deriver);
    self
  }

  pub fn with_registry(mut self, registry: impl SchemaAdapterRegistry + 'static) -> Self {
    self.registry = Box::new(registry);
    self
  }

  pub fn with_options(mut self, options: CompileOptions) -> Self {
    self.options = options;
    self
  }

  pub fn with_mode(mut self, mode: ValidationMode) -> Self {
    self.options.mode = mode;
    self
  }

  pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
    self.options.max_attempts = max_attempts;
    self
  }

  pub fn options(&self) -> CompileOptions {
    self.options
  }

  /// Parses and compiles a YAML or JSON document.
  pub fn compile(&self, raw: &str) -> BlueprintResult<CompileOutcome> {
    let parsed = parse_blueprint(raw)?;
    Ok(self.compile_blueprint(parsed.blueprint, parsed.binding_errors))
  }

  /// Compiles an already-decoded document.
  pub fn compile_value(&self, value: Value) -> BlueprintResult<CompileOutcome> {
    let (blueprint, binding_errors) = blueprint_from_value(value)?;
    Ok(self.compile_blueprint(blueprint, binding_errors))
  }

  /// Runs the healing loop on a parsed blueprint.
  ///
  /// `parse_errors` are binding entries that could not be normalized; they are
  /// reported by every validation and keep the blueprint from becoming valid.
  #[instrument(level = "trace", skip(self, blueprint, parse_errors))]
  pub fn compile_blueprint(
    &self,
    blueprint: Blueprint,
    parse_errors: Vec<ValidationError>,
  ) -> CompileOutcome {
    let max_attempts = self.options.max_attempts.max(1);
    let mode = self.options.mode;
    let mut state = AttemptState::new(blueprint, parse_errors);
    let mut step = Step::Parsing;

    loop {
      debug!(phase = ?step.phase(), attempt = state.attempt_number, "phase");
      step = match step {
        Step::Parsing => Step::StructuralHeal,

        Step::StructuralHeal => {
          info!(attempt = state.attempt_number, max_attempts, %mode, "starting attempt");
          let mut candidate = state.working.clone();
          let ops = heal_structure(&mut candidate)
            .into_iter()
            .map(|op| op.in_attempt(state.attempt_number))
            .collect();
          Step::ValidatingStructure(Attempt {
            candidate,
            ops,
            errors: Vec::new(),
          })
        }

        Step::ValidatingStructure(mut a) => {
          a.errors = state.with_parse_errors(validate_structure(&a.candidate));
          if has_errors(&a.errors) {
            debug!(errors = a.errors.len(), "structural validation failed");
            end_attempt(&mut state, a, max_attempts)
          } else {
            Step::Deriving(a)
          }
        }

        Step::Deriving(mut a) => {
          a.candidate = self.deriver.derive(&a.candidate);
          Step::SchemaHeal(a)
        }

        Step::SchemaHeal(mut a) => {
          let n = state.attempt_number;
          let ops = heal_schemas(&mut a.candidate, self.registry.as_ref());
          a.ops.extend(ops.into_iter().map(|op| op.in_attempt(n)));
          Step::ValidatingSemantics(a)
        }

        Step::ValidatingSemantics(mut a) => {
          a.errors = state.with_parse_errors(validate(&a.candidate, mode));
          if has_errors(&a.errors) {
            debug!(errors = a.errors.len(), "semantic validation failed");
            end_attempt(&mut state, a, max_attempts)
          } else {
            Step::Valid(a)
          }
        }

        Step::Valid(a) => {
          let warnings = a.errors;
          state.commit(a.candidate, a.ops);
          info!(
            attempts = state.attempt_number,
            operations = state.history.len(),
            warnings = warnings.len(),
            "blueprint valid"
          );
          return CompileOutcome::Valid(HealedBlueprint {
            blueprint: state.working,
            attempts: state.attempt_number,
            history: state.history,
            warnings,
          });
        }

        Step::Failed => {
          let stagnation_detected = state.is_stagnant();
          let snapshot = self.deriver.derive(&state.working);
          let errors = state.with_parse_errors(validate(&snapshot, mode));
          warn!(
            attempts = state.attempt_number,
            stagnation_detected,
            errors = errors.iter().filter(|e| e.is_error()).count(),
            "blueprint could not be healed"
          );
          return CompileOutcome::Failed(FailureDiagnostic {
            attempts_made: state.attempt_number,
            stagnation_detected,
            errors,
            operations_applied: state.history,
          });
        }
      };
    }
  }
}

/// Commits a failed attempt and decides between retrying and giving up.
#[instrument(level = "trace", skip(state, a))]
fn end_attempt(state: &mut AttemptState, a: Attempt, max_attempts: u32) -> Step {
  state.commit(a.candidate, a.ops);
  if state.is_stagnant() {
    warn!(attempt = state.attempt_number, "stagnation detected");
    return Step::Failed;
  }
  if state.attempt_number >= max_attempts {
    return Step::Failed;
  }
  state.attempt_number += 1;
  Step::StructuralHeal
}

/// Compiles a YAML or JSON blueprint with the built-in deriver and adapters.
///
/// `Err` means the document could not be read as a blueprint at all; every
/// other problem is reported inside the returned [`CompileOutcome`].
pub fn compile(raw: &str, mode: ValidationMode, max_attempts: u32) -> BlueprintResult<CompileOutcome> {
  Compiler::new()
    .with_mode(mode)
    .with_max_attempts(max_attempts)
    .compile(raw)
}
