//! Blueprint data model.
//!
//! Everything the engine reads, rewrites and reports: the blueprint document
//! itself, audit records of repairs, validation defects and compile outcomes.

mod binding;
mod blueprint;
#[cfg(test)]
mod blueprint_test;
mod compile_outcome;
#[cfg(test)]
mod compile_outcome_test;
mod component;
mod component_type;
mod healing_operation;
#[cfg(test)]
mod healing_operation_test;
mod policy;
mod validation_error;
mod validation_mode;

pub use binding::{Binding, Transformation, TransformationId};
pub use blueprint::{Blueprint, CANONICAL_SCHEMA_VERSION};
pub use compile_outcome::{CompileOutcome, FailureDiagnostic, HealedBlueprint};
pub use component::{ANY_SCHEMA, Component, DEFAULT_INPUT_PORT, DEFAULT_OUTPUT_PORT, Port};
pub use component_type::ComponentType;
pub use healing_operation::{HealingKind, HealingOperation, HealingPhase};
pub use policy::{BackoffStrategy, CircuitBreakerPolicy, Policy, RetryPolicy};
pub use validation_error::{Severity, ValidationError, ValidationErrorKind};
pub use validation_mode::ValidationMode;
