//! # blueprint-healer
//!
//! Semantic validation and self-healing compiler for component/binding
//! blueprints.
//!
//! ## Architecture
//!
//! A blueprint is parsed once, then driven through a bounded loop of phases
//! (see `compiler`):
//!
//! - structural heal: schema version, policy, terminal sinks, adjacent bindings
//! - structural validation: names, policy, binding targets
//! - port derivation (`PortDeriver`)
//! - schema heal: adapters from a `SchemaAdapterRegistry`
//! - semantic validation against the connectivity matrix
//!
//! Repairs carry forward between attempts. The loop stops when the blueprint
//! validates, when two consecutive attempts apply the same repairs, or after
//! `max_attempts`.

pub mod adapter_registry;
pub mod binding_normalizer;
pub mod blueprint_io;
pub mod blueprint_parser;
pub mod compiler;
#[cfg(test)]
mod compiler_test;
pub mod connectivity;
pub mod error;
pub mod phases;
pub mod types;

pub use adapter_registry::{InMemoryAdapterRegistry, SchemaAdapterRegistry};
pub use blueprint_parser::{DocumentFormat, ParsedBlueprint, parse_blueprint};
pub use compiler::{AttemptState, CompileOptions, Compiler, DEFAULT_MAX_ATTEMPTS, Phase, compile};
pub use error::{BlueprintError, BlueprintResult};
pub use phases::{DefaultPortDeriver, PortDeriver};
pub use types::{
  Binding, Blueprint, CompileOutcome, Component, ComponentType, FailureDiagnostic, HealedBlueprint,
  HealingKind, HealingOperation, ValidationError, ValidationErrorKind, ValidationMode,
};
