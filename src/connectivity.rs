//! Connectivity matrix and effective-role computation.
//!
//! The matrix is one match over every (producer, consumer) pair with no
//! wildcard arm, so a new [`ComponentType`] variant fails to compile until
//! its row and its column are written.

use tracing::instrument;

use crate::types::{Component, ComponentType};

use ComponentType::*;

/// True if a component with role `producer` may bind into one with role `consumer`.
#[instrument(level = "trace")]
pub fn may_connect(producer: ComponentType, consumer: ComponentType) -> bool {
  match (producer, consumer) {
    (
      Source,
      Sink | Transformer | Store | Controller | StreamProcessor | Router | Aggregator | Filter
      | WebSocket | Model | Accumulator,
    ) => true,
    (Source, Source | APIEndpoint) => false,

    (
      Transformer | Filter | Router,
      Sink | Transformer | Store | Controller | APIEndpoint | StreamProcessor | Router
      | Aggregator | Filter | WebSocket | Model | Accumulator,
    ) => true,
    (Transformer | Filter | Router, Source) => false,

    (
      StreamProcessor,
      Sink | Transformer | Store | StreamProcessor | Router | Aggregator | Filter | WebSocket
      | Model | Accumulator,
    ) => true,
    (StreamProcessor, Source | Controller | APIEndpoint) => false,

    // Request/response endpoints cannot feed unbounded stream stages.
    (APIEndpoint, Sink | Transformer | Store | Controller | Router | Filter | Model) => true,
    (
      APIEndpoint,
      Source | APIEndpoint | StreamProcessor | Aggregator | WebSocket | Accumulator,
    ) => false,

    (
      Controller,
      Sink | Transformer | Store | Controller | APIEndpoint | StreamProcessor | Router | Filter
      | Model,
    ) => true,
    (Controller, Source | Aggregator | WebSocket | Accumulator) => false,

    (
      WebSocket,
      Sink | Transformer | Store | Controller | StreamProcessor | Router | Filter | Model,
    ) => true,
    (WebSocket, Source | APIEndpoint | Aggregator | WebSocket | Accumulator) => false,

    (
      Aggregator | Accumulator,
      Sink | Transformer | Store | APIEndpoint | Router | Aggregator | Filter | WebSocket | Model
      | Accumulator,
    ) => true,
    (Aggregator | Accumulator, Source | Controller | StreamProcessor) => false,

    (
      Model,
      Sink | Transformer | Store | Controller | APIEndpoint | StreamProcessor | Router
      | Aggregator | Filter | WebSocket,
    ) => true,
    (Model, Source | Model | Accumulator) => false,

    (
      Sink | Store,
      Source | Sink | Transformer | Store | Controller | APIEndpoint | StreamProcessor | Router
      | Aggregator | Filter | WebSocket | Model | Accumulator,
    ) => false,
  }
}

/// Roles that legitimately end a flow.
pub fn is_terminal_role(role: ComponentType) -> bool {
  matches!(role, Sink | Store)
}

/// Roles that face an external client and may end a flow by replying to it.
pub fn is_boundary_role(role: ComponentType) -> bool {
  matches!(role, APIEndpoint | WebSocket)
}

/// Roles through which data enters the system.
pub fn is_entry_role(role: ComponentType) -> bool {
  matches!(role, Source | APIEndpoint | WebSocket)
}

/// Role computed from the declared type and the current port shape.
///
/// A terminal role that nonetheless has outputs is reclassified: with no
/// inputs it behaves as a `Source`, otherwise as a `Transformer`. Never
/// cache the result; ports change between attempts.
pub fn effective_role_of(declared: ComponentType, inputs: usize, outputs: usize) -> ComponentType {
  if is_terminal_role(declared) && outputs > 0 {
    if inputs == 0 { Source } else { Transformer }
  } else {
    declared
  }
}

#[instrument(level = "trace", skip(c), fields(component = %c.name))]
pub fn effective_role(c: &Component) -> ComponentType {
  effective_role_of(c.declared_type, c.input_ports.len(), c.output_ports.len())
}
