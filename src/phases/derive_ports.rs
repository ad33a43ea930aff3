//! Port/type derivation: gives every component concrete ports and schema refs.

use tracing::{instrument, trace};

use crate::types::{
  ANY_SCHEMA, Blueprint, Component, ComponentType, DEFAULT_INPUT_PORT, DEFAULT_OUTPUT_PORT, Port,
};

use crate::connectivity::{is_entry_role, is_terminal_role};

/// Derives each component's input/output ports from a structurally sound blueprint.
///
/// Implementations must be pure, total and idempotent, and must never touch bindings.
pub trait PortDeriver: Send + Sync {
  fn derive(&self, blueprint: &Blueprint) -> Blueprint;
}

/// Derivation from declared ports, binding references, role defaults and config.
///
/// - ports referenced by bindings are added (inputs on anything but a `Source`)
/// - a component with no inputs gets `input` unless it is a `Source`, an entry role,
///   or a terminal role that already has outputs
/// - a component with no outputs gets `output` unless it is a terminal role
/// - untyped ports pick up `input_schema` / `output_schema` / `schema` from config
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPortDeriver;

fn config_schema(c: &Component, directional_key: &str) -> Option<String> {
  c.config_str(directional_key).or_else(|| c.config_str("schema"))
}

fn ensure_port(ports: &mut Vec<Port>, name: &str) -> bool {
  if ports.iter().any(|p| p.name == name) {
    return false;
  }
  ports.push(Port::new(name));
  true
}

fn fill_schema(ports: &mut [Port], schema: Option<&str>) {
  if let Some(s) = schema {
    for p in ports.iter_mut().filter(|p| p.schema_ref == ANY_SCHEMA) {
      p.schema_ref = s.to_string();
    }
  }
}

#[instrument(level = "trace", skip(bp, c), fields(component = %c.name))]
fn derive_component(bp: &Blueprint, c: &Component) -> Component {
  let mut out = c.clone();

  if c.declared_type != ComponentType::Source || !c.input_ports.is_empty() {
    for b in bp.incoming_bindings(&c.name) {
      if ensure_port(&mut out.input_ports, &b.to_port) {
        trace!(component = %c.name, port = %b.to_port, "derived input port from binding");
      }
    }
  }
  for b in bp.outgoing_bindings(&c.name) {
    if ensure_port(&mut out.output_ports, &b.from_port) {
      trace!(component = %c.name, port = %b.from_port, "derived output port from binding");
    }
  }

  // A terminal role with outputs and no inputs is a producer; it gets no default input.
  let terminal_producer = is_terminal_role(c.declared_type) && !out.output_ports.is_empty();
  if out.input_ports.is_empty()
    && c.declared_type != ComponentType::Source
    && !is_entry_role(c.declared_type)
    && !terminal_producer
  {
    out.input_ports.push(Port::new(DEFAULT_INPUT_PORT));
  }
  if out.output_ports.is_empty() && !is_terminal_role(c.declared_type) {
    out.output_ports.push(Port::new(DEFAULT_OUTPUT_PORT));
  }

  fill_schema(
    &mut out.input_ports,
    config_schema(c, "input_schema").as_deref(),
  );
  fill_schema(
    &mut out.output_ports,
    config_schema(c, "output_schema").as_deref(),
  );
  out
}

impl PortDeriver for DefaultPortDeriver {
  #[instrument(level = "trace", skip(self, blueprint))]
  fn derive(&self, blueprint: &Blueprint) -> Blueprint {
    let components = blueprint
      .components
      .iter()
      .map(|c| derive_component(blueprint, c))
      .collect();
    Blueprint {
      components,
      ..blueprint.clone()
    }
  }
}
