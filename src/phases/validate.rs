//! Architectural validation over a derived blueprint.
//!
//! Every check runs regardless of what earlier checks found, and findings are
//! reported in check order so output is stable across runs.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use tracing::{instrument, trace};

use super::schema_heal::{delivered_schema, endpoint_schemas, schemas_compatible};
use crate::connectivity::{
  effective_role, is_boundary_role, is_entry_role, is_terminal_role, may_connect,
};
use crate::types::{Binding, Blueprint, Component, ValidationError, ValidationErrorKind, ValidationMode};

const DEFAULT_HOST: &str = "0.0.0.0";

#[instrument(level = "trace", skip(bp, out))]
fn check_duplicate_names(bp: &Blueprint, out: &mut Vec<ValidationError>) {
  let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
  let mut order = Vec::new();
  for c in &bp.components {
    let n = counts.entry(c.name.as_str()).or_insert(0);
    if *n == 0 {
      order.push(c.name.as_str());
    }
    *n += 1;
  }
  for name in order {
    let n = counts[name];
    if n > 1 {
      out.push(ValidationError::error(
        ValidationErrorKind::DuplicateName,
        Some(name),
        format!("component name '{}' is declared {} times", name, n),
      ));
    }
  }
}

#[instrument(level = "trace", skip(bp, out))]
fn check_policy(bp: &Blueprint, out: &mut Vec<ValidationError>) {
  if bp.policy.is_none() {
    out.push(ValidationError::error(
      ValidationErrorKind::MissingPolicy,
      None,
      "blueprint has no policy block",
    ));
  }
}

#[instrument(level = "trace", skip(bp, out))]
fn check_components_resolve(bp: &Blueprint, out: &mut Vec<ValidationError>) {
  for b in &bp.bindings {
    for name in [&b.from_component, &b.to_component] {
      if !bp.contains_component(name) {
        out.push(ValidationError::error(
          ValidationErrorKind::InvalidEndpointSpec,
          Some(name),
          format!("binding {} references unknown component '{}'", b, name),
        ));
      }
    }
  }
}

fn port_error(component: &str, b: &Binding, direction: &str, port: &str, wrong_way: bool) -> ValidationError {
  let hint = if wrong_way {
    format!(" ('{}' is declared the other way)", port)
  } else {
    String::new()
  };
  ValidationError::error(
    ValidationErrorKind::InvalidEndpointSpec,
    Some(component),
    format!(
      "binding {}: '{}' has no {} port '{}'{}",
      b, component, direction, port, hint
    ),
  )
}

#[instrument(level = "trace", skip(bp, out))]
fn check_ports_resolve(bp: &Blueprint, out: &mut Vec<ValidationError>) {
  for b in &bp.bindings {
    if let Some(c) = bp.component(&b.from_component) {
      if c.output_port(&b.from_port).is_none() {
        let wrong_way = c.input_port(&b.from_port).is_some();
        out.push(port_error(&c.name, b, "output", &b.from_port, wrong_way));
      }
    }
    if let Some(c) = bp.component(&b.to_component) {
      if c.input_port(&b.to_port).is_none() {
        let wrong_way = c.output_port(&b.to_port).is_some();
        out.push(port_error(&c.name, b, "input", &b.to_port, wrong_way));
      }
    }
  }
}

#[instrument(level = "trace", skip(bp, out))]
fn check_connectivity(bp: &Blueprint, out: &mut Vec<ValidationError>) {
  for b in &bp.bindings {
    let (Some(from), Some(to)) = (bp.component(&b.from_component), bp.component(&b.to_component))
    else {
      continue;
    };
    let (pr, cr) = (effective_role(from), effective_role(to));
    if !may_connect(pr, cr) {
      out.push(
        ValidationError::error(
          ValidationErrorKind::InvalidConnection,
          Some(&from.name),
          format!(
            "'{}' ({}) may not feed '{}' ({}) via {}",
            from.name, pr, to.name, cr, b
          ),
        )
        .with_related(&to.name),
      );
    }
  }
}

fn schema_error(b: &Binding, message: String) -> ValidationError {
  ValidationError::error(
    ValidationErrorKind::SchemaMismatch,
    Some(&b.to_component),
    message,
  )
  .with_related(&b.from_component)
}

#[instrument(level = "trace", skip(bp, out))]
fn check_schemas(bp: &Blueprint, out: &mut Vec<ValidationError>) {
  for b in &bp.bindings {
    let Some((producer, consumer)) = endpoint_schemas(bp, b) else {
      continue;
    };
    match delivered_schema(b, &producer) {
      Err(i) => {
        let t = &b.transformations[i];
        let received = match i {
          0 => producer.as_str(),
          _ => b.transformations[i - 1].to_schema.as_str(),
        };
        out.push(schema_error(
          b,
          format!(
            "binding {}: transformation '{}' expects {} but receives {}",
            b, t.id, t.from_schema, received
          ),
        ));
      }
      Ok(delivered) if !schemas_compatible(&delivered, &consumer) => {
        out.push(schema_error(
          b,
          format!(
            "binding {}: delivers {} but '{}.{}' expects {} and no adapter applies",
            b, delivered, b.to_component, b.to_port, consumer
          ),
        ));
      }
      Ok(_) => {}
    }
  }
}

#[instrument(level = "trace", skip(bp, out))]
fn check_missing_bindings(bp: &Blueprint, out: &mut Vec<ValidationError>) {
  for c in &bp.components {
    let role = effective_role(c);
    if is_terminal_role(role) || is_boundary_role(role) || c.output_ports.is_empty() {
      continue;
    }
    if !bp.has_outgoing(&c.name) {
      out.push(ValidationError::error(
        ValidationErrorKind::MissingBinding,
        Some(&c.name),
        format!("'{}' ({}) has outputs but nothing consumes them", c.name, role),
      ));
    }
  }
}

#[instrument(level = "trace", skip(bp, out))]
fn check_reachability(bp: &Blueprint, out: &mut Vec<ValidationError>) {
  let mut reached: HashSet<&str> = HashSet::new();
  let mut queue: VecDeque<&str> = VecDeque::new();
  for c in &bp.components {
    if (is_entry_role(effective_role(c)) || c.input_ports.is_empty()) && reached.insert(&c.name) {
      queue.push_back(&c.name);
    }
  }
  while let Some(name) = queue.pop_front() {
    for b in bp.outgoing_bindings(name) {
      if bp.contains_component(&b.to_component) && reached.insert(&b.to_component) {
        queue.push_back(&b.to_component);
      }
    }
  }
  trace!(reached = reached.len(), total = bp.components.len(), "reachability");
  for c in &bp.components {
    if !c.standalone && !reached.contains(c.name.as_str()) {
      out.push(ValidationError::error(
        ValidationErrorKind::OrphanedComponent,
        Some(&c.name),
        format!("'{}' is not reachable from any entry point", c.name),
      ));
    }
  }
}

/// Exclusive resource a component claims through its config.
fn claimed_resource(c: &Component) -> Option<String> {
  if let Some(addr) = c.config_str("listen_address") {
    return Some(addr);
  }
  let port = c.config_str("port")?;
  let host = c.config_str("host").unwrap_or_else(|| DEFAULT_HOST.to_string());
  Some(format!("{}:{}", host, port))
}

#[instrument(level = "trace", skip(bp, out))]
fn check_resources(bp: &Blueprint, out: &mut Vec<ValidationError>) {
  let mut owners: HashMap<String, &str> = HashMap::new();
  for c in &bp.components {
    let Some(resource) = claimed_resource(c) else {
      continue;
    };
    match owners.get(&resource) {
      Some(first) => out.push(
        ValidationError::error(
          ValidationErrorKind::ResourceConflict,
          Some(&c.name),
          format!("'{}' claims {} already claimed by '{}'", c.name, resource, first),
        )
        .with_related(*first),
      ),
      None => {
        owners.insert(resource, &c.name);
      }
    }
  }
}

#[instrument(level = "trace", skip(bp, out))]
fn check_shape(bp: &Blueprint, mode: ValidationMode, out: &mut Vec<ValidationError>) {
  let make = |kind, msg: &str| match mode {
    ValidationMode::Strict => ValidationError::error(kind, None, msg),
    ValidationMode::Relaxed => ValidationError::warning(kind, None, msg),
  };
  let roles: Vec<_> = bp.components.iter().map(effective_role).collect();
  if !roles.iter().any(|r| is_entry_role(*r)) {
    out.push(make(
      ValidationErrorKind::MissingSource,
      "blueprint has no source or entry component",
    ));
  }
  if !roles.iter().any(|r| is_terminal_role(*r)) {
    out.push(make(
      ValidationErrorKind::MissingSink,
      "blueprint has no sink or store component",
    ));
  }
}

/// Checks usable before port derivation: names, policy, component resolution.
#[instrument(level = "trace", skip(bp))]
pub fn validate_structure(bp: &Blueprint) -> Vec<ValidationError> {
  let mut out = Vec::new();
  check_duplicate_names(bp, &mut out);
  check_policy(bp, &mut out);
  check_components_resolve(bp, &mut out);
  out
}

/// Runs every architectural check against a derived blueprint.
///
/// Only `Error`-severity entries make the blueprint invalid; `mode` decides
/// whether shape findings are errors or warnings.
#[instrument(level = "trace", skip(bp))]
pub fn validate(bp: &Blueprint, mode: ValidationMode) -> Vec<ValidationError> {
  let mut out = Vec::new();
  check_duplicate_names(bp, &mut out);
  check_policy(bp, &mut out);
  check_components_resolve(bp, &mut out);
  check_ports_resolve(bp, &mut out);
  check_connectivity(bp, &mut out);
  check_schemas(bp, &mut out);
  check_missing_bindings(bp, &mut out);
  check_reachability(bp, &mut out);
  check_resources(bp, &mut out);
  check_shape(bp, mode, &mut out);
  out
}
