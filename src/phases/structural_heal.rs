//! Structural healing: version, policy, terminals and adjacent bindings.
//!
//! Rules run in a fixed order and each one is idempotent, so healing an
//! already-healed blueprint yields no operations.

use std::collections::BTreeSet;

use tracing::{debug, instrument};

use crate::connectivity::{
  effective_role, is_boundary_role, is_entry_role, is_terminal_role, may_connect,
};
use crate::types::{
  Binding, Blueprint, CANONICAL_SCHEMA_VERSION, Component, ComponentType, DEFAULT_INPUT_PORT,
  HealingKind, HealingOperation, Policy, Port,
};

/// Names of components that resolving bindings point at.
fn bound_component_names(bp: &Blueprint) -> BTreeSet<String> {
  bp.bindings
    .iter()
    .flat_map(|b| [&b.from_component, &b.to_component])
    .filter(|name| bp.contains_component(name))
    .cloned()
    .collect()
}

/// Rule 0: drops synthesized components nothing references any more.
#[instrument(level = "trace", skip(bp, ops))]
fn remove_subsumed_terminals(bp: &mut Blueprint, ops: &mut Vec<HealingOperation>) {
  let stale: Vec<String> = bp
    .components
    .iter()
    .filter(|c| c.synthesized && !bp.bindings.iter().any(|b| b.touches(&c.name)))
    .map(|c| c.name.clone())
    .collect();
  for name in stale {
    if bp.remove_component(&name).is_some() {
      ops.push(HealingOperation::structural(
        HealingKind::RemovedComponent,
        format!("removed unreferenced synthesized component '{}'", name),
        vec![name],
      ));
    }
  }
}

/// Rule 1.
fn set_schema_version(bp: &mut Blueprint, ops: &mut Vec<HealingOperation>) {
  let missing = bp
    .schema_version
    .as_deref()
    .is_none_or(|v| v.trim().is_empty());
  if missing {
    bp.schema_version = Some(CANONICAL_SCHEMA_VERSION.to_string());
    ops.push(HealingOperation::structural(
      HealingKind::SetSchemaVersion,
      format!("set schema_version to {}", CANONICAL_SCHEMA_VERSION),
      vec![],
    ));
  }
}

/// Rule 2.
fn inject_policy(bp: &mut Blueprint, ops: &mut Vec<HealingOperation>) {
  if bp.policy.is_none() {
    bp.policy = Some(Policy::canonical());
    ops.push(HealingOperation::structural(
      HealingKind::InjectedPolicy,
      "injected default policy",
      vec![],
    ));
  }
}

/// Adjacent declared pairs that could be bound, as component indices.
fn viable_adjacent_pairs(bp: &Blueprint) -> Vec<(usize, usize)> {
  bp.components
    .windows(2)
    .enumerate()
    .filter(|(_, pair)| {
      let (a, b) = (&pair[0], &pair[1]);
      a.name != b.name
        && !bp.has_outgoing(&a.name)
        && !bp.has_incoming(&b.name)
        && may_connect(effective_role(a), effective_role(b))
    })
    .map(|(i, _)| (i, i + 1))
    .collect()
}

/// True if `name` feeds some component the healer did not synthesize.
fn feeds_declared_component(bp: &Blueprint, name: &str) -> bool {
  bp.outgoing_bindings(name)
    .any(|b| bp.component(&b.to_component).is_none_or(|c| !c.synthesized))
}

/// Adjacent declared pairs rule 4 will bind, as component indices.
///
/// A pair is skipped when another unconnected entry component could equally
/// feed the consumer. Components that already take part in a viable pair are
/// never counted as rivals, and a rival stays one after rule 3 gives it a sink.
#[instrument(level = "trace", skip(bp))]
fn plan_adjacent_bindings(bp: &Blueprint) -> Vec<(usize, usize)> {
  let viable = viable_adjacent_pairs(bp);
  let paired: BTreeSet<usize> = viable.iter().flat_map(|&(i, j)| [i, j]).collect();
  let free_entries: Vec<usize> = bp
    .components
    .iter()
    .enumerate()
    .filter(|(i, c)| {
      !paired.contains(i)
        && !c.synthesized
        && is_entry_role(effective_role(c))
        && !feeds_declared_component(bp, &c.name)
        && !bp.has_incoming(&c.name)
    })
    .map(|(i, _)| i)
    .collect();

  viable
    .into_iter()
    .filter(|&(i, j)| {
      let consumer = effective_role(&bp.components[j]);
      let rival = free_entries.iter().find(|&&k| {
        k != i && k != j && may_connect(effective_role(&bp.components[k]), consumer)
      });
      match rival {
        Some(&k) => {
          debug!(
            consumer = %bp.components[j].name,
            producer = %bp.components[i].name,
            rival = %bp.components[k].name,
            "ambiguous adjacent binding skipped"
          );
          false
        }
        None => true,
      }
    })
    .collect()
}

fn needs_terminal(bp: &Blueprint, c: &Component) -> bool {
  let role = effective_role(c);
  !c.synthesized
    && !is_terminal_role(role)
    && !is_boundary_role(role)
    && !bp.has_outgoing(&c.name)
}

/// Rule 3: gives every dangling producer its own synthesized sink.
#[instrument(level = "trace", skip(bp, planned, ops))]
fn attach_terminals(bp: &mut Blueprint, planned: &BTreeSet<String>, ops: &mut Vec<HealingOperation>) {
  let dangling: Vec<(String, String)> = bp
    .components
    .iter()
    .filter(|c| !planned.contains(&c.name) && needs_terminal(bp, c))
    .map(|c| (c.name.clone(), c.primary_output().to_string()))
    .collect();
  for (producer, port) in dangling {
    let sink_name = bp.unique_component_name(&format!("{}_sink", producer));
    let mut sink =
      Component::new(sink_name.clone(), ComponentType::Sink).with_input(Port::new(DEFAULT_INPUT_PORT));
    sink.synthesized = true;
    bp.components.push(sink);
    bp.bindings
      .push(Binding::new(&producer, &port, &sink_name, DEFAULT_INPUT_PORT));
    ops.push(HealingOperation::structural(
      HealingKind::AddedTerminalComponent,
      format!(
        "added terminal sink '{}' for '{}' ({}.{} -> {}.{})",
        sink_name, producer, producer, port, sink_name, DEFAULT_INPUT_PORT
      ),
      vec![producer, sink_name],
    ));
  }
}

/// Rule 4: binds the planned adjacent pairs.
#[instrument(level = "trace", skip(bp, ops))]
fn bind_adjacent(bp: &mut Blueprint, plan: &[(usize, usize)], ops: &mut Vec<HealingOperation>) {
  for &(i, j) in plan {
    let (a, b) = (&bp.components[i], &bp.components[j]);
    let binding = Binding::new(&a.name, a.primary_output(), &b.name, b.primary_input());
    if bp.has_binding(&binding) {
      continue;
    }
    let op = HealingOperation::structural(
      HealingKind::GeneratedBinding,
      format!("generated binding {}", binding),
      vec![a.name.clone(), b.name.clone()],
    );
    bp.bindings.push(binding);
    ops.push(op);
  }
}

/// Applies every structural rule to `bp` in place and returns what was done.
///
/// Never fails; defects no rule can repair are left for the validator.
///
/// # Panics
///
/// If a rule removes a component that a binding resolved to before the heal.
#[instrument(level = "trace", skip(bp))]
pub fn heal_structure(bp: &mut Blueprint) -> Vec<HealingOperation> {
  let bound_before = bound_component_names(bp);
  let mut ops = Vec::new();

  remove_subsumed_terminals(bp, &mut ops);
  set_schema_version(bp, &mut ops);
  inject_policy(bp, &mut ops);

  let plan = plan_adjacent_bindings(bp);
  let planned: BTreeSet<String> = plan
    .iter()
    .map(|&(i, _)| bp.components[i].name.clone())
    .collect();
  attach_terminals(bp, &planned, &mut ops);
  bind_adjacent(bp, &plan, &mut ops);

  for name in &bound_before {
    assert!(
      bp.contains_component(name),
      "structural heal removed bound component '{}'",
      name
    );
  }
  for op in &ops {
    debug!(kind = %op.kind, description = %op.description, "structural heal");
  }
  ops
}
