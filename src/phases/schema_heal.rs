//! Schema healing: inserts adapters on bindings whose port schemas disagree.

use tracing::{debug, instrument};

use crate::adapter_registry::SchemaAdapterRegistry;
use crate::types::{ANY_SCHEMA, Binding, Blueprint, HealingKind, HealingOperation, Transformation};

/// Equal refs, or either side `any`.
pub fn schemas_compatible(producer: &str, consumer: &str) -> bool {
  producer == consumer || producer == ANY_SCHEMA || consumer == ANY_SCHEMA
}

/// Schema a binding delivers after its transformations run.
///
/// `Err` carries the index of the first transformation whose input does not
/// match what the previous step produced.
pub fn delivered_schema(binding: &Binding, producer_schema: &str) -> Result<String, usize> {
  let mut current = producer_schema.to_string();
  for (i, t) in binding.transformations.iter().enumerate() {
    if !schemas_compatible(&current, &t.from_schema) {
      return Err(i);
    }
    current = t.to_schema.clone();
  }
  Ok(current)
}

/// Producer and consumer schema refs, if both ends resolve to a port.
pub(crate) fn endpoint_schemas(bp: &Blueprint, b: &Binding) -> Option<(String, String)> {
  let producer = bp.component(&b.from_component)?.output_port(&b.from_port)?;
  let consumer = bp.component(&b.to_component)?.input_port(&b.to_port)?;
  Some((producer.schema_ref.clone(), consumer.schema_ref.clone()))
}

/// Appends a registered adapter to every binding that needs one.
///
/// Bindings that do not resolve, whose existing transformation chain is
/// broken, or for which no adapter is registered are left untouched.
#[instrument(level = "trace", skip(bp, registry))]
pub fn heal_schemas(bp: &mut Blueprint, registry: &dyn SchemaAdapterRegistry) -> Vec<HealingOperation> {
  let mut ops = Vec::new();
  for i in 0..bp.bindings.len() {
    let Some((producer, consumer)) = endpoint_schemas(bp, &bp.bindings[i]) else {
      continue;
    };
    let Ok(delivered) = delivered_schema(&bp.bindings[i], &producer) else {
      continue;
    };
    if schemas_compatible(&delivered, &consumer) {
      continue;
    }
    let binding = &mut bp.bindings[i];
    if binding.transformations.iter().any(|t| t.converts(&delivered, &consumer)) {
      continue;
    }
    let Some(id) = registry.lookup(&delivered, &consumer) else {
      debug!(binding = %binding, from = %delivered, to = %consumer, "no adapter registered");
      continue;
    };
    let t = Transformation::new(id, delivered, consumer);
    let op = HealingOperation::schema(
      HealingKind::AddedTransformation,
      format!(
        "added transformation {} ({} -> {}) on {}",
        t.id, t.from_schema, t.to_schema, binding
      ),
      vec![binding.from_component.clone(), binding.to_component.clone()],
    );
    binding.transformations.push(t);
    debug!(kind = %op.kind, description = %op.description, "schema heal");
    ops.push(op);
  }
  ops
}
