//! Binding normalizer: canonicalizes the accepted binding syntaxes.
//!
//! Accepted surface forms, resolved independently for the `from` and `to` side:
//!
//! - dotted endpoint strings: `from: "a.out"`, `to: "b.in"`
//! - split fields: `from_component`/`from_port`, `to_component`/`to_port`
//! - a bare component name plus a port field: `from: "a"`, `from_port: "out"`
//! - plural fan-out: `to_components: ["b", "c"]` with a shared `to_port`, or a
//!   list of dotted strings / `{component, port}` maps under `to_components` or `to`
//! - a legacy arrow string as the whole entry: `"a.out -> b.in"`
//!
//! Ports are never invented: an endpoint without a port is rejected.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::types::{Binding, Transformation, ValidationError, ValidationErrorKind};

static ENDPOINT_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^([A-Za-z_][A-Za-z0-9_\-]*)\.([A-Za-z_][A-Za-z0-9_\-]*)$").expect("endpoint regex")
});

static NAME_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").expect("name regex"));

static ARROW_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^\s*(\S+)\s*->\s*(\S+)\s*$").expect("arrow regex"));

/// A resolved `component.port` pair.
type Endpoint = (String, String);

fn endpoint_error(component: Option<&str>, message: impl Into<String>) -> ValidationError {
  ValidationError::error(ValidationErrorKind::InvalidEndpointSpec, component, message)
}

/// Splits `"component.port"`.
#[instrument(level = "trace")]
pub fn parse_endpoint(spec: &str) -> Result<Endpoint, ValidationError> {
  let spec = spec.trim();
  ENDPOINT_RE
    .captures(spec)
    .map(|c| (c[1].to_string(), c[2].to_string()))
    .ok_or_else(|| {
      endpoint_error(
        None,
        format!("endpoint '{}' is not of the form component.port", spec),
      )
    })
}

fn is_name(s: &str) -> bool {
  NAME_RE.is_match(s)
}

fn str_field<'a>(m: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>, ValidationError> {
  match m.get(key) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) => Ok(Some(s.trim())),
    Some(_) => Err(endpoint_error(None, format!("binding field '{}' must be a string", key))),
  }
}

/// Resolves a bare name or dotted string, using `port` when the string has no port.
#[instrument(level = "trace")]
fn resolve_name_or_dotted(spec: &str, port: Option<&str>, side: &str) -> Result<Endpoint, ValidationError> {
  if spec.contains('.') {
    return parse_endpoint(spec);
  }
  if !is_name(spec) {
    return Err(endpoint_error(
      None,
      format!("{} endpoint '{}' is not a valid component name", side, spec),
    ));
  }
  match port {
    Some(p) if is_name(p) => Ok((spec.to_string(), p.to_string())),
    Some(p) => Err(endpoint_error(
      Some(spec),
      format!("{} port '{}' is not a valid port name", side, p),
    )),
    None => Err(endpoint_error(
      Some(spec),
      format!("{} endpoint '{}' names no port", side, spec),
    )),
  }
}

/// Resolves one side from `side`, `side_component` and `side_port`.
#[instrument(level = "trace", skip(m))]
fn resolve_side(m: &Map<String, Value>, side: &str) -> Result<Endpoint, ValidationError> {
  let combined = str_field(m, side)?;
  let component = str_field(m, &format!("{}_component", side))?;
  let port = str_field(m, &format!("{}_port", side))?;
  match (combined, component) {
    (Some(spec), _) => resolve_name_or_dotted(spec, port, side),
    (None, Some(c)) => resolve_name_or_dotted(c, port, side),
    (None, None) => Err(endpoint_error(
      None,
      format!("binding has no '{}' endpoint", side),
    )),
  }
}

/// Resolves one fan-out target entry.
#[instrument(level = "trace", skip(entry))]
fn resolve_target(entry: &Value, shared_port: Option<&str>) -> Result<Endpoint, ValidationError> {
  match entry {
    Value::String(s) => resolve_name_or_dotted(s.trim(), shared_port, "to"),
    Value::Object(t) => {
      let component = match str_field(t, "component")? {
        Some(c) => Some(c),
        None => str_field(t, "to_component")?,
      };
      let port = match str_field(t, "port")? {
        Some(p) => Some(p),
        None => str_field(t, "to_port")?.or(shared_port),
      };
      let component =
        component.ok_or_else(|| endpoint_error(None, "fan-out target has no component"))?;
      resolve_name_or_dotted(component, port, "to")
    }
    _ => Err(endpoint_error(
      None,
      "fan-out target must be a string or a {component, port} map",
    )),
  }
}

/// Resolves all targets of a binding entry (one for singular forms, several for fan-out).
#[instrument(level = "trace", skip(m))]
fn resolve_targets(m: &Map<String, Value>) -> Result<Vec<Endpoint>, ValidationError> {
  let shared_port = str_field(m, "to_port")?;
  let list = match (m.get("to_components"), m.get("to")) {
    (Some(Value::Array(a)), _) => Some(a),
    (Some(Value::Null) | None, Some(Value::Array(a))) => Some(a),
    (Some(Value::Null) | None, _) => None,
    (Some(_), _) => {
      return Err(endpoint_error(None, "'to_components' must be a list"));
    }
  };
  match list {
    Some(entries) if entries.is_empty() => {
      Err(endpoint_error(None, "binding fan-out list is empty"))
    }
    Some(entries) => entries
      .iter()
      .map(|e| resolve_target(e, shared_port))
      .collect(),
    None => resolve_side(m, "to").map(|e| vec![e]),
  }
}

#[instrument(level = "trace", skip(m))]
fn parse_transformations(m: &Map<String, Value>) -> Result<Vec<Transformation>, ValidationError> {
  match m.get("transformations") {
    None | Some(Value::Null) => Ok(Vec::new()),
    Some(v) => serde_json::from_value(v.clone()).map_err(|e| {
      endpoint_error(
        None,
        format!("binding transformations are malformed: {}", e),
      )
    }),
  }
}

#[instrument(level = "trace")]
fn from_arrow(s: &str) -> Result<Vec<Binding>, ValidationError> {
  let caps = ARROW_RE.captures(s).ok_or_else(|| {
    endpoint_error(
      None,
      format!("binding '{}' is not of the form a.out -> b.in", s.trim()),
    )
  })?;
  let (fc, fp) = parse_endpoint(&caps[1])?;
  let (tc, tp) = parse_endpoint(&caps[2])?;
  Ok(vec![Binding::new(fc, fp, tc, tp)])
}

/// Normalizes one raw binding entry into one or more fully split bindings.
///
/// Fan-out entries yield one binding per target, each carrying the same
/// source endpoint and transformations.
#[instrument(level = "trace", skip(raw))]
pub fn normalize_binding(raw: &Value) -> Result<Vec<Binding>, ValidationError> {
  let m = match raw {
    Value::String(s) => return from_arrow(s),
    Value::Object(m) => m,
    _ => {
      return Err(endpoint_error(
        None,
        "binding entry must be a map or an 'a.out -> b.in' string",
      ));
    }
  };

  let (from_component, from_port) = resolve_side(m, "from")?;
  let targets = resolve_targets(m).map_err(|mut e| {
    if e.component_ref.is_none() {
      e.component_ref = Some(from_component.clone());
    }
    e
  })?;
  let transformations = parse_transformations(m)?;

  Ok(
    targets
      .into_iter()
      .map(|(to_component, to_port)| Binding {
        from_component: from_component.clone(),
        from_port: from_port.clone(),
        to_component,
        to_port,
        transformations: transformations.clone(),
      })
      .collect(),
  )
}

/// Normalizes a whole binding list, collecting every failure instead of stopping at the first.
#[instrument(level = "trace", skip(raw), fields(count = raw.len()))]
pub fn normalize_bindings(raw: &[Value]) -> (Vec<Binding>, Vec<ValidationError>) {
  let mut bindings = Vec::new();
  let mut errors = Vec::new();
  for (i, entry) in raw.iter().enumerate() {
    match normalize_binding(entry) {
      Ok(mut bs) => bindings.append(&mut bs),
      Err(mut e) => {
        e.message = format!("binding #{}: {}", i, e.message);
        errors.push(e);
      }
    }
  }
  (bindings, errors)
}
