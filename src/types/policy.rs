//! Resilience policy block (retry, circuit breaker, backoff).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backoff strategy between retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
  Fixed,
  Linear,
  Exponential,
}

/// Retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub backoff: BackoffStrategy,
  pub initial_delay_ms: u64,
  pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      backoff: BackoffStrategy::Exponential,
      initial_delay_ms: 100,
      max_delay_ms: 5_000,
    }
  }
}

/// Circuit breaker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerPolicy {
  pub failure_threshold: u32,
  pub recovery_timeout_ms: u64,
  pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerPolicy {
  fn default() -> Self {
    Self {
      failure_threshold: 5,
      recovery_timeout_ms: 30_000,
      half_open_max_calls: 1,
    }
  }
}

/// Resilience policy applied to every generated component.
///
/// Fields missing from an authored policy take their canonical defaults;
/// unknown keys are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
  pub retry: RetryPolicy,
  pub circuit_breaker: CircuitBreakerPolicy,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl Policy {
  /// The canonical policy injected by the structural healer.
  pub fn canonical() -> Self {
    Self {
      timeout_ms: Some(30_000),
      ..Self::default()
    }
  }
}
