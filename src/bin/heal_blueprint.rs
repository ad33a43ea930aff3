//! CLI: validate and heal a blueprint document.
//!
//! Reads a YAML or JSON blueprint, runs the healing compiler and prints the
//! healed document (same format as the input unless `--format` says otherwise)
//! or the failure diagnostic.
//!
//! Usage: `heal_blueprint [OPTIONS] <path-to-blueprint>`
//!
//! Exit codes: 0 valid, 1 unreadable input or I/O error, 2 blueprint could not be healed.
//!
//! Set RUST_LOG=blueprint_healer=trace for TRACE-level span enter/exit and events.

use std::env;
use std::path::PathBuf;
use std::process;

use blueprint_healer::blueprint_io::{load_document, render_outcome, save_document};
use blueprint_healer::{CompileOutcome, Compiler, DocumentFormat, ValidationMode, parse_blueprint};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Validate and heal a blueprint document.
#[derive(Parser, Debug)]
#[command(name = "heal_blueprint")]
#[command(
  after_help = r#"Environment variables (override --mode and --max-attempts when set):
  BLUEPRINT_MODE          strict or relaxed
  BLUEPRINT_MAX_ATTEMPTS  Upper bound on healing attempts

Examples:
  heal_blueprint pipeline.yaml
  heal_blueprint --mode strict --output healed.json --format json pipeline.yaml"#
)]
struct Args {
  /// Validation mode: strict or relaxed. Overridden by BLUEPRINT_MODE if set.
  #[arg(long, value_name = "MODE", default_value_t = ValidationMode::Relaxed)]
  mode: ValidationMode,

  /// Maximum healing attempts. Overridden by BLUEPRINT_MAX_ATTEMPTS if set.
  #[arg(long, value_name = "N", default_value_t = blueprint_healer::DEFAULT_MAX_ATTEMPTS)]
  max_attempts: u32,

  /// Write the result here instead of stdout.
  #[arg(long, short, value_name = "FILE")]
  output: Option<PathBuf>,

  /// Output format (yaml or json). Defaults to the input's format.
  #[arg(long, value_name = "FORMAT")]
  format: Option<DocumentFormat>,

  /// Path to the blueprint document
  #[arg(value_name = "path-to-blueprint")]
  path: PathBuf,
}

fn fail(msg: impl std::fmt::Display) -> ! {
  eprintln!("{}", msg);
  process::exit(1);
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  // Env vars override flags.
  let mode = match env::var("BLUEPRINT_MODE") {
    Ok(v) => v
      .parse::<ValidationMode>()
      .unwrap_or_else(|e| fail(format!("Invalid BLUEPRINT_MODE: {}", e))),
    Err(_) => args.mode,
  };
  let max_attempts = match env::var("BLUEPRINT_MAX_ATTEMPTS") {
    Ok(v) => v
      .trim()
      .parse::<u32>()
      .unwrap_or_else(|e| fail(format!("Invalid BLUEPRINT_MAX_ATTEMPTS '{}': {}", v, e))),
    Err(_) => args.max_attempts,
  };
  info!(%mode, max_attempts, path = %args.path.display(), "options (env or flags)");

  let raw = load_document(&args.path).unwrap_or_else(|e| fail(format!("Error reading blueprint: {}", e)));
  let parsed = parse_blueprint(&raw).unwrap_or_else(|e| fail(format!("Error parsing blueprint: {}", e)));
  let format = args.format.unwrap_or(parsed.format);

  let outcome = Compiler::new()
    .with_mode(mode)
    .with_max_attempts(max_attempts)
    .compile_blueprint(parsed.blueprint, parsed.binding_errors);

  let text = render_outcome(&outcome, format).unwrap_or_else(|e| fail(format!("Error rendering result: {}", e)));
  match &args.output {
    Some(path) => {
      save_document(path, &text).unwrap_or_else(|e| fail(format!("Error writing output: {}", e)));
    }
    None => print!("{}", text),
  }

  match outcome {
    CompileOutcome::Valid(h) => {
      info!(attempts = h.attempts, operations = h.history.len(), "blueprint valid");
      for w in &h.warnings {
        eprintln!("{}", w);
      }
    }
    CompileOutcome::Failed(d) => {
      warn!(attempts = d.attempts_made, stagnation = d.stagnation_detected, "blueprint invalid");
      for e in d.errors.iter().filter(|e| e.is_error()) {
        eprintln!("{}", e);
      }
      process::exit(2);
    }
  }
}
