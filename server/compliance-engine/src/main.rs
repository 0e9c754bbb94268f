//! Binary entrypoint: read one JSON audit request from stdin, write one JSON
//! report to stdout.
//!
//! The request carries the policy document, the pre-fetched repository
//! snapshots, an optional repository filter, an optional `generated_at`
//! timestamp (defaults to now) and an optional output format. Logs go to
//! stderr so stdout stays pure JSON.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::{self, Read, Write};

use compliance_engine::report;
use compliance_engine::types::ErrorOutput;
use compliance_engine::{
  run_audit, EngineError, PolicyDocument, ReportFormat, RepositoryFilter, RepositorySnapshot,
  StaticSource,
};

#[derive(Debug, Deserialize)]
struct AuditRequest {
  policy: PolicyDocument,
  #[serde(default)]
  repositories: Vec<RepositorySnapshot>,
  #[serde(default)]
  filter: RepositoryFilter,
  #[serde(default)]
  generated_at: Option<DateTime<Utc>>,
  #[serde(default)]
  format: Option<String>,
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  if let Err(e) = run_binary() {
    let err = match &e {
      EngineError::Schema { field, .. } | EngineError::Validation { field, .. } => {
        ErrorOutput::new(e.to_string()).with_field(field.clone())
      }
      _ => ErrorOutput::new(e.to_string()),
    };
    let _ = serde_json::to_writer(io::stdout(), &err);
    let _ = writeln!(io::stdout());
    std::process::exit(1);
  }
}

fn run_binary() -> Result<(), EngineError> {
  let mut raw = String::new();
  io::stdin()
    .lock()
    .read_to_string(&mut raw)
    .map_err(|e| EngineError::parse(format!("stdin: {}", e)))?;
  let request: AuditRequest = serde_json::from_str(&raw)?;

  // Fail fast on an unsupported format before any computation.
  let format = ReportFormat::parse(request.format.as_deref().unwrap_or("json"))?;

  let generated_at = request.generated_at.unwrap_or_else(Utc::now);
  let source = StaticSource::new(request.repositories);
  let data = run_audit(&source, &request.policy, &request.filter, generated_at)?;

  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());
  match format {
    // Table rendering is a consumer concern; the bundle is the contract.
    ReportFormat::Json | ReportFormat::Table => serde_json::to_writer(&mut out, &data)?,
    ReportFormat::Csv => serde_json::to_writer(&mut out, &report::to_csv(&data))?,
    ReportFormat::Sarif => serde_json::to_writer(&mut out, &report::to_sarif(&data))?,
    ReportFormat::Junit => serde_json::to_writer(&mut out, &report::to_junit(&data))?,
  }
  let _ = writeln!(out);
  let _ = out.flush();
  Ok(())
}
