//! Risk scoring engine for repository policy violations — rule-based and
//! deterministic; no AI, no DB, no network.
//!
//! Two independent scorers run over the same violation list:
//! - CVSS 3.1-style per-violation assessments (0-10 scale) with business
//!   risk, remediation guidance, timeline, priority and escalation routing.
//! - A weighted per-repository composite score (0-100 scale) with
//!   recommendations and an org-level rollup.
//!
//! Used by the binary for stdin/stdout; can also be called as a library.

pub mod assess;
pub mod business;
pub mod composite;
pub mod cvss;
pub mod error;
pub mod escalate;
pub mod report;
pub mod types;

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub use error::RiskError;
pub use report::RiskReport;
pub use types::{RepositoryInfo, RiskAssessment, Violation};

/// One JSON object from the caller: the compliance engine's violations and
/// repositories arrays plus report options.
#[derive(Debug, Deserialize)]
pub struct Input {
  #[serde(default)]
  pub violations: Vec<Violation>,
  #[serde(default)]
  pub repositories: Vec<RepositoryInfo>,
  /// Org compliance percentage from the audit summary; feeds the rollup.
  #[serde(default)]
  pub compliance_percentage: Option<f64>,
  #[serde(default)]
  pub assessed_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub include_metrics: bool,
  #[serde(default)]
  pub threshold: Option<String>,
  #[serde(default)]
  pub sort_by: Option<String>,
  #[serde(default)]
  pub format: Option<String>,
}

/// Run both scorers on parsed input and return the report (no I/O).
///
/// `assessed_at` is injected so output is reproducible; binaries default it
/// to the wall clock at the I/O boundary.
pub fn run(input: &Input, assessed_at: DateTime<Utc>) -> Result<RiskReport, RiskError> {
  // Validate report options before any scoring.
  report::ReportFormat::parse(input.format.as_deref().unwrap_or("json"))?;
  let threshold = assess::RiskThreshold::parse(input.threshold.as_deref().unwrap_or("all"))?;
  let sort_key = assess::SortKey::parse(input.sort_by.as_deref().unwrap_or("score"))?;

  let all = assess::assess(&input.violations, assessed_at);

  // Metrics cover the full list, not the filtered view.
  let business_metrics = input.include_metrics.then(|| assess::business_metrics(&all));

  let mut risk_assessments = assess::filter_by_threshold(all, threshold);
  assess::sort_assessments(&mut risk_assessments, sort_key);

  let repository_risk_scores = composite::score_repositories(&input.repositories, &input.violations);
  let risk_analysis = composite::analyze(
    &repository_risk_scores,
    input.compliance_percentage.unwrap_or(100.0),
  );

  Ok(RiskReport {
    generated_at: assessed_at,
    risk_assessments,
    business_metrics,
    repository_risk_scores,
    risk_analysis,
  })
}
