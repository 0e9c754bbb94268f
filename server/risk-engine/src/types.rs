//! Core types for the risk engine (JSON contracts + scoring models).
//!
//! Inbound types deserialize straight from the compliance engine's audit
//! bundle (`violations` and `repositories` arrays); unknown fields are
//! ignored so the two engines stay decoupled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what the caller sends)
// ---------------------------------------------------------------------------

/// One policy violation to score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
  pub repository: String,
  pub policy: String,
  #[serde(default)]
  pub setting: String,
  #[serde(default)]
  pub expected: String,
  #[serde(default)]
  pub actual: String,
  pub severity: Severity,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub remediation: String,
}

/// Per-repository audit row, as the compliance engine reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
  pub name: String,
  #[serde(default = "private_label")]
  pub visibility: String,
  #[serde(default)]
  pub violation_count: usize,
  #[serde(default)]
  pub critical_count: usize,
}

fn private_label() -> String {
  "private".to_string()
}

/// Violation severity, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Low,
  Medium,
  High,
  Critical,
}

// ---------------------------------------------------------------------------
// CVSS vector metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackVector {
  Network,
  Adjacent,
  Local,
  Physical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackComplexity {
  Low,
  High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivilegesRequired {
  None,
  Low,
  High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserInteraction {
  None,
  Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
  Unchanged,
  Changed,
}

/// Confidentiality/integrity/availability metric. `Medium` is not a CVSS 3.1
/// impact value and carries no weight in scoring; it exists because the
/// access-control keyword rule assigns it before severity overrides land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpactMetric {
  None,
  Low,
  Medium,
  High,
}

/// CVSS scoring components plus the derived scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvssVector {
  pub attack_vector: AttackVector,
  pub attack_complexity: AttackComplexity,
  pub privileges_required: PrivilegesRequired,
  pub user_interaction: UserInteraction,
  pub scope: Scope,
  pub confidentiality: ImpactMetric,
  pub integrity: ImpactMetric,
  pub availability: ImpactMetric,
  pub base_score: f64,
  pub temporal_score: f64,
  pub environmental_score: f64,
}

/// Risk level on the CVSS 0-10 scale. Distinct from `CompositeRiskLevel`;
/// the two scales are reported side by side and never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
  None,
  Low,
  Medium,
  High,
  Critical,
}

// ---------------------------------------------------------------------------
// Business risk and impact
// ---------------------------------------------------------------------------

/// Qualitative rating used across business-risk and impact fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
  None,
  Low,
  Medium,
  High,
  Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSensitivity {
  Public,
  Internal,
  Confidential,
  Restricted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRiskFactor {
  pub data_sensitivity: DataSensitivity,
  pub business_criticality: Rating,
  pub compliance_impact: Rating,
  pub reputation_risk: Rating,
  /// Estimated cost in currency units; fixed tier per severity.
  pub financial_impact: f64,
  pub customer_impact: Rating,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactAssessment {
  pub security_impact: Rating,
  pub compliance_impact: Rating,
  pub operational_impact: Rating,
  pub affected_systems: Vec<String>,
  pub exposure_level: Rating,
  pub likelihood_exploit: Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effort {
  Minimal,
  Low,
  Medium,
  High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationGuidance {
  pub recommendation: String,
  pub steps: Vec<String>,
  pub estimated_effort: Effort,
  pub required_skills: Vec<String>,
  pub dependencies: Vec<String>,
  pub risk_reduction: f64,
  pub cost: f64,
  pub timeline_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskTimeline {
  pub first_detected: DateTime<Utc>,
  pub last_assessed: DateTime<Utc>,
  pub exposure_duration: String,
  pub time_to_fix: String,
  pub sla_deadline: String,
  pub days_overdue: i64,
}

// ---------------------------------------------------------------------------
// Escalation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscalationTier {
  None,
  Management,
  Executive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escalation {
  pub level: EscalationTier,
  pub required_by: DateTime<Utc>,
  pub notifications_sent: u32,
  pub stakeholders: Vec<String>,
  pub escalation_reason: String,
}

// ---------------------------------------------------------------------------
// Assessment (output — one per violation, immutable once computed)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
  pub id: String,
  pub repository: String,
  pub policy: String,
  pub setting: String,
  pub violation: String,
  pub cvss_score: f64,
  pub risk_level: RiskLevel,
  pub business_risk: BusinessRiskFactor,
  pub cvss_vector: CvssVector,
  pub impact: ImpactAssessment,
  pub remediation: RemediationGuidance,
  pub timeline: RiskTimeline,
  pub priority: u8,
  pub escalation: Escalation,
}

// ---------------------------------------------------------------------------
// Organization-wide business metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTrend {
  Increasing,
  Decreasing,
  Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRiskMetrics {
  pub total_risk_score: f64,
  pub average_risk_score: f64,
  pub risk_distribution: BTreeMap<String, usize>,
  pub business_impact_score: f64,
  pub compliance_risk_score: f64,
  pub security_risk_score: f64,
  pub estimated_cost: f64,
  pub risk_trend: RiskTrend,
  pub critical_risk_count: usize,
  pub top_risk_categories: Vec<RiskCategoryRank>,
  pub escalation_required: bool,
  pub compliance_violations: Vec<StandardViolation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskCategoryRank {
  pub category: String,
  pub risk_score: f64,
  pub violation_count: usize,
  pub average_score: f64,
}

/// Rollup against a compliance standard (SOC 2, ISO 27001, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardViolation {
  pub standard: String,
  pub requirement: String,
  pub violation_count: usize,
  pub risk_score: f64,
  pub severity: RiskLevel,
}

// ---------------------------------------------------------------------------
// Composite repository score (independent of the CVSS scale)
// ---------------------------------------------------------------------------

/// Risk level on the composite 0-100 scale. Lowercase on the wire, unlike
/// the CVSS-scale `RiskLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeRiskLevel {
  Low,
  Medium,
  High,
  Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
  Security,
  Compliance,
  Exposure,
  Operational,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
  pub category: RiskCategory,
  pub name: String,
  /// Weighted contribution to the total (sub-score x weight).
  pub score: f64,
  pub weight: f64,
  pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryRiskScore {
  pub repository: String,
  /// 0-100; 100 is the highest risk.
  pub total_score: f64,
  pub risk_level: CompositeRiskLevel,
  pub risk_factors: Vec<RiskFactor>,
  pub recommendations: Vec<String>,
}

/// Org-level rollup of the composite scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAnalysis {
  pub overall_risk_level: CompositeRiskLevel,
  pub high_risk_repos: usize,
  pub critical_risk_repos: usize,
  pub risk_distribution: BTreeMap<String, usize>,
  pub top_risks: Vec<RepositoryRiskScore>,
  pub risk_trend: RiskTrend,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for invalid input.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }
}
