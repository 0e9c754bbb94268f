//! Risk report data contracts: the JSON bundle and CSV rows.
//!
//! The assessment section and the composite section stay separate; the two
//! risk scales are never merged into one number.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::RiskError;
use crate::types::{
  BusinessRiskMetrics, Effort, EscalationTier, Rating, RepositoryRiskScore, RiskAnalysis,
  RiskAssessment, RiskCategory, RiskLevel,
};

/// Supported risk report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
  Table,
  Json,
  Csv,
}

impl ReportFormat {
  pub fn parse(s: &str) -> Result<Self, RiskError> {
    match s {
      "table" => Ok(Self::Table),
      "json" => Ok(Self::Json),
      "csv" => Ok(Self::Csv),
      other => Err(RiskError::validation(
        "format",
        &format!("unsupported format: {}", other),
      )),
    }
  }
}

/// The full risk report bundle.
#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
  pub generated_at: DateTime<Utc>,
  pub risk_assessments: Vec<RiskAssessment>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub business_metrics: Option<BusinessRiskMetrics>,
  pub repository_risk_scores: Vec<RepositoryRiskScore>,
  pub risk_analysis: RiskAnalysis,
}

// ---------------------------------------------------------------------------
// CSV rows
// ---------------------------------------------------------------------------

pub const ASSESSMENT_CSV_HEADER: [&str; 12] = [
  "Repository",
  "Policy",
  "Setting",
  "Violation",
  "CVSS Score",
  "Risk Level",
  "Business Criticality",
  "Financial Impact",
  "Estimated Effort",
  "Priority",
  "Escalation Level",
  "Remediation",
];

pub fn assessment_csv_rows(assessments: &[RiskAssessment]) -> Vec<Vec<String>> {
  assessments
    .iter()
    .map(|a| {
      vec![
        a.repository.clone(),
        a.policy.clone(),
        a.setting.clone(),
        a.violation.clone(),
        format!("{:.1}", a.cvss_score),
        risk_level_label(a.risk_level).to_string(),
        rating_label(a.business_risk.business_criticality).to_string(),
        format!("{:.0}", a.business_risk.financial_impact),
        effort_label(a.remediation.estimated_effort).to_string(),
        a.priority.to_string(),
        tier_label(a.escalation.level).to_string(),
        a.remediation.recommendation.clone(),
      ]
    })
    .collect()
}

pub const COMPOSITE_CSV_HEADER: [&str; 7] = [
  "Repository",
  "Total Score",
  "Risk Level",
  "Security",
  "Compliance",
  "Exposure",
  "Operational",
];

pub fn composite_csv_rows(scores: &[RepositoryRiskScore]) -> Vec<Vec<String>> {
  scores
    .iter()
    .map(|s| {
      let factor = |category: RiskCategory| {
        s.risk_factors
          .iter()
          .find(|f| f.category == category)
          .map_or(0.0, |f| f.score)
      };
      vec![
        s.repository.clone(),
        format!("{:.1}", s.total_score),
        composite_label(s.risk_level).to_string(),
        format!("{:.1}", factor(RiskCategory::Security)),
        format!("{:.1}", factor(RiskCategory::Compliance)),
        format!("{:.1}", factor(RiskCategory::Exposure)),
        format!("{:.1}", factor(RiskCategory::Operational)),
      ]
    })
    .collect()
}

fn risk_level_label(level: RiskLevel) -> &'static str {
  match level {
    RiskLevel::None => "None",
    RiskLevel::Low => "Low",
    RiskLevel::Medium => "Medium",
    RiskLevel::High => "High",
    RiskLevel::Critical => "Critical",
  }
}

fn rating_label(rating: Rating) -> &'static str {
  match rating {
    Rating::None => "None",
    Rating::Low => "Low",
    Rating::Medium => "Medium",
    Rating::High => "High",
    Rating::Critical => "Critical",
  }
}

fn effort_label(effort: Effort) -> &'static str {
  match effort {
    Effort::Minimal => "Minimal",
    Effort::Low => "Low",
    Effort::Medium => "Medium",
    Effort::High => "High",
  }
}

fn tier_label(tier: EscalationTier) -> &'static str {
  match tier {
    EscalationTier::None => "None",
    EscalationTier::Management => "Management",
    EscalationTier::Executive => "Executive",
  }
}

fn composite_label(level: crate::types::CompositeRiskLevel) -> &'static str {
  match level {
    crate::types::CompositeRiskLevel::Low => "low",
    crate::types::CompositeRiskLevel::Medium => "medium",
    crate::types::CompositeRiskLevel::High => "high",
    crate::types::CompositeRiskLevel::Critical => "critical",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assess;
  use crate::types::{Severity, Violation};

  #[test]
  fn unsupported_format_fails_fast() {
    assert!(ReportFormat::parse("json").is_ok());
    let err = ReportFormat::parse("sarif").unwrap_err();
    assert!(matches!(err, RiskError::Validation { .. }));
  }

  #[test]
  fn assessment_rows_format_scores_to_one_decimal() {
    let assessments = assess::assess(
      &[Violation {
        repository: "api-service".to_string(),
        policy: "Branch Protection".to_string(),
        setting: "branch_protection.main.enforce_admins".to_string(),
        expected: "true".to_string(),
        actual: "false".to_string(),
        severity: Severity::Critical,
        description: "unprotected".to_string(),
        remediation: "protect it".to_string(),
      }],
      "2025-03-01T12:00:00Z".parse().unwrap(),
    );
    let rows = assessment_csv_rows(&assessments);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), ASSESSMENT_CSV_HEADER.len());
    assert_eq!(rows[0][0], "api-service");
    // One decimal place, no more.
    assert!(rows[0][4].split('.').nth(1).unwrap().len() == 1);
    assert_eq!(rows[0][6], "Critical");
    assert_eq!(rows[0][7], "100000");
  }
}
