//! Per-violation assessment assembly and organization-wide business metrics.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::business;
use crate::cvss;
use crate::error::RiskError;
use crate::escalate;
use crate::types::{
  BusinessRiskMetrics, EscalationTier, Rating, RiskAssessment, RiskCategoryRank, RiskLevel,
  RiskTrend, StandardViolation, Violation,
};

/// Score every violation. IDs are `risk-N` by input order; the caller may
/// re-sort the list afterwards without breaking them.
pub fn assess(violations: &[Violation], assessed_at: DateTime<Utc>) -> Vec<RiskAssessment> {
  violations
    .iter()
    .enumerate()
    .map(|(i, v)| assess_one(v, i + 1, assessed_at))
    .collect()
}

fn assess_one(violation: &Violation, n: usize, assessed_at: DateTime<Utc>) -> RiskAssessment {
  let cvss_vector = cvss::score_vector(violation);
  let cvss_score = cvss_vector.base_score;
  let business_risk = business::business_risk(violation);

  RiskAssessment {
    id: format!("risk-{}", n),
    repository: violation.repository.clone(),
    policy: violation.policy.clone(),
    setting: violation.setting.clone(),
    violation: violation.description.clone(),
    cvss_score,
    risk_level: cvss::risk_level(cvss_score),
    impact: business::assess_impact(violation, cvss_score),
    remediation: business::remediation_guidance(violation, cvss_score),
    timeline: business::risk_timeline(violation, assessed_at),
    priority: escalate::priority(cvss_score, &business_risk),
    escalation: escalate::escalation(cvss_score, &business_risk, assessed_at),
    business_risk,
    cvss_vector,
  }
}

// ---------------------------------------------------------------------------
// Threshold filtering and sorting for report consumers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskThreshold {
  All,
  Level(RiskLevel),
}

impl RiskThreshold {
  pub fn parse(s: &str) -> Result<Self, RiskError> {
    match s {
      "all" => Ok(Self::All),
      "critical" => Ok(Self::Level(RiskLevel::Critical)),
      "high" => Ok(Self::Level(RiskLevel::High)),
      "medium" => Ok(Self::Level(RiskLevel::Medium)),
      "low" => Ok(Self::Level(RiskLevel::Low)),
      "none" => Ok(Self::Level(RiskLevel::None)),
      other => Err(RiskError::validation(
        "threshold",
        &format!("unsupported threshold: {}", other),
      )),
    }
  }
}

pub fn filter_by_threshold(
  assessments: Vec<RiskAssessment>,
  threshold: RiskThreshold,
) -> Vec<RiskAssessment> {
  match threshold {
    RiskThreshold::All => assessments,
    RiskThreshold::Level(level) => assessments
      .into_iter()
      .filter(|a| a.risk_level == level)
      .collect(),
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
  Score,
  Repository,
  Policy,
  Impact,
}

impl SortKey {
  pub fn parse(s: &str) -> Result<Self, RiskError> {
    match s {
      "score" => Ok(Self::Score),
      "repository" => Ok(Self::Repository),
      "policy" => Ok(Self::Policy),
      "impact" => Ok(Self::Impact),
      other => Err(RiskError::validation(
        "sort_by",
        &format!("unsupported sort key: {}", other),
      )),
    }
  }
}

/// Sort assessments for presentation. Ties break on repository then id so
/// output is stable across runs.
pub fn sort_assessments(assessments: &mut [RiskAssessment], key: SortKey) {
  match key {
    SortKey::Score => assessments.sort_by(|a, b| {
      b.cvss_score
        .total_cmp(&a.cvss_score)
        .then_with(|| a.repository.cmp(&b.repository))
        .then_with(|| a.id.cmp(&b.id))
    }),
    SortKey::Repository => {
      assessments.sort_by(|a, b| a.repository.cmp(&b.repository).then_with(|| a.id.cmp(&b.id)))
    }
    SortKey::Policy => {
      assessments.sort_by(|a, b| a.policy.cmp(&b.policy).then_with(|| a.id.cmp(&b.id)))
    }
    SortKey::Impact => assessments.sort_by(|a, b| {
      b.business_risk
        .financial_impact
        .total_cmp(&a.business_risk.financial_impact)
        .then_with(|| a.repository.cmp(&b.repository))
        .then_with(|| a.id.cmp(&b.id))
    }),
  }
}

// ---------------------------------------------------------------------------
// Organization-wide business metrics
// ---------------------------------------------------------------------------

/// Aggregate metrics over the full (unfiltered) assessment list.
pub fn business_metrics(assessments: &[RiskAssessment]) -> BusinessRiskMetrics {
  let total_risk_score: f64 = assessments.iter().map(|a| a.cvss_score).sum();
  let estimated_cost: f64 = assessments
    .iter()
    .map(|a| a.business_risk.financial_impact)
    .sum();

  let mut risk_distribution: BTreeMap<String, usize> = BTreeMap::new();
  for a in assessments {
    *risk_distribution.entry(level_label(a.risk_level)).or_insert(0) += 1;
  }

  let critical_risk_count = assessments
    .iter()
    .filter(|a| a.risk_level == RiskLevel::Critical)
    .count();
  let escalation_required = assessments
    .iter()
    .any(|a| a.escalation.level != EscalationTier::None);

  let average_risk_score = if assessments.is_empty() {
    0.0
  } else {
    total_risk_score / assessments.len() as f64
  };

  let risk_trend = if average_risk_score > 7.0 {
    RiskTrend::Increasing
  } else if average_risk_score < 3.0 {
    RiskTrend::Decreasing
  } else {
    RiskTrend::Stable
  };

  BusinessRiskMetrics {
    total_risk_score,
    average_risk_score,
    risk_distribution,
    business_impact_score: business_impact_score(assessments),
    compliance_risk_score: compliance_risk_score(assessments),
    security_risk_score: security_risk_score(assessments),
    estimated_cost,
    risk_trend,
    critical_risk_count,
    top_risk_categories: top_risk_categories(assessments),
    escalation_required,
    compliance_violations: standard_violations(assessments),
  }
}

/// Mean CVSS over security-flavored policies; 0 when there are none.
fn security_risk_score(assessments: &[RiskAssessment]) -> f64 {
  let scores: Vec<f64> = assessments
    .iter()
    .filter(|a| {
      let policy = a.policy.to_lowercase();
      policy.contains("security") || policy.contains("branch protection")
    })
    .map(|a| a.cvss_score)
    .collect();
  mean(&scores)
}

/// Mean CVSS over assessments with any compliance impact; 0 when none.
fn compliance_risk_score(assessments: &[RiskAssessment]) -> f64 {
  let scores: Vec<f64> = assessments
    .iter()
    .filter(|a| a.business_risk.compliance_impact != Rating::None)
    .map(|a| a.cvss_score)
    .collect();
  mean(&scores)
}

/// CVSS weighted by business criticality, summed.
fn business_impact_score(assessments: &[RiskAssessment]) -> f64 {
  assessments
    .iter()
    .map(|a| {
      let multiplier = match a.business_risk.business_criticality {
        Rating::Critical => 2.0,
        Rating::High => 1.5,
        Rating::Medium => 1.0,
        Rating::Low => 0.5,
        Rating::None => 0.5,
      };
      a.cvss_score * multiplier
    })
    .sum()
}

fn mean(scores: &[f64]) -> f64 {
  if scores.is_empty() {
    return 0.0;
  }
  scores.iter().sum::<f64>() / scores.len() as f64
}

/// Top five policy categories by summed risk score.
fn top_risk_categories(assessments: &[RiskAssessment]) -> Vec<RiskCategoryRank> {
  let mut by_policy: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
  for a in assessments {
    let entry = by_policy.entry(a.policy.as_str()).or_insert((0.0, 0));
    entry.0 += a.cvss_score;
    entry.1 += 1;
  }

  let mut ranks: Vec<RiskCategoryRank> = by_policy
    .into_iter()
    .map(|(category, (risk_score, violation_count))| RiskCategoryRank {
      category: category.to_string(),
      risk_score,
      violation_count,
      average_score: risk_score / violation_count as f64,
    })
    .collect();

  ranks.sort_by(|a, b| {
    b.risk_score
      .total_cmp(&a.risk_score)
      .then_with(|| a.category.cmp(&b.category))
  });
  ranks.truncate(5);
  ranks
}

/// Roll compliance-impacting assessments up by standard.
fn standard_violations(assessments: &[RiskAssessment]) -> Vec<StandardViolation> {
  let mut by_standard: BTreeMap<&'static str, StandardViolation> = BTreeMap::new();

  for a in assessments {
    if a.business_risk.compliance_impact == Rating::None {
      continue;
    }
    let standard = policy_standard(&a.policy);
    by_standard
      .entry(standard)
      .and_modify(|v| {
        v.violation_count += 1;
        v.risk_score += a.cvss_score;
      })
      .or_insert_with(|| StandardViolation {
        standard: standard.to_string(),
        requirement: a.policy.clone(),
        violation_count: 1,
        risk_score: a.cvss_score,
        severity: a.risk_level,
      });
  }

  by_standard.into_values().collect()
}

/// Keyword mapping from policy names to compliance standards.
fn policy_standard(policy: &str) -> &'static str {
  let policy = policy.to_lowercase();
  if policy.contains("security") {
    "ISO 27001"
  } else if policy.contains("branch protection") {
    "SOC 2"
  } else if policy.contains("access") {
    "GDPR"
  } else if policy.contains("audit") {
    "SOX"
  } else {
    "General"
  }
}

fn level_label(level: RiskLevel) -> String {
  match level {
    RiskLevel::None => "None",
    RiskLevel::Low => "Low",
    RiskLevel::Medium => "Medium",
    RiskLevel::High => "High",
    RiskLevel::Critical => "Critical",
  }
  .to_string()
}
