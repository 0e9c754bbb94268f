//! Composite per-repository risk score on its own 0-100 scale.
//!
//! Four weighted factors: security 40%, compliance 30%, exposure 20%,
//! operational 10%. Independent of the CVSS scorer; the two scales are
//! reported side by side and never merged.

use std::collections::BTreeMap;

use crate::types::{
  CompositeRiskLevel, RepositoryInfo, RepositoryRiskScore, RiskAnalysis, RiskCategory, RiskFactor,
  RiskTrend, Severity, Violation,
};

const SECURITY_WEIGHT: f64 = 0.4;
const COMPLIANCE_WEIGHT: f64 = 0.3;
const EXPOSURE_WEIGHT: f64 = 0.2;
const OPERATIONAL_WEIGHT: f64 = 0.1;

/// Score every repository, sorted by name.
pub fn score_repositories(
  repositories: &[RepositoryInfo],
  violations: &[Violation],
) -> Vec<RepositoryRiskScore> {
  let mut by_repo: BTreeMap<&str, Vec<&Violation>> = BTreeMap::new();
  for v in violations {
    by_repo.entry(v.repository.as_str()).or_default().push(v);
  }

  let mut scores: Vec<RepositoryRiskScore> = repositories
    .iter()
    .map(|repo| {
      let violations = by_repo
        .get(repo.name.as_str())
        .map_or(&[][..], |v| v.as_slice());
      score_repository(repo, violations)
    })
    .collect();
  scores.sort_by(|a, b| a.repository.cmp(&b.repository));
  scores
}

/// Score one repository from its violations. A repository with zero
/// violations scores 0 and lands in the low tier.
pub fn score_repository(
  repo: &RepositoryInfo,
  violations: &[&Violation],
) -> RepositoryRiskScore {
  let mut risk_factors = Vec::new();

  let security = security_score(violations);
  if security > 0.0 {
    risk_factors.push(RiskFactor {
      category: RiskCategory::Security,
      name: "Security Policy Violations".to_string(),
      score: security * SECURITY_WEIGHT,
      weight: SECURITY_WEIGHT,
      description: format!("{} critical security violations", repo.critical_count),
    });
  }

  let compliance = compliance_score(violations);
  if compliance > 0.0 {
    risk_factors.push(RiskFactor {
      category: RiskCategory::Compliance,
      name: "Compliance Policy Violations".to_string(),
      score: compliance * COMPLIANCE_WEIGHT,
      weight: COMPLIANCE_WEIGHT,
      description: format!("{} total policy violations", repo.violation_count),
    });
  }

  let exposure = exposure_score(repo);
  if exposure > 0.0 {
    risk_factors.push(RiskFactor {
      category: RiskCategory::Exposure,
      name: "Public Exposure Risk".to_string(),
      score: exposure * EXPOSURE_WEIGHT,
      weight: EXPOSURE_WEIGHT,
      description: "Public repository with security issues".to_string(),
    });
  }

  let operational = operational_score(violations);
  if operational > 0.0 {
    risk_factors.push(RiskFactor {
      category: RiskCategory::Operational,
      name: "Operational Risk".to_string(),
      score: operational * OPERATIONAL_WEIGHT,
      weight: OPERATIONAL_WEIGHT,
      description: "Missing operational best practices".to_string(),
    });
  }

  let total_score: f64 = risk_factors.iter().map(|f| f.score).sum();
  let risk_level = composite_level(total_score);
  let recommendations = recommendations(repo, &risk_factors, risk_level);

  RepositoryRiskScore {
    repository: repo.name.clone(),
    total_score,
    risk_level,
    risk_factors,
    recommendations,
  }
}

/// Critical security violations weigh 40 points, high 20, capped at 100.
fn security_score(violations: &[&Violation]) -> f64 {
  let mut critical = 0u32;
  let mut high = 0u32;
  for v in violations {
    let policy = v.policy.to_lowercase();
    if policy.contains("security")
      || policy.contains("protection")
      || policy.contains("vulnerability")
    {
      match v.severity {
        Severity::Critical => critical += 1,
        Severity::High => high += 1,
        _ => {}
      }
    }
  }
  (f64::from(critical) * 40.0 + f64::from(high) * 20.0).min(100.0)
}

/// Violation count against a ten-policy baseline, capped at 100.
fn compliance_score(violations: &[&Violation]) -> f64 {
  if violations.is_empty() {
    return 0.0;
  }
  (violations.len() as f64 / 10.0 * 100.0).min(100.0)
}

/// Public repositories with violations start at 50, plus 10 per critical.
fn exposure_score(repo: &RepositoryInfo) -> f64 {
  if repo.visibility != "public" || repo.violation_count == 0 {
    return 0.0;
  }
  (50.0 + repo.critical_count as f64 * 10.0).min(100.0)
}

/// Twenty points per missing operational control, capped at 100.
fn operational_score(violations: &[&Violation]) -> f64 {
  let mut score = 0.0;
  for v in violations {
    let policy = v.policy.to_lowercase();
    if policy.contains("ci") || policy.contains("documentation") || policy.contains("workflow") {
      score += 20.0;
    }
  }
  f64::min(score, 100.0)
}

/// Thresholds on the 0-100 composite total. Not the CVSS partition.
pub fn composite_level(total_score: f64) -> CompositeRiskLevel {
  if total_score >= 75.0 {
    CompositeRiskLevel::Critical
  } else if total_score >= 50.0 {
    CompositeRiskLevel::High
  } else if total_score >= 25.0 {
    CompositeRiskLevel::Medium
  } else {
    CompositeRiskLevel::Low
  }
}

fn recommendations(
  repo: &RepositoryInfo,
  factors: &[RiskFactor],
  level: CompositeRiskLevel,
) -> Vec<String> {
  let mut out = Vec::new();

  if repo.critical_count > 0 {
    out.push(format!(
      "URGENT: Fix {} critical security violations immediately",
      repo.critical_count
    ));
  }
  if repo.visibility == "public" && repo.violation_count > 0 {
    out.push("Consider making repository private until violations are resolved".to_string());
  }

  for factor in factors {
    match factor.category {
      RiskCategory::Security if factor.score > 30.0 => {
        out.push("Enable branch protection and require code reviews".to_string());
        out.push("Enable security scanning and vulnerability alerts".to_string());
      }
      RiskCategory::Compliance if factor.score > 20.0 => {
        out.push("Review and implement required compliance policies".to_string());
        out.push("Schedule regular compliance audits".to_string());
      }
      RiskCategory::Operational if factor.score > 5.0 => {
        out.push("Implement CI/CD pipelines for automated testing".to_string());
        out.push("Add required documentation (README, LICENSE, SECURITY.md)".to_string());
      }
      _ => {}
    }
  }

  match level {
    CompositeRiskLevel::Critical => {
      out.push("Block all deployments until critical issues are resolved".to_string());
      out.push("Assign security team to review immediately".to_string());
    }
    CompositeRiskLevel::High => {
      out.push("Schedule immediate remediation (within 7 days)".to_string());
      out.push("Conduct security review before next release".to_string());
    }
    CompositeRiskLevel::Medium => {
      out.push("Add to remediation backlog (resolve within 30 days)".to_string());
      out.push("Monitor for any increase in violations".to_string());
    }
    CompositeRiskLevel::Low => {}
  }

  out
}

/// Org-level rollup of the composite scores. `compliance_percentage` comes
/// from the audit summary and sharpens the high-tier rule.
pub fn analyze(scores: &[RepositoryRiskScore], compliance_percentage: f64) -> RiskAnalysis {
  let mut risk_distribution: BTreeMap<String, usize> = ["critical", "high", "medium", "low"]
    .into_iter()
    .map(|l| (l.to_string(), 0))
    .collect();

  let mut top_risks = Vec::new();
  let mut critical_count = 0;
  let mut high_count = 0;

  for score in scores {
    let label = match score.risk_level {
      CompositeRiskLevel::Critical => "critical",
      CompositeRiskLevel::High => "high",
      CompositeRiskLevel::Medium => "medium",
      CompositeRiskLevel::Low => "low",
    };
    *risk_distribution.entry(label.to_string()).or_insert(0) += 1;

    match score.risk_level {
      CompositeRiskLevel::Critical => {
        critical_count += 1;
        top_risks.push(score.clone());
      }
      CompositeRiskLevel::High => {
        high_count += 1;
        if top_risks.len() < 10 {
          top_risks.push(score.clone());
        }
      }
      _ => {}
    }
  }

  let overall_risk_level = if critical_count > 0 {
    CompositeRiskLevel::Critical
  } else if high_count > 2 || (high_count > 0 && compliance_percentage < 70.0) {
    CompositeRiskLevel::High
  } else if risk_distribution["medium"] > scores.len() / 2 {
    CompositeRiskLevel::Medium
  } else {
    CompositeRiskLevel::Low
  };

  RiskAnalysis {
    overall_risk_level,
    high_risk_repos: high_count,
    critical_risk_repos: critical_count,
    risk_distribution,
    top_risks,
    risk_trend: RiskTrend::Stable,
  }
}
