//! Violation classifier and compliance audit aggregator.
//!
//! Differences are promoted into policy violations through a fixed catalog
//! keyed by setting category; the aggregator then computes per-policy and
//! org-wide compliance statistics. Output lists are sorted by repository
//! name so reports are deterministic and diffable across runs.

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::EngineError;
use crate::types::{
  AuditData, AuditSummary, ChangeAction, ConfigurationDifference, PolicyCompliance, PolicyStatus,
  RepositoryAudit, RepositoryFilter, RepositoryResult, RepositorySnapshot, Severity,
  ViolationDetail,
};

/// One audited policy: name, what it checks, and the severity of violating it.
#[derive(Debug, Clone, Copy)]
pub struct PolicyDef {
  pub name: &'static str,
  pub description: &'static str,
  pub severity: Severity,
}

/// The fixed policy catalog. Order is the report order; policy names line up
/// with the risk engine's keyword buckets.
pub const POLICY_CATALOG: &[PolicyDef] = &[
  PolicyDef {
    name: "Branch Protection",
    description: "Protected branches must carry protection rules with admin enforcement",
    severity: Severity::Critical,
  },
  PolicyDef {
    name: "Required Reviews",
    description: "Pull requests must require the configured number of reviews",
    severity: Severity::High,
  },
  PolicyDef {
    name: "Repository Visibility",
    description: "Repository visibility must match the configured target",
    severity: Severity::Critical,
  },
  PolicyDef {
    name: "Access Control",
    description: "Team permissions must match the configured grants",
    severity: Severity::High,
  },
  PolicyDef {
    name: "Merge Policy",
    description: "Merge behavior flags must match the configured target",
    severity: Severity::Medium,
  },
  PolicyDef {
    name: "Repository Features",
    description: "Issue, wiki and project features must match the configured target",
    severity: Severity::Medium,
  },
  PolicyDef {
    name: "Repository Metadata",
    description: "Description and homepage must match the configured target",
    severity: Severity::Low,
  },
  PolicyDef {
    name: "General Configuration",
    description: "Remaining settings must match the configured target",
    severity: Severity::Medium,
  },
];

/// Promote a configuration difference into a policy violation.
pub fn classify(diff: &ConfigurationDifference) -> ViolationDetail {
  let (policy, severity, description, remediation) = classify_setting(diff);
  ViolationDetail {
    repository: diff.repository.clone(),
    policy: policy.to_string(),
    setting: diff.setting.clone(),
    expected: diff.target_value.clone(),
    actual: diff.current_value.clone(),
    severity,
    description,
    remediation,
  }
}

fn classify_setting(diff: &ConfigurationDifference) -> (&'static str, Severity, String, String) {
  let setting = diff.setting.as_str();
  if setting == "visibility" {
    return (
      "Repository Visibility",
      Severity::Critical,
      "Repository visibility does not match the policy target".to_string(),
      format!("Change repository visibility to {}", diff.target_value),
    );
  }
  if setting.starts_with("branch_protection.") {
    if diff.change_action == ChangeAction::Create {
      return (
        "Branch Protection",
        Severity::Critical,
        "Branch lacks protection rules".to_string(),
        "Add a branch protection rule for the branch".to_string(),
      );
    }
    if setting.ends_with(".enforce_admins") {
      return (
        "Branch Protection",
        Severity::Critical,
        "Branch protection is not enforced for administrators".to_string(),
        "Enable admin enforcement on the branch protection rule".to_string(),
      );
    }
    if setting.ends_with(".required_reviews") {
      return (
        "Required Reviews",
        Severity::High,
        "Required review count does not match the policy target".to_string(),
        format!("Set the required review count to {}", diff.target_value),
      );
    }
    return (
      "Branch Protection",
      Severity::Critical,
      "Branch protection rule does not match the policy target".to_string(),
      "Align the branch protection rule with the policy".to_string(),
    );
  }
  if setting.starts_with("permissions.team.") {
    return (
      "Access Control",
      Severity::High,
      "Team permission does not match the configured grant".to_string(),
      format!("Grant the team {} permission", diff.target_value),
    );
  }
  if setting.starts_with("merge.") {
    return (
      "Merge Policy",
      Severity::Medium,
      "Merge behavior does not match the policy target".to_string(),
      format!("Set {} to {}", setting, diff.target_value),
    );
  }
  if setting.starts_with("features.") {
    return (
      "Repository Features",
      Severity::Medium,
      "Repository feature flag does not match the policy target".to_string(),
      format!("Set {} to {}", setting, diff.target_value),
    );
  }
  if setting == "description" || setting == "homepage" {
    return (
      "Repository Metadata",
      Severity::Low,
      "Repository metadata does not match the policy target".to_string(),
      format!("Update the repository {}", setting),
    );
  }
  (
    "General Configuration",
    Severity::Medium,
    "Repository setting does not match the policy target".to_string(),
    format!("Set {} to {}", setting, diff.target_value),
  )
}

/// Select repositories before any aggregation runs: exact visibility match
/// and/or a name regex. An invalid regex is a validation error.
pub fn filter_repositories(
  snapshots: Vec<RepositorySnapshot>,
  filter: &RepositoryFilter,
) -> Result<Vec<RepositorySnapshot>, EngineError> {
  let pattern = match &filter.name_pattern {
    Some(p) => Some(
      Regex::new(p).map_err(|e| EngineError::validation("filter.name_pattern", &e.to_string()))?,
    ),
    None => None,
  };

  Ok(
    snapshots
      .into_iter()
      .filter(|s| {
        if let Some(vis) = &filter.visibility {
          if s.visibility() != vis {
            return false;
          }
        }
        if let Some(re) = &pattern {
          if !re.is_match(&s.name) {
            return false;
          }
        }
        true
      })
      .collect(),
  )
}

/// Aggregate per-repository results into the audit bundle.
///
/// Results are sorted by repository name first; concurrent callers may hand
/// them over in any order.
pub fn aggregate(
  organization: &str,
  generated_at: DateTime<Utc>,
  mut results: Vec<RepositoryResult>,
) -> AuditData {
  results.sort_by(|a, b| a.snapshot.name.cmp(&b.snapshot.name));

  let total = results.len();
  let compliant = results.iter().filter(|r| r.violations.is_empty()).count();
  let total_violations: usize = results.iter().map(|r| r.violations.len()).sum();
  let critical_violations = results
    .iter()
    .flat_map(|r| &r.violations)
    .filter(|v| v.severity == Severity::Critical)
    .count();

  let summary = AuditSummary {
    total_repositories: total,
    compliant_repositories: compliant,
    compliance_percentage: percentage(compliant, total),
    total_violations,
    critical_violations,
    policy_count: POLICY_CATALOG.len(),
  };

  let policy_compliance = POLICY_CATALOG
    .iter()
    .map(|policy| {
      let violating = results
        .iter()
        .filter(|r| r.violations.iter().any(|v| v.policy == policy.name))
        .count();
      let compliant_repos = total - violating;
      PolicyCompliance {
        policy_name: policy.name.to_string(),
        description: policy.description.to_string(),
        severity: policy.severity,
        compliant_repos,
        violating_repos: violating,
        compliance_percentage: percentage(compliant_repos, compliant_repos + violating),
      }
    })
    .collect();

  let last_checked = generated_at.format("%Y-%m-%d %H:%M:%S").to_string();
  let repositories = results
    .iter()
    .map(|r| RepositoryAudit {
      name: r.snapshot.name.clone(),
      visibility: r.snapshot.visibility().to_string(),
      template: r.template.clone(),
      overall_compliant: r.violations.is_empty(),
      violation_count: r.violations.len(),
      critical_count: r
        .violations
        .iter()
        .filter(|v| v.severity == Severity::Critical)
        .count(),
      last_checked: last_checked.clone(),
      policy_status: POLICY_CATALOG
        .iter()
        .map(|policy| policy_status(&r.violations, policy.name))
        .collect(),
    })
    .collect();

  let violations = results.into_iter().flat_map(|r| r.violations).collect();

  AuditData {
    organization: organization.to_string(),
    generated_at,
    summary,
    policy_compliance,
    repositories,
    violations,
  }
}

fn policy_status(violations: &[ViolationDetail], policy: &str) -> PolicyStatus {
  let mut worst: Option<Severity> = None;
  for v in violations.iter().filter(|v| v.policy == policy) {
    worst = Some(worst.map_or(v.severity, |w| w.max(v.severity)));
  }
  match worst {
    None => PolicyStatus::Pass,
    Some(s) if s >= Severity::High => PolicyStatus::Fail,
    Some(_) => PolicyStatus::Warn,
  }
}

/// Percentage with the zero-denominator convention: 0, never an error.
pub fn percentage(numerator: usize, denominator: usize) -> f64 {
  if denominator == 0 {
    return 0.0;
  }
  numerator as f64 / denominator as f64 * 100.0
}
