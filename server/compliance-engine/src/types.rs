//! Core types for the compliance engine (JSON contracts + internal models).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Snapshot types (JSON contract — what the collaborator fetched)
// ---------------------------------------------------------------------------

/// Point-in-time state of one repository. Produced by a `ConfigSource`
/// collaborator; never mutated by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositorySnapshot {
  pub name: String,
  #[serde(default)]
  pub private: bool,
  #[serde(default)]
  pub archived: bool,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub homepage: String,
  #[serde(default)]
  pub has_issues: bool,
  #[serde(default)]
  pub has_wiki: bool,
  #[serde(default)]
  pub has_projects: bool,
  #[serde(default)]
  pub allow_squash_merge: bool,
  #[serde(default)]
  pub allow_merge_commit: bool,
  #[serde(default)]
  pub allow_rebase_merge: bool,
  #[serde(default)]
  pub delete_branch_on_merge: bool,
  /// Branch protection keyed by branch name. BTreeMap so diff order is stable.
  #[serde(default)]
  pub branch_protection: BTreeMap<String, BranchProtectionStatus>,
  /// Team slug -> permission level (pull, triage, push, maintain, admin).
  #[serde(default)]
  pub team_permissions: BTreeMap<String, String>,
}

impl RepositorySnapshot {
  pub fn visibility(&self) -> &'static str {
    if self.private {
      "private"
    } else {
      "public"
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BranchProtectionStatus {
  #[serde(default)]
  pub required_reviews: u32,
  #[serde(default)]
  pub enforce_admins: bool,
}

// ---------------------------------------------------------------------------
// Severity / impact / change-action enums
// ---------------------------------------------------------------------------

/// Violation severity, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Low,
  Medium,
  High,
  Critical,
}

/// Fixed impact classification for a configuration difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
  Low,
  Medium,
  High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
  Create,
  Update,
  Delete,
}

// ---------------------------------------------------------------------------
// Reconciliation output
// ---------------------------------------------------------------------------

/// One deviating field between current and target configuration.
/// Created by the reconciliation engine; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationDifference {
  pub repository: String,
  pub setting: String,
  pub current_value: String,
  pub target_value: String,
  pub change_action: ChangeAction,
  pub impact: Impact,
  pub template: String,
  pub compliant: bool,
}

/// Difference list plus the roll-up counts report consumers show.
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
  pub differences: Vec<ConfigurationDifference>,
  pub summary: DiffSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffSummary {
  pub total_changes: usize,
  pub affected_repos: usize,
}

// ---------------------------------------------------------------------------
// Violations and the audit bundle (JSON contract — what we emit)
// ---------------------------------------------------------------------------

/// A classified policy violation, derived from a non-exception difference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationDetail {
  pub repository: String,
  pub policy: String,
  pub setting: String,
  pub expected: String,
  pub actual: String,
  pub severity: Severity,
  pub description: String,
  pub remediation: String,
}

/// Complete audit bundle. Field names are the stable report contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditData {
  pub organization: String,
  pub generated_at: DateTime<Utc>,
  pub summary: AuditSummary,
  pub policy_compliance: Vec<PolicyCompliance>,
  pub repositories: Vec<RepositoryAudit>,
  pub violations: Vec<ViolationDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditSummary {
  pub total_repositories: usize,
  pub compliant_repositories: usize,
  pub compliance_percentage: f64,
  pub total_violations: usize,
  pub critical_violations: usize,
  pub policy_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyCompliance {
  pub policy_name: String,
  pub description: String,
  pub severity: Severity,
  pub compliant_repos: usize,
  pub violating_repos: usize,
  pub compliance_percentage: f64,
}

/// Per-policy marker for one repository, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
  Pass,
  Warn,
  Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryAudit {
  pub name: String,
  pub visibility: String,
  pub template: String,
  pub overall_compliant: bool,
  pub violation_count: usize,
  pub critical_count: usize,
  pub last_checked: String,
  pub policy_status: Vec<PolicyStatus>,
}

// ---------------------------------------------------------------------------
// Run inputs
// ---------------------------------------------------------------------------

/// Repository selection, applied before any aggregation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryFilter {
  /// Exact visibility match: "public" or "private".
  #[serde(default)]
  pub visibility: Option<String>,
  /// Regex matched against the repository name.
  #[serde(default)]
  pub name_pattern: Option<String>,
}

/// One repository's reconciliation result, before aggregation.
#[derive(Debug, Clone)]
pub struct RepositoryResult {
  pub snapshot: RepositorySnapshot,
  pub template: String,
  pub differences: Vec<ConfigurationDifference>,
  pub violations: Vec<ViolationDetail>,
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

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}
