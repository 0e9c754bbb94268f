//! Report data contracts: CSV rows, SARIF 2.1.0 and JUnit structures.
//!
//! Only the structures are built here; terminal tables and XML text belong
//! to report consumers.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::types::{AuditData, Severity};

/// Supported audit report formats. Unsupported names fail before any
/// computation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
  Table,
  Json,
  Csv,
  Sarif,
  Junit,
}

impl ReportFormat {
  pub fn parse(s: &str) -> Result<Self, EngineError> {
    match s {
      "table" => Ok(Self::Table),
      "json" => Ok(Self::Json),
      "csv" => Ok(Self::Csv),
      "sarif" => Ok(Self::Sarif),
      "junit" => Ok(Self::Junit),
      other => Err(EngineError::validation(
        "format",
        &format!("unsupported format: {}", other),
      )),
    }
  }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

pub const CSV_HEADER: [&str; 6] = [
  "Repository",
  "Visibility",
  "Template",
  "Compliant",
  "Violations",
  "Critical",
];

/// One CSV row per repository, in report order.
pub fn csv_rows(data: &AuditData) -> Vec<Vec<String>> {
  data
    .repositories
    .iter()
    .map(|r| {
      vec![
        r.name.clone(),
        r.visibility.clone(),
        r.template.clone(),
        r.overall_compliant.to_string(),
        r.violation_count.to_string(),
        r.critical_count.to_string(),
      ]
    })
    .collect()
}

/// CSV contract bundle for serializers.
#[derive(Debug, Clone, Serialize)]
pub struct CsvReport {
  pub header: Vec<String>,
  pub rows: Vec<Vec<String>>,
}

pub fn to_csv(data: &AuditData) -> CsvReport {
  CsvReport {
    header: CSV_HEADER.iter().map(|s| s.to_string()).collect(),
    rows: csv_rows(data),
  }
}

// ---------------------------------------------------------------------------
// SARIF 2.1.0
// ---------------------------------------------------------------------------

pub const SARIF_SCHEMA: &str =
  "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
pub const SARIF_VERSION: &str = "2.1.0";

#[derive(Debug, Clone, Serialize)]
pub struct SarifReport {
  #[serde(rename = "$schema")]
  pub schema: String,
  pub version: String,
  pub runs: Vec<SarifRun>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SarifRun {
  pub tool: SarifTool,
  pub results: Vec<SarifResult>,
  #[serde(rename = "columnKind")]
  pub column_kind: String,
  #[serde(rename = "logicalLocations")]
  pub logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SarifTool {
  pub driver: SarifDriver,
}

#[derive(Debug, Clone, Serialize)]
pub struct SarifDriver {
  pub name: String,
  #[serde(rename = "semanticVersion")]
  pub semantic_version: String,
  #[serde(rename = "fullName")]
  pub full_name: String,
  pub rules: Vec<SarifRule>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SarifRule {
  pub id: String,
  pub name: String,
  #[serde(rename = "shortDescription")]
  pub short_description: SarifText,
  #[serde(rename = "fullDescription")]
  pub full_description: SarifText,
  pub help: SarifText,
  pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SarifText {
  pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SarifResult {
  #[serde(rename = "ruleId")]
  pub rule_id: String,
  #[serde(rename = "ruleIndex")]
  pub rule_index: usize,
  pub level: String,
  pub message: SarifText,
  pub locations: Vec<SarifLocation>,
  pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SarifLocation {
  #[serde(rename = "logicalLocation")]
  pub logical_location: SarifLogicalLocation,
}

#[derive(Debug, Clone, Serialize)]
pub struct SarifLogicalLocation {
  pub name: String,
  pub kind: String,
}

/// Build the SARIF report: one rule per distinct `policy.setting` pair, one
/// result per violation, one logical location per repository.
pub fn to_sarif(data: &AuditData) -> SarifReport {
  let mut rules: Vec<SarifRule> = Vec::new();
  let mut rule_index: BTreeMap<String, usize> = BTreeMap::new();
  let mut results = Vec::new();
  let mut locations: Vec<SarifLogicalLocation> = Vec::new();

  for violation in &data.violations {
    let rule_id = format!("{}.{}", violation.policy, violation.setting);

    let index = *rule_index.entry(rule_id.clone()).or_insert_with(|| {
      rules.push(SarifRule {
        id: rule_id.clone(),
        name: violation.setting.clone(),
        short_description: SarifText {
          text: violation.description.clone(),
        },
        full_description: SarifText {
          text: format!("Policy: {} - {}", violation.policy, violation.description),
        },
        help: SarifText {
          text: violation.remediation.clone(),
        },
        properties: BTreeMap::from([
          ("severity".to_string(), severity_label(violation.severity).to_string()),
          ("category".to_string(), "compliance".to_string()),
        ]),
      });
      rules.len() - 1
    });

    let level = match violation.severity {
      Severity::Critical | Severity::High => "error",
      Severity::Medium | Severity::Low => "warning",
    };

    results.push(SarifResult {
      rule_id,
      rule_index: index,
      level: level.to_string(),
      message: SarifText {
        text: format!(
          "{}: Expected {}, but found {}",
          violation.description, violation.expected, violation.actual
        ),
      },
      locations: vec![SarifLocation {
        logical_location: SarifLogicalLocation {
          name: violation.repository.clone(),
          kind: "repository".to_string(),
        },
      }],
      properties: BTreeMap::from([
        ("policy".to_string(), violation.policy.clone()),
        ("expected".to_string(), violation.expected.clone()),
        ("actual".to_string(), violation.actual.clone()),
        ("remediation".to_string(), violation.remediation.clone()),
      ]),
    });

    if !locations.iter().any(|l| l.name == violation.repository) {
      locations.push(SarifLogicalLocation {
        name: violation.repository.clone(),
        kind: "repository".to_string(),
      });
    }
  }

  SarifReport {
    schema: SARIF_SCHEMA.to_string(),
    version: SARIF_VERSION.to_string(),
    runs: vec![SarifRun {
      tool: SarifTool {
        driver: SarifDriver {
          name: "compliance-engine".to_string(),
          semantic_version: env!("CARGO_PKG_VERSION").to_string(),
          full_name: "Repository Compliance Audit".to_string(),
          rules,
        },
      },
      results,
      column_kind: "utf16CodeUnits".to_string(),
      logical_locations: locations,
    }],
  }
}

fn severity_label(severity: Severity) -> &'static str {
  match severity {
    Severity::Low => "low",
    Severity::Medium => "medium",
    Severity::High => "high",
    Severity::Critical => "critical",
  }
}

// ---------------------------------------------------------------------------
// JUnit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct JUnitReport {
  pub name: String,
  pub tests: usize,
  pub failures: usize,
  pub errors: usize,
  pub time: f64,
  pub suites: Vec<JUnitSuite>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JUnitSuite {
  pub name: String,
  pub tests: usize,
  pub failures: usize,
  pub errors: usize,
  pub time: f64,
  pub timestamp: String,
  pub properties: Vec<JUnitProperty>,
  pub cases: Vec<JUnitCase>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub system_out: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JUnitProperty {
  pub name: String,
  pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JUnitCase {
  pub classname: String,
  pub name: String,
  pub time: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub failure: Option<JUnitFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JUnitFailure {
  pub message: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub text: String,
}

/// Build the JUnit report: one suite per policy, one case per repository,
/// a failure element listing the repository's violations of that policy.
pub fn to_junit(data: &AuditData) -> JUnitReport {
  let mut suites = Vec::new();

  for policy in &data.policy_compliance {
    let mut cases = Vec::new();
    let mut failures = 0;

    for repo in &data.repositories {
      let messages: Vec<String> = data
        .violations
        .iter()
        .filter(|v| v.policy == policy.policy_name && v.repository == repo.name)
        .map(|v| format!("{}: expected {}, got {}", v.setting, v.expected, v.actual))
        .collect();

      let failure = if messages.is_empty() {
        None
      } else {
        failures += 1;
        Some(JUnitFailure {
          message: format!("{} violations found", messages.len()),
          kind: "ComplianceViolation".to_string(),
          text: messages.join("\n"),
        })
      };

      cases.push(JUnitCase {
        classname: policy.policy_name.clone(),
        name: format!("{} compliance", repo.name),
        time: 0.001,
        failure,
      });
    }

    suites.push(JUnitSuite {
      name: policy.policy_name.clone(),
      tests: cases.len(),
      failures,
      errors: 0,
      time: 0.01,
      timestamp: data.generated_at.to_rfc3339(),
      properties: vec![
        JUnitProperty {
          name: "description".to_string(),
          value: policy.description.clone(),
        },
        JUnitProperty {
          name: "severity".to_string(),
          value: severity_label(policy.severity).to_string(),
        },
        JUnitProperty {
          name: "compliance_percentage".to_string(),
          value: format!("{:.1}", policy.compliance_percentage),
        },
      ],
      cases,
      system_out: None,
    });
  }

  if let Some(first) = suites.first_mut() {
    first.system_out = Some(format!(
      "Compliance Summary:\nTotal Repositories: {}\nCompliant: {} ({:.1}%)\nTotal Violations: {}\nCritical Violations: {}\n",
      data.summary.total_repositories,
      data.summary.compliant_repositories,
      data.summary.compliance_percentage,
      data.summary.total_violations,
      data.summary.critical_violations,
    ));
  }

  JUnitReport {
    name: format!("Repository Compliance Audit - {}", data.organization),
    tests: suites.iter().map(|s| s.tests).sum(),
    failures: suites.iter().map(|s| s.failures).sum(),
    errors: 0,
    time: 0.1,
    suites,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::audit;
  use crate::types::{RepositoryResult, RepositorySnapshot, ViolationDetail};

  fn sample() -> AuditData {
    let violation = |repo: &str, policy: &str, setting: &str, severity: Severity| ViolationDetail {
      repository: repo.to_string(),
      policy: policy.to_string(),
      setting: setting.to_string(),
      expected: "true".to_string(),
      actual: "false".to_string(),
      severity,
      description: "does not match".to_string(),
      remediation: "fix it".to_string(),
    };
    let result = |name: &str, violations: Vec<ViolationDetail>| RepositoryResult {
      snapshot: RepositorySnapshot {
        name: name.to_string(),
        ..RepositorySnapshot::default()
      },
      template: "none".to_string(),
      differences: Vec::new(),
      violations,
    };
    audit::aggregate(
      "acme",
      "2025-03-01T12:00:00Z".parse().unwrap(),
      vec![
        result(
          "legacy-service",
          vec![
            violation(
              "legacy-service",
              "Branch Protection",
              "branch_protection.main.enforce_admins",
              Severity::Critical,
            ),
            violation(
              "legacy-service",
              "Merge Policy",
              "merge.allow_squash_merge",
              Severity::Medium,
            ),
          ],
        ),
        result(
          "api-service",
          vec![violation(
            "api-service",
            "Branch Protection",
            "branch_protection.main.enforce_admins",
            Severity::Critical,
          )],
        ),
      ],
    )
  }

  #[test]
  fn unsupported_format_is_a_validation_error() {
    assert!(ReportFormat::parse("json").is_ok());
    assert!(ReportFormat::parse("sarif").is_ok());
    let err = ReportFormat::parse("yaml").unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));
    assert!(err.to_string().contains("unsupported format"));
  }

  #[test]
  fn csv_rows_follow_the_contract() {
    let report = to_csv(&sample());
    assert_eq!(report.header[0], "Repository");
    assert_eq!(report.rows.len(), 2);
    // Rows come out sorted by repository name.
    assert_eq!(report.rows[0][0], "api-service");
    assert_eq!(report.rows[1][0], "legacy-service");
    assert_eq!(report.rows[1][3], "false");
    assert_eq!(report.rows[1][4], "2");
    assert_eq!(report.rows[1][5], "1");
  }

  #[test]
  fn sarif_deduplicates_rules_and_locations() {
    let sarif = to_sarif(&sample());
    let run = &sarif.runs[0];
    // Two repositories violate the same policy.setting pair: one rule.
    let ids: Vec<&str> = run.tool.driver.rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
      ids,
      vec![
        "Branch Protection.branch_protection.main.enforce_admins",
        "Merge Policy.merge.allow_squash_merge",
      ]
    );
    assert_eq!(run.results.len(), 3);
    // One logical location per repository, first-occurrence order.
    let names: Vec<&str> = run.logical_locations.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["api-service", "legacy-service"]);
    assert!(run.logical_locations.iter().all(|l| l.kind == "repository"));
  }

  #[test]
  fn sarif_level_splits_at_high_severity() {
    let sarif = to_sarif(&sample());
    let levels: Vec<&str> = sarif.runs[0]
      .results
      .iter()
      .map(|r| r.level.as_str())
      .collect();
    assert_eq!(levels, vec!["error", "error", "warning"]);
  }

  #[test]
  fn sarif_results_point_back_to_their_rule() {
    let sarif = to_sarif(&sample());
    let run = &sarif.runs[0];
    for result in &run.results {
      assert_eq!(run.tool.driver.rules[result.rule_index].id, result.rule_id);
    }
  }

  #[test]
  fn junit_builds_a_suite_per_policy_and_case_per_repository() {
    let junit = to_junit(&sample());
    assert_eq!(junit.suites.len(), audit::POLICY_CATALOG.len());
    let bp = junit
      .suites
      .iter()
      .find(|s| s.name == "Branch Protection")
      .unwrap();
    assert_eq!(bp.tests, 2);
    assert_eq!(bp.failures, 2);
    let case = bp
      .cases
      .iter()
      .find(|c| c.name == "legacy-service compliance")
      .unwrap();
    let failure = case.failure.as_ref().unwrap();
    assert_eq!(failure.kind, "ComplianceViolation");
    assert!(failure
      .text
      .contains("branch_protection.main.enforce_admins: expected true, got false"));
    // A compliant pairing has no failure element.
    let clean = junit
      .suites
      .iter()
      .find(|s| s.name == "Access Control")
      .unwrap();
    assert_eq!(clean.failures, 0);
    assert!(clean.cases.iter().all(|c| c.failure.is_none()));
  }

  #[test]
  fn junit_totals_and_summary() {
    let junit = to_junit(&sample());
    assert_eq!(junit.tests, audit::POLICY_CATALOG.len() * 2);
    assert_eq!(junit.failures, 3);
    let system_out = junit.suites[0].system_out.as_ref().unwrap();
    assert!(system_out.contains("Total Repositories: 2"));
    assert!(system_out.contains("Critical Violations: 2"));
  }
}
