//! Integration tests for the risk engine.

use risk_engine::{run, Input};

fn fixture_input() -> Input {
  let json = r#"{
    "violations": [
      {
        "repository": "legacy-service",
        "policy": "Branch Protection",
        "setting": "branch_protection.main.enforce_admins",
        "expected": "true",
        "actual": "false",
        "severity": "critical",
        "description": "Branch protection is not enforced for administrators",
        "remediation": "Enable admin enforcement on the branch protection rule"
      },
      {
        "repository": "legacy-service",
        "policy": "Required Reviews",
        "setting": "branch_protection.main.required_reviews",
        "expected": "2",
        "actual": "0",
        "severity": "high",
        "description": "Required review count does not match the policy target",
        "remediation": "Set the required review count to 2"
      },
      {
        "repository": "public-docs",
        "policy": "Repository Metadata",
        "setting": "description",
        "expected": "Docs",
        "actual": "",
        "severity": "low",
        "description": "Repository metadata does not match the policy target",
        "remediation": "Update the repository description"
      }
    ],
    "repositories": [
      {"name": "legacy-service", "visibility": "public", "violation_count": 2, "critical_count": 1},
      {"name": "public-docs", "visibility": "public", "violation_count": 1, "critical_count": 0},
      {"name": "clean-repo", "visibility": "private", "violation_count": 0, "critical_count": 0}
    ],
    "compliance_percentage": 33.3,
    "assessed_at": "2025-03-01T12:00:00Z",
    "include_metrics": true
  }"#;
  serde_json::from_str(json).unwrap()
}

fn assessed_at() -> chrono::DateTime<chrono::Utc> {
  "2025-03-01T12:00:00Z".parse().unwrap()
}

#[test]
fn full_report_covers_both_scales() {
  let input = fixture_input();
  let report = run(&input, assessed_at()).unwrap();

  // One assessment per violation, sorted by score descending.
  assert_eq!(report.risk_assessments.len(), 3);
  for pair in report.risk_assessments.windows(2) {
    assert!(pair[0].cvss_score >= pair[1].cvss_score);
  }
  for a in &report.risk_assessments {
    assert!(a.cvss_score >= 0.0 && a.cvss_score <= 10.0);
    assert!((1..=10).contains(&a.priority));
  }

  // The review-count violation tops the list: its severity override keeps
  // C/I high while its baseline vector needs no privileges at all.
  let top = &report.risk_assessments[0];
  assert_eq!(top.repository, "legacy-service");
  assert_eq!(top.policy, "Required Reviews");
  assert!(top.cvss_score >= 9.0);

  // Composite section exists independently, sorted by repository name.
  let names: Vec<&str> = report
    .repository_risk_scores
    .iter()
    .map(|s| s.repository.as_str())
    .collect();
  assert_eq!(names, vec!["clean-repo", "legacy-service", "public-docs"]);

  // Metrics requested and present.
  let metrics = report.business_metrics.as_ref().unwrap();
  assert!(metrics.critical_risk_count >= 1);
  assert!(metrics.escalation_required);
  assert_eq!(metrics.estimated_cost, 151_000.0);
}

#[test]
fn zero_violation_repository_scores_zero_regardless_of_others() {
  let report = run(&fixture_input(), assessed_at()).unwrap();
  let clean = report
    .repository_risk_scores
    .iter()
    .find(|s| s.repository == "clean-repo")
    .unwrap();
  assert_eq!(clean.total_score, 0.0);
  assert_eq!(
    serde_json::to_value(clean.risk_level).unwrap(),
    serde_json::json!("low")
  );
  // Even though another repository in the run carries a critical CVSS score.
  assert!(report.risk_assessments.iter().any(|a| a.cvss_score >= 8.0));
}

#[test]
fn deterministic_output_across_runs() {
  let json1 = serde_json::to_string(&run(&fixture_input(), assessed_at()).unwrap()).unwrap();
  let json2 = serde_json::to_string(&run(&fixture_input(), assessed_at()).unwrap()).unwrap();
  assert_eq!(json1, json2, "same inputs must produce identical JSON output");
}

#[test]
fn risk_scales_serialize_with_their_own_vocabularies() {
  let report = run(&fixture_input(), assessed_at()).unwrap();
  let value = serde_json::to_value(&report).unwrap();

  // CVSS scale: PascalCase labels.
  let cvss_level = value["risk_assessments"][0]["risk_level"].as_str().unwrap();
  assert!(["None", "Low", "Medium", "High", "Critical"].contains(&cvss_level));

  // Composite scale: lowercase labels.
  let composite_level = value["repository_risk_scores"][0]["risk_level"]
    .as_str()
    .unwrap();
  assert!(["low", "medium", "high", "critical"].contains(&composite_level));

  // Both sections exist side by side; no merged score.
  assert!(value.get("risk_assessments").is_some());
  assert!(value.get("repository_risk_scores").is_some());
  assert!(value.get("risk_analysis").is_some());
}

#[test]
fn empty_input_is_not_an_error() {
  let input: Input = serde_json::from_str(r#"{"violations": [], "repositories": []}"#).unwrap();
  let report = run(&input, assessed_at()).unwrap();
  assert!(report.risk_assessments.is_empty());
  assert!(report.repository_risk_scores.is_empty());
  assert!(report.business_metrics.is_none());
}

#[test]
fn unknown_fields_from_the_audit_bundle_are_ignored() {
  let json = r#"{
    "violations": [
      {
        "repository": "r",
        "policy": "Merge Policy",
        "setting": "merge.allow_squash_merge",
        "expected": "true",
        "actual": "false",
        "severity": "medium",
        "description": "drift",
        "remediation": "fix",
        "extra_field": 42
      }
    ],
    "repositories": [
      {"name": "r", "visibility": "private", "violation_count": 1, "critical_count": 0,
       "template": "baseline", "overall_compliant": false, "last_checked": "2025-03-01 12:00:00"}
    ]
  }"#;
  let input: Input = serde_json::from_str(json).unwrap();
  let report = run(&input, assessed_at()).unwrap();
  assert_eq!(report.risk_assessments.len(), 1);
}

#[test]
fn threshold_and_sort_options_are_validated_before_scoring() {
  let mut input = fixture_input();
  input.threshold = Some("severe".to_string());
  assert!(run(&input, assessed_at()).is_err());

  let mut input = fixture_input();
  input.sort_by = Some("color".to_string());
  assert!(run(&input, assessed_at()).is_err());

  let mut input = fixture_input();
  input.format = Some("xml".to_string());
  assert!(run(&input, assessed_at()).is_err());
}

#[test]
fn threshold_filters_assessments_but_not_metrics() {
  let mut input = fixture_input();
  input.threshold = Some("critical".to_string());
  let report = run(&input, assessed_at()).unwrap();
  assert!(report
    .risk_assessments
    .iter()
    .all(|a| { serde_json::to_value(a.risk_level).unwrap() == serde_json::json!("Critical") }));
  // Metrics still cover all three violations.
  let metrics = report.business_metrics.as_ref().unwrap();
  assert_eq!(metrics.risk_distribution.values().sum::<usize>(), 3);
}
