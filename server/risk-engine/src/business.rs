//! Business risk factors, impact assessment, remediation guidance and risk
//! timeline for one violation.

use chrono::{DateTime, Duration, Utc};

use crate::types::{
  BusinessRiskFactor, DataSensitivity, Effort, ImpactAssessment, Rating, RemediationGuidance,
  RiskTimeline, Severity, Violation,
};

/// Business-specific risk factors: repository-name keywords first, severity
/// overrides second. Financial impact is a fixed tier per severity.
pub fn business_risk(violation: &Violation) -> BusinessRiskFactor {
  let mut risk = BusinessRiskFactor {
    data_sensitivity: DataSensitivity::Internal,
    business_criticality: Rating::Medium,
    compliance_impact: Rating::Medium,
    reputation_risk: Rating::Low,
    financial_impact: 0.0,
    customer_impact: Rating::Low,
  };

  let repo = violation.repository.to_lowercase();
  if repo.contains("api") || repo.contains("service") {
    risk.data_sensitivity = DataSensitivity::Confidential;
    risk.business_criticality = Rating::High;
    risk.customer_impact = Rating::Medium;
  }
  if repo.contains("public") || repo.contains("doc") {
    risk.data_sensitivity = DataSensitivity::Public;
    risk.business_criticality = Rating::Low;
    risk.reputation_risk = Rating::Medium;
  }

  match violation.severity {
    Severity::Critical => {
      risk.business_criticality = Rating::Critical;
      risk.compliance_impact = Rating::High;
      risk.reputation_risk = Rating::High;
      risk.customer_impact = Rating::High;
      risk.financial_impact = 100_000.0;
    }
    Severity::High => {
      risk.business_criticality = Rating::High;
      risk.compliance_impact = Rating::Medium;
      risk.reputation_risk = Rating::Medium;
      risk.customer_impact = Rating::Medium;
      risk.financial_impact = 50_000.0;
    }
    Severity::Medium => {
      risk.business_criticality = Rating::Medium;
      risk.compliance_impact = Rating::Low;
      risk.reputation_risk = Rating::Low;
      risk.customer_impact = Rating::Low;
      risk.financial_impact = 10_000.0;
    }
    Severity::Low => {
      risk.business_criticality = Rating::Low;
      risk.compliance_impact = Rating::None;
      risk.reputation_risk = Rating::Low;
      risk.customer_impact = Rating::None;
      risk.financial_impact = 1_000.0;
    }
  }

  risk
}

/// Impact assessment keyed on the CVSS score band.
pub fn assess_impact(violation: &Violation, cvss_score: f64) -> ImpactAssessment {
  let mut impact = ImpactAssessment {
    security_impact: Rating::Medium,
    compliance_impact: Rating::Medium,
    operational_impact: Rating::Low,
    affected_systems: vec![violation.repository.clone()],
    exposure_level: Rating::Medium,
    likelihood_exploit: Rating::Medium,
  };

  if cvss_score >= 9.0 {
    impact.security_impact = Rating::Critical;
    impact.compliance_impact = Rating::High;
    impact.operational_impact = Rating::High;
    impact.exposure_level = Rating::High;
    impact.likelihood_exploit = Rating::High;
  } else if cvss_score >= 7.0 {
    impact.security_impact = Rating::High;
    impact.compliance_impact = Rating::Medium;
    impact.operational_impact = Rating::Medium;
    impact.exposure_level = Rating::Medium;
    impact.likelihood_exploit = Rating::Medium;
  } else if cvss_score >= 4.0 {
    impact.security_impact = Rating::Medium;
    impact.compliance_impact = Rating::Low;
    impact.operational_impact = Rating::Low;
    impact.exposure_level = Rating::Low;
    impact.likelihood_exploit = Rating::Low;
  } else {
    impact.security_impact = Rating::Low;
    impact.compliance_impact = Rating::None;
    impact.operational_impact = Rating::None;
    impact.exposure_level = Rating::Low;
    impact.likelihood_exploit = Rating::Low;
  }

  impact
}

/// Remediation guidance: policy-keyword step lists, then effort/cost tiers
/// by CVSS band. Risk reduction assumes the fix removes 90% of the risk.
pub fn remediation_guidance(violation: &Violation, cvss_score: f64) -> RemediationGuidance {
  let mut guidance = RemediationGuidance {
    recommendation: violation.remediation.clone(),
    steps: Vec::new(),
    estimated_effort: Effort::Minimal,
    required_skills: vec!["GitHub Administration".to_string()],
    dependencies: Vec::new(),
    risk_reduction: cvss_score * 0.9,
    cost: 0.0,
    timeline_hours: 24.0,
  };

  let policy = violation.policy.to_lowercase();
  if policy.contains("branch protection") {
    guidance.steps = vec![
      "Navigate to repository settings".to_string(),
      "Select 'Branches' tab".to_string(),
      "Add branch protection rule for main branch".to_string(),
      "Configure required status checks".to_string(),
      "Enable 'Require pull request reviews'".to_string(),
      "Test the protection rule".to_string(),
    ];
    guidance
      .required_skills
      .push("Branch Protection Configuration".to_string());
    guidance.timeline_hours = 2.0;
  } else if policy.contains("security") {
    guidance.steps = vec![
      "Navigate to repository settings".to_string(),
      "Select 'Security & analysis' tab".to_string(),
      "Enable vulnerability alerts".to_string(),
      "Configure security scanning".to_string(),
      "Set up dependency scanning".to_string(),
      "Review security policies".to_string(),
    ];
    guidance
      .required_skills
      .push("Security Configuration".to_string());
    guidance.timeline_hours = 4.0;
  } else if policy.contains("access") {
    guidance.steps = vec![
      "Review current access permissions".to_string(),
      "Identify unauthorized users".to_string(),
      "Remove unnecessary access".to_string(),
      "Configure team-based access".to_string(),
      "Set up access reviews".to_string(),
      "Document access changes".to_string(),
    ];
    guidance
      .required_skills
      .push("Access Management".to_string());
    guidance.timeline_hours = 8.0;
  }

  if cvss_score >= 9.0 {
    guidance.estimated_effort = Effort::High;
    guidance.timeline_hours *= 2.0;
    guidance.cost = 5_000.0;
  } else if cvss_score >= 7.0 {
    guidance.estimated_effort = Effort::Medium;
    guidance.timeline_hours *= 1.5;
    guidance.cost = 2_000.0;
  } else if cvss_score >= 4.0 {
    guidance.estimated_effort = Effort::Low;
    guidance.cost = 500.0;
  } else {
    guidance.estimated_effort = Effort::Minimal;
    guidance.cost = 100.0;
  }

  guidance
}

/// Timeline with severity-tiered fix/SLA expectations. Detection history is
/// not tracked yet, so first_detected is pinned seven days before the
/// assessment.
pub fn risk_timeline(violation: &Violation, assessed_at: DateTime<Utc>) -> RiskTimeline {
  let first_detected = assessed_at - Duration::days(7);
  let exposure = assessed_at - first_detected;

  let (time_to_fix, sla_deadline, sla) = match violation.severity {
    Severity::Critical => ("1 hour", "4 hours", Duration::hours(4)),
    Severity::High => ("4 hours", "24 hours", Duration::hours(24)),
    Severity::Medium => ("1 day", "7 days", Duration::days(7)),
    Severity::Low => ("1 week", "30 days", Duration::days(30)),
  };

  let days_overdue = if exposure > sla {
    exposure.num_hours() / 24
  } else {
    0
  };

  RiskTimeline {
    first_detected,
    last_assessed: assessed_at,
    exposure_duration: format_duration(exposure),
    time_to_fix: time_to_fix.to_string(),
    sla_deadline: sla_deadline.to_string(),
    days_overdue,
  }
}

fn format_duration(d: Duration) -> String {
  if d < Duration::hours(1) {
    format!("{} minutes", d.num_minutes())
  } else if d < Duration::days(1) {
    format!("{} hours", d.num_hours())
  } else {
    format!("{} days", d.num_days())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn violation(repo: &str, policy: &str, severity: Severity) -> Violation {
    Violation {
      repository: repo.to_string(),
      policy: policy.to_string(),
      setting: "s".to_string(),
      expected: String::new(),
      actual: String::new(),
      severity,
      description: String::new(),
      remediation: "Fix the setting".to_string(),
    }
  }

  fn assessed_at() -> DateTime<Utc> {
    "2025-03-01T12:00:00Z".parse().unwrap()
  }

  #[test]
  fn api_service_critical_business_risk() {
    let risk = business_risk(&violation("api-service", "Branch Protection", Severity::Critical));
    assert_eq!(risk.data_sensitivity, DataSensitivity::Confidential);
    assert_eq!(risk.business_criticality, Rating::Critical);
    assert_eq!(risk.compliance_impact, Rating::High);
    assert_eq!(risk.reputation_risk, Rating::High);
    assert_eq!(risk.customer_impact, Rating::High);
    assert_eq!(risk.financial_impact, 100_000.0);
  }

  #[test]
  fn public_docs_low_business_risk() {
    let risk = business_risk(&violation("public-docs", "Documentation", Severity::Low));
    assert_eq!(risk.data_sensitivity, DataSensitivity::Public);
    assert_eq!(risk.business_criticality, Rating::Low);
    assert_eq!(risk.compliance_impact, Rating::None);
    assert_eq!(risk.reputation_risk, Rating::Medium);
    assert_eq!(risk.customer_impact, Rating::None);
    assert_eq!(risk.financial_impact, 1_000.0);
  }

  #[test]
  fn regular_service_medium_business_risk() {
    let risk = business_risk(&violation("regular-service", "Merge Policy", Severity::Medium));
    assert_eq!(risk.data_sensitivity, DataSensitivity::Confidential);
    assert_eq!(risk.business_criticality, Rating::Medium);
    assert_eq!(risk.compliance_impact, Rating::Low);
    assert_eq!(risk.reputation_risk, Rating::Low);
    assert_eq!(risk.customer_impact, Rating::Low);
    assert_eq!(risk.financial_impact, 10_000.0);
  }

  #[test]
  fn impact_assessment_bands() {
    let v = violation("test-repo", "Any", Severity::Medium);

    let critical = assess_impact(&v, 9.5);
    assert_eq!(critical.security_impact, Rating::Critical);
    assert_eq!(critical.compliance_impact, Rating::High);
    assert_eq!(critical.operational_impact, Rating::High);
    assert_eq!(critical.exposure_level, Rating::High);

    let high = assess_impact(&v, 8.0);
    assert_eq!(high.security_impact, Rating::High);
    assert_eq!(high.compliance_impact, Rating::Medium);

    let medium = assess_impact(&v, 5.0);
    assert_eq!(medium.security_impact, Rating::Medium);
    assert_eq!(medium.compliance_impact, Rating::Low);

    let low = assess_impact(&v, 2.0);
    assert_eq!(low.security_impact, Rating::Low);
    assert_eq!(low.compliance_impact, Rating::None);
    assert_eq!(low.operational_impact, Rating::None);

    assert_eq!(critical.affected_systems, vec!["test-repo".to_string()]);
  }

  #[test]
  fn remediation_guidance_tiers() {
    // Branch protection at 8.5: 2h base x 1.5, medium effort.
    let g = remediation_guidance(&violation("r", "Branch Protection", Severity::High), 8.5);
    assert_eq!(g.estimated_effort, Effort::Medium);
    assert_eq!(g.timeline_hours, 3.0);
    assert_eq!(g.cost, 2_000.0);
    assert!((g.risk_reduction - 7.65).abs() < 0.1);
    assert_eq!(
      g.required_skills,
      vec!["GitHub Administration".to_string(), "Branch Protection Configuration".to_string()]
    );
    assert!(!g.steps.is_empty());

    // Security at 9.0: 4h base x 2, high effort.
    let g = remediation_guidance(&violation("r", "Security Scanning", Severity::Critical), 9.0);
    assert_eq!(g.estimated_effort, Effort::High);
    assert_eq!(g.timeline_hours, 8.0);
    assert_eq!(g.cost, 5_000.0);

    // Access control at 6.0: 8h base, low-effort band, no multiplier.
    let g = remediation_guidance(&violation("r", "Access Control", Severity::Medium), 6.0);
    assert_eq!(g.estimated_effort, Effort::Low);
    assert_eq!(g.timeline_hours, 8.0);
    assert_eq!(g.cost, 500.0);

    // Unknown policy at 3.0: defaults.
    let g = remediation_guidance(&violation("r", "Documentation", Severity::Low), 3.0);
    assert_eq!(g.estimated_effort, Effort::Minimal);
    assert_eq!(g.timeline_hours, 24.0);
    assert_eq!(g.cost, 100.0);
    assert_eq!(g.recommendation, "Fix the setting");
  }

  #[test]
  fn timeline_sla_per_severity() {
    let t = risk_timeline(&violation("r", "p", Severity::Critical), assessed_at());
    assert_eq!(t.time_to_fix, "1 hour");
    assert_eq!(t.sla_deadline, "4 hours");
    // Seven days of exposure against a 4 hour SLA.
    assert_eq!(t.days_overdue, 7);
    assert_eq!(t.exposure_duration, "7 days");

    let t = risk_timeline(&violation("r", "p", Severity::High), assessed_at());
    assert_eq!(t.sla_deadline, "24 hours");
    assert_eq!(t.days_overdue, 7);

    // Medium: exposure equals the SLA exactly, not overdue.
    let t = risk_timeline(&violation("r", "p", Severity::Medium), assessed_at());
    assert_eq!(t.sla_deadline, "7 days");
    assert_eq!(t.days_overdue, 0);

    let t = risk_timeline(&violation("r", "p", Severity::Low), assessed_at());
    assert_eq!(t.sla_deadline, "30 days");
    assert_eq!(t.days_overdue, 0);
  }
}
