//! CVSS 3.1-style vector derivation and scoring.
//!
//! The metric value tables are the published CVSS 3.1 constants; the vector
//! derivation is keyword-driven from the violation's policy name, with the
//! violation severity overriding confidentiality/integrity/availability last
//! (severity wins on conflict).

use crate::types::{
  AttackComplexity, AttackVector, CvssVector, ImpactMetric, PrivilegesRequired, RiskLevel, Scope,
  Severity, UserInteraction, Violation,
};

impl ImpactMetric {
  pub(crate) fn value(self) -> f64 {
    match self {
      ImpactMetric::None => 0.0,
      ImpactMetric::Low => 0.22,
      // Not a CVSS 3.1 impact value; carries no weight.
      ImpactMetric::Medium => 0.0,
      ImpactMetric::High => 0.56,
    }
  }
}

impl AttackVector {
  pub(crate) fn value(self) -> f64 {
    match self {
      AttackVector::Network => 0.85,
      AttackVector::Adjacent => 0.62,
      AttackVector::Local => 0.55,
      AttackVector::Physical => 0.20,
    }
  }
}

impl AttackComplexity {
  pub(crate) fn value(self) -> f64 {
    match self {
      AttackComplexity::Low => 0.77,
      AttackComplexity::High => 0.44,
    }
  }
}

impl PrivilegesRequired {
  pub(crate) fn value(self) -> f64 {
    match self {
      PrivilegesRequired::None => 0.85,
      PrivilegesRequired::Low => 0.62,
      PrivilegesRequired::High => 0.27,
    }
  }
}

impl UserInteraction {
  pub(crate) fn value(self) -> f64 {
    match self {
      UserInteraction::None => 0.85,
      UserInteraction::Required => 0.62,
    }
  }
}

/// Derive the scored CVSS vector for one violation.
pub fn score_vector(violation: &Violation) -> CvssVector {
  let mut vector = derive_vector(violation);
  vector.base_score = base_score(&vector);
  // Exploit code assumed available; high business impact assumed.
  // Intentionally uncapped.
  vector.temporal_score = vector.base_score * 0.95;
  vector.environmental_score = vector.base_score * 1.1;
  vector
}

/// Baseline vector, adjusted by policy keywords, then by severity.
fn derive_vector(violation: &Violation) -> CvssVector {
  let mut vector = CvssVector {
    attack_vector: AttackVector::Network,
    attack_complexity: AttackComplexity::Low,
    privileges_required: PrivilegesRequired::None,
    user_interaction: UserInteraction::None,
    scope: Scope::Unchanged,
    confidentiality: ImpactMetric::Low,
    integrity: ImpactMetric::Low,
    availability: ImpactMetric::None,
    base_score: 0.0,
    temporal_score: 0.0,
    environmental_score: 0.0,
  };

  let policy = violation.policy.to_lowercase();
  if policy.contains("branch protection") {
    vector.privileges_required = PrivilegesRequired::Low;
    vector.integrity = ImpactMetric::High;
    vector.availability = ImpactMetric::Low;
  } else if policy.contains("security") {
    vector.confidentiality = ImpactMetric::High;
    vector.integrity = ImpactMetric::High;
    vector.availability = ImpactMetric::Low;
  } else if policy.contains("access") {
    vector.confidentiality = ImpactMetric::High;
    vector.integrity = ImpactMetric::Medium;
    vector.availability = ImpactMetric::None;
  } else if policy.contains("visibility") {
    vector.confidentiality = ImpactMetric::High;
    vector.integrity = ImpactMetric::Low;
    vector.availability = ImpactMetric::None;
  }

  // Severity wins on conflict with the keyword rules.
  match violation.severity {
    Severity::Critical => {
      vector.confidentiality = ImpactMetric::High;
      vector.integrity = ImpactMetric::High;
      vector.availability = ImpactMetric::High;
    }
    Severity::High => {
      vector.confidentiality = ImpactMetric::High;
      vector.integrity = ImpactMetric::High;
      vector.availability = ImpactMetric::Low;
    }
    Severity::Medium => {
      vector.confidentiality = ImpactMetric::Low;
      vector.integrity = ImpactMetric::Low;
      vector.availability = ImpactMetric::Low;
    }
    Severity::Low => {
      vector.confidentiality = ImpactMetric::None;
      vector.integrity = ImpactMetric::Low;
      vector.availability = ImpactMetric::None;
    }
  }

  vector
}

/// CVSS 3.1-style base score: impact and exploitability sub-scores, capped
/// at 10, rounded to one decimal. Zero impact is zero, full stop.
pub fn base_score(vector: &CvssVector) -> f64 {
  let iss = 1.0
    - ((1.0 - vector.confidentiality.value())
      * (1.0 - vector.integrity.value())
      * (1.0 - vector.availability.value()));
  let impact = 6.42 * iss;

  let exploitability = 8.22
    * vector.attack_vector.value()
    * vector.attack_complexity.value()
    * vector.privileges_required.value()
    * vector.user_interaction.value();

  if impact <= 0.0 {
    return 0.0;
  }

  let raw = match vector.scope {
    Scope::Unchanged => (impact + exploitability).min(10.0),
    Scope::Changed => (1.08 * (impact + exploitability)).min(10.0),
  };
  (raw * 10.0).round() / 10.0
}

/// Risk level partition on the 0-10 scale; lower bounds are inclusive.
pub fn risk_level(score: f64) -> RiskLevel {
  if score >= 9.0 {
    RiskLevel::Critical
  } else if score >= 7.0 {
    RiskLevel::High
  } else if score >= 4.0 {
    RiskLevel::Medium
  } else if score >= 0.1 {
    RiskLevel::Low
  } else {
    RiskLevel::None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn violation(policy: &str, severity: Severity) -> Violation {
    Violation {
      repository: "repo".to_string(),
      policy: policy.to_string(),
      setting: "s".to_string(),
      expected: String::new(),
      actual: String::new(),
      severity,
      description: String::new(),
      remediation: String::new(),
    }
  }

  fn vector(
    av: AttackVector,
    ac: AttackComplexity,
    pr: PrivilegesRequired,
    ui: UserInteraction,
    c: ImpactMetric,
    i: ImpactMetric,
    a: ImpactMetric,
  ) -> CvssVector {
    CvssVector {
      attack_vector: av,
      attack_complexity: ac,
      privileges_required: pr,
      user_interaction: ui,
      scope: Scope::Unchanged,
      confidentiality: c,
      integrity: i,
      availability: a,
      base_score: 0.0,
      temporal_score: 0.0,
      environmental_score: 0.0,
    }
  }

  #[test]
  fn metric_value_tables() {
    assert_eq!(ImpactMetric::None.value(), 0.0);
    assert_eq!(ImpactMetric::Low.value(), 0.22);
    assert_eq!(ImpactMetric::High.value(), 0.56);
    assert_eq!(AttackVector::Network.value(), 0.85);
    assert_eq!(AttackVector::Adjacent.value(), 0.62);
    assert_eq!(AttackVector::Local.value(), 0.55);
    assert_eq!(AttackVector::Physical.value(), 0.20);
    assert_eq!(AttackComplexity::Low.value(), 0.77);
    assert_eq!(AttackComplexity::High.value(), 0.44);
    assert_eq!(PrivilegesRequired::None.value(), 0.85);
    assert_eq!(PrivilegesRequired::Low.value(), 0.62);
    assert_eq!(PrivilegesRequired::High.value(), 0.27);
    assert_eq!(UserInteraction::None.value(), 0.85);
    assert_eq!(UserInteraction::Required.value(), 0.62);
  }

  #[test]
  fn base_score_literal_scenarios() {
    // (vector, expected) from the defining formula, tolerance 0.5.
    let cases = [
      (
        vector(
          AttackVector::Network,
          AttackComplexity::Low,
          PrivilegesRequired::None,
          UserInteraction::None,
          ImpactMetric::High,
          ImpactMetric::High,
          ImpactMetric::High,
        ),
        9.8,
      ),
      (
        vector(
          AttackVector::Network,
          AttackComplexity::Low,
          PrivilegesRequired::Low,
          UserInteraction::None,
          ImpactMetric::Low,
          ImpactMetric::Low,
          ImpactMetric::Low,
        ),
        6.3,
      ),
      (
        vector(
          AttackVector::Local,
          AttackComplexity::High,
          PrivilegesRequired::High,
          UserInteraction::Required,
          ImpactMetric::Low,
          ImpactMetric::None,
          ImpactMetric::None,
        ),
        1.8,
      ),
      (
        vector(
          AttackVector::Physical,
          AttackComplexity::High,
          PrivilegesRequired::High,
          UserInteraction::Required,
          ImpactMetric::None,
          ImpactMetric::None,
          ImpactMetric::None,
        ),
        0.0,
      ),
    ];
    for (v, expected) in cases {
      let score = base_score(&v);
      assert!(
        (score - expected).abs() <= 0.5,
        "expected ~{}, got {}",
        expected,
        score
      );
    }
  }

  #[test]
  fn base_score_is_bounded_and_one_decimal() {
    for severity in [Severity::Low, Severity::Medium, Severity::High, Severity::Critical] {
      for policy in ["Branch Protection", "Security Scanning", "Access Control", "Repository Visibility", "Other"] {
        let v = score_vector(&violation(policy, severity));
        assert!(v.base_score >= 0.0 && v.base_score <= 10.0, "{}", v.base_score);
        let scaled = v.base_score * 10.0;
        assert!((scaled - scaled.round()).abs() < 1e-9, "not one decimal: {}", v.base_score);
      }
    }
  }

  #[test]
  fn temporal_and_environmental_scale_from_base() {
    let v = score_vector(&violation("Security Scanning", Severity::Critical));
    assert!((v.temporal_score - v.base_score * 0.95).abs() < 1e-9);
    assert!((v.environmental_score - v.base_score * 1.1).abs() < 1e-9);
  }

  #[test]
  fn branch_protection_keyword_sets_privileges_required() {
    let v = score_vector(&violation("Branch Protection", Severity::Critical));
    assert_eq!(v.privileges_required, PrivilegesRequired::Low);
    // Severity override wins over the keyword's C/I/A assignments.
    assert_eq!(v.confidentiality, ImpactMetric::High);
    assert_eq!(v.integrity, ImpactMetric::High);
    assert_eq!(v.availability, ImpactMetric::High);
  }

  #[test]
  fn severity_overrides_apply_after_policy_keywords() {
    let v = score_vector(&violation("Security Scanning", Severity::High));
    assert_eq!(v.confidentiality, ImpactMetric::High);
    assert_eq!(v.integrity, ImpactMetric::High);
    assert_eq!(v.availability, ImpactMetric::Low);

    let v = score_vector(&violation("Repository Visibility", Severity::Medium));
    assert_eq!(v.confidentiality, ImpactMetric::Low);
    assert_eq!(v.integrity, ImpactMetric::Low);
    assert_eq!(v.availability, ImpactMetric::Low);

    let v = score_vector(&violation("Documentation", Severity::Low));
    assert_eq!(v.confidentiality, ImpactMetric::None);
    assert_eq!(v.integrity, ImpactMetric::Low);
    assert_eq!(v.availability, ImpactMetric::None);
  }

  #[test]
  fn risk_level_partition() {
    assert_eq!(risk_level(9.5), RiskLevel::Critical);
    assert_eq!(risk_level(9.0), RiskLevel::Critical);
    assert_eq!(risk_level(8.5), RiskLevel::High);
    assert_eq!(risk_level(7.0), RiskLevel::High);
    assert_eq!(risk_level(6.5), RiskLevel::Medium);
    assert_eq!(risk_level(4.0), RiskLevel::Medium);
    assert_eq!(risk_level(3.5), RiskLevel::Low);
    assert_eq!(risk_level(0.1), RiskLevel::Low);
    assert_eq!(risk_level(0.0), RiskLevel::None);
  }
}
