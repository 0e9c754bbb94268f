//! Priority scoring and escalation routing.

use chrono::{DateTime, Duration, Utc};

use crate::types::{BusinessRiskFactor, Escalation, EscalationTier, Rating};

/// Priority 1-10: floor of the CVSS score plus business bonuses, clamped.
pub fn priority(cvss_score: f64, business: &BusinessRiskFactor) -> u8 {
  let mut priority = cvss_score.floor() as i32;

  priority += match business.business_criticality {
    Rating::Critical => 3,
    Rating::High => 2,
    Rating::Medium => 1,
    _ => 0,
  };
  priority += match business.compliance_impact {
    Rating::High => 2,
    Rating::Medium => 1,
    _ => 0,
  };

  priority.clamp(1, 10) as u8
}

/// Escalation routing. The CVSS score and the business criticality both
/// open the executive and management tiers; a high compliance impact opens
/// management at medium scores.
pub fn escalation(
  cvss_score: f64,
  business: &BusinessRiskFactor,
  assessed_at: DateTime<Utc>,
) -> Escalation {
  if cvss_score >= 9.0 || business.business_criticality == Rating::Critical {
    return Escalation {
      level: EscalationTier::Executive,
      required_by: assessed_at + Duration::hours(2),
      notifications_sent: 0,
      stakeholders: stakeholders(&["CISO", "CTO", "CEO"]),
      escalation_reason: "Critical security risk requires immediate executive attention"
        .to_string(),
    };
  }
  if cvss_score >= 7.0 || business.business_criticality == Rating::High {
    return Escalation {
      level: EscalationTier::Management,
      required_by: assessed_at + Duration::hours(8),
      notifications_sent: 0,
      stakeholders: stakeholders(&["Security Manager", "Engineering Manager"]),
      escalation_reason: "High-priority security issue requires management oversight".to_string(),
    };
  }
  if cvss_score >= 4.0 && business.compliance_impact == Rating::High {
    return Escalation {
      level: EscalationTier::Management,
      required_by: assessed_at + Duration::hours(24),
      notifications_sent: 0,
      stakeholders: stakeholders(&["Compliance Officer", "Security Team Lead"]),
      escalation_reason: "Compliance-related security issue requires management review"
        .to_string(),
    };
  }
  Escalation {
    level: EscalationTier::None,
    required_by: assessed_at + Duration::days(30),
    notifications_sent: 0,
    stakeholders: Vec::new(),
    escalation_reason: "No escalation required".to_string(),
  }
}

fn stakeholders(names: &[&str]) -> Vec<String> {
  names.iter().map(|s| s.to_string()).collect()
}
