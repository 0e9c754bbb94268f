//! Reconcile a repository snapshot against its resolved target configuration.
//!
//! Differences come out in a fixed field order (the order the checks run) and
//! are never resorted; repeated runs over the same inputs produce the same
//! list byte for byte.

use crate::policy::{EffectiveConfig, PolicyException};
use crate::types::{ChangeAction, ConfigurationDifference, Impact, RepositorySnapshot};

/// Compare one snapshot against its effective target configuration.
pub fn diff(current: &RepositorySnapshot, effective: &EffectiveConfig) -> Vec<ConfigurationDifference> {
  let mut out = Vec::new();

  if let Some(settings) = &effective.settings {
    if let Some(target) = &settings.description {
      if &current.description != target {
        out.push(text_diff(current, effective, "description", &current.description, target, Impact::Low));
      }
    }
    if let Some(target) = &settings.homepage {
      if &current.homepage != target {
        out.push(text_diff(current, effective, "homepage", &current.homepage, target, Impact::Low));
      }
    }
    // Visibility renders the boolean as public/private strings.
    if let Some(target) = settings.private {
      if current.private != target {
        out.push(ConfigurationDifference {
          repository: current.name.clone(),
          setting: "visibility".to_string(),
          current_value: visibility_label(current.private).to_string(),
          target_value: visibility_label(target).to_string(),
          change_action: ChangeAction::Update,
          impact: Impact::High,
          template: effective.template.clone(),
          compliant: false,
        });
      }
    }
    // Feature flags.
    flag_diff(&mut out, current, effective, "features.issues", current.has_issues, settings.has_issues, Impact::Low);
    flag_diff(&mut out, current, effective, "features.wiki", current.has_wiki, settings.has_wiki, Impact::Low);
    flag_diff(&mut out, current, effective, "features.projects", current.has_projects, settings.has_projects, Impact::Low);
    // Merge behavior.
    flag_diff(&mut out, current, effective, "merge.allow_squash_merge", current.allow_squash_merge, settings.allow_squash_merge, Impact::Medium);
    flag_diff(&mut out, current, effective, "merge.allow_merge_commit", current.allow_merge_commit, settings.allow_merge_commit, Impact::Medium);
    flag_diff(&mut out, current, effective, "merge.allow_rebase_merge", current.allow_rebase_merge, settings.allow_rebase_merge, Impact::Medium);
    flag_diff(&mut out, current, effective, "merge.delete_branch_on_merge", current.delete_branch_on_merge, settings.delete_branch_on_merge, Impact::Medium);
  }

  if let Some(security) = &effective.security {
    for (branch, target) in &security.branch_protection {
      match current.branch_protection.get(branch) {
        None => {
          // No protection at all: a single create difference when the target
          // actually requires reviews.
          if target.required_reviews.is_some_and(|r| r > 0) {
            out.push(ConfigurationDifference {
              repository: current.name.clone(),
              setting: format!("branch_protection.{}.required_reviews", branch),
              current_value: "0".to_string(),
              target_value: target.required_reviews.unwrap_or(0).to_string(),
              change_action: ChangeAction::Create,
              impact: Impact::High,
              template: effective.template.clone(),
              compliant: false,
            });
          }
        }
        Some(rule) => {
          if let Some(required) = target.required_reviews {
            if rule.required_reviews != required {
              out.push(ConfigurationDifference {
                repository: current.name.clone(),
                setting: format!("branch_protection.{}.required_reviews", branch),
                current_value: rule.required_reviews.to_string(),
                target_value: required.to_string(),
                change_action: ChangeAction::Update,
                impact: Impact::Medium,
                template: effective.template.clone(),
                compliant: false,
              });
            }
          }
          if let Some(enforce) = target.enforce_admins {
            if rule.enforce_admins != enforce {
              out.push(ConfigurationDifference {
                repository: current.name.clone(),
                setting: format!("branch_protection.{}.enforce_admins", branch),
                current_value: rule.enforce_admins.to_string(),
                target_value: enforce.to_string(),
                change_action: ChangeAction::Update,
                impact: Impact::High,
                template: effective.template.clone(),
                compliant: false,
              });
            }
          }
        }
      }
    }
  }

  if let Some(permissions) = &effective.permissions {
    for (team, target_perm) in &permissions.team_permissions {
      match current.team_permissions.get(team) {
        None => out.push(ConfigurationDifference {
          repository: current.name.clone(),
          setting: format!("permissions.team.{}", team),
          current_value: "none".to_string(),
          target_value: target_perm.clone(),
          change_action: ChangeAction::Create,
          impact: Impact::Medium,
          template: effective.template.clone(),
          compliant: false,
        }),
        Some(current_perm) if current_perm != target_perm => {
          out.push(ConfigurationDifference {
            repository: current.name.clone(),
            setting: format!("permissions.team.{}", team),
            current_value: current_perm.clone(),
            target_value: target_perm.clone(),
            change_action: ChangeAction::Update,
            impact: Impact::Medium,
            template: effective.template.clone(),
            compliant: false,
          });
        }
        Some(_) => {}
      }
    }
  }

  apply_exceptions(out, &effective.exceptions)
}

/// Change action from value presence. Both-empty still counts as update.
pub fn change_action(current: &str, target: &str) -> ChangeAction {
  if current.is_empty() && !target.is_empty() {
    ChangeAction::Create
  } else if !current.is_empty() && target.is_empty() {
    ChangeAction::Delete
  } else {
    ChangeAction::Update
  }
}

/// Extension point for policy exceptions. Exceptions are matched by
/// (repository, setting) but do not yet suppress or down-weight anything;
/// the list passes through unchanged.
pub fn apply_exceptions(
  differences: Vec<ConfigurationDifference>,
  exceptions: &[PolicyException],
) -> Vec<ConfigurationDifference> {
  if !exceptions.is_empty() {
    let matched = differences
      .iter()
      .filter(|d| {
        exceptions
          .iter()
          .any(|e| e.repository == d.repository && e.setting == d.setting)
      })
      .count();
    tracing::debug!(matched, "policy exceptions matched, pass-through");
  }
  differences
}

fn visibility_label(private: bool) -> &'static str {
  if private {
    "private"
  } else {
    "public"
  }
}

/// Free-text field difference; action follows the presence rule.
fn text_diff(
  current: &RepositorySnapshot,
  effective: &EffectiveConfig,
  setting: &str,
  current_value: &str,
  target_value: &str,
  impact: Impact,
) -> ConfigurationDifference {
  ConfigurationDifference {
    repository: current.name.clone(),
    setting: setting.to_string(),
    current_value: current_value.to_string(),
    target_value: target_value.to_string(),
    change_action: change_action(current_value, target_value),
    impact,
    template: effective.template.clone(),
    compliant: false,
  }
}

/// Boolean flag difference; always an update.
fn flag_diff(
  out: &mut Vec<ConfigurationDifference>,
  current: &RepositorySnapshot,
  effective: &EffectiveConfig,
  setting: &str,
  current_value: bool,
  target: Option<bool>,
  impact: Impact,
) {
  let Some(target_value) = target else { return };
  if current_value == target_value {
    return;
  }
  out.push(ConfigurationDifference {
    repository: current.name.clone(),
    setting: setting.to_string(),
    current_value: current_value.to_string(),
    target_value: target_value.to_string(),
    change_action: ChangeAction::Update,
    impact,
    template: effective.template.clone(),
    compliant: false,
  });
}
