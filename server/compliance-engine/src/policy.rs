//! Policy document schema, validation, and the desired-state resolver.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Document schema (JSON contract — what the loader collaborator hands us)
// ---------------------------------------------------------------------------

/// Organization policy document: templates, pattern rules, per-repo
/// overrides, and policy exceptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyDocument {
  #[serde(default)]
  pub version: String,
  #[serde(default)]
  pub organization: String,
  #[serde(default)]
  pub defaults: Option<TargetEntry>,
  #[serde(default)]
  pub templates: BTreeMap<String, TemplateEntry>,
  #[serde(default)]
  pub repositories: Option<RepositoryTargets>,
  #[serde(default)]
  pub exceptions: Vec<PolicyException>,
}

/// A target layer: an optional template reference plus inline settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetEntry {
  #[serde(default)]
  pub template: Option<String>,
  #[serde(default)]
  pub settings: Option<TargetSettings>,
  #[serde(default)]
  pub security: Option<TargetSecurity>,
  #[serde(default)]
  pub permissions: Option<TargetPermissions>,
}

/// A reusable configuration template. `base` names another template whose
/// settings this one refines; chains merge root-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateEntry {
  #[serde(default)]
  pub base: Option<String>,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub settings: Option<TargetSettings>,
  #[serde(default)]
  pub security: Option<TargetSecurity>,
  #[serde(default)]
  pub permissions: Option<TargetPermissions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryTargets {
  #[serde(default)]
  pub specific: Vec<SpecificEntry>,
  #[serde(default)]
  pub patterns: Vec<PatternEntry>,
  #[serde(default)]
  pub default: Option<TargetEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecificEntry {
  pub name: String,
  #[serde(flatten)]
  pub entry: TargetEntry,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternEntry {
  /// Glob pattern matched against the repository name.
  #[serde(rename = "match")]
  pub match_pattern: String,
  #[serde(flatten)]
  pub entry: TargetEntry,
}

/// Suppression rule for a (repository, setting-path) pair. Matched after
/// reconciliation; see `reconcile::apply_exceptions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyException {
  pub repository: String,
  pub setting: String,
  #[serde(default)]
  pub reason: String,
}

// ---------------------------------------------------------------------------
// Target settings (every field optional: present = must match)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetSettings {
  pub description: Option<String>,
  pub homepage: Option<String>,
  pub private: Option<bool>,
  pub has_issues: Option<bool>,
  pub has_wiki: Option<bool>,
  pub has_projects: Option<bool>,
  pub allow_squash_merge: Option<bool>,
  pub allow_merge_commit: Option<bool>,
  pub allow_rebase_merge: Option<bool>,
  pub delete_branch_on_merge: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetSecurity {
  #[serde(default)]
  pub branch_protection: BTreeMap<String, BranchProtectionTarget>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchProtectionTarget {
  pub required_reviews: Option<u32>,
  pub enforce_admins: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetPermissions {
  #[serde(default)]
  pub team_permissions: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Resolver output
// ---------------------------------------------------------------------------

/// Effective target configuration for one repository.
#[derive(Debug, Clone, Default)]
pub struct EffectiveConfig {
  pub settings: Option<TargetSettings>,
  pub security: Option<TargetSecurity>,
  pub permissions: Option<TargetPermissions>,
  pub exceptions: Vec<PolicyException>,
  /// Name of the template that applies, "none" when nothing names one.
  pub template: String,
}

impl PolicyDocument {
  /// Parse a policy document from JSON and validate it against the schema.
  pub fn from_json(raw: &str) -> Result<Self, EngineError> {
    let doc: PolicyDocument =
      serde_json::from_str(raw).map_err(|e| EngineError::parse(e.to_string()))?;
    doc.validate()?;
    Ok(doc)
  }

  /// Validate; the first schema problem is the error.
  pub fn validate(&self) -> Result<(), EngineError> {
    match self.lint().into_iter().next() {
      Some((field, reason)) => Err(EngineError::Schema { field, reason }),
      None => Ok(()),
    }
  }

  /// Collect every schema problem as (field, reason) pairs.
  pub fn lint(&self) -> Vec<(String, String)> {
    let mut problems = Vec::new();

    if self.version.is_empty() {
      problems.push(("version".to_string(), "is required".to_string()));
    }
    if self.organization.is_empty() {
      problems.push(("organization".to_string(), "is required".to_string()));
    }

    for (name, template) in &self.templates {
      if let Some(reason) = self.check_template_chain(name, template) {
        problems.push((format!("templates.{}", name), reason));
      }
    }

    if let Some(targets) = &self.repositories {
      for (i, specific) in targets.specific.iter().enumerate() {
        if specific.name.is_empty() {
          problems.push((
            format!("repositories.specific[{}].name", i),
            "is required".to_string(),
          ));
        }
      }
      for (i, pattern) in targets.patterns.iter().enumerate() {
        if pattern.match_pattern.is_empty() {
          problems.push((
            format!("repositories.patterns[{}].match", i),
            "is required".to_string(),
          ));
        }
      }
    }

    problems
  }

  /// Walk a template's `base` chain: unknown base or a cycle is a problem.
  fn check_template_chain(&self, name: &str, template: &TemplateEntry) -> Option<String> {
    let mut visited = BTreeSet::new();
    visited.insert(name.to_string());

    let mut current = template;
    while let Some(base) = &current.base {
      if !visited.insert(base.clone()) {
        return Some("circular template inheritance".to_string());
      }
      match self.templates.get(base) {
        Some(next) => current = next,
        None => return Some(format!("base template '{}' not found", base)),
      }
    }
    None
  }

  /// Resolve the effective target configuration for `repo_name`.
  ///
  /// Layers merge lowest to highest precedence: document defaults, the
  /// repositories default entry, the first matching pattern rule, the
  /// exact-name entry. Each layer expands its template reference first and
  /// then overlays its inline settings.
  pub fn resolve(&self, repo_name: &str) -> EffectiveConfig {
    let mut effective = EffectiveConfig {
      template: self.applied_template(repo_name),
      ..EffectiveConfig::default()
    };

    if let Some(defaults) = &self.defaults {
      self.overlay(&mut effective, defaults);
    }

    if let Some(targets) = &self.repositories {
      if let Some(default) = &targets.default {
        self.overlay(&mut effective, default);
      }
      if let Some(pattern) = targets
        .patterns
        .iter()
        .find(|p| match_repo_pattern(repo_name, &p.match_pattern))
      {
        self.overlay(&mut effective, &pattern.entry);
      }
      if let Some(specific) = targets.specific.iter().find(|s| s.name == repo_name) {
        self.overlay(&mut effective, &specific.entry);
      }
    }

    effective.exceptions = self
      .exceptions
      .iter()
      .filter(|e| e.repository == repo_name)
      .cloned()
      .collect();

    effective
  }

  /// Name of the template that applies to `repo_name`: the most specific
  /// matching level that names one, "none" otherwise.
  pub fn applied_template(&self, repo_name: &str) -> String {
    if let Some(targets) = &self.repositories {
      for specific in &targets.specific {
        if specific.name == repo_name {
          if let Some(t) = &specific.entry.template {
            return t.clone();
          }
        }
      }
      for pattern in &targets.patterns {
        if match_repo_pattern(repo_name, &pattern.match_pattern) {
          if let Some(t) = &pattern.entry.template {
            return t.clone();
          }
        }
      }
      if let Some(default) = &targets.default {
        if let Some(t) = &default.template {
          return t.clone();
        }
      }
    }
    if let Some(defaults) = &self.defaults {
      if let Some(t) = &defaults.template {
        return t.clone();
      }
    }
    "none".to_string()
  }

  /// Overlay one target layer (template chain first, inline second).
  fn overlay(&self, effective: &mut EffectiveConfig, entry: &TargetEntry) {
    if let Some(template) = &entry.template {
      for layer in self.template_chain(template) {
        merge_settings(&mut effective.settings, layer.settings.as_ref());
        merge_security(&mut effective.security, layer.security.as_ref());
        merge_permissions(&mut effective.permissions, layer.permissions.as_ref());
      }
    }
    merge_settings(&mut effective.settings, entry.settings.as_ref());
    merge_security(&mut effective.security, entry.security.as_ref());
    merge_permissions(&mut effective.permissions, entry.permissions.as_ref());
  }

  /// Template plus its ancestors, root-first. Unknown names resolve to an
  /// empty chain; cycles were rejected at validation time.
  fn template_chain<'a>(&'a self, name: &str) -> Vec<&'a TemplateEntry> {
    let mut chain = Vec::new();
    let mut visited = BTreeSet::new();
    let mut current = name.to_string();
    while let Some(template) = self.templates.get(&current) {
      if !visited.insert(current.clone()) {
        break;
      }
      chain.push(template);
      match &template.base {
        Some(base) => current = base.clone(),
        None => break,
      }
    }
    chain.reverse();
    chain
  }
}

/// Glob match against a repository name: `*` becomes `.*`, dots are
/// escaped, the pattern is anchored. A pattern without `*` is an exact
/// string compare. Case-sensitive.
pub fn match_repo_pattern(name: &str, pattern: &str) -> bool {
  if !pattern.contains('*') {
    return name == pattern;
  }
  let escaped = pattern.replace('.', "\\.").replace('*', ".*");
  match Regex::new(&format!("^{}$", escaped)) {
    Ok(re) => re.is_match(name),
    Err(_) => false,
  }
}

// ---------------------------------------------------------------------------
// Field-wise merges (override wins when present)
// ---------------------------------------------------------------------------

fn merge_settings(base: &mut Option<TargetSettings>, over: Option<&TargetSettings>) {
  let Some(over) = over else { return };
  let out = base.get_or_insert_with(TargetSettings::default);

  macro_rules! take {
    ($field:ident) => {
      if over.$field.is_some() {
        out.$field = over.$field.clone();
      }
    };
  }
  take!(description);
  take!(homepage);
  take!(private);
  take!(has_issues);
  take!(has_wiki);
  take!(has_projects);
  take!(allow_squash_merge);
  take!(allow_merge_commit);
  take!(allow_rebase_merge);
  take!(delete_branch_on_merge);
}

fn merge_security(base: &mut Option<TargetSecurity>, over: Option<&TargetSecurity>) {
  let Some(over) = over else { return };
  let out = base.get_or_insert_with(TargetSecurity::default);
  for (branch, rule) in &over.branch_protection {
    let merged = out.branch_protection.entry(branch.clone()).or_default();
    if rule.required_reviews.is_some() {
      merged.required_reviews = rule.required_reviews;
    }
    if rule.enforce_admins.is_some() {
      merged.enforce_admins = rule.enforce_admins;
    }
  }
}

fn merge_permissions(base: &mut Option<TargetPermissions>, over: Option<&TargetPermissions>) {
  let Some(over) = over else { return };
  let out = base.get_or_insert_with(TargetPermissions::default);
  for (team, perm) in &over.team_permissions {
    out.team_permissions.insert(team.clone(), perm.clone());
  }
}
