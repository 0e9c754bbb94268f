//! Audit run: fetch snapshots through a collaborator, reconcile each
//! repository, and aggregate the compliance bundle.
//!
//! Per-repository computation is independent; callers that fan out across a
//! worker pool can feed `audit::aggregate` directly, which sorts by
//! repository name regardless of arrival order. This sequential runner is the
//! reference path — the fetch bound belongs to the `ConfigSource`
//! implementation, not to the engine.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::audit;
use crate::error::EngineError;
use crate::policy::PolicyDocument;
use crate::reconcile;
use crate::source::ConfigSource;
use crate::types::{
  AuditData, ConfigurationDifference, DiffReport, DiffSummary, RepositoryFilter, RepositoryResult,
  RepositorySnapshot,
};

/// Run a full compliance audit for the document's organization.
///
/// Document problems are fatal; per-repository fetch failures are warnings
/// and the repository is skipped, so `total_repositories` counts only
/// successfully fetched repositories.
pub fn run_audit(
  source: &dyn ConfigSource,
  document: &PolicyDocument,
  filter: &RepositoryFilter,
  generated_at: DateTime<Utc>,
) -> Result<AuditData, EngineError> {
  document.validate()?;
  let results = collect_results(source, document, filter)?;
  Ok(audit::aggregate(&document.organization, generated_at, results))
}

/// Run reconciliation only and return the difference report.
pub fn run_diff(
  source: &dyn ConfigSource,
  document: &PolicyDocument,
  filter: &RepositoryFilter,
) -> Result<DiffReport, EngineError> {
  document.validate()?;
  let results = collect_results(source, document, filter)?;

  let affected_repos = results
    .iter()
    .filter(|r| !r.differences.is_empty())
    .count();
  let differences: Vec<ConfigurationDifference> = results
    .into_iter()
    .flat_map(|r| r.differences)
    .collect();

  Ok(DiffReport {
    summary: DiffSummary {
      total_changes: differences.len(),
      affected_repos,
    },
    differences,
  })
}

fn collect_results(
  source: &dyn ConfigSource,
  document: &PolicyDocument,
  filter: &RepositoryFilter,
) -> Result<Vec<RepositoryResult>, EngineError> {
  let listed = source.list_repositories(&document.organization)?;
  let selected = audit::filter_repositories(listed, filter)?;

  let mut results = Vec::with_capacity(selected.len());
  for repo in selected {
    if repo.archived {
      continue;
    }
    let current = match source.fetch_current(&document.organization, &repo.name) {
      Ok(snapshot) => snapshot,
      Err(e) => {
        warn!(repository = %repo.name, error = %e, "skipping repository, fetch failed");
        continue;
      }
    };
    results.push(reconcile_repository(document, current));
  }
  // Aggregation sorts; keep fetch order here so a fan-out caller and this
  // sequential runner end up with identical reports.
  Ok(results)
}

/// Resolve, diff and classify one repository. Pure; safe to fan out.
pub fn reconcile_repository(
  document: &PolicyDocument,
  snapshot: RepositorySnapshot,
) -> RepositoryResult {
  let effective = document.resolve(&snapshot.name);
  let differences = reconcile::diff(&snapshot, &effective);
  let violations = differences.iter().map(audit::classify).collect();
  RepositoryResult {
    template: effective.template.clone(),
    snapshot,
    differences,
    violations,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::source::{FetchError, StaticSource};
  use crate::types::RepositorySnapshot;

  struct FlakySource {
    inner: StaticSource,
    failing: String,
  }

  impl ConfigSource for FlakySource {
    fn fetch_current(
      &self,
      organization: &str,
      repo: &str,
    ) -> Result<RepositorySnapshot, FetchError> {
      if repo == self.failing {
        return Err(FetchError::NetworkFailure("connection reset".to_string()));
      }
      self.inner.fetch_current(organization, repo)
    }

    fn list_repositories(
      &self,
      organization: &str,
    ) -> Result<Vec<RepositorySnapshot>, FetchError> {
      self.inner.list_repositories(organization)
    }
  }

  fn document() -> PolicyDocument {
    PolicyDocument::from_json(
      r#"{
        "version": "1",
        "organization": "acme",
        "repositories": {
          "default": {"settings": {"private": true}}
        }
      }"#,
    )
    .unwrap()
  }

  fn snapshot(name: &str, private: bool) -> RepositorySnapshot {
    RepositorySnapshot {
      name: name.to_string(),
      private,
      ..RepositorySnapshot::default()
    }
  }

  fn now() -> DateTime<Utc> {
    "2025-03-01T12:00:00Z".parse().unwrap()
  }

  #[test]
  fn fetch_failures_skip_the_repository() {
    let source = FlakySource {
      inner: StaticSource::new(vec![
        snapshot("alpha", true),
        snapshot("broken", false),
        snapshot("gamma", false),
      ]),
      failing: "broken".to_string(),
    };
    let data = run_audit(&source, &document(), &RepositoryFilter::default(), now()).unwrap();
    // The failed repository is absent from the totals, not an error.
    assert_eq!(data.summary.total_repositories, 2);
    assert!(data.repositories.iter().all(|r| r.name != "broken"));
  }

  #[test]
  fn archived_repositories_are_skipped() {
    let mut archived = snapshot("old", false);
    archived.archived = true;
    let source = StaticSource::new(vec![archived, snapshot("live", true)]);
    let data = run_audit(&source, &document(), &RepositoryFilter::default(), now()).unwrap();
    assert_eq!(data.summary.total_repositories, 1);
    assert_eq!(data.repositories[0].name, "live");
  }

  #[test]
  fn invalid_document_is_fatal() {
    let source = StaticSource::new(Vec::new());
    let doc = PolicyDocument {
      version: "1".to_string(),
      ..PolicyDocument::default()
    };
    let err = run_audit(&source, &doc, &RepositoryFilter::default(), now()).unwrap_err();
    assert!(matches!(err, EngineError::Schema { .. }));
  }

  #[test]
  fn diff_report_counts_affected_repositories() {
    let source = StaticSource::new(vec![snapshot("a", false), snapshot("b", true)]);
    let report = run_diff(&source, &document(), &RepositoryFilter::default()).unwrap();
    // Only "a" deviates (public but target private).
    assert_eq!(report.summary.total_changes, 1);
    assert_eq!(report.summary.affected_repos, 1);
    assert_eq!(report.differences[0].setting, "visibility");
  }
}
