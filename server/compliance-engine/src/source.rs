//! Collaborator interface for fetching repository state.
//!
//! The engine never talks to the network; implementations of `ConfigSource`
//! own rate limiting, retries, and any fan-out bound. Demo or fixture data
//! belongs behind this trait, never inside the engine.

use thiserror::Error;

use crate::types::RepositorySnapshot;

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("rate limited, retry after {retry_after_secs}s")]
  RateLimited { retry_after_secs: u64 },

  #[error("not found: {0}")]
  NotFound(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("network failure: {0}")]
  NetworkFailure(String),
}

/// Read side of the external configuration store.
pub trait ConfigSource {
  /// Fetch the full current configuration of one repository.
  fn fetch_current(
    &self,
    organization: &str,
    repo: &str,
  ) -> Result<RepositorySnapshot, FetchError>;

  /// List the organization's repositories.
  fn list_repositories(&self, organization: &str) -> Result<Vec<RepositorySnapshot>, FetchError>;
}

/// In-memory source over pre-fetched snapshots. The binary wraps its stdin
/// payload in one; tests use it as the standard double.
pub struct StaticSource {
  snapshots: Vec<RepositorySnapshot>,
}

impl StaticSource {
  pub fn new(snapshots: Vec<RepositorySnapshot>) -> Self {
    Self { snapshots }
  }
}

impl ConfigSource for StaticSource {
  fn fetch_current(
    &self,
    _organization: &str,
    repo: &str,
  ) -> Result<RepositorySnapshot, FetchError> {
    self
      .snapshots
      .iter()
      .find(|s| s.name == repo)
      .cloned()
      .ok_or_else(|| FetchError::NotFound(repo.to_string()))
  }

  fn list_repositories(&self, _organization: &str) -> Result<Vec<RepositorySnapshot>, FetchError> {
    Ok(self.snapshots.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn static_source_finds_by_name() {
    let source = StaticSource::new(vec![RepositorySnapshot {
      name: "api".to_string(),
      ..RepositorySnapshot::default()
    }]);
    assert!(source.fetch_current("acme", "api").is_ok());
    let err = source.fetch_current("acme", "missing").unwrap_err();
    assert!(matches!(err, FetchError::NotFound(_)));
  }
}
