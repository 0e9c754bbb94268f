//! Structured error types for the compliance engine.

use thiserror::Error;

use crate::source::FetchError;

#[derive(Debug, Error)]
pub enum EngineError {
  /// The policy document could not be parsed at all.
  #[error("parse: {0}")]
  Parse(String),

  /// The policy document parsed but violates the schema.
  #[error("schema: {field}: {reason}")]
  Schema { field: String, reason: String },

  /// A request parameter is invalid (unsupported format, bad filter regex).
  /// Raised before any computation runs.
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  /// Listing repositories failed; nothing to audit.
  #[error("fetch: {0}")]
  Fetch(#[from] FetchError),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),
}

impl EngineError {
  pub fn parse(msg: impl Into<String>) -> Self {
    Self::Parse(msg.into())
  }

  pub fn schema(field: &str, reason: &str) -> Self {
    Self::Schema {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }
}
