//! Error type for `staffing-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A business rule rejected the operation.
  #[error(transparent)]
  Domain(#[from] staffing_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored value could not be turned back into a domain type.
  #[error("decode error: {0}")]
  Decode(String),
}

impl Error {
  /// The domain error, if this is one.
  pub fn domain(&self) -> Option<&staffing_core::Error> {
    match self {
      Self::Domain(e) => Some(e),
      _ => None,
    }
  }
}

// Constraint failures mean the engine let something through that storage
// refuses. They surface as `InvariantViolation`, never as raw SQL text.
impl From<rusqlite::Error> for Error {
  fn from(err: rusqlite::Error) -> Self {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err
      && failure.code == rusqlite::ErrorCode::ConstraintViolation
    {
      let detail = message.clone().unwrap_or_else(|| failure.to_string());
      tracing::error!(constraint = %detail, "storage constraint rejected an engine write");
      return Self::Domain(staffing_core::Error::InvariantViolation(detail));
    }
    Self::Sqlite(err)
  }
}

/// Debug-log a rejected request. Infrastructure faults are left to the caller.
pub(crate) fn log_rejected(action: &'static str) -> impl Fn(&Error) {
  move |err| {
    if err.domain().is_some_and(staffing_core::Error::is_user_error) {
      tracing::debug!(action, error = %err, "request rejected");
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
