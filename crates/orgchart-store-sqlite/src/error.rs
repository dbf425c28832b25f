//! Error type for `orgchart-store-sqlite`.

use orgchart_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A hierarchy, authorization or uniqueness rule rejected the operation.
  #[error(transparent)]
  Core(#[from] orgchart_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("cannot decode column: {0}")]
  Decode(String),
}

impl StoreError for Error {
  fn into_domain(self) -> Result<orgchart_core::Error, Self> {
    match self {
      Self::Core(e) => Ok(e),
      other => Err(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
