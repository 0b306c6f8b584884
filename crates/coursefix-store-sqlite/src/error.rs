//! Error type for `coursefix-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// The `extra` column held JSON that is not an object.
  #[error("extra fields of course {0} are not a JSON object")]
  ExtraNotObject(uuid::Uuid),

  #[error("course not found: {0}")]
  CourseNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
