//! Error types for `coursefix-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No user with role `teacher` exists, so there is no valid owner to
  /// assign. Raised before any record is touched.
  #[error("no user with role \"teacher\" exists; cannot repair course owners")]
  NoTeacherAvailable,

  #[error("no free slug derived from {base:?} within {attempts} attempts")]
  SlugSpaceExhausted { base: String, attempts: usize },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
