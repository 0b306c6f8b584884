//! Users, as far as course ownership is concerned.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The only role whose members may own a course.
pub const TEACHER_ROLE: &str = "teacher";

/// A platform user. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id: Uuid,
  /// Missing on some legacy rows.
  pub role:    Option<String>,
}

impl User {
  pub fn is_teacher(&self) -> bool { self.role.as_deref() == Some(TEACHER_ROLE) }
}
