//! The `CourseStore` trait.
//!
//! Implemented by storage backends (e.g. `coursefix-store-sqlite`). The
//! normalizer depends on this abstraction only, and receives the store it
//! operates on explicitly.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  course::{Course, CourseUpdate},
  user::User,
};

// ─── Listing ─────────────────────────────────────────────────────────────────

/// A stored course row that could not be decoded into a [`Course`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedCourse {
  /// The id exactly as stored; may itself be the malformed part.
  pub course_id: String,
  pub error:     String,
}

/// Every course row, split into those that decoded and those that did not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseListing {
  pub courses:   Vec<Course>,
  pub malformed: Vec<MalformedCourse>,
}

impl CourseListing {
  /// Number of rows in the collection, decodable or not.
  pub fn len(&self) -> usize { self.courses.len() + self.malformed.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// The reads and writes the normalization pass needs from a data store.
///
/// User records are only ever read. Course records are only ever partially
/// updated; nothing is created or deleted.
pub trait CourseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// All users whose role is `teacher`, ordered by ascending id. Rows that
  /// cannot be decoded are left out.
  fn list_teachers(&self) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Courses ───────────────────────────────────────────────────────────

  /// All courses, in stored order. A row that cannot be decoded is listed
  /// in [`CourseListing::malformed`] instead of failing the whole read.
  fn list_courses(&self) -> impl Future<Output = Result<CourseListing, Self::Error>> + Send + '_;

  /// Whether any course other than `excluding` currently holds `slug`.
  fn slug_taken<'a>(
    &'a self,
    slug: &'a str,
    excluding: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Write the `Some` fields of `update` to course `id` as a single atomic
  /// partial update. Fields not named by the update are left as stored.
  fn update_course<'a>(
    &'a self,
    id: Uuid,
    update: &'a CourseUpdate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
