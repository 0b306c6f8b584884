//! [`CourseNormalizer`]: one sequential pass that brings every course record
//! into compliance with the course invariants.
//!
//! For each record a [`CourseUpdate`] is computed from the record alone plus
//! what earlier records in the same pass claimed; a non-empty update is
//! written as one partial update, an empty one is skipped.
//!
//! The slug uniqueness check and the write that follows are not atomic with
//! respect to other writers. Two passes running concurrently against the same
//! store can assign the same generated slug to two different records.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  classify::{infer_category, infer_level},
  course::{Course, CourseUpdate, Status, Visibility},
  store::{CourseStore, MalformedCourse},
  text::{FALLBACK_SLUG, is_blank, numbered_slug, slugify},
};

pub const DEFAULT_MAX_SLUG_ATTEMPTS: usize = 1000;

// ─── Options and report ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NormalizeOptions {
  /// Upper bound on candidates tried (`base`, `base-1`, ...) per record.
  pub max_slug_attempts: usize,
  /// Compute and report updates without writing them.
  pub dry_run:           bool,
}

impl Default for NormalizeOptions {
  fn default() -> Self {
    Self { max_slug_attempts: DEFAULT_MAX_SLUG_ATTEMPTS, dry_run: false }
  }
}

/// A corrective update applied (or, in a dry run, planned) for one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseChange {
  pub course_id: Uuid,
  pub title:     Option<String>,
  pub update:    CourseUpdate,
}

/// A record that could not be repaired in this pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFailure {
  /// The stored id; not necessarily a valid UUID when the row was malformed.
  pub course_id: String,
  pub error:     String,
}

impl RecordFailure {
  fn new(course_id: Uuid, error: &impl std::fmt::Display) -> Self {
    Self { course_id: course_id.to_string(), error: error.to_string() }
  }
}

impl From<MalformedCourse> for RecordFailure {
  fn from(m: MalformedCourse) -> Self { Self { course_id: m.course_id, error: m.error } }
}

/// Outcome of [`CourseNormalizer::normalize_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeReport {
  pub total_courses:  usize,
  pub updated_count:  usize,
  /// The teacher assigned to records without a valid owner.
  pub fallback_owner: Uuid,
  pub dry_run:        bool,
  pub changes:        Vec<CourseChange>,
  pub failures:       Vec<RecordFailure>,
  pub started_at:     DateTime<Utc>,
  pub finished_at:    DateTime<Utc>,
}

// ─── Pass state ──────────────────────────────────────────────────────────────

/// What a pass has learned so far.
struct Pass {
  teachers:       HashSet<Uuid>,
  fallback_owner: Uuid,
  /// Slug → the already-processed course holding it after this pass.
  claimed:        HashMap<String, Uuid>,
}

impl Pass {
  fn claimed_by_other(&self, slug: &str, course_id: Uuid) -> bool {
    self.claimed.get(slug).is_some_and(|owner| *owner != course_id)
  }

  fn claim(&mut self, slug: Option<&str>, course_id: Uuid) {
    if let Some(slug) = slug.filter(|s| !s.trim().is_empty()) {
      self.claimed.entry(slug.to_owned()).or_insert(course_id);
    }
  }
}

// ─── Normalizer ──────────────────────────────────────────────────────────────

/// Repairs every course in a [`CourseStore`].
///
/// Borrows the store for the duration of the pass; opening and closing it is
/// the caller's business.
pub struct CourseNormalizer<'s, S> {
  store:   &'s S,
  options: NormalizeOptions,
}

impl<'s, S: CourseStore> CourseNormalizer<'s, S> {
  pub fn new(store: &'s S) -> Self { Self { store, options: NormalizeOptions::default() } }

  pub fn with_options(mut self, options: NormalizeOptions) -> Self {
    self.options = options;
    self
  }

  /// Run one full pass over all courses.
  ///
  /// Fails with [`Error::NoTeacherAvailable`] before touching any record if
  /// the store holds no teacher. Failures confined to a single record are
  /// logged, collected into [`NormalizeReport::failures`], and do not stop
  /// the pass.
  pub async fn normalize_all(&self) -> Result<NormalizeReport> {
    let started_at = Utc::now();

    let teachers = self.store.list_teachers().await.map_err(Error::store)?;
    let fallback_owner = teachers
      .iter()
      .map(|t| t.user_id)
      .min()
      .ok_or(Error::NoTeacherAvailable)?;
    debug!(teachers = teachers.len(), %fallback_owner, "resolved fallback owner");

    let listing = self.store.list_courses().await.map_err(Error::store)?;
    let total_courses = listing.len();

    let mut pass = Pass {
      teachers: teachers.into_iter().map(|t| t.user_id).collect(),
      fallback_owner,
      claimed: HashMap::new(),
    };
    let mut changes = Vec::new();
    let mut failures: Vec<RecordFailure> = listing
      .malformed
      .into_iter()
      .inspect(|m| warn!(course_id = %m.course_id, error = %m.error, "malformed course row, skipping"))
      .map(RecordFailure::from)
      .collect();

    for course in &listing.courses {
      let id = course.course_id;

      let update = match self.plan(course, &pass).await {
        Ok(update) => update,
        Err(e) => {
          warn!(course_id = %id, error = %e, "cannot repair course, skipping");
          failures.push(RecordFailure::new(id, &e));
          pass.claim(course.slug.as_deref(), id);
          continue;
        }
      };

      if update.is_empty() {
        debug!(course_id = %id, "course already valid");
        pass.claim(course.slug.as_deref(), id);
        continue;
      }

      if !self.options.dry_run
        && let Err(e) = self.store.update_course(id, &update).await
      {
        warn!(course_id = %id, error = %e, "failed to write course update, skipping");
        failures.push(RecordFailure::new(id, &e));
        pass.claim(course.slug.as_deref(), id);
        continue;
      }

      info!(
        course_id = %id,
        fields = ?update.fields(),
        dry_run = self.options.dry_run,
        "updated course"
      );
      pass.claim(update.slug.as_deref().or(course.slug.as_deref()), id);
      changes.push(CourseChange { course_id: id, title: course.title.clone(), update });
    }

    let report = NormalizeReport {
      total_courses,
      updated_count: changes.len(),
      fallback_owner,
      dry_run: self.options.dry_run,
      changes,
      failures,
      started_at,
      finished_at: Utc::now(),
    };
    info!(
      updated = report.updated_count,
      total = report.total_courses,
      failed = report.failures.len(),
      "normalization pass finished"
    );
    Ok(report)
  }

  /// Compute the corrective update for one record.
  async fn plan(&self, course: &Course, pass: &Pass) -> Result<CourseUpdate> {
    let title = course.title_or_empty();
    let mut update = CourseUpdate::default();

    if !self.owner_is_valid(course, pass).await? {
      update.created_by = Some(pass.fallback_owner);
    }
    if course.visibility().is_none() {
      update.visibility = Some(Visibility::default());
    }
    if course.status().is_none() {
      update.status = Some(Status::default());
    }
    if course.category().is_none() {
      update.category = Some(infer_category(title));
    }
    if course.level().is_none() {
      update.level = Some(infer_level(title));
    }
    update.slug = self.repair_slug(course, pass).await?;

    Ok(update)
  }

  async fn owner_is_valid(&self, course: &Course, pass: &Pass) -> Result<bool> {
    let Some(owner) = course.created_by else {
      debug!(course_id = %course.course_id, "course has no owner");
      return Ok(false);
    };
    if pass.teachers.contains(&owner) {
      return Ok(true);
    }

    match self.store.get_user(owner).await.map_err(Error::store)? {
      Some(user) if user.is_teacher() => Ok(true),
      Some(user) => {
        debug!(course_id = %course.course_id, %owner, role = ?user.role, "owner is not a teacher");
        Ok(false)
      }
      None => {
        debug!(course_id = %course.course_id, %owner, "owner does not exist");
        Ok(false)
      }
    }
  }

  /// A new slug for the record, or `None` if its current one stays.
  ///
  /// A present slug stays unless an earlier record in this pass already
  /// holds it. A replacement is the first of `base`, `base-1`, `base-2`, ...
  /// that no other record holds, either in the store or in this pass.
  async fn repair_slug(&self, course: &Course, pass: &Pass) -> Result<Option<String>> {
    let id = course.course_id;
    let current = course.slug.as_deref().filter(|s| !is_blank(Some(s)));

    let base = match current {
      Some(slug) if !pass.claimed_by_other(slug, id) => return Ok(None),
      Some(slug) => slug.to_owned(),
      None => match slugify(course.title_or_empty()) {
        s if s.is_empty() => FALLBACK_SLUG.to_owned(),
        s => s,
      },
    };

    for n in 0..self.options.max_slug_attempts {
      let candidate = numbered_slug(&base, n);
      if pass.claimed_by_other(&candidate, id) {
        continue;
      }
      if self.store.slug_taken(&candidate, id).await.map_err(Error::store)? {
        continue;
      }
      return Ok(Some(candidate));
    }

    Err(Error::SlugSpaceExhausted { base, attempts: self.options.max_slug_attempts })
  }
}
