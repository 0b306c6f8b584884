//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings, enum values as their
//! display labels, and the open `extra` bag as a compact JSON object.

use coursefix_core::{
  course::{Course, CourseUpdate},
  store::MalformedCourse,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// Owner references are legacy data: anything that is not a valid id reads
/// back as "no owner" instead of failing the whole row.
fn decode_owner(course_id: Uuid, s: Option<&str>) -> Option<Uuid> {
  let s = s?;
  match Uuid::parse_str(s) {
    Ok(id) => Some(id),
    Err(_) => {
      tracing::debug!(%course_id, created_by = s, "unparseable owner reference");
      None
    }
  }
}

// ─── Extra fields ────────────────────────────────────────────────────────────

pub fn encode_extra(extra: &serde_json::Map<String, serde_json::Value>) -> Result<String> {
  Ok(serde_json::to_string(extra)?)
}

pub fn decode_extra(
  course_id: Uuid,
  s: &str,
) -> Result<serde_json::Map<String, serde_json::Value>> {
  match serde_json::from_str(s)? {
    serde_json::Value::Object(map) => Ok(map),
    _ => Err(Error::ExtraNotObject(course_id)),
  }
}

// ─── Partial update ──────────────────────────────────────────────────────────

/// `(column, value)` pairs for the fields an update writes.
pub fn encode_update(update: &CourseUpdate) -> Vec<(&'static str, String)> {
  let mut sets = Vec::new();
  if let Some(owner) = update.created_by {
    sets.push(("created_by", encode_uuid(owner)));
  }
  if let Some(v) = update.visibility {
    sets.push(("visibility", v.to_string()));
  }
  if let Some(s) = update.status {
    sets.push(("status", s.to_string()));
  }
  if let Some(c) = update.category {
    sets.push(("category", c.to_string()));
  }
  if let Some(l) = update.level {
    sets.push(("level", l.to_string()));
  }
  if let Some(slug) = &update.slug {
    sets.push(("slug", slug.clone()));
  }
  sets
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawCourse::from_row`].
pub const COURSE_COLUMNS: &str =
  "course_id, title, slug, created_by, visibility, status, category, level, extra";

/// Read column `idx` as text whatever its storage class. Legacy rows may hold
/// numbers where text is expected; those are kept as their decimal form so the
/// row still decodes.
fn text_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
  use rusqlite::types::ValueRef;

  Ok(match row.get_ref(idx)? {
    ValueRef::Null => None,
    ValueRef::Integer(i) => Some(i.to_string()),
    ValueRef::Real(f) => Some(f.to_string()),
    ValueRef::Text(b) | ValueRef::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
  })
}

/// Raw strings read directly from a `courses` row.
pub struct RawCourse {
  pub course_id:  String,
  pub title:      Option<String>,
  pub slug:       Option<String>,
  pub created_by: Option<String>,
  pub visibility: Option<String>,
  pub status:     Option<String>,
  pub category:   Option<String>,
  pub level:      Option<String>,
  pub extra:      Option<String>,
}

impl RawCourse {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:  text_column(row, 0)?.unwrap_or_default(),
      title:      text_column(row, 1)?,
      slug:       text_column(row, 2)?,
      created_by: text_column(row, 3)?,
      visibility: text_column(row, 4)?,
      status:     text_column(row, 5)?,
      category:   text_column(row, 6)?,
      level:      text_column(row, 7)?,
      extra:      text_column(row, 8)?,
    })
  }

  pub fn into_course(self) -> Result<Course> {
    let course_id = decode_uuid(&self.course_id)?;
    Ok(Course {
      course_id,
      created_by: decode_owner(course_id, self.created_by.as_deref()),
      extra: match self.extra.as_deref() {
        Some(s) => decode_extra(course_id, s)?,
        None => serde_json::Map::new(),
      },
      title: self.title,
      slug: self.slug,
      visibility: self.visibility,
      status: self.status,
      category: self.category,
      level: self.level,
    })
  }

  /// Decode the row, or describe why it cannot be decoded.
  pub fn decode(self) -> std::result::Result<Course, MalformedCourse> {
    let course_id = self.course_id.clone();
    self
      .into_course()
      .map_err(|e| MalformedCourse { course_id, error: e.to_string() })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id: String,
  pub role:    Option<String>,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { user_id: text_column(row, 0)?.unwrap_or_default(), role: text_column(row, 1)? })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User { user_id: decode_uuid(&self.user_id)?, role: self.role })
  }

  /// Decode the row, logging and dropping it when the id is unusable.
  pub fn decode_or_warn(self) -> Option<User> {
    let user_id = self.user_id.clone();
    match self.into_user() {
      Ok(user) => Some(user),
      Err(error) => {
        tracing::warn!(user_id, %error, "skipping undecodable user row");
        None
      }
    }
  }
}
