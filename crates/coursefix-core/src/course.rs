//! Course records and the closed value sets their fields must belong to.
//!
//! A [`Course`] is a legacy document: the invariant-bearing fields are held
//! exactly as stored, so a record can be loaded no matter how broken it is.
//! The typed enums below define what "valid" means; [`CourseUpdate`] only
//! ever carries typed values.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

// ─── Closed value sets ───────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
  /// Applied when the stored value is missing or foreign.
  #[default]
  Public,
  Private,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
  Draft,
  /// Applied when the stored value is missing or foreign.
  #[default]
  Published,
  Archived,
}

/// Subject categories. Declaration order is significant: it is the order
/// keyword inference tries them in, and the first one is the fallback.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumIter, EnumString,
)]
pub enum Category {
  #[serde(rename = "Toán")]
  #[strum(serialize = "Toán")]
  Toan,
  #[serde(rename = "Tiếng Việt")]
  #[strum(serialize = "Tiếng Việt")]
  TiengViet,
  #[serde(rename = "Tiếng Anh")]
  #[strum(serialize = "Tiếng Anh")]
  TiengAnh,
  #[serde(rename = "Khoa học")]
  #[strum(serialize = "Khoa học")]
  KhoaHoc,
  #[serde(rename = "Tin học")]
  #[strum(serialize = "Tin học")]
  TinHoc,
  #[serde(rename = "Mỹ thuật")]
  #[strum(serialize = "Mỹ thuật")]
  MyThuat,
  #[serde(rename = "Âm nhạc")]
  #[strum(serialize = "Âm nhạc")]
  AmNhac,
}

impl Category {
  /// Folded keywords that identify this category in a title.
  pub fn keywords(self) -> &'static [&'static str] {
    match self {
      Self::Toan => &["toan", "math"],
      Self::TiengViet => &["tieng viet", "vietnamese"],
      Self::TiengAnh => &["tieng anh", "english", "anh"],
      Self::KhoaHoc => &["khoa hoc", "science"],
      Self::TinHoc => &["tin hoc", "informatic", "computer"],
      Self::MyThuat => &["my thuat", "art"],
      Self::AmNhac => &["am nhac", "music"],
    }
  }

  pub fn fallback() -> Self { Self::Toan }
}

/// Grade levels, in ascending order; the first one is the fallback.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumIter, EnumString,
)]
pub enum Level {
  #[serde(rename = "Lớp 1")]
  #[strum(serialize = "Lớp 1")]
  Lop1,
  #[serde(rename = "Lớp 2")]
  #[strum(serialize = "Lớp 2")]
  Lop2,
  #[serde(rename = "Lớp 3")]
  #[strum(serialize = "Lớp 3")]
  Lop3,
  #[serde(rename = "Lớp 4")]
  #[strum(serialize = "Lớp 4")]
  Lop4,
  #[serde(rename = "Lớp 5")]
  #[strum(serialize = "Lớp 5")]
  Lop5,
}

impl Level {
  pub fn from_grade(grade: u32) -> Option<Self> {
    match grade {
      1 => Some(Self::Lop1),
      2 => Some(Self::Lop2),
      3 => Some(Self::Lop3),
      4 => Some(Self::Lop4),
      5 => Some(Self::Lop5),
      _ => None,
    }
  }

  pub fn fallback() -> Self { Self::Lop1 }
}

/// Parse a stored value into a member of a closed set. Matching is exact:
/// `"Public"` or `"toán"` are not members.
fn member<T: FromStr>(raw: Option<&str>) -> Option<T> { raw.and_then(|s| s.parse().ok()) }

// ─── Course ──────────────────────────────────────────────────────────────────

/// A course document as stored, possibly violating any invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
  pub course_id:  Uuid,
  pub title:      Option<String>,
  pub slug:       Option<String>,
  /// `None` when missing or when the stored reference is not a valid id.
  pub created_by: Option<Uuid>,
  pub visibility: Option<String>,
  pub status:     Option<String>,
  pub category:   Option<String>,
  pub level:      Option<String>,
  /// Every other field of the document, untouched by normalization.
  #[serde(default)]
  pub extra:      serde_json::Map<String, serde_json::Value>,
}

impl Course {
  /// A blank record with only an id; fields are filled in by the caller.
  pub fn new(course_id: Uuid) -> Self {
    Self {
      course_id,
      title: None,
      slug: None,
      created_by: None,
      visibility: None,
      status: None,
      category: None,
      level: None,
      extra: serde_json::Map::new(),
    }
  }

  pub fn visibility(&self) -> Option<Visibility> { member(self.visibility.as_deref()) }

  pub fn status(&self) -> Option<Status> { member(self.status.as_deref()) }

  pub fn category(&self) -> Option<Category> { member(self.category.as_deref()) }

  pub fn level(&self) -> Option<Level> { member(self.level.as_deref()) }

  pub fn title_or_empty(&self) -> &str { self.title.as_deref().unwrap_or_default() }
}

// ─── Partial update ──────────────────────────────────────────────────────────

/// A corrective partial update: only `Some` fields are written.
///
/// Serializes to a compact object holding just the changed fields, which is
/// what the run summary prints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub created_by: Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub visibility: Option<Visibility>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status:     Option<Status>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category:   Option<Category>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub level:      Option<Level>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub slug:       Option<String>,
}

impl CourseUpdate {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// Names of the fields this update writes, in column order.
  pub fn fields(&self) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if self.created_by.is_some() {
      fields.push("created_by");
    }
    if self.visibility.is_some() {
      fields.push("visibility");
    }
    if self.status.is_some() {
      fields.push("status");
    }
    if self.category.is_some() {
      fields.push("category");
    }
    if self.level.is_some() {
      fields.push("level");
    }
    if self.slug.is_some() {
      fields.push("slug");
    }
    fields
  }

  /// Apply this update to an in-memory record.
  pub fn apply_to(&self, course: &mut Course) {
    if let Some(owner) = self.created_by {
      course.created_by = Some(owner);
    }
    if let Some(v) = self.visibility {
      course.visibility = Some(v.to_string());
    }
    if let Some(s) = self.status {
      course.status = Some(s.to_string());
    }
    if let Some(c) = self.category {
      course.category = Some(c.to_string());
    }
    if let Some(l) = self.level {
      course.level = Some(l.to_string());
    }
    if let Some(slug) = &self.slug {
      course.slug = Some(slug.clone());
    }
  }
}
