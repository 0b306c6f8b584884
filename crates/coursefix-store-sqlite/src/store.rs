//! [`SqliteStore`] — the SQLite implementation of [`CourseStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use coursefix_core::{
  course::{Course, CourseUpdate},
  store::{CourseListing, CourseStore},
  user::{TEACHER_ROLE, User},
};

use crate::{
  Error, Result,
  encode::{COURSE_COLUMNS, RawCourse, RawUser, encode_extra, encode_update, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A course store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a store from a database URL: `sqlite://<path>`, `sqlite:<path>`,
  /// a bare path, or `:memory:`.
  pub async fn connect(url: &str) -> Result<Self> {
    let location = url
      .strip_prefix("sqlite://")
      .or_else(|| url.strip_prefix("sqlite:"))
      .unwrap_or(url);
    if location == ":memory:" {
      Self::open_in_memory().await
    } else {
      Self::open(location).await
    }
  }

  /// Close the underlying connection, flushing any pending work.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Seeding ───────────────────────────────────────────────────────────────

  /// Insert a user row as-is.
  pub async fn insert_user(&self, user: &User) -> Result<()> {
    let id_str = encode_uuid(user.user_id);
    let role = user.role.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, role) VALUES (?1, ?2)",
          rusqlite::params![id_str, role],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a course row as-is, invalid values included.
  pub async fn insert_course(&self, course: &Course) -> Result<()> {
    let id_str     = encode_uuid(course.course_id);
    let owner_str  = course.created_by.map(encode_uuid);
    let extra_str  = encode_extra(&course.extra)?;
    let title      = course.title.clone();
    let slug       = course.slug.clone();
    let visibility = course.visibility.clone();
    let status     = course.status.clone();
    let category   = course.category.clone();
    let level      = course.level.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO courses (
             course_id, title, slug, created_by, visibility,
             status, category, level, extra
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, title, slug, owner_str, visibility, status, category, level,
            extra_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Retrieve a course by id. Returns `None` if not found.
  pub async fn get_course(&self, id: Uuid) -> Result<Option<Course>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCourse> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = ?1"),
              rusqlite::params![id_str],
              RawCourse::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCourse::into_course).transpose()
  }
}

// ─── CourseStore impl ────────────────────────────────────────────────────────

impl CourseStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn list_teachers(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT user_id, role FROM users WHERE role = ?1 ORDER BY user_id")?;
        let rows = stmt
          .query_map(rusqlite::params![TEACHER_ROLE], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().filter_map(RawUser::decode_or_warn).collect())
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, role FROM users WHERE user_id = ?1",
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.and_then(RawUser::decode_or_warn))
  }

  // ── Courses ───────────────────────────────────────────────────────────────

  async fn list_courses(&self) -> Result<CourseListing> {
    let raws: Vec<RawCourse> = self
      .conn
      .call(|conn| {
        // rowid order is insertion order, which decides who keeps a
        // duplicated slug.
        let mut stmt =
          conn.prepare(&format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawCourse::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut listing = CourseListing::default();
    for raw in raws {
      match raw.decode() {
        Ok(course) => listing.courses.push(course),
        Err(malformed) => listing.malformed.push(malformed),
      }
    }
    Ok(listing)
  }

  async fn slug_taken(&self, slug: &str, excluding: Uuid) -> Result<bool> {
    let slug = slug.to_owned();
    let id_str = encode_uuid(excluding);

    let taken = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM courses WHERE slug = ?1 AND course_id != ?2 LIMIT 1",
              rusqlite::params![slug, id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(taken)
  }

  async fn update_course(&self, id: Uuid, update: &CourseUpdate) -> Result<()> {
    let sets = encode_update(update);
    if sets.is_empty() {
      return Ok(());
    }

    let assignments = sets
      .iter()
      .enumerate()
      .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "UPDATE courses SET {assignments} WHERE course_id = ?{}",
      sets.len() + 1
    );
    let mut values: Vec<String> = sets.into_iter().map(|(_, value)| value).collect();
    values.push(encode_uuid(id));

    // A single UPDATE statement is atomic on its own.
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(values))?))
      .await?;

    if changed == 0 {
      return Err(Error::CourseNotFound(id));
    }
    Ok(())
  }
}
