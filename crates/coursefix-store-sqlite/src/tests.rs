//! Integration tests for `SqliteStore` against an in-memory database, and
//! full normalization passes over it.

use std::collections::HashSet;

use coursefix_core::{
  Error as CoreError,
  course::{Category, Course, CourseUpdate, Level, Status, Visibility},
  normalize::{CourseNormalizer, NormalizeOptions},
  store::CourseStore,
  user::User,
};
use uuid::Uuid;

use crate::{Error, SqliteStore, encode::encode_uuid};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn teacher(n: u128) -> User {
  User { user_id: Uuid::from_u128(n), role: Some("teacher".into()) }
}

fn course(n: u128) -> Course { Course::new(Uuid::from_u128(n)) }

fn valid_course(n: u128, slug: &str, owner: Uuid) -> Course {
  Course {
    title:      Some(format!("Course {n}")),
    slug:       Some(slug.into()),
    created_by: Some(owner),
    visibility: Some("public".into()),
    status:     Some("published".into()),
    category:   Some("Toán".into()),
    level:      Some("Lớp 1".into()),
    ..course(n)
  }
}

// ─── Store contract ──────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_course_roundtrip() {
  let s = store().await;
  let mut c = course(1);
  c.title = Some("Toán lớp 3".into());
  c.slug = Some(String::new());
  c.category = Some("Math".into());
  c.extra.insert("price".into(), serde_json::json!(99));
  s.insert_course(&c).await.unwrap();

  let fetched = s.get_course(c.course_id).await.unwrap();
  assert_eq!(fetched, Some(c));
}

#[tokio::test]
async fn get_course_missing_returns_none() {
  let s = store().await;
  assert!(s.get_course(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_teachers_filters_and_orders_by_id() {
  let s = store().await;
  s.insert_user(&teacher(3)).await.unwrap();
  s.insert_user(&User { user_id: Uuid::from_u128(2), role: Some("student".into()) })
    .await
    .unwrap();
  s.insert_user(&teacher(1)).await.unwrap();
  s.insert_user(&User { user_id: Uuid::from_u128(4), role: None }).await.unwrap();

  let teachers = s.list_teachers().await.unwrap();
  let ids: Vec<Uuid> = teachers.iter().map(|t| t.user_id).collect();
  assert_eq!(ids, vec![Uuid::from_u128(1), Uuid::from_u128(3)]);

  let roleless = s.get_user(Uuid::from_u128(4)).await.unwrap().unwrap();
  assert_eq!(roleless.role, None);
  assert!(s.get_user(Uuid::from_u128(9)).await.unwrap().is_none());
}

#[tokio::test]
async fn list_courses_keeps_insertion_order() {
  let s = store().await;
  for n in [5, 1, 3] {
    s.insert_course(&course(n)).await.unwrap();
  }

  let ids: Vec<Uuid> = s.list_courses().await.unwrap().courses.iter().map(|c| c.course_id).collect();
  assert_eq!(ids, vec![Uuid::from_u128(5), Uuid::from_u128(1), Uuid::from_u128(3)]);
}

#[tokio::test]
async fn slug_taken_excludes_the_asking_course() {
  let s = store().await;
  let t = teacher(0x10);
  s.insert_course(&valid_course(1, "intro", t.user_id)).await.unwrap();

  assert!(!s.slug_taken("intro", Uuid::from_u128(1)).await.unwrap());
  assert!(s.slug_taken("intro", Uuid::from_u128(2)).await.unwrap());
  assert!(!s.slug_taken("other", Uuid::from_u128(2)).await.unwrap());
}

#[tokio::test]
async fn update_course_writes_only_named_fields() {
  let s = store().await;
  let mut c = valid_course(1, "intro", Uuid::from_u128(0x10));
  c.extra.insert("lessons".into(), serde_json::json!([1, 2, 3]));
  s.insert_course(&c).await.unwrap();

  let update = CourseUpdate {
    level: Some(Level::Lop3),
    slug: Some("intro-1".into()),
    ..Default::default()
  };
  s.update_course(c.course_id, &update).await.unwrap();

  let after = s.get_course(c.course_id).await.unwrap().unwrap();
  let mut expected = c.clone();
  update.apply_to(&mut expected);
  assert_eq!(after, expected);
  assert_eq!(after.level.as_deref(), Some("Lớp 3"));
  assert_eq!(after.extra, c.extra);
}

#[tokio::test]
async fn update_missing_course_errors() {
  let s = store().await;
  let update = CourseUpdate { status: Some(Status::Draft), ..Default::default() };

  let err = s.update_course(Uuid::from_u128(7), &update).await.unwrap_err();
  assert!(matches!(err, Error::CourseNotFound(id) if id == Uuid::from_u128(7)));
}

#[tokio::test]
async fn unparseable_owner_reads_as_missing() {
  let s = store().await;
  s.insert_course(&course(1)).await.unwrap();
  s.conn
    .call(|conn| {
      conn.execute("UPDATE courses SET created_by = 'not-a-user-id'", [])?;
      Ok(())
    })
    .await
    .unwrap();

  let c = s.get_course(Uuid::from_u128(1)).await.unwrap().unwrap();
  assert_eq!(c.created_by, None);
}

#[tokio::test]
async fn undecodable_course_rows_are_listed_as_malformed() {
  let s = store().await;
  s.insert_course(&course(1)).await.unwrap();
  s.insert_course(&course(2)).await.unwrap();
  s.insert_course(&course(3)).await.unwrap();
  let bad_extra = encode_uuid(Uuid::from_u128(2));
  s.conn
    .call(move |conn| {
      conn.execute("UPDATE courses SET extra = '[1, 2]' WHERE course_id = ?1", [bad_extra])?;
      conn.execute("INSERT INTO courses (course_id) VALUES ('legacy-42')", [])?;
      Ok(())
    })
    .await
    .unwrap();

  let listing = s.list_courses().await.unwrap();
  let ids: Vec<Uuid> = listing.courses.iter().map(|c| c.course_id).collect();
  assert_eq!(ids, vec![Uuid::from_u128(1), Uuid::from_u128(3)]);

  let bad: Vec<&str> = listing.malformed.iter().map(|m| m.course_id.as_str()).collect();
  assert_eq!(bad, vec![encode_uuid(Uuid::from_u128(2)).as_str(), "legacy-42"]);
  assert_eq!(listing.len(), 4);
}

#[tokio::test]
async fn numeric_columns_read_as_text() {
  let s = store().await;
  s.insert_course(&course(1)).await.unwrap();
  s.conn
    .call(|conn| {
      conn.execute("UPDATE courses SET title = 42, level = 3", [])?;
      Ok(())
    })
    .await
    .unwrap();

  let c = s.get_course(Uuid::from_u128(1)).await.unwrap().unwrap();
  assert_eq!(c.title.as_deref(), Some("42"));
  assert_eq!(c.level.as_deref(), Some("3"));
}

#[tokio::test]
async fn undecodable_user_rows_are_skipped() {
  let s = store().await;
  s.insert_user(&teacher(0x10)).await.unwrap();
  s.conn
    .call(|conn| {
      conn.execute("INSERT INTO users (user_id, role) VALUES ('admin', 'teacher')", [])?;
      Ok(())
    })
    .await
    .unwrap();

  let ids: Vec<Uuid> = s.list_teachers().await.unwrap().iter().map(|u| u.user_id).collect();
  assert_eq!(ids, vec![Uuid::from_u128(0x10)]);
}

// ─── Normalization scenarios ─────────────────────────────────────────────────

#[tokio::test]
async fn legacy_record_is_fully_repaired() {
  let s = store().await;
  let t1 = teacher(0x10);
  s.insert_user(&t1).await.unwrap();
  let c = Course {
    title: Some("Toán lớp 3".into()),
    slug: Some(String::new()),
    category: Some("Math".into()),
    level: Some(String::new()),
    ..course(1)
  };
  s.insert_course(&c).await.unwrap();

  let report = CourseNormalizer::new(&s).normalize_all().await.unwrap();
  assert_eq!((report.updated_count, report.total_courses), (1, 1));

  let after = s.get_course(c.course_id).await.unwrap().unwrap();
  assert_eq!(after.category(), Some(Category::Toan));
  assert_eq!(after.level(), Some(Level::Lop3));
  assert_eq!(after.created_by, Some(t1.user_id));
  assert_eq!(after.slug.as_deref(), Some("toan-lop-3"));
  assert_eq!(after.visibility(), Some(Visibility::Public));
  assert_eq!(after.status(), Some(Status::Published));
}

#[tokio::test]
async fn duplicate_slug_second_record_renamed() {
  let s = store().await;
  let t = teacher(0x10);
  s.insert_user(&t).await.unwrap();
  s.insert_course(&valid_course(1, "intro", t.user_id)).await.unwrap();
  s.insert_course(&valid_course(2, "intro", t.user_id)).await.unwrap();

  CourseNormalizer::new(&s).normalize_all().await.unwrap();

  let first = s.get_course(Uuid::from_u128(1)).await.unwrap().unwrap();
  let second = s.get_course(Uuid::from_u128(2)).await.unwrap().unwrap();
  assert_eq!(first.slug.as_deref(), Some("intro"));
  assert_eq!(second.slug.as_deref(), Some("intro-1"));
}

#[tokio::test]
async fn unique_slug_untouched_on_rerun() {
  let s = store().await;
  let t = teacher(0x10);
  s.insert_user(&t).await.unwrap();
  s.insert_course(&valid_course(1, "algebra", t.user_id)).await.unwrap();

  for _ in 0..2 {
    let report = CourseNormalizer::new(&s).normalize_all().await.unwrap();
    assert_eq!(report.updated_count, 0);
  }
  let c = s.get_course(Uuid::from_u128(1)).await.unwrap().unwrap();
  assert_eq!(c.slug.as_deref(), Some("algebra"));
}

#[tokio::test]
async fn deleted_owner_is_reassigned() {
  let s = store().await;
  let t = teacher(0x10);
  s.insert_user(&t).await.unwrap();
  s.insert_course(&valid_course(1, "a", Uuid::from_u128(0xdead))).await.unwrap();

  let report = CourseNormalizer::new(&s).normalize_all().await.unwrap();

  assert_eq!(report.changes[0].update, CourseUpdate {
    created_by: Some(t.user_id),
    ..Default::default()
  });
}

#[tokio::test]
async fn no_teacher_leaves_collection_unchanged() {
  let s = store().await;
  s.insert_user(&User { user_id: Uuid::from_u128(1), role: Some("admin".into()) })
    .await
    .unwrap();
  s.insert_course(&course(1)).await.unwrap();
  let before = s.list_courses().await.unwrap();

  let err = CourseNormalizer::new(&s).normalize_all().await.unwrap_err();

  assert!(matches!(err, CoreError::NoTeacherAvailable));
  assert_eq!(s.list_courses().await.unwrap(), before);
}

#[tokio::test]
async fn dry_run_writes_nothing() {
  let s = store().await;
  s.insert_user(&teacher(0x10)).await.unwrap();
  s.insert_course(&course(1)).await.unwrap();
  let before = s.list_courses().await.unwrap();
  let options = NormalizeOptions { dry_run: true, ..Default::default() };

  let report = CourseNormalizer::new(&s).with_options(options).normalize_all().await.unwrap();

  assert_eq!(report.updated_count, 1);
  assert_eq!(s.list_courses().await.unwrap(), before);
}

#[tokio::test]
async fn malformed_row_does_not_stop_the_pass() {
  let s = store().await;
  let t1 = teacher(0x10);
  s.insert_user(&t1).await.unwrap();
  for n in 1..=3 {
    s.insert_course(&course(n)).await.unwrap();
  }
  let bad_id = encode_uuid(Uuid::from_u128(2));
  let bad = bad_id.clone();
  s.conn
    .call(move |conn| {
      conn.execute("UPDATE courses SET extra = 'not json' WHERE course_id = ?1", [bad])?;
      Ok(())
    })
    .await
    .unwrap();

  let report = CourseNormalizer::new(&s).normalize_all().await.unwrap();
  assert_eq!(report.total_courses, 3);
  assert_eq!(report.updated_count, 2);
  assert_eq!(report.failures.len(), 1);
  assert_eq!(report.failures[0].course_id, bad_id);

  for n in [1, 3] {
    let c = s.get_course(Uuid::from_u128(n)).await.unwrap().unwrap();
    assert_eq!(c.created_by, Some(t1.user_id));
    assert_eq!(c.visibility(), Some(Visibility::Public));
    assert!(c.slug.is_some_and(|slug| !slug.is_empty()));
  }
}

// ─── Properties over a messy collection ──────────────────────────────────────

async fn messy_store() -> SqliteStore {
  let s = store().await;
  let t = teacher(0x10);
  s.insert_user(&teacher(0x20)).await.unwrap();
  s.insert_user(&t).await.unwrap();
  s.insert_user(&User { user_id: Uuid::from_u128(0x30), role: Some("student".into()) })
    .await
    .unwrap();

  let titles = [
    Some("Toán lớp 3"),
    Some("English Grade 2"),
    None,
    Some("Âm nhạc"),
    Some("Âm nhạc"),
    Some("!!!"),
    Some("Tin học cơ bản"),
  ];
  for (i, title) in titles.into_iter().enumerate() {
    let n = i as u128 + 1;
    let mut c = course(n);
    c.title = title.map(str::to_owned);
    c.slug = match n {
      1 | 2 => Some("shared".into()),
      3 => Some("  ".into()),
      4 => Some("am-nhac-1".into()),
      _ => None,
    };
    c.created_by = match n {
      1 => Some(t.user_id),
      2 => Some(Uuid::from_u128(0x30)),
      _ => Some(Uuid::from_u128(0x99)),
    };
    c.visibility = Some(if n % 2 == 0 { "hidden" } else { "private" }.into());
    c.status = Some(if n % 3 == 0 { "PUBLISHED" } else { "archived" }.into());
    c.category = Some(if n == 7 { "Tin học" } else { "misc" }.into());
    c.level = None;
    c.extra.insert("legacy_id".into(), serde_json::json!(n as u64));
    s.insert_course(&c).await.unwrap();
  }
  s
}

#[tokio::test]
async fn invariants_hold_after_one_pass() {
  let s = messy_store().await;
  let before = s.list_courses().await.unwrap().courses;

  let report = CourseNormalizer::new(&s).normalize_all().await.unwrap();
  assert!(report.failures.is_empty());
  assert_eq!(report.fallback_owner, Uuid::from_u128(0x10));

  let after = s.list_courses().await.unwrap().courses;
  assert_eq!(after.len(), before.len());

  let mut slugs = HashSet::new();
  for (old, new) in before.iter().zip(&after) {
    assert_eq!(old.course_id, new.course_id);
    assert_eq!(old.title, new.title);
    assert_eq!(old.extra, new.extra);
    assert!(new.visibility().is_some());
    assert!(new.status().is_some());
    assert!(new.category().is_some());
    assert!(new.level().is_some());

    let owner = s.get_user(new.created_by.unwrap()).await.unwrap().unwrap();
    assert!(owner.is_teacher());

    let slug = new.slug.clone().unwrap();
    assert!(!slug.trim().is_empty());
    assert!(slugs.insert(slug), "duplicate slug");
  }

  // The pre-existing unique slug is stable; the colliding ones are not.
  assert_eq!(after[3].slug.as_deref(), Some("am-nhac-1"));
  assert_eq!(after[0].slug.as_deref(), Some("shared"));
  assert_eq!(after[1].slug.as_deref(), Some("shared-1"));
  assert_eq!(after[2].slug.as_deref(), Some("khoa-hoc"));
  assert_eq!(after[4].slug.as_deref(), Some("am-nhac"));
  assert_eq!(after[5].slug.as_deref(), Some("khoa-hoc-1"));
  assert_eq!(after[6].slug.as_deref(), Some("tin-hoc-co-ban"));
}

#[tokio::test]
async fn second_pass_performs_no_updates() {
  let s = messy_store().await;

  let first = CourseNormalizer::new(&s).normalize_all().await.unwrap();
  assert_eq!(first.updated_count, first.total_courses);
  let snapshot = s.list_courses().await.unwrap();

  let second = CourseNormalizer::new(&s).normalize_all().await.unwrap();
  assert_eq!(second.updated_count, 0);
  assert_eq!(s.list_courses().await.unwrap(), snapshot);
}
