//! Heuristics that infer a category or a grade level from a course title.

use strum::IntoEnumIterator as _;

use crate::{
  course::{Category, Level},
  text::fold,
};

/// The first category, in declaration order, with a keyword that starts a
/// word of the folded title.
pub fn category_from_title(title: &str) -> Option<Category> {
  let folded = fold(title);
  Category::iter().find(|category| {
    category.keywords().iter().any(|kw| starts_word(&folded, kw))
  })
}

/// A `lop N` or `grade N` mention (N in 1..=5) in the folded title.
pub fn level_from_title(title: &str) -> Option<Level> {
  let folded = fold(title);
  let tokens: Vec<&str> = folded
    .split(|c: char| !c.is_alphanumeric())
    .filter(|t| !t.is_empty())
    .collect();

  for (i, token) in tokens.iter().enumerate() {
    for marker in ["lop", "grade"] {
      let Some(rest) = token.strip_prefix(marker) else { continue };
      // Either "lop3" in one token, or "lop" followed by "3".
      let digits = if rest.is_empty() {
        tokens.get(i + 1).copied().unwrap_or_default()
      } else {
        rest
      };
      if let Some(level) = grade(digits) {
        return Some(level);
      }
    }
  }
  None
}

/// Category for a record whose stored value is not a member of the set.
pub fn infer_category(title: &str) -> Category {
  category_from_title(title).unwrap_or_else(Category::fallback)
}

/// Level for a record whose stored value is not a member of the set.
pub fn infer_level(title: &str) -> Level {
  level_from_title(title).unwrap_or_else(Level::fallback)
}

fn grade(token: &str) -> Option<Level> {
  if token.len() != 1 {
    return None;
  }
  token.parse().ok().and_then(Level::from_grade)
}

/// Whether `needle` occurs in `haystack` at a position not preceded by an
/// alphanumeric character.
fn starts_word(haystack: &str, needle: &str) -> bool {
  haystack.match_indices(needle).any(|(at, _)| {
    haystack[..at]
      .chars()
      .next_back()
      .is_none_or(|c| !c.is_alphanumeric())
  })
}
