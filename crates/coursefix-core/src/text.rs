//! Text folding and slug generation.
//!
//! Titles are mostly Vietnamese, so matching and slugs work on *folded*
//! text: NFD-decomposed, combining marks dropped, `đ`/`Đ` mapped to `d`,
//! lowercased.

use unicode_normalization::{UnicodeNormalization as _, char::is_combining_mark};

/// Slug used when neither the stored slug nor the title yields anything.
pub const FALLBACK_SLUG: &str = "khoa-hoc";

/// Lowercase `s` and strip diacritics.
pub fn fold(s: &str) -> String {
  s.nfd()
    .filter(|c| !is_combining_mark(*c))
    .map(|c| match c {
      'đ' | 'Đ' => 'd',
      other => other,
    })
    .flat_map(char::to_lowercase)
    .collect()
}

/// Turn free text into a URL-safe slug. May return an empty string.
pub fn slugify(s: &str) -> String {
  let kept: String = fold(s)
    .chars()
    .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
    .collect();

  let mut slug = String::with_capacity(kept.len());
  for word in kept.split_whitespace() {
    if !slug.is_empty() {
      slug.push('-');
    }
    slug.push_str(word);
  }

  let mut collapsed = String::with_capacity(slug.len());
  for c in slug.chars() {
    if c == '-' && collapsed.ends_with('-') {
      continue;
    }
    collapsed.push(c);
  }
  collapsed.trim_matches('-').to_owned()
}

/// Whether `s` is missing or only whitespace.
pub fn is_blank(s: Option<&str>) -> bool { s.is_none_or(|s| s.trim().is_empty()) }

/// The candidate slug for attempt `n`: `base`, `base-1`, `base-2`, ...
pub fn numbered_slug(base: &str, n: usize) -> String {
  if n == 0 { base.to_owned() } else { format!("{base}-{n}") }
}
