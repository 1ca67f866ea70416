//! Plain-text formatting for terminal output.

use std::fmt::Write as _;

use shelf_api::reviews::BookReviews;
use shelf_core::{
  account::ProfileSummary,
  aggregate::RatingSummary,
  library::{CatalogListing, LibraryEntry},
  review::Review,
};

/// `★★★☆☆` for a 1–5 star value; anything above five is clamped.
pub fn stars(filled: u8) -> String {
  let filled = usize::from(filled.min(5));
  format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

pub fn summary(s: &RatingSummary) -> String {
  match s.count {
    0 => "no reviews yet".to_owned(),
    1 => format!("{} {:.1} (1 review)", stars(s.stars), s.average),
    n => format!("{} {:.1} ({n} reviews)", stars(s.stars), s.average),
  }
}

pub fn catalog(listings: &[CatalogListing]) -> String {
  let mut out = String::new();
  for l in listings {
    let mark = if l.in_library { "*" } else { " " };
    let _ = write!(out, "{mark} {:<24} {}", l.book.id.as_str(), l.book.title);
    if !l.book.authors.is_empty() {
      let _ = write!(out, " by {}", l.book.byline());
    }
    out.push('\n');
  }
  out
}

pub fn library(entries: &[LibraryEntry]) -> String {
  if entries.is_empty() {
    return "library is empty\n".to_owned();
  }
  entries
    .iter()
    .map(|e| format!("{}  {:<24} {}\n", e.entry_id, e.book_id.as_str(), e.book_title))
    .collect()
}

fn review_line(r: &Review) -> String {
  let edited = if r.updated_at.is_some() { " (edited)" } else { "" };
  format!(
    "{} {}  {}{edited}\n    {}\n",
    stars(r.rating.get()),
    r.review_id,
    r.created_at.format("%Y-%m-%d"),
    r.comment,
  )
}

pub fn book_reviews(page: &BookReviews) -> String {
  let mut out = summary(&page.summary);
  out.push('\n');
  for item in &page.reviews {
    if item.can_edit {
      out.push_str("[yours] ");
    }
    out.push_str(&review_line(&item.review));
  }
  out
}

pub fn profile(p: &ProfileSummary) -> String {
  let mut out = String::new();
  if let Some(profile) = &p.profile {
    let _ = writeln!(out, "{} {} <{}>", profile.first_name, profile.last_name, profile.email);
  }
  let _ = writeln!(out, "books in library: {}", p.library_count);
  for e in &p.library {
    let _ = writeln!(out, "  {}", e.book_title);
  }
  let _ = writeln!(out, "ratings given:    {}", summary(&p.rating));
  for r in &p.reviews {
    let _ = write!(out, "{}: ", r.book_title);
    out.push_str(&review_line(r));
  }
  out
}
