//! Rating statistics derived from already-fetched reviews.
//!
//! Everything here is a pure function of its input; nothing is cached between
//! calls.

use serde::{Deserialize, Serialize};

use crate::{id::UserId, review::Review};

/// Mean rating in tenths of a star, rounded half-up. `0` when empty.
///
/// Integer arithmetic keeps `x.x5` boundaries exact.
fn average_tenths(reviews: &[Review]) -> u32 {
  if reviews.is_empty() {
    return 0;
  }
  let sum: u64 = reviews.iter().map(|r| u64::from(r.rating.get())).sum();
  let count = reviews.len() as u64;
  // floor(sum * 10 / count + 1/2)
  ((sum * 20 + count) / (count * 2)) as u32
}

/// Mean rating rounded half-up to one decimal; `0.0` for no reviews.
pub fn average_rating(reviews: &[Review]) -> f64 {
  f64::from(average_tenths(reviews)) / 10.0
}

/// [`average_rating`] rounded half-up to whole stars, in `0..=5`.
pub fn average_stars(reviews: &[Review]) -> u8 {
  ((average_tenths(reviews) + 5) / 10) as u8
}

/// Whether `user_id` wrote `review` and may therefore edit or delete it.
pub fn is_owner(review: &Review, user_id: &UserId) -> bool { &review.user_id == user_id }

/// Order by `created_at`, most recent first.
pub fn newest_first(mut reviews: Vec<Review>) -> Vec<Review> {
  reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
  reviews
}

/// Order by rating, highest first; equal ratings keep their input order.
pub fn by_rating_desc(mut reviews: Vec<Review>) -> Vec<Review> {
  reviews.sort_by(|a, b| b.rating.cmp(&a.rating));
  reviews
}

/// Count, one-decimal average and star readout of a set of reviews.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
  pub count:   usize,
  pub average: f64,
  pub stars:   u8,
}

pub fn summarize(reviews: &[Review]) -> RatingSummary {
  RatingSummary {
    count:   reviews.len(),
    average: average_rating(reviews),
    stars:   average_stars(reviews),
  }
}
