//! Relative age buckets for video timestamps.
//!
//! Thresholds are evaluated on truncated integer quotients, in order:
//! hours below 24, days below 7, weeks below 4, then months on a flat
//! 30-day divisor. The month divisor is not calendar-aware, so 28 and 29
//! days classify as `0mo`.

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

/// Coarse age of a video relative to "now".
///
/// Ordering follows elapsed time: every `Hours` bucket sorts before every
/// `Days` bucket, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeBucket {
    Hours(u64),
    Days(u64),
    Weeks(u64),
    Months(u64),
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hours(n) => write!(f, "{}h", n),
            Self::Days(n) => write!(f, "{}d", n),
            Self::Weeks(n) => write!(f, "{}w", n),
            Self::Months(n) => write!(f, "{}mo", n),
        }
    }
}

/// Classify how long ago `published` was, seen from `now`.
///
/// A `published` timestamp in the future clamps to `0h`.
pub fn classify_age(now: DateTime<Utc>, published: DateTime<Utc>) -> AgeBucket {
    let elapsed = now.signed_duration_since(published);
    if elapsed < TimeDelta::zero() {
        tracing::debug!(
            published = %published,
            now = %now,
            "Published timestamp is in the future, clamping age to 0h"
        );
        return AgeBucket::Hours(0);
    }

    // num_hours truncates toward zero, which is floor for non-negative spans
    let hours = elapsed.num_hours().unsigned_abs();
    if hours < 24 {
        return AgeBucket::Hours(hours);
    }

    let days = hours / 24;
    if days < 7 {
        return AgeBucket::Days(days);
    }

    let weeks = days / 7;
    if weeks < 4 {
        return AgeBucket::Weeks(weeks);
    }

    AgeBucket::Months(days / 30)
}
