use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::card::{MIN_EASE_FACTOR, Rating, SRSCard};

// Product-tuned interval modifiers. They have no derivation behind them; change
// them only together with the people who own the learning experience.
/// Applied to the interval of a `hard` answer.
pub const HARD_INTERVAL_MULTIPLIER: f64 = 0.8;
/// Applied to the interval of an `easy` answer.
pub const EASY_INTERVAL_MULTIPLIER: f64 = 1.3;

/// Longest interval the scheduler hands out, about a hundred years.
pub const MAX_INTERVAL_DAYS: u32 = 36500;

const PASSING_QUALITY: u8 = 3;
const FIRST_INTERVAL: u32 = 1;
const SECOND_INTERVAL: u32 = 6;

/// Scheduling fields produced by one review.
///
/// Review counters and the streak are not part of it; see [`apply_review`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdate {
    pub ease_factor: f64,
    pub interval: u32,
    pub repetitions: u32,
    pub next_review: DateTime<Utc>,
    pub last_review: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleUpdate {
    /// Writes the scheduling fields into `card`.
    ///
    /// This alone leaves `total_reviews`, `correct_count`, `incorrect_count` and
    /// `streak` untouched. A caller taking this path must update them in the
    /// same write, or the card ends up with `interval > 0` and no reviews.
    pub fn apply_to(&self, card: &mut SRSCard) {
        card.ease_factor = self.ease_factor;
        card.interval = self.interval;
        card.repetitions = self.repetitions;
        card.next_review = self.next_review;
        card.last_review = Some(self.last_review);
        card.updated_at = self.updated_at;
    }
}

/// SM-2 ease update. Only defined for passing grades; failures keep their ease.
pub fn next_ease_factor(ease_factor: f64, quality: u8) -> f64 {
    debug_assert!((PASSING_QUALITY..=5).contains(&quality));
    let q = f64::from(5 - quality);
    (ease_factor + (0.1 - q * (0.08 + q * 0.02))).max(MIN_EASE_FACTOR)
}

/// Rounds half away from zero, the rule every interval step uses.
fn round_days(days: f64) -> u32 {
    days.round().min(f64::from(MAX_INTERVAL_DAYS)) as u32
}

/// `now` moved forward by `days`, pinned to the latest representable instant.
fn days_after(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_add_signed(TimeDelta::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Computes the SM-2 transition of `card` for `rating`, reviewed at `now`.
///
/// Only `ease_factor`, `interval` and `repetitions` of the input are read.
pub fn calculate_next_review(card: &SRSCard, rating: Rating, now: DateTime<Utc>) -> ScheduleUpdate {
    debug_assert!(card.ease_factor.is_finite());
    let quality = rating.quality();

    let (ease_factor, interval, repetitions) = if quality < PASSING_QUALITY {
        (card.ease_factor, FIRST_INTERVAL, 0)
    } else {
        let ease_factor = next_ease_factor(card.ease_factor, quality);
        let repetitions = card.repetitions + 1;
        let interval = match repetitions {
            1 => FIRST_INTERVAL,
            2 => SECOND_INTERVAL,
            _ => round_days(f64::from(card.interval) * ease_factor),
        };
        let interval = match rating {
            Rating::Hard => round_days(f64::from(interval) * HARD_INTERVAL_MULTIPLIER),
            Rating::Easy => round_days(f64::from(interval) * EASY_INTERVAL_MULTIPLIER),
            Rating::Good | Rating::Again => interval,
        };
        (ease_factor, interval, repetitions)
    };
    // The lower bound is only reachable from cards stored with
    // `repetitions >= 2` and `interval == 0`.
    let interval = interval.clamp(FIRST_INTERVAL, MAX_INTERVAL_DAYS);

    ScheduleUpdate {
        ease_factor,
        interval,
        repetitions,
        next_review: days_after(now, interval),
        last_review: now,
        updated_at: now,
    }
}

/// Full review: the scheduling transition plus the counters and streak, as
/// one new card. The input is left as is.
pub fn apply_review(card: &SRSCard, rating: Rating, now: DateTime<Utc>) -> SRSCard {
    let mut next = card.clone();
    calculate_next_review(card, rating, now).apply_to(&mut next);
    next.total_reviews += 1;
    if rating.is_correct() {
        next.correct_count += 1;
        next.streak += 1;
    } else {
        next.incorrect_count += 1;
        next.streak = 0;
    }
    next
}

/// Outcome of every button for the same card and instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStates {
    pub again: ScheduleUpdate,
    pub hard: ScheduleUpdate,
    pub good: ScheduleUpdate,
    pub easy: ScheduleUpdate,
}

impl NextStates {
    pub fn get(&self, rating: Rating) -> &ScheduleUpdate {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }
}

pub fn next_states(card: &SRSCard, now: DateTime<Utc>) -> NextStates {
    NextStates {
        again: calculate_next_review(card, Rating::Again, now),
        hard: calculate_next_review(card, Rating::Hard, now),
        good: calculate_next_review(card, Rating::Good, now),
        easy: calculate_next_review(card, Rating::Easy, now),
    }
}
