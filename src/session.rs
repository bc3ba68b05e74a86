use std::time::Duration;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::card::Rating;

/// One sitting of reviews, started when the review page opens and finished
/// when the learner leaves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSession {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub cards_reviewed: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    /// Seconds spent answering.
    pub total_time: f64,
    /// Seconds per answered card, filled in by [`ReviewSession::finish`].
    pub average_time: f64,
}

impl ReviewSession {
    pub fn start(user_id: impl Into<String>, lesson_id: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            lesson_id,
            start_time: now,
            end_time: None,
            cards_reviewed: 0,
            correct_count: 0,
            incorrect_count: 0,
            total_time: 0.0,
            average_time: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    /// Counts one answered card and the time it took.
    pub fn record(&mut self, rating: Rating, elapsed: Duration) {
        if self.is_finished() {
            warn!(
                "ignoring {rating} answer for finished session of user {}",
                self.user_id
            );
            return;
        }
        self.cards_reviewed += 1;
        if rating.is_correct() {
            self.correct_count += 1;
        } else {
            self.incorrect_count += 1;
        }
        self.total_time += elapsed.as_secs_f64();
    }

    /// Closes the session. Finishing twice keeps the first end time.
    pub fn finish(&mut self, now: DateTime<Utc>) {
        if self.is_finished() {
            return;
        }
        self.end_time = Some(now);
        self.average_time = if self.cards_reviewed > 0 {
            self.total_time / f64::from(self.cards_reviewed)
        } else {
            0.0
        };
    }
}
