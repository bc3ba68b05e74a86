use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::card::{CardStatus, SRSCard};
use crate::queries::{get_card_status, is_due, percentage};
use crate::session::ReviewSession;

/// Progress overview of one learner across all their cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_cards: usize,
    pub new_cards: usize,
    pub learning_cards: usize,
    pub mastered_cards: usize,
    pub due_today: usize,
    pub total_reviews: u64,
    /// Whole percentage of correct answers over every review.
    pub accuracy: u32,
}

impl UserStats {
    pub fn from_cards<'a, I>(cards: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a SRSCard>,
    {
        let mut stats = UserStats::default();
        let mut total_correct = 0u64;
        for card in cards {
            stats.total_cards += 1;
            match get_card_status(card) {
                CardStatus::New => stats.new_cards += 1,
                CardStatus::Learning => stats.learning_cards += 1,
                CardStatus::Mastered => stats.mastered_cards += 1,
            }
            if is_due(card, now) {
                stats.due_today += 1;
            }
            stats.total_reviews += u64::from(card.total_reviews);
            total_correct += u64::from(card.correct_count);
        }
        stats.accuracy = percentage(total_correct, stats.total_reviews);
        stats
    }
}

/// Calendar day of `instant` as seen in `tz`.
pub fn local_day<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Study activity of one learner on one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    pub user_id: String,
    pub new_cards: u32,
    pub reviewed_cards: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    /// Whole seconds.
    pub time_spent: u64,
    pub streak: u32,
}

impl DailyStats {
    /// Daily figures for a session, dated by the day it ended (or started, if
    /// still open) in `tz`. `new_cards` and `streak` come from the caller,
    /// the session does not know them.
    pub fn from_session<Tz: TimeZone>(
        session: &ReviewSession,
        tz: &Tz,
        new_cards: u32,
        streak: u32,
    ) -> Self {
        let instant = session.end_time.unwrap_or(session.start_time);
        Self {
            date: local_day(instant, tz),
            user_id: session.user_id.clone(),
            new_cards,
            reviewed_cards: session.cards_reviewed,
            correct_count: session.correct_count,
            incorrect_count: session.incorrect_count,
            time_spent: session.total_time.round() as u64,
            streak,
        }
    }

    /// Folds another record of the same learner and day into this one.
    pub fn merge(&mut self, other: &DailyStats) {
        debug_assert_eq!(self.date, other.date);
        debug_assert_eq!(self.user_id, other.user_id);
        self.new_cards += other.new_cards;
        self.reviewed_cards += other.reviewed_cards;
        self.correct_count += other.correct_count;
        self.incorrect_count += other.incorrect_count;
        self.time_spent += other.time_spent;
        self.streak = self.streak.max(other.streak);
    }
}
