use chrono::{DateTime, Utc};

use crate::card::{CardStatus, SRSCard};

/// Interval, in days, from which a reviewed card counts as mastered. Product
/// policy, roughly three weeks.
pub const MASTERED_INTERVAL_DAYS: u32 = 21;

/// A card is due once its review time has arrived, inclusive of `now`.
pub fn is_due(card: &SRSCard, now: DateTime<Utc>) -> bool {
    card.next_review <= now
}

/// The due subset of `cards`, earliest due first. Cards due at the same
/// instant keep their input order.
pub fn get_due_cards<I>(cards: I, now: DateTime<Utc>) -> Vec<SRSCard>
where
    I: IntoIterator<Item = SRSCard>,
{
    let mut due = cards
        .into_iter()
        .filter(|card| is_due(card, now))
        .collect::<Vec<_>>();
    due.sort_by_key(|card| card.next_review);
    due
}

pub fn get_card_status(card: &SRSCard) -> CardStatus {
    if card.total_reviews == 0 {
        CardStatus::New
    } else if card.interval < MASTERED_INTERVAL_DAYS {
        CardStatus::Learning
    } else {
        CardStatus::Mastered
    }
}

/// Share of correct answers as a whole percentage, 0 for an unreviewed card.
pub fn calculate_accuracy(card: &SRSCard) -> u32 {
    percentage(card.correct_count.into(), card.total_reviews.into())
}

pub(crate) fn percentage(part: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

/// How many new cards to introduce today given the current review backlog.
/// Advisory only.
pub fn get_suggested_new_cards_limit(due_cards: usize) -> usize {
    match due_cards {
        51.. => 5,
        31..=50 => 10,
        21..=30 => 15,
        _ => 20,
    }
}
