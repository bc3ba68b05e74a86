use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::card::{Rating, SRSCard};
use crate::scheduler::apply_review;

/// One recorded answer of a learner, keyed by the card's `word_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
    pub user_id: String,
    pub card_key: String,
    pub rating: Rating,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewLogEntry {
    pub fn new(
        user_id: impl Into<String>,
        card_key: impl Into<String>,
        rating: Rating,
        reviewed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            card_key: card_key.into(),
            rating,
            reviewed_at,
        }
    }

    fn sort_key(&self) -> (DateTime<Utc>, &str, &str) {
        (self.reviewed_at, self.user_id.as_str(), self.card_key.as_str())
    }
}

/// A learner's card as log entries address it.
pub type CardKey = (String, String);

fn card_key(card: &SRSCard) -> CardKey {
    (card.user_id.clone(), card.word_id.clone())
}

/// Rebuilds a card's scheduling state and counters from its review history.
///
/// The card is reset to its creation state first, so entries must cover the
/// whole history. Entries are applied oldest first; entries with the same
/// timestamp keep their log order.
pub fn replay<'a, I>(card: &SRSCard, entries: I) -> SRSCard
where
    I: IntoIterator<Item = &'a ReviewLogEntry>,
{
    entries
        .into_iter()
        .sorted_by_key(|entry| entry.reviewed_at)
        .fold(card.reset(), |card, entry| {
            apply_review(&card, entry.rating, entry.reviewed_at)
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    /// Input cards in input order, each replayed from its own entries.
    pub cards: Vec<SRSCard>,
    /// Entries whose `(user_id, card_key)` matched none of the cards.
    pub orphaned: Vec<ReviewLogEntry>,
    /// `(user_id, word_id)` pairs shared by several input cards. Those cards
    /// are returned unchanged and their entries are not applied.
    pub ambiguous: Vec<CardKey>,
}

/// Replays a log that mixes entries of many cards and learners.
pub fn replay_log(cards: &[SRSCard], entries: Vec<ReviewLogEntry>) -> ReplayOutcome {
    let mut by_key = entries
        .into_iter()
        .into_group_map_by(|entry| (entry.user_id.clone(), entry.card_key.clone()));
    let ambiguous = cards
        .iter()
        .map(card_key)
        .duplicates()
        .sorted()
        .collect_vec();

    let cards = cards
        .iter()
        .map(|card| {
            let key = card_key(card);
            if ambiguous.contains(&key) {
                by_key.remove(&key);
                return card.clone();
            }
            match by_key.remove(&key) {
                Some(history) => replay(card, &history),
                None => card.reset(),
            }
        })
        .collect();

    if !ambiguous.is_empty() {
        warn!(
            "skipped replay of cards sharing a user and word id: {}",
            ambiguous
                .iter()
                .map(|(user_id, word_id)| format!("{user_id}/{word_id}"))
                .join(", ")
        );
    }

    let orphaned = by_key
        .into_values()
        .flatten()
        .sorted_by(|a, b| a.sort_key().cmp(&b.sort_key()))
        .collect_vec();
    if !orphaned.is_empty() {
        warn!(
            "{} review log entries reference unknown cards: {}",
            orphaned.len(),
            orphaned
                .iter()
                .map(|e| format!("{}/{}", e.user_id, e.card_key))
                .unique()
                .join(", ")
        );
    }

    ReplayOutcome {
        cards,
        orphaned,
        ambiguous,
    }
}
