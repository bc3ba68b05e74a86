use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::card::{CardId, Rating, SRSCard, Vocabulary, initialize_srs_card};
use crate::error::{CardNotFoundSnafu, Result};
use crate::queries::get_due_cards;
use crate::scheduler::apply_review;
use crate::stats::UserStats;

/// Persistence the scheduler relies on.
///
/// Implementations own concurrency control: `create_lesson_cards` is one
/// atomic check-then-create, and `update_card` applies its closure to a single
/// consistent read and stores the result before any other update of the same
/// card can read it.
pub trait CardStore {
    /// Every card of the learner, earliest `next_review` first.
    fn user_cards(&self, user_id: &str) -> Result<Vec<SRSCard>>;

    fn lesson_cards(&self, lesson_id: &str, user_id: &str) -> Result<Vec<SRSCard>>;

    fn card(&self, id: CardId) -> Result<Option<SRSCard>>;

    /// Stores `cards` for the pair unless it already has at least one card.
    /// Returns how many cards were written, 0 when the pair was populated.
    fn create_lesson_cards(
        &self,
        lesson_id: &str,
        user_id: &str,
        cards: Vec<SRSCard>,
    ) -> Result<usize>;

    /// Replaces card `id` with `update(&current)`. Nothing is written when
    /// `update` fails.
    fn update_card<F>(&self, id: CardId, update: F) -> Result<SRSCard>
    where
        F: FnOnce(&SRSCard) -> Result<SRSCard>;
}

/// Creates one due card per vocabulary word of a lesson the learner started.
///
/// Calling it again for the same lesson and learner writes nothing.
pub fn initialize_cards_for_lesson<S: CardStore>(
    store: &S,
    lesson_id: &str,
    user_id: &str,
    vocabulary: &[Vocabulary],
    now: DateTime<Utc>,
) -> Result<usize> {
    let cards = vocabulary
        .iter()
        .map(|vocab| {
            initialize_srs_card(
                format!("{lesson_id}_{}", vocab.word),
                vocab.word.as_str(),
                vocab.definition.as_str(),
                lesson_id,
                user_id,
                now,
            )
        })
        .collect();
    let created = store.create_lesson_cards(lesson_id, user_id, cards)?;
    if created == 0 {
        info!("SRS cards already exist for lesson {lesson_id} and user {user_id}");
    } else {
        info!("initialized {created} SRS cards for lesson {lesson_id}");
    }
    Ok(created)
}

/// Records one answer for a stored card and returns the card as saved.
pub fn review_card<S: CardStore>(
    store: &S,
    id: CardId,
    rating: Rating,
    now: DateTime<Utc>,
) -> Result<SRSCard> {
    let card = store.update_card(id, |current| {
        current.validate()?;
        Ok(apply_review(current, rating, now))
    })?;
    debug!(
        "card {id} rated {rating}: interval {} days, ease {:.2}, due {}",
        card.interval, card.ease_factor, card.next_review
    );
    Ok(card)
}

pub fn due_cards_for_user<S: CardStore>(
    store: &S,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<SRSCard>> {
    Ok(get_due_cards(store.user_cards(user_id)?, now))
}

pub fn user_stats<S: CardStore>(store: &S, user_id: &str, now: DateTime<Utc>) -> Result<UserStats> {
    Ok(UserStats::from_cards(&store.user_cards(user_id)?, now))
}

#[derive(Debug, Default)]
struct MemoryCards {
    last_id: CardId,
    cards: BTreeMap<CardId, SRSCard>,
}

/// Card store held in process memory. Ids are assigned from 1 upwards.
#[derive(Debug, Default)]
pub struct MemoryCardStore {
    inner: RwLock<MemoryCards>,
}

impl MemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cards
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CardStore for MemoryCardStore {
    fn user_cards(&self, user_id: &str) -> Result<Vec<SRSCard>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut cards = inner
            .cards
            .values()
            .filter(|card| card.user_id == user_id)
            .cloned()
            .collect::<Vec<_>>();
        cards.sort_by_key(|card| card.next_review);
        Ok(cards)
    }

    fn lesson_cards(&self, lesson_id: &str, user_id: &str) -> Result<Vec<SRSCard>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .cards
            .values()
            .filter(|card| card.lesson_id == lesson_id && card.user_id == user_id)
            .cloned()
            .collect())
    }

    fn card(&self, id: CardId) -> Result<Option<SRSCard>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.cards.get(&id).cloned())
    }

    fn create_lesson_cards(
        &self,
        lesson_id: &str,
        user_id: &str,
        cards: Vec<SRSCard>,
    ) -> Result<usize> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner
            .cards
            .values()
            .any(|card| card.lesson_id == lesson_id && card.user_id == user_id)
        {
            return Ok(0);
        }
        let created = cards.len();
        for mut card in cards {
            inner.last_id += 1;
            let id = inner.last_id;
            card.id = Some(id);
            inner.cards.insert(id, card);
        }
        Ok(created)
    }

    fn update_card<F>(&self, id: CardId, update: F) -> Result<SRSCard>
    where
        F: FnOnce(&SRSCard) -> Result<SRSCard>,
    {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let current = inner
            .cards
            .get_mut(&id)
            .ok_or_else(|| CardNotFoundSnafu { id }.build())?;
        let mut updated = update(current)?;
        updated.id = Some(id);
        *current = updated.clone();
        Ok(updated)
    }
}
