use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{InvalidCardStateSnafu, InvalidRatingSnafu, Result, SRSError};

/// Storage-assigned identifier of a card.
pub type CardId = i64;

/// Ease factor every card starts with.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;
/// Floor applied to the ease factor after every successful review.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// The four answer buttons shown after a card is revealed.
///
/// Discriminants follow the 1-4 button numbering.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Rating {
    /// Total failure to recall.
    Again = 1,
    /// Correct, with serious difficulty.
    Hard = 2,
    /// Correct after a slight hesitation.
    Good = 3,
    /// Immediate, confident recall.
    Easy = 4,
}

impl Rating {
    /// SM-2 quality grade on the 0-5 scale.
    pub fn quality(self) -> u8 {
        match self {
            Rating::Again => 0,
            Rating::Hard => 3,
            Rating::Good => 4,
            Rating::Easy => 5,
        }
    }

    /// Everything but `again` counts as a correct answer.
    pub fn is_correct(self) -> bool {
        self != Rating::Again
    }

    /// Parses the lowercase rating name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse::<Rating>()
            .map_err(|_| InvalidRatingSnafu { value: name }.build())
    }
}

impl TryFrom<u8> for Rating {
    type Error = SRSError;

    fn try_from(button: u8) -> Result<Self> {
        match button {
            1 => Ok(Rating::Again),
            2 => Ok(Rating::Hard),
            3 => Ok(Rating::Good),
            4 => Ok(Rating::Easy),
            _ => InvalidRatingSnafu {
                value: button.to_string(),
            }
            .fail(),
        }
    }
}

/// Derived learning stage of a card. Never stored.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CardStatus {
    New,
    Learning,
    Mastered,
}

/// A vocabulary entry a lesson hands over when its cards are created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub word: String,
    pub definition: String,
}

impl Vocabulary {
    pub fn new(word: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            definition: definition.into(),
        }
    }
}

/// Scheduling state of one word for one learner in one lesson.
///
/// Field names serialize in camelCase to match the card documents kept by the
/// web client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SRSCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CardId>,
    pub word_id: String,
    pub word: String,
    pub definition: String,

    pub ease_factor: f64,
    /// Days until the next review. 0 only before the first review.
    pub interval: u32,
    /// Consecutive successful reviews since creation or the last lapse.
    pub repetitions: u32,
    pub next_review: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review: Option<DateTime<Utc>>,

    pub total_reviews: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub streak: u32,

    pub lesson_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SRSCard {
    /// Checks the invariants a stored card must satisfy before it is scheduled.
    pub fn validate(&self) -> Result<()> {
        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE_FACTOR {
            return InvalidCardStateSnafu {
                reason: format!("ease factor {} below {MIN_EASE_FACTOR}", self.ease_factor),
            }
            .fail();
        }
        if u64::from(self.total_reviews)
            != u64::from(self.correct_count) + u64::from(self.incorrect_count)
        {
            return InvalidCardStateSnafu {
                reason: format!(
                    "{} total reviews but {} correct and {} incorrect",
                    self.total_reviews, self.correct_count, self.incorrect_count
                ),
            }
            .fail();
        }
        if self.interval == 0 && self.total_reviews > 0 {
            return InvalidCardStateSnafu {
                reason: "reviewed card has a zero interval",
            }
            .fail();
        }
        Ok(())
    }

    /// Same card with every scheduling and counter field back at its creation
    /// values. Identity, text and `created_at` are kept.
    pub fn reset(&self) -> SRSCard {
        SRSCard {
            ease_factor: INITIAL_EASE_FACTOR,
            interval: 0,
            repetitions: 0,
            next_review: self.created_at,
            last_review: None,
            total_reviews: 0,
            correct_count: 0,
            incorrect_count: 0,
            streak: 0,
            updated_at: self.created_at,
            ..self.clone()
        }
    }
}

/// Builds a never-reviewed card that is due immediately.
pub fn initialize_srs_card(
    word_id: impl Into<String>,
    word: impl Into<String>,
    definition: impl Into<String>,
    lesson_id: impl Into<String>,
    user_id: impl Into<String>,
    now: DateTime<Utc>,
) -> SRSCard {
    SRSCard {
        id: None,
        word_id: word_id.into(),
        word: word.into(),
        definition: definition.into(),
        ease_factor: INITIAL_EASE_FACTOR,
        interval: 0,
        repetitions: 0,
        next_review: now,
        last_review: None,
        total_reviews: 0,
        correct_count: 0,
        incorrect_count: 0,
        streak: 0,
        lesson_id: lesson_id.into(),
        user_id: user_id.into(),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{card_with, now};
    use strum::IntoEnumIterator;

    #[test]
    fn new_card_starts_due_with_default_state() {
        let now = now();
        let card = initialize_srs_card("l1_hola", "hola", "hello", "l1", "u1", now);
        assert_eq!(card.id, None);
        assert_eq!(card.ease_factor, 2.5);
        assert_eq!(card.interval, 0);
        assert_eq!(card.repetitions, 0);
        assert_eq!(card.next_review, now);
        assert_eq!(card.last_review, None);
        assert_eq!(
            (card.total_reviews, card.correct_count, card.incorrect_count, card.streak),
            (0, 0, 0, 0)
        );
        assert_eq!(card.created_at, now);
        assert_eq!(card.updated_at, now);
        assert!(card.validate().is_ok());
    }

    #[test]
    fn quality_mapping() {
        let qualities = Rating::iter().map(Rating::quality).collect::<Vec<_>>();
        assert_eq!(qualities, [0, 3, 4, 5]);
        assert!(!Rating::Again.is_correct());
        assert!(Rating::Hard.is_correct());
    }

    #[test]
    fn rating_parsing_rejects_unknown_values() {
        assert_eq!(Rating::from_name("good").unwrap(), Rating::Good);
        assert_eq!(Rating::from_name("EASY").unwrap(), Rating::Easy);
        assert_eq!(
            Rating::from_name("perfect").unwrap_err(),
            SRSError::InvalidRating {
                value: "perfect".into()
            }
        );
        assert_eq!(Rating::try_from(1).unwrap(), Rating::Again);
        assert_eq!(Rating::try_from(4).unwrap(), Rating::Easy);
        assert!(Rating::try_from(0).is_err());
        assert!(Rating::try_from(5).is_err());
    }

    #[test]
    fn rating_and_status_text_forms() {
        assert_eq!(Rating::Hard.to_string(), "hard");
        let name: &'static str = CardStatus::Mastered.into();
        assert_eq!(name, "mastered");
        assert_eq!("learning".parse::<CardStatus>().unwrap(), CardStatus::Learning);
    }

    #[test]
    fn validate_rejects_broken_cards() {
        let mut card = card_with(1.2, 3, 1);
        card.total_reviews = 1;
        card.correct_count = 1;
        assert!(matches!(
            card.validate(),
            Err(SRSError::InvalidCardState { .. })
        ));

        let mut card = card_with(2.5, 3, 1);
        card.total_reviews = 2;
        card.correct_count = 1;
        assert!(card.validate().is_err());

        let mut card = card_with(2.5, 0, 0);
        card.total_reviews = 1;
        card.incorrect_count = 1;
        assert!(card.validate().is_err());

        let card = card_with(f64::NAN, 1, 1);
        assert!(card.validate().is_err());
    }

    #[test]
    fn reset_restores_creation_state() {
        let mut card = card_with(1.9, 40, 5);
        card.total_reviews = 9;
        card.correct_count = 7;
        card.incorrect_count = 2;
        card.streak = 5;
        card.id = Some(7);
        let reset = card.reset();
        assert_eq!(reset.id, Some(7));
        assert_eq!(reset.ease_factor, INITIAL_EASE_FACTOR);
        assert_eq!(reset.interval, 0);
        assert_eq!(reset.total_reviews, 0);
        assert_eq!(reset.next_review, card.created_at);
        assert_eq!(reset.last_review, None);
    }
}
