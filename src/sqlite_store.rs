use std::path::Path;
use std::sync::{Mutex, PoisonError};

use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use crate::card::{CardId, SRSCard};
use crate::error::{CardNotFoundSnafu, Result, SRSError};
use crate::store::CardStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS srs_cards (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    word_id         TEXT    NOT NULL,
    word            TEXT    NOT NULL,
    definition      TEXT    NOT NULL,
    ease_factor     REAL    NOT NULL,
    interval_days   INTEGER NOT NULL,
    repetitions     INTEGER NOT NULL,
    next_review     TEXT    NOT NULL,
    last_review     TEXT,
    total_reviews   INTEGER NOT NULL,
    correct_count   INTEGER NOT NULL,
    incorrect_count INTEGER NOT NULL,
    streak          INTEGER NOT NULL,
    lesson_id       TEXT    NOT NULL,
    user_id         TEXT    NOT NULL,
    created_at      TEXT    NOT NULL,
    updated_at      TEXT    NOT NULL,
    UNIQUE (lesson_id, user_id, word_id)
);
CREATE INDEX IF NOT EXISTS idx_srs_cards_user_due ON srs_cards (user_id, next_review);
";

const COLUMNS: &str = "id, word_id, word, definition, ease_factor, interval_days, repetitions, \
     next_review, last_review, total_reviews, correct_count, incorrect_count, streak, \
     lesson_id, user_id, created_at, updated_at";

impl From<rusqlite::Error> for SRSError {
    fn from(source: rusqlite::Error) -> Self {
        SRSError::Storage {
            source: Box::new(source),
        }
    }
}

impl TryFrom<&Row<'_>> for SRSCard {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SRSCard {
            id: row.get(0)?,
            word_id: row.get(1)?,
            word: row.get(2)?,
            definition: row.get(3)?,
            ease_factor: row.get(4)?,
            interval: row.get(5)?,
            repetitions: row.get(6)?,
            next_review: row.get(7)?,
            last_review: row.get(8)?,
            total_reviews: row.get(9)?,
            correct_count: row.get(10)?,
            incorrect_count: row.get(11)?,
            streak: row.get(12)?,
            lesson_id: row.get(13)?,
            user_id: row.get(14)?,
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
        })
    }
}

/// Card store backed by a SQLite database.
///
/// Timestamps are stored as UTC text, which sorts chronologically.
#[derive(Debug)]
pub struct SqliteCardStore {
    conn: Mutex<Connection>,
}

impl SqliteCardStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wraps an existing connection, creating the card table if needed.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn query_cards(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<SRSCard>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare_cached(sql)?;
        let cards = stmt
            .query_and_then(params, |row| SRSCard::try_from(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }
}

impl CardStore for SqliteCardStore {
    fn user_cards(&self, user_id: &str) -> Result<Vec<SRSCard>> {
        self.query_cards(
            &format!("SELECT {COLUMNS} FROM srs_cards WHERE user_id = ?1 ORDER BY next_review, id"),
            params![user_id],
        )
    }

    fn lesson_cards(&self, lesson_id: &str, user_id: &str) -> Result<Vec<SRSCard>> {
        self.query_cards(
            &format!(
                "SELECT {COLUMNS} FROM srs_cards WHERE lesson_id = ?1 AND user_id = ?2 ORDER BY id"
            ),
            params![lesson_id, user_id],
        )
    }

    fn card(&self, id: CardId) -> Result<Option<SRSCard>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let card = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM srs_cards WHERE id = ?1"),
                params![id],
                |row| SRSCard::try_from(row),
            )
            .optional()?;
        Ok(card)
    }

    fn create_lesson_cards(
        &self,
        lesson_id: &str,
        user_id: &str,
        cards: Vec<SRSCard>,
    ) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing: i64 = tx.query_row(
            "SELECT COUNT(*) FROM srs_cards WHERE lesson_id = ?1 AND user_id = ?2",
            params![lesson_id, user_id],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Ok(0);
        }
        {
            let mut insert = tx.prepare_cached(
                "INSERT INTO srs_cards (word_id, word, definition, ease_factor, interval_days,
                    repetitions, next_review, last_review, total_reviews, correct_count,
                    incorrect_count, streak, lesson_id, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            )?;
            for card in &cards {
                insert.execute(params![
                    card.word_id,
                    card.word,
                    card.definition,
                    card.ease_factor,
                    card.interval,
                    card.repetitions,
                    card.next_review,
                    card.last_review,
                    card.total_reviews,
                    card.correct_count,
                    card.incorrect_count,
                    card.streak,
                    lesson_id,
                    user_id,
                    card.created_at,
                    card.updated_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(cards.len())
    }

    fn update_card<F>(&self, id: CardId, update: F) -> Result<SRSCard>
    where
        F: FnOnce(&SRSCard) -> Result<SRSCard>,
    {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = tx
            .query_row(
                &format!("SELECT {COLUMNS} FROM srs_cards WHERE id = ?1"),
                params![id],
                |row| SRSCard::try_from(row),
            )
            .optional()?
            .ok_or_else(|| CardNotFoundSnafu { id }.build())?;
        let mut updated = update(&current)?;
        updated.id = Some(id);
        tx.execute(
            "UPDATE srs_cards SET word = ?2, definition = ?3, ease_factor = ?4,
                interval_days = ?5, repetitions = ?6, next_review = ?7, last_review = ?8,
                total_reviews = ?9, correct_count = ?10, incorrect_count = ?11, streak = ?12,
                updated_at = ?13
             WHERE id = ?1",
            params![
                id,
                updated.word,
                updated.definition,
                updated.ease_factor,
                updated.interval,
                updated.repetitions,
                updated.next_review,
                updated.last_review,
                updated.total_reviews,
                updated.correct_count,
                updated.incorrect_count,
                updated.streak,
                updated.updated_at,
            ],
        )?;
        tx.commit()?;
        Ok(updated)
    }
}
