mod card;
mod convertor;
#[cfg(test)]
mod convertor_tests;
mod error;
mod queries;
mod scheduler;
mod session;
mod simulation;
#[cfg(feature = "sqlite")]
mod sqlite_store;
mod stats;
mod store;
#[cfg(test)]
mod test_helpers;

pub use card::{
    CardId, CardStatus, INITIAL_EASE_FACTOR, MIN_EASE_FACTOR, Rating, SRSCard, Vocabulary,
    initialize_srs_card,
};
pub use convertor::{CardKey, ReplayOutcome, ReviewLogEntry, replay, replay_log};
pub use error::{Result, SRSError};
pub use queries::{
    MASTERED_INTERVAL_DAYS, calculate_accuracy, get_card_status, get_due_cards,
    get_suggested_new_cards_limit, is_due,
};
pub use scheduler::{
    EASY_INTERVAL_MULTIPLIER, HARD_INTERVAL_MULTIPLIER, MAX_INTERVAL_DAYS, NextStates,
    ScheduleUpdate, apply_review, calculate_next_review, next_ease_factor, next_states,
};
pub use session::ReviewSession;
pub use simulation::{SimulationResult, SimulatorConfig, simulate, simulate_many};
#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteCardStore;
pub use stats::{DailyStats, UserStats, local_day};
pub use store::{
    CardStore, MemoryCardStore, due_cards_for_user, initialize_cards_for_lesson, review_card,
    user_stats,
};
