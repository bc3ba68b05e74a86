use std::cmp::Reverse;

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use priority_queue::PriorityQueue;
use rand::SeedableRng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use snafu::ensure;

use crate::card::{CardStatus, Rating, SRSCard, initialize_srs_card};
use crate::error::{InvalidDeckSizeSnafu, InvalidProbabilitiesSnafu, Result};
use crate::queries::{get_card_status, get_suggested_new_cards_limit};
use crate::scheduler::apply_review;

const RATINGS: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub review_cnt_per_day: Vec<usize>,
    pub learn_cnt_per_day: Vec<usize>,
    /// Cards due at the start of each day, including ones postponed by the
    /// review limit.
    pub due_cnt_per_day: Vec<usize>,
    /// Review cards answered correctly on each day, not counting new cards.
    pub correct_cnt_per_day: Vec<usize>,
    pub mastered_cnt_per_day: Vec<usize>,
    /// The whole deck at the end of the run, in introduction order.
    pub cards: Vec<SRSCard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub deck_size: usize,
    pub learn_span: usize,
    pub learn_limit: usize,
    pub review_limit: usize,
    /// Replaces `learn_limit` with the backlog-based suggestion each day.
    pub adaptive_learn_limit: bool,
    /// Weights of `[again, hard, good, easy]` for a card's first answer.
    pub first_rating_prob: [f64; 4],
    /// Weights of `[again, hard, good, easy]` for later answers.
    pub review_rating_prob: [f64; 4],
    /// Instant of day 0. Day `n` is reviewed at `start + n` days.
    pub start: DateTime<Utc>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            deck_size: 1000,
            learn_span: 365,
            learn_limit: 20,
            review_limit: usize::MAX,
            adaptive_learn_limit: false,
            first_rating_prob: [0.24, 0.094, 0.495, 0.171],
            review_rating_prob: [0.1, 0.2016, 0.5679, 0.1305],
            start: DateTime::UNIX_EPOCH,
        }
    }
}

fn rating_dist(weights: [f64; 4]) -> Result<WeightedIndex<f64>> {
    WeightedIndex::new(weights).map_err(|_| InvalidProbabilitiesSnafu.build())
}

fn card_priority(card: &SRSCard, index: usize) -> Reverse<(DateTime<Utc>, usize)> {
    // earliest due first, then introduction order
    Reverse((card.next_review, index))
}

/// Plays `config.learn_span` days of study of a fresh deck.
///
/// Each day, every due card is taken in `next_review` order and the first
/// `review_limit` of them are answered; the rest stay due. New cards are then
/// introduced up to the day's learn limit.
pub fn simulate(config: &SimulatorConfig, seed: Option<u64>) -> Result<SimulationResult> {
    ensure!(config.deck_size > 0, InvalidDeckSizeSnafu);
    let first_rating_dist = rating_dist(config.first_rating_prob)?;
    let review_rating_dist = rating_dist(config.review_rating_prob)?;
    let mut rng = StdRng::seed_from_u64(seed.unwrap_or(42));

    let mut review_cnt_per_day = vec![0; config.learn_span];
    let mut learn_cnt_per_day = vec![0; config.learn_span];
    let mut due_cnt_per_day = vec![0; config.learn_span];
    let mut correct_cnt_per_day = vec![0; config.learn_span];
    let mut mastered_cnt_per_day = vec![0; config.learn_span];

    let mut cards = (0..config.deck_size)
        .map(|i| {
            initialize_srs_card(
                format!("simulated_{i}"),
                format!("word {i}"),
                format!("definition {i}"),
                "simulated",
                "simulator",
                config.start,
            )
        })
        .collect::<Vec<_>>();
    let mut introduced = 0;
    let mut card_priorities: PriorityQueue<usize, Reverse<(DateTime<Utc>, usize)>> =
        PriorityQueue::new();

    for day in 0..config.learn_span {
        let now = config.start + TimeDelta::days(day as i64);

        let mut due = Vec::new();
        while let Some((&index, &Reverse((next_review, _)))) = card_priorities.peek() {
            if next_review > now {
                break;
            }
            card_priorities.pop();
            due.push(index);
        }
        due_cnt_per_day[day] = due.len();

        let (reviewed, postponed) = due.split_at(due.len().min(config.review_limit));
        for &index in reviewed {
            let rating = RATINGS[review_rating_dist.sample(&mut rng)];
            cards[index] = apply_review(&cards[index], rating, now);
            if rating.is_correct() {
                correct_cnt_per_day[day] += 1;
            }
            card_priorities.push(index, card_priority(&cards[index], index));
        }
        for &index in postponed {
            card_priorities.push(index, card_priority(&cards[index], index));
        }
        review_cnt_per_day[day] = reviewed.len();

        let learn_limit = if config.adaptive_learn_limit {
            get_suggested_new_cards_limit(due.len())
        } else {
            config.learn_limit
        };
        let learn = learn_limit.min(config.deck_size - introduced);
        for index in introduced..introduced + learn {
            let rating = RATINGS[first_rating_dist.sample(&mut rng)];
            cards[index] = apply_review(&cards[index], rating, now);
            card_priorities.push(index, card_priority(&cards[index], index));
        }
        introduced += learn;
        learn_cnt_per_day[day] = learn;

        mastered_cnt_per_day[day] = cards[..introduced]
            .iter()
            .filter(|card| get_card_status(card) == CardStatus::Mastered)
            .count();
    }

    debug!(
        "simulated {} days: {introduced} of {} cards introduced, {} reviews",
        config.learn_span,
        config.deck_size,
        review_cnt_per_day.iter().sum::<usize>()
    );

    Ok(SimulationResult {
        review_cnt_per_day,
        learn_cnt_per_day,
        due_cnt_per_day,
        correct_cnt_per_day,
        mastered_cnt_per_day,
        cards,
    })
}

/// Runs [`simulate`] once per seed in parallel. Results follow `seeds` order.
pub fn simulate_many(config: &SimulatorConfig, seeds: &[u64]) -> Result<Vec<SimulationResult>> {
    seeds
        .par_iter()
        .map(|&seed| simulate(config, Some(seed)))
        .collect()
}
