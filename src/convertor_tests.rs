use chrono::{DateTime, TimeDelta, Utc};
use itertools::Itertools;

use crate::card::{Rating, SRSCard, initialize_srs_card};
use crate::convertor::{ReplayOutcome, ReviewLogEntry, replay, replay_log};
use crate::scheduler::apply_review;
use crate::test_helpers::{TestHelper, card_with, now};

fn day(n: i64) -> DateTime<Utc> {
    now() + TimeDelta::days(n)
}

fn user_log(user: &str, key: &str, ratings: &[(Rating, i64)]) -> Vec<ReviewLogEntry> {
    ratings
        .iter()
        .map(|&(rating, n)| ReviewLogEntry::new(user, key, rating, day(n)))
        .collect()
}

fn log(key: &str, ratings: &[(Rating, i64)]) -> Vec<ReviewLogEntry> {
    user_log("u1", key, ratings)
}

fn gato_for(user: &str) -> SRSCard {
    initialize_srs_card("l1_gato", "gato", "cat", "l1", user, now())
}

fn gato() -> SRSCard {
    gato_for("u1")
}

#[test]
fn replay_matches_live_reviews() {
    let fresh = card_with(2.5, 0, 0);
    let entries = log(
        "l1_perro",
        &[(Rating::Good, 0), (Rating::Easy, 1), (Rating::Again, 9)],
    );

    let live = [(Rating::Good, 0), (Rating::Easy, 1), (Rating::Again, 9)]
        .into_iter()
        .fold(fresh.clone(), |card, (rating, n)| {
            apply_review(&card, rating, day(n))
        });
    let replayed = replay(&fresh, &entries);

    assert_eq!(replayed, live);
    assert_eq!(replayed.repetitions, 0);
    assert_eq!(replayed.interval, 1);
    replayed.ease_factor.assert_approx_eq(2.6);
    assert_eq!(replayed.total_reviews, 3);
    assert_eq!(replayed.correct_count, 2);
    assert_eq!(replayed.incorrect_count, 1);
    assert_eq!(replayed.streak, 0);
    assert_eq!(replayed.last_review, Some(day(9)));
    assert_eq!(replayed.next_review, day(10));
}

#[test]
fn ordering_of_inputs_should_not_change() {
    let fresh = card_with(2.5, 0, 0);
    let entries = log(
        "l1_perro",
        &[
            (Rating::Good, 0),
            (Rating::Good, 1),
            (Rating::Hard, 7),
            (Rating::Easy, 12),
        ],
    );
    let expected = replay(&fresh, &entries);
    let reversed = entries.iter().rev().cloned().collect_vec();
    assert_eq!(replay(&fresh, &reversed), expected);
    let rotated = entries[2..].iter().chain(&entries[..2]).cloned().collect_vec();
    assert_eq!(replay(&fresh, &rotated), expected);
}

#[test]
fn same_timestamp_keeps_log_order() {
    let fresh = card_with(2.5, 0, 0);
    let fail_then_pass = replay(
        &fresh,
        &log("l1_perro", &[(Rating::Again, 3), (Rating::Good, 3)]),
    );
    let pass_then_fail = replay(
        &fresh,
        &log("l1_perro", &[(Rating::Good, 3), (Rating::Again, 3)]),
    );
    assert_eq!(fail_then_pass.streak, 1);
    assert_eq!(fail_then_pass.repetitions, 1);
    assert_eq!(pass_then_fail.streak, 0);
    assert_eq!(pass_then_fail.repetitions, 0);
}

#[test]
fn replay_repairs_drifted_counters() {
    let mut drifted = card_with(1.9, 40, 5);
    drifted.total_reviews = 2;
    drifted.correct_count = 7;
    drifted.next_review = day(40);
    assert!(drifted.validate().is_err());

    let repaired = replay(&drifted, &log("l1_perro", &[(Rating::Good, 0)]));
    assert!(repaired.validate().is_ok());
    assert_eq!(repaired.total_reviews, 1);
    assert_eq!(repaired.correct_count, 1);
    repaired.ease_factor.assert_approx_eq(2.5);

    let untouched = replay(&drifted, &Vec::<ReviewLogEntry>::new());
    assert_eq!(untouched, drifted.reset());
    assert_eq!(untouched.next_review, drifted.created_at);
}

#[test]
fn replay_log_splits_by_card() {
    let perro = card_with(2.5, 0, 0);
    let gato = gato();
    let mut entries = log("l1_perro", &[(Rating::Good, 0), (Rating::Good, 1)]);
    entries.extend(log("l1_gato", &[(Rating::Again, 0)]));
    entries.extend(log("l2_pez", &[(Rating::Easy, 2), (Rating::Good, 0)]));
    entries.extend(log("l1_perro", &[(Rating::Hard, 7)]));

    let ReplayOutcome {
        cards,
        orphaned,
        ambiguous,
    } = replay_log(&[perro.clone(), gato.clone()], entries);

    assert_eq!(cards.len(), 2);
    let perro_history = log(
        "l1_perro",
        &[(Rating::Good, 0), (Rating::Good, 1), (Rating::Hard, 7)],
    );
    assert_eq!(cards[0], replay(&perro, &perro_history));
    assert_eq!(cards[0].total_reviews, 3);
    assert_eq!(cards[1].word_id, "l1_gato");
    assert_eq!(cards[1].incorrect_count, 1);
    assert_eq!(
        orphaned,
        log("l2_pez", &[(Rating::Good, 0), (Rating::Easy, 2)])
    );
    assert!(ambiguous.is_empty());
}

#[test]
fn learners_sharing_a_lesson_keep_their_own_history() {
    let alice = gato_for("alice");
    let bob = gato_for("bob");
    let mut entries = user_log("alice", "l1_gato", &[(Rating::Good, 0), (Rating::Good, 1)]);
    entries.extend(user_log("bob", "l1_gato", &[(Rating::Again, 0)]));
    entries.extend(user_log("carol", "l1_gato", &[(Rating::Easy, 3)]));

    let outcome = replay_log(&[alice, bob], entries);

    assert_eq!(outcome.cards[0].user_id, "alice");
    assert_eq!(outcome.cards[0].total_reviews, 2);
    assert_eq!(outcome.cards[0].correct_count, 2);
    assert_eq!(outcome.cards[1].user_id, "bob");
    assert_eq!(outcome.cards[1].total_reviews, 1);
    assert_eq!(outcome.cards[1].incorrect_count, 1);
    assert_eq!(
        outcome.orphaned,
        user_log("carol", "l1_gato", &[(Rating::Easy, 3)])
    );
    assert!(outcome.ambiguous.is_empty());
}

#[test]
fn cards_sharing_a_key_are_reported_and_left_alone() {
    let first = apply_review(&gato(), Rating::Good, now());
    let mut second = gato();
    second.id = Some(9);
    let perro = card_with(2.5, 0, 0);
    let mut entries = log("l1_gato", &[(Rating::Again, 0), (Rating::Good, 1)]);
    entries.extend(log("l1_perro", &[(Rating::Easy, 0)]));

    let outcome = replay_log(&[first.clone(), second.clone(), perro], entries);

    assert_eq!(
        outcome.ambiguous,
        vec![("u1".to_string(), "l1_gato".to_string())]
    );
    assert_eq!(outcome.cards[0], first);
    assert_eq!(outcome.cards[1], second);
    assert_eq!(outcome.cards[2].total_reviews, 1);
    assert!(outcome.orphaned.is_empty());
}

#[test]
fn replay_log_resets_cards_without_history() {
    let mut reviewed = apply_review(&gato(), Rating::Good, now());
    reviewed.id = Some(4);
    let ReplayOutcome {
        cards,
        orphaned,
        ambiguous,
    } = replay_log(std::slice::from_ref(&reviewed), Vec::new());
    assert!(orphaned.is_empty());
    assert!(ambiguous.is_empty());
    assert_eq!(cards, vec![reviewed.reset()]);
    assert_eq!(cards[0].id, Some(4));
    assert_eq!(cards[0].total_reviews, 0);
}
