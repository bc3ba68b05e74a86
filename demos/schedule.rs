use chrono::{DateTime, TimeDelta, Utc};
use log::LevelFilter;
use vocab_srs::{
    CardStore, MemoryCardStore, Rating, ReviewSession, SRSCard, Vocabulary, get_card_status,
    initialize_cards_for_lesson, next_states, review_card, user_stats,
};

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}: {}", record.level(), record.target(), message))
        })
        .level(LevelFilter::Debug)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn print_next_states(card: &SRSCard, now: DateTime<Utc>) {
    let states = next_states(card, now);
    // Display the intervals for each rating
    println!("Again interval: {} days", states.again.interval);
    println!("Hard interval: {} days", states.hard.interval);
    println!("Good interval: {} days", states.good.interval);
    println!("Easy interval: {} days", states.easy.interval);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger()?;
    let store = MemoryCardStore::new();
    let mut now = Utc::now();

    // Starting a lesson creates one card per word
    let words = [
        Vocabulary::new("perro", "dog"),
        Vocabulary::new("gato", "cat"),
        Vocabulary::new("casa", "house"),
    ];
    initialize_cards_for_lesson(&store, "lesson_1", "demo_user", &words, now)?;

    let card = store.lesson_cards("lesson_1", "demo_user")?.remove(0);
    println!("Scheduling a new card ({}):", card.word);
    print_next_states(&card, now);

    // Answer the same card a few times, each time on its due date
    let mut session = ReviewSession::start("demo_user", Some("lesson_1".into()), now);
    let id = card.id.ok_or("stored card without id")?;
    for rating in [Rating::Good, Rating::Good, Rating::Easy, Rating::Hard, Rating::Again] {
        let card = review_card(&store, id, rating, now)?;
        session.record(rating, std::time::Duration::from_secs(4));
        println!(
            "{rating:>5}: interval {:>2} days, ease {:.2}, {}, next review {}",
            card.interval,
            card.ease_factor,
            get_card_status(&card),
            card.next_review.format("%Y-%m-%d"),
        );
        now = card.next_review;
    }
    session.finish(now);

    println!("\nScheduling an existing card:");
    if let Some(card) = store.card(id)? {
        print_next_states(&card, now);
    }

    let stats = user_stats(&store, "demo_user", now + TimeDelta::days(1))?;
    println!("\n{stats:#?}");
    println!("average answer time: {:.1}s", session.average_time);
    Ok(())
}
