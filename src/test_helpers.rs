use chrono::{DateTime, TimeZone, Utc};

use crate::card::{SRSCard, initialize_srs_card};

pub(crate) fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .unwrap()
}

pub(crate) fn now() -> DateTime<Utc> {
    at(2024, 3, 1, 9, 0, 0)
}

/// Card due at [`now`] with the given scheduling state and zeroed counters.
pub(crate) fn card_with(ease_factor: f64, interval: u32, repetitions: u32) -> SRSCard {
    SRSCard {
        ease_factor,
        interval,
        repetitions,
        ..initialize_srs_card("l1_perro", "perro", "dog", "l1", "u1", now())
    }
}

pub(crate) trait TestHelper {
    fn assert_approx_eq(self, expected: Self);
}

impl TestHelper for f64 {
    fn assert_approx_eq(self, expected: Self) {
        assert!(
            (self - expected).abs() < 1e-9,
            "expected {expected}, got {self}"
        );
    }
}
