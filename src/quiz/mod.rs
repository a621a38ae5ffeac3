// src/quiz/mod.rs

//! Quiz lifecycle and scoring engine.
//!
//! * `window`    - is the quiz open, has the student used their attempt.
//! * `ledger`    - atomic, write-once recording of an attempt.
//! * `aggregate` - per-student results and per-quiz statistics.
//! * `lifecycle` - quiz authoring, publishing and listing.
//!
//! Every operation takes `now` explicitly; handlers pass `Utc::now()`.

pub mod aggregate;
pub mod ledger;
pub mod lifecycle;
pub mod window;

/// Rounds to 2 decimal places. Shared by every percentage and duration.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `obtained / total` as a percentage rounded to 2 decimals, 0 when `total` is 0.
pub fn percentage(obtained: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round2(obtained as f64 / total as f64 * 100.0)
}
