//! Time string parsing for `pause`
//!
//! # Supported Formats
//!
//! - Seconds: "30s", or a bare "30"
//! - Minutes: "5m"
//! - Hours: "2h"
//! - Combined: "1h2m30s", "1h2m30"
//! - Random: "random 1m" sleeps anywhere from zero up to the given time

use rand::Rng;
use std::time::Duration;
use thiserror::Error;

/// Word that turns a time string into an upper bound
const RANDOM_WORD: &str = "random";

/// Errors that can occur when parsing time strings.
#[derive(Debug, Error, PartialEq)]
pub enum TimeStrError {
    /// Empty time string.
    #[error("empty time string")]
    Empty,

    /// Invalid numeric value.
    #[error("invalid numeric value: {0}")]
    InvalidNumber(String),

    /// Unknown unit.
    #[error("unknown time unit: {0}")]
    UnknownUnit(char),
}

/// A parsed time string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpec {
    /// Total time given
    pub total: Duration,

    /// Whether to pick a random time up to `total`
    pub random: bool,
}

impl TimeSpec {
    /// The time to actually wait
    pub fn sample(&self) -> Duration {
        if !self.random {
            return self.total;
        }
        let secs = self.total.as_secs();
        Duration::from_secs(rand::thread_rng().gen_range(0..=secs))
    }
}

/// Parse a time string such as `1h2m30s` or `random 5m`
pub fn parse_timestr(text: &str) -> Result<TimeSpec, TimeStrError> {
    let mut random = false;
    let mut spec = String::new();

    for word in text.split_whitespace() {
        if word.eq_ignore_ascii_case(RANDOM_WORD) {
            random = true;
        } else {
            spec.push_str(word);
        }
    }

    if spec.is_empty() {
        return Err(TimeStrError::Empty);
    }

    let mut total_secs = 0u64;
    let mut current_num = String::new();

    for ch in spec.chars() {
        if ch.is_ascii_digit() {
            current_num.push(ch);
            continue;
        }

        let multiplier = match ch.to_ascii_lowercase() {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            other => return Err(TimeStrError::UnknownUnit(other)),
        };
        total_secs = number(&current_num, &spec)?
            .checked_mul(multiplier)
            .and_then(|secs| total_secs.checked_add(secs))
            .ok_or_else(|| TimeStrError::InvalidNumber(spec.clone()))?;
        current_num.clear();
    }

    // trailing bare number counts as seconds
    if !current_num.is_empty() {
        total_secs = total_secs
            .checked_add(number(&current_num, &spec)?)
            .ok_or_else(|| TimeStrError::InvalidNumber(spec.clone()))?;
    }

    Ok(TimeSpec {
        total: Duration::from_secs(total_secs),
        random,
    })
}

fn number(digits: &str, spec: &str) -> Result<u64, TimeStrError> {
    if digits.is_empty() {
        return Err(TimeStrError::InvalidNumber(spec.to_string()));
    }
    digits
        .parse()
        .map_err(|_| TimeStrError::InvalidNumber(digits.to_string()))
}
