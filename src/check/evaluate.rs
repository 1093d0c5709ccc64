//! Judging a single state against the configured thresholds.

use chrono::{DateTime, Local, Utc};

use super::threshold::{parse_number, parse_timestamp, Bound, Limits, PatternLimit, Thresholds};
use crate::error::CheckError;
use crate::verdict::{CheckResult, Verdict};

/// States the REST API reports for an item that has no value yet.
///
/// openHAB 1 used the long forms, openHAB 2 and later use `NULL` / `UNDEF`.
pub const UNINITIALIZED_STATES: &[&str] = &["Uninitialized", "Undefined", "NULL", "UNDEF"];

pub fn is_uninitialized(state: &str) -> bool {
    UNINITIALIZED_STATES.contains(&state)
}

/// Applies one set of thresholds to item states.
#[derive(Debug, Clone)]
pub struct Evaluator {
    thresholds: Thresholds,
    uninitialized: Verdict,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Thresholds::None, Verdict::Unknown)
    }
}

impl Evaluator {
    pub fn new(thresholds: Thresholds, uninitialized: Verdict) -> Self {
        Self {
            thresholds,
            uninitialized,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Evaluate the state of item `name`.
    ///
    /// Uninitialized states bypass every threshold. Otherwise exactly one
    /// threshold type is consulted, and a state that cannot be read as that
    /// type yields UNKNOWN.
    pub fn evaluate(&self, name: &str, state: &str) -> CheckResult {
        if is_uninitialized(state) {
            return CheckResult::new(self.uninitialized, format!("{} is uninitialized.", name));
        }

        let result = match &self.thresholds {
            Thresholds::Numeric(limits) => check_numeric(name, state, limits),
            Thresholds::Time(limits) => check_time(name, state, limits),
            Thresholds::Pattern(pattern) => Ok(check_pattern(name, state, pattern)),
            Thresholds::None => Ok(within_bounds(name, state)),
        };

        result.unwrap_or_else(|e| CheckResult::unknown(e.to_string()))
    }
}

fn check_numeric(name: &str, state: &str, limits: &Limits<f64>) -> Result<CheckResult, CheckError> {
    let value = parse_number(state).map_err(|_| CheckError::NonNumericState)?;
    Ok(check_limits(name, state, value, limits, format_number))
}

fn check_time(
    name: &str,
    state: &str,
    limits: &Limits<DateTime<Utc>>,
) -> Result<CheckResult, CheckError> {
    let value = parse_timestamp(state).ok_or(CheckError::NonTemporalState)?;
    Ok(check_limits(name, state, value, limits, format_time))
}

/// Critical interval first, then warning; the first violation wins.
fn check_limits<T, F>(name: &str, state: &str, value: T, limits: &Limits<T>, fmt: F) -> CheckResult
where
    T: PartialOrd + Copy,
    F: Fn(T) -> String,
{
    let checks = [
        (limits.critical.as_ref(), Verdict::Critical),
        (limits.warning.as_ref(), Verdict::Warning),
    ];

    for (interval, verdict) in checks {
        let Some(bound) = interval.and_then(|i| i.violation(value)) else {
            continue;
        };
        let message = match bound {
            Bound::Below(low) => {
                format!("{} state ({}) is less than {}", name, fmt(value), fmt(low))
            }
            Bound::Above(high) => {
                format!("{} state ({}) is greater than {}", name, fmt(value), fmt(high))
            }
        };
        return CheckResult::new(verdict, message);
    }

    within_bounds(name, state)
}

fn check_pattern(name: &str, state: &str, pattern: &PatternLimit) -> CheckResult {
    let matched = pattern.regex.is_match(state);
    let verdict = if matched != pattern.invert {
        Verdict::Ok
    } else {
        Verdict::Critical
    };
    let outcome = if matched { "matched" } else { "did not match" };
    CheckResult::new(verdict, format!("{} regex {} state: {}", name, outcome, state))
}

fn within_bounds(name: &str, state: &str) -> CheckResult {
    CheckResult::new(Verdict::Ok, format!("{} state within bounds: {}", name, state))
}

/// Integral values keep one decimal place, so `12` prints as `12.0`.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn format_time(value: DateTime<Utc>) -> String {
    value
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S%:z")
        .to_string()
}
