//! Threshold parsing.
//!
//! Thresholds come in as `<low>:<high>` pairs where either side may be left
//! empty. Numeric pairs bound a float state, time pairs bound a timestamp
//! state. A time bound is either an absolute timestamp or an ISO-8601
//! duration such as `P1D` or `PT30M`, which is resolved against the current
//! instant: into the past when used as a lower bound, into the future when
//! used as an upper bound.

use std::fmt;
use std::sync::OnceLock;

use chrono::{
    DateTime, Duration as ChronoDuration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc,
};
use regex::Regex;

use crate::error::CheckError;

/// Which end of an interval a bound belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Lower,
    Upper,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Lower => f.write_str("lower"),
            Side::Upper => f.write_str("upper"),
        }
    }
}

/// The bound a state ran into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound<T> {
    /// State is at or below this lower bound.
    Below(T),
    /// State is at or above this upper bound.
    Above(T),
}

/// A pair of independently optional bounds.
///
/// A value equal to a bound counts as out of range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<T> {
    pub low: Option<T>,
    pub high: Option<T>,
}

impl<T: PartialOrd + Copy> Interval<T> {
    pub fn new(low: Option<T>, high: Option<T>) -> Self {
        Self { low, high }
    }

    /// Returns the bound `value` violates, lower bound first.
    pub fn violation(&self, value: T) -> Option<Bound<T>> {
        if let Some(low) = self.low {
            if value <= low {
                return Some(Bound::Below(low));
            }
        }
        if let Some(high) = self.high {
            if high <= value {
                return Some(Bound::Above(high));
            }
        }
        None
    }
}

/// Parse a `<low>:<high>` pair.
///
/// `kind` names the threshold in diagnostics. An empty side means no bound.
pub fn parse_interval<T, E, F>(raw: &str, kind: &str, parse: F) -> Result<Interval<T>, CheckError>
where
    T: PartialOrd + Copy,
    F: Fn(&str, Side) -> Result<T, E>,
    E: fmt::Display,
{
    let parts: Vec<&str> = raw.split(':').collect();
    let [low, high] = parts.as_slice() else {
        return Err(CheckError::MalformedThreshold(raw.to_string()));
    };

    let bound = |text: &str, side: Side| -> Result<Option<T>, CheckError> {
        if text.is_empty() {
            return Ok(None);
        }
        parse(text, side)
            .map(Some)
            .map_err(|e| CheckError::InvalidThresholdValue {
                kind: kind.to_string(),
                side,
                value: text.to_string(),
                reason: e.to_string(),
            })
    };

    Ok(Interval::new(
        bound(*low, Side::Lower)?,
        bound(*high, Side::Upper)?,
    ))
}

/// Parse a numeric bound.
pub fn parse_number(text: &str) -> Result<f64, std::num::ParseFloatError> {
    text.trim().parse::<f64>()
}

/// Components of an ISO-8601 duration, pre-summed into calendar months and
/// fixed-length seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct RelativeOffset {
    months: u32,
    days: i64,
    seconds: i64,
}

impl RelativeOffset {
    fn parse(text: &str) -> Option<Result<Self, CheckError>> {
        static DURATION: OnceLock<Regex> = OnceLock::new();
        static WEEKS: OnceLock<Regex> = OnceLock::new();

        let duration = DURATION.get_or_init(|| {
            Regex::new(
                r"^P(?:(?P<y>\d+)Y)?(?:(?P<mo>\d+)M)?(?:(?P<d>\d+)D)?(?:T(?:(?P<h>\d+)H)?(?:(?P<mi>\d+)M)?(?:(?P<s>\d+)S)?)?$",
            )
            .unwrap()
        });
        let weeks = WEEKS.get_or_init(|| Regex::new(r"^P(?P<w>\d+)W$").unwrap());

        let invalid = || CheckError::InvalidTimeFormat(text.to_string());

        if let Some(caps) = weeks.captures(text) {
            let parsed = number(&caps, "w")
                .and_then(|w| w.checked_mul(7))
                .map(|days| RelativeOffset {
                    days,
                    ..Default::default()
                })
                .ok_or_else(invalid);
            return Some(parsed);
        }

        let caps = duration.captures(text)?;
        // `P` and `PT` alone carry no component.
        if text.len() <= 1 || text.ends_with('T') {
            return Some(Err(invalid()));
        }
        let parsed = (|| {
            let years = u32::try_from(number(&caps, "y")?).ok()?;
            let months = u32::try_from(number(&caps, "mo")?).ok()?;
            let seconds = number(&caps, "h")?
                .checked_mul(3600)?
                .checked_add(number(&caps, "mi")?.checked_mul(60)?)?
                .checked_add(number(&caps, "s")?)?;
            Some(RelativeOffset {
                months: years.checked_mul(12)?.checked_add(months)?,
                days: number(&caps, "d")?,
                seconds,
            })
        })()
        .ok_or_else(invalid);
        Some(parsed)
    }

    fn resolve(&self, now: DateTime<Utc>, forward: bool) -> Option<DateTime<Utc>> {
        let months = Months::new(self.months);
        let shifted = if forward {
            now.checked_add_months(months)?
        } else {
            now.checked_sub_months(months)?
        };
        let delta = ChronoDuration::try_days(self.days)?
            .checked_add(&ChronoDuration::try_seconds(self.seconds)?)?;
        if forward {
            shifted.checked_add_signed(delta)
        } else {
            shifted.checked_sub_signed(delta)
        }
    }
}

/// Value of a named duration component, zero when absent.
fn number(caps: &regex::Captures<'_>, name: &str) -> Option<i64> {
    match caps.name(name) {
        Some(m) => m.as_str().parse::<i64>().ok(),
        None => Some(0),
    }
}

/// Resolve a time bound to an instant.
///
/// Durations move away from `now`: backwards for a lower bound, forwards for
/// an upper bound. Anything else must be an absolute timestamp.
pub fn parse_time_value(
    text: &str,
    upper: bool,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, CheckError> {
    let text = text.trim();
    if let Some(offset) = RelativeOffset::parse(text) {
        return offset?
            .resolve(now, upper)
            .ok_or_else(|| CheckError::InvalidTimeFormat(text.to_string()));
    }
    parse_timestamp(text).ok_or_else(|| CheckError::InvalidTimeFormat(text.to_string()))
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Lenient absolute timestamp parser.
///
/// Accepts RFC 3339, the openHAB `2024-05-01T12:00:00.000+0200` form, naive
/// date-times, bare dates (midnight) and bare times of day (anchored to
/// 0001-01-01). Naive values are taken as local time.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(local_to_utc(naive));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(local_to_utc(date.and_hms_opt(0, 0, 0)?));
        }
    }
    for fmt in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(text, fmt) {
            let anchor = NaiveDate::from_ymd_opt(1, 1, 1)?;
            return Some(local_to_utc(anchor.and_time(time)));
        }
    }
    None
}

fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// Raw threshold options as supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ThresholdArgs {
    pub warning: Option<String>,
    pub critical: Option<String>,
    pub warning_time: Option<String>,
    pub critical_time: Option<String>,
    pub regex: Option<String>,
    pub invert_regex: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Limits<T> {
    pub warning: Option<Interval<T>>,
    pub critical: Option<Interval<T>>,
}

#[derive(Debug, Clone)]
pub struct PatternLimit {
    pub regex: Regex,
    /// Report CRITICAL on a match instead of on a miss.
    pub invert: bool,
}

/// The single threshold type that applies to a run.
#[derive(Debug, Clone, Default)]
pub enum Thresholds {
    #[default]
    None,
    Numeric(Limits<f64>),
    Time(Limits<DateTime<Utc>>),
    Pattern(PatternLimit),
}

impl Thresholds {
    /// Build thresholds from raw options.
    ///
    /// Every supplied option is parsed, so bad input fails before anything is
    /// fetched. When more than one threshold type is given, numeric wins over
    /// time, and time over regex.
    pub fn from_args(args: &ThresholdArgs, now: DateTime<Utc>) -> Result<Self, CheckError> {
        let numeric_bound = |text: &str, _side: Side| parse_number(text);
        let time_bound = |text: &str, side: Side| parse_time_value(text, side == Side::Upper, now);

        let numeric = Limits {
            warning: parse_optional(args.warning.as_deref(), "warning", numeric_bound)?,
            critical: parse_optional(args.critical.as_deref(), "critical", numeric_bound)?,
        };
        let time = Limits {
            warning: parse_optional(args.warning_time.as_deref(), "warning-time", time_bound)?,
            critical: parse_optional(args.critical_time.as_deref(), "critical-time", time_bound)?,
        };
        let pattern = args
            .regex
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern)
                    .map(|regex| PatternLimit {
                        regex,
                        invert: args.invert_regex,
                    })
                    .map_err(|source| CheckError::InvalidRegex {
                        pattern: pattern.to_string(),
                        source,
                    })
            })
            .transpose()?;

        let has_numeric = numeric.warning.is_some() || numeric.critical.is_some();
        let has_time = time.warning.is_some() || time.critical.is_some();

        let selected = if has_numeric {
            Thresholds::Numeric(numeric)
        } else if has_time {
            Thresholds::Time(time)
        } else if let Some(pattern) = pattern.clone() {
            Thresholds::Pattern(pattern)
        } else {
            Thresholds::None
        };

        let ignored: Vec<&str> = [
            (has_time && has_numeric, "time"),
            (pattern.is_some() && (has_numeric || has_time), "regex"),
        ]
        .into_iter()
        .filter_map(|(ignored, name)| ignored.then_some(name))
        .collect();
        if !ignored.is_empty() {
            tracing::warn!(
                "Using {} thresholds, ignoring {}",
                selected.kind(),
                ignored.join(" and ")
            );
        }

        Ok(selected)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Thresholds::None => "no",
            Thresholds::Numeric(_) => "numeric",
            Thresholds::Time(_) => "time",
            Thresholds::Pattern(_) => "regex",
        }
    }
}

fn parse_optional<T, E, F>(
    raw: Option<&str>,
    kind: &str,
    parse: F,
) -> Result<Option<Interval<T>>, CheckError>
where
    T: PartialOrd + Copy,
    F: Fn(&str, Side) -> Result<T, E>,
    E: fmt::Display,
{
    raw.map(|raw| parse_interval(raw, kind, parse)).transpose()
}
