//! Status levels reported to the monitoring framework.

use std::fmt;
use std::str::FromStr;

/// Plugin status, ordered from best to worst.
///
/// UNKNOWN ranks above CRITICAL, so folding a set of verdicts with `max`
/// yields the worst one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Verdict {
    #[default]
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Verdict {
    /// Position in the severity order. Also the process exit code.
    pub fn rank(self) -> u8 {
        match self {
            Verdict::Ok => 0,
            Verdict::Warning => 1,
            Verdict::Critical => 2,
            Verdict::Unknown => 3,
        }
    }

    pub fn exit_code(self) -> u8 {
        self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Ok => "OK",
            Verdict::Warning => "WARNING",
            Verdict::Critical => "CRITICAL",
            Verdict::Unknown => "UNKNOWN",
        }
    }
}

impl PartialOrd for Verdict {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Verdict {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unexpected status '{0}', expected one of ok, warning, critical, unknown")]
pub struct ParseVerdictError(String);

impl FromStr for Verdict {
    type Err = ParseVerdictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ok" => Ok(Verdict::Ok),
            "warning" | "warn" => Ok(Verdict::Warning),
            "critical" | "crit" => Ok(Verdict::Critical),
            "unknown" => Ok(Verdict::Unknown),
            _ => Err(ParseVerdictError(s.to_string())),
        }
    }
}

/// Worst verdict of the set, OK when empty.
pub fn worst<I>(verdicts: I) -> Verdict
where
    I: IntoIterator<Item = Verdict>,
{
    verdicts.into_iter().fold(Verdict::Ok, Verdict::max)
}

/// Outcome of a single check: a verdict, a message and perfdata tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub verdict: Verdict,
    pub message: String,
    /// `'name'=value` tokens, in evaluation order.
    pub perfdata: Vec<String>,
}

impl CheckResult {
    pub fn new(verdict: Verdict, message: impl Into<String>) -> Self {
        Self {
            verdict,
            message: message.into(),
            perfdata: Vec::new(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(Verdict::Unknown, message)
    }

    pub fn with_perfdata(mut self, name: &str, value: &str) -> Self {
        self.perfdata.push(perf_token(name, value));
        self
    }

    /// Perfdata tokens joined into the space separated form.
    pub fn perfdata_line(&self) -> String {
        self.perfdata.join(" ")
    }
}

/// Format one perfdata token.
pub fn perf_token(name: &str, value: &str) -> String {
    format!("'{}'={}", name, value)
}
