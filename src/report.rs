//! Status line rendering.
//!
//! Item checks print `message|perfdata` (the separator only when there is
//! perfdata), group checks always print `summary|perfdata`, thing checks print
//! the message alone.

use std::fmt;

use crate::check::GroupReport;
use crate::error::CheckError;
use crate::verdict::{CheckResult, Verdict};

/// Final plugin output: the exit status and the text for stdout.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub verdict: Verdict,
    pub text: String,
}

impl Report {
    pub fn item(result: &CheckResult) -> Self {
        let text = if result.perfdata.is_empty() {
            result.message.clone()
        } else {
            format!("{}|{}", result.message, result.perfdata_line())
        };
        Self {
            verdict: result.verdict,
            text,
        }
    }

    pub fn group(name: &str, report: &GroupReport) -> Self {
        let summary = match report.problems.as_slice() {
            [] => "All group members within bounds.".to_string(),
            [single] => single.clone(),
            many => format!(
                "{} problems in group {}.\n{}",
                many.len(),
                name,
                many.join("\n")
            ),
        };
        Self {
            verdict: report.verdict,
            text: format!("{}|{}", summary, report.perfdata.join(" ")),
        }
    }

    pub fn thing(result: &CheckResult) -> Self {
        Self {
            verdict: result.verdict,
            text: result.message.clone(),
        }
    }

    /// UNKNOWN with the error flattened onto one line.
    pub fn error(err: &CheckError) -> Self {
        let text = err
            .to_string()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            verdict: err.verdict(),
            text,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.verdict.exit_code()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_report(verdict: Verdict, problems: &[&str], perfdata: &[&str]) -> GroupReport {
        GroupReport {
            verdict,
            problems: problems.iter().map(|s| s.to_string()).collect(),
            perfdata: perfdata.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_item_with_perfdata() {
        let result = CheckResult::new(Verdict::Ok, "Temp state within bounds: 21")
            .with_perfdata("Temp", "21");
        let report = Report::item(&result);
        assert_eq!(report.text, "Temp state within bounds: 21|'Temp'=21");
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_item_without_perfdata() {
        let result = CheckResult::new(Verdict::Critical, "Door regex did not match state: OPEN");
        let report = Report::item(&result);
        assert_eq!(report.text, "Door regex did not match state: OPEN");
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn test_group_all_ok() {
        let report = Report::group("G", &group_report(Verdict::Ok, &[], &["'A'=1", "'B'=2"]));
        assert_eq!(report.text, "All group members within bounds.|'A'=1 'B'=2");
        assert_eq!(report.verdict, Verdict::Ok);
    }

    #[test]
    fn test_group_single_problem() {
        let report = Report::group(
            "G",
            &group_report(Verdict::Warning, &["A state (1.0) is less than 2.0"], &["'A'=1"]),
        );
        assert_eq!(report.text, "A state (1.0) is less than 2.0|'A'=1");
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_group_many_problems() {
        let report = Report::group(
            "Sensors",
            &group_report(Verdict::Unknown, &["A is uninitialized.", "B is uninitialized."], &[]),
        );
        assert_eq!(
            report.text,
            "2 problems in group Sensors.\nA is uninitialized.\nB is uninitialized.|"
        );
        assert_eq!(report.exit_code(), 3);
    }

    #[test]
    fn test_thing_has_no_perfdata() {
        let result = CheckResult::new(Verdict::Ok, "hue:bridge:1 is ONLINE.");
        assert_eq!(Report::thing(&result).to_string(), "hue:bridge:1 is ONLINE.");
    }

    #[test]
    fn test_error_is_single_line_unknown() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = CheckError::InvalidRegex {
            pattern: "(".to_string(),
            source,
        };
        let report = Report::error(&err);
        assert_eq!(report.verdict, Verdict::Unknown);
        assert_eq!(report.exit_code(), 3);
        assert!(!report.text.contains('\n'));
        assert!(report.text.starts_with("invalid regex '('"));
    }
}
