//! Thing connectivity check.

use crate::api::Thing;
use crate::verdict::{CheckResult, Verdict};

pub fn check_thing(thing: &Thing) -> CheckResult {
    let status = thing.status_info.status.as_str();
    tracing::debug!(
        "Thing {} status {} (detail: {}, description: {})",
        thing.uid,
        status,
        thing.status_info.status_detail.as_deref().unwrap_or("-"),
        thing.status_info.description.as_deref().unwrap_or("-")
    );
    let verdict = match status {
        "ONLINE" => Verdict::Ok,
        "UNKNOWN" => Verdict::Unknown,
        _ => Verdict::Critical,
    };
    CheckResult::new(verdict, format!("{} is {}.", thing.uid, status))
}
