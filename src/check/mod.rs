//! Check logic.
//!
//! Items are judged by an [`Evaluator`], groups are folded by
//! [`check_group`] and things by [`check_thing`].

mod evaluate;
mod group;
mod thing;
mod threshold;

pub use evaluate::*;
pub use group::*;
pub use thing::*;
pub use threshold::*;

use crate::api::{Fetcher, Item};
use crate::error::CheckError;
use crate::report::Report;
use crate::verdict::{perf_token, CheckResult};

/// What a single invocation checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Item(String),
    Group(String),
    Thing(String),
}

impl Target {
    /// Resolve the target from the item, thing and group options.
    pub fn resolve(
        item: Option<String>,
        thing: Option<String>,
        group: bool,
    ) -> Result<Self, CheckError> {
        let conflict = |msg: &str| Err(CheckError::ConfigurationConflict(msg.to_string()));
        match (item, thing) {
            (Some(_), Some(_)) => conflict("--item and --thing are mutually exclusive"),
            (None, None) => conflict("one of --item or --thing is required"),
            (None, Some(_)) if group => conflict("--group can only be used with --item"),
            (None, Some(uid)) => Ok(Target::Thing(uid)),
            (Some(name), None) if group => Ok(Target::Group(name)),
            (Some(name), None) => Ok(Target::Item(name)),
        }
    }
}

/// Perfdata token for a state that reads as a number.
pub fn perfdata_for(name: &str, state: &str) -> Option<String> {
    parse_number(state)
        .ok()
        .map(|_| perf_token(name, state.trim()))
}

/// Evaluate a single item, attaching its value as perfdata when numeric.
pub fn check_item(item: &Item, evaluator: &Evaluator) -> CheckResult {
    let result = evaluator.evaluate(&item.name, &item.state);
    if parse_number(&item.state).is_ok() {
        result.with_perfdata(&item.name, item.state.trim())
    } else {
        result
    }
}

/// Fetch the target and produce the final report.
pub async fn run<F: Fetcher>(
    target: &Target,
    evaluator: &Evaluator,
    fetcher: &F,
    max_depth: usize,
) -> Result<Report, CheckError> {
    match target {
        Target::Item(name) => {
            let item = fetcher.fetch_item(&fetcher.item_url(name)).await?;
            Ok(Report::item(&check_item(&item, evaluator)))
        }
        Target::Group(name) => {
            let group = fetcher.fetch_item(&fetcher.item_url(name)).await?;
            if !group.is_group() {
                return Err(CheckError::ConfigurationConflict(format!(
                    "{} is not a group",
                    group.name
                )));
            }
            let report = check_group(&group, evaluator, fetcher, max_depth).await?;
            Ok(Report::group(&group.name, &report))
        }
        Target::Thing(uid) => {
            let thing = fetcher.fetch_thing(&fetcher.thing_url(uid)).await?;
            Ok(Report::thing(&check_thing(&thing)))
        }
    }
}
