//! Group aggregation.
//!
//! Members are walked depth-first in the order the API lists them. Nested
//! groups are fetched through their `link` and expanded in place, so the
//! problem list reads the same as a recursive walk would produce. The walk
//! keeps an explicit stack instead of recursing; the stack height is bounded
//! and a group that appears inside itself is rejected.

use super::evaluate::Evaluator;
use super::perfdata_for;
use crate::api::{Fetcher, Item};
use crate::error::CheckError;
use crate::verdict::{worst, Verdict};

/// Default limit on group nesting.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Folded outcome of a group walk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupReport {
    pub verdict: Verdict,
    /// Messages of every member that is not OK.
    pub problems: Vec<String>,
    pub perfdata: Vec<String>,
}

/// Evaluate every leaf member of `group`, descending into sub-groups.
///
/// Any fetch failure aborts the whole walk.
pub async fn check_group<F: Fetcher>(
    group: &Item,
    evaluator: &Evaluator,
    fetcher: &F,
    max_depth: usize,
) -> Result<GroupReport, CheckError> {
    let mut verdicts = Vec::new();
    let mut problems = Vec::new();
    let mut perfdata = Vec::new();

    // path[i] is the group whose remaining members are pending[i].
    let mut path = vec![group.name.clone()];
    let mut pending = vec![group.members.clone().into_iter()];

    while let Some(members) = pending.last_mut() {
        let Some(member) = members.next() else {
            pending.pop();
            path.pop();
            continue;
        };

        if member.is_group() {
            if path.contains(&member.name) {
                return Err(CheckError::GroupCycle(member.name));
            }
            if pending.len() >= max_depth {
                return Err(CheckError::GroupTooDeep {
                    name: member.name,
                    limit: max_depth,
                });
            }

            let url = member
                .link
                .clone()
                .unwrap_or_else(|| fetcher.item_url(&member.name));
            tracing::debug!("Descending into group {} ({})", member.name, url);
            let sub_group = fetcher.fetch_item(&url).await?;

            path.push(member.name);
            pending.push(sub_group.members.into_iter());
            continue;
        }

        let result = evaluator.evaluate(&member.name, &member.state);
        tracing::debug!(
            "Member {} state {:?}: {}",
            member.name,
            member.state,
            result.verdict
        );

        if let Some(token) = perfdata_for(&member.name, &member.state) {
            perfdata.push(token);
        }
        if result.verdict != Verdict::Ok {
            problems.push(result.message);
        }
        verdicts.push(result.verdict);
    }

    Ok(GroupReport {
        verdict: worst(verdicts),
        problems,
        perfdata,
    })
}
