//! # Exclusion Adjuster
//!
//! Groups in an exclusion set share one weekly quota. For a member `g`:
//!
//! ```text
//! sibling_usage      = Σ actual[h]  for h in set, h ≠ g
//! effective_required = max(0, shared_frequency − sibling_usage)
//! complies           = actual[g] + sibling_usage ≥ shared_frequency
//! ```
//!
//! The whole set passes or fails together. The sum of the members'
//! effective requirements need not equal the shared quota.

use crate::weekly::{Contributor, GroupFrequency, WeeklyUsage};
use crate::{ExclusionSet, ExclusionSetId, GroupId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Why a group's quota was adjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionDetail {
    pub set: ExclusionSetId,
    pub set_name: String,
    pub shared_frequency: u32,
    /// Own usage plus sibling usage.
    pub combined_usage: u32,
    pub sibling_usage: u32,
    /// Deduplicated by (group, preparation, day), sorted by day.
    pub sibling_contributors: Vec<Contributor>,
}

/// A group result after exclusion sets are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedGroupResult {
    pub group: GroupId,
    pub group_name: String,
    pub required: u32,
    pub effective_required: u32,
    pub actual: u32,
    pub complies: bool,
    pub exclusion: Option<ExclusionDetail>,
}

impl AdjustedGroupResult {
    fn unchanged(base: &GroupFrequency) -> Self {
        Self {
            group: base.group,
            group_name: base.group_name.clone(),
            required: base.required,
            effective_required: base.required,
            actual: base.actual,
            complies: base.complies,
            exclusion: None,
        }
    }
}

fn sibling_contributors(set: &ExclusionSet, group: GroupId, usage: &WeeklyUsage) -> Vec<Contributor> {
    let mut seen = BTreeSet::new();
    let mut contributors: Vec<Contributor> = set
        .groups
        .iter()
        .filter(|h| **h != group)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .flat_map(|h| usage.contributors(*h).iter())
        .filter(|c| seen.insert((c.group, c.preparation, c.day)))
        .cloned()
        .collect();
    contributors.sort_by_key(|c| (c.day, c.group, c.preparation));
    contributors
}

/// Adjust one group against the set it belongs to.
fn adjust(base: &GroupFrequency, set: &ExclusionSet, usage: &WeeklyUsage) -> AdjustedGroupResult {
    let siblings: BTreeSet<GroupId> = set.groups.iter().copied().filter(|h| *h != base.group).collect();
    let sibling_usage: u32 = siblings.iter().map(|h| usage.actual(*h)).sum();
    let combined_usage = base.actual.saturating_add(sibling_usage);

    AdjustedGroupResult {
        group: base.group,
        group_name: base.group_name.clone(),
        required: base.required,
        effective_required: set.shared_frequency.saturating_sub(sibling_usage),
        actual: base.actual,
        complies: combined_usage >= set.shared_frequency,
        exclusion: Some(ExclusionDetail {
            set: set.id,
            set_name: set.name.clone(),
            shared_frequency: set.shared_frequency,
            combined_usage,
            sibling_usage,
            sibling_contributors: sibling_contributors(set, base.group, usage),
        }),
    }
}

/// Apply a modality's exclusion sets to the base frequency results.
///
/// Groups outside every set pass through unchanged.
pub fn apply_exclusions(
    base: &[GroupFrequency],
    sets: &[&ExclusionSet],
    usage: &WeeklyUsage,
) -> Vec<AdjustedGroupResult> {
    base.iter()
        .map(|result| {
            match sets.iter().find(|s| s.groups.contains(&result.group)) {
                Some(set) => {
                    let adjusted = adjust(result, set, usage);
                    tracing::debug!(
                        group = result.group.0,
                        set = set.id.0,
                        effective_required = adjusted.effective_required,
                        complies = adjusted.complies,
                        "group quota shared through exclusion set"
                    );
                    adjusted
                }
                None => AdjustedGroupResult::unchanged(result),
            }
        })
        .collect()
}
