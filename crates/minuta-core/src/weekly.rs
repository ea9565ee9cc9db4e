//! # Weekly Group Frequency
//!
//! Counts, for an ordered list of day menus, on how many days each food
//! group appears, and checks the counts against a modality's weekly quotas.
//!
//! A group is credited once per day no matter how many preparations of that
//! day map to it. Every (preparation, day) pair that mapped to a group is
//! kept as a contributor for explanations downstream.

use crate::catalog::Catalog;
use crate::primitives::{MAX_WEEK_DAYS, day_label};
use crate::{GroupId, Menu, MenuId, MinutaError, Preparation, PreparationId, WeeklyGroupRequirement};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// WEEK PLAN
// =============================================================================

/// Ordered day menus; position is the day index (0 = Monday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MenuId>", into = "Vec<MenuId>")]
pub struct WeekPlan {
    days: Vec<MenuId>,
}

impl WeekPlan {
    /// A plan of one to seven day menus.
    pub fn new(days: Vec<MenuId>) -> Result<Self, MinutaError> {
        if days.is_empty() {
            return Err(MinutaError::InvalidWeekPlan("no day menus".to_string()));
        }
        if days.len() > MAX_WEEK_DAYS {
            return Err(MinutaError::InvalidWeekPlan(format!(
                "{} day menus (max {})",
                days.len(),
                MAX_WEEK_DAYS
            )));
        }
        Ok(Self { days })
    }

    #[must_use]
    pub fn days(&self) -> &[MenuId] {
        &self.days
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl TryFrom<Vec<MenuId>> for WeekPlan {
    type Error = MinutaError;

    fn try_from(days: Vec<MenuId>) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<WeekPlan> for Vec<MenuId> {
    fn from(plan: WeekPlan) -> Self {
        plan.days
    }
}

// =============================================================================
// GROUP RESOLUTION
// =============================================================================

/// Food group of a preparation.
///
/// The preparation's own component group wins. Otherwise the first
/// ingredient, by code, whose composition component has a group decides.
pub fn preparation_group<C: Catalog + ?Sized>(catalog: &C, prep: &Preparation) -> Option<GroupId> {
    catalog.group_of_component(prep.component).or_else(|| {
        prep.ingredients_by_code().into_iter().find_map(|ingredient| {
            catalog
                .composition(&ingredient.code)
                .and_then(|c| catalog.group_of_component(c.component))
        })
    })
}

// =============================================================================
// USAGE
// =============================================================================

/// A preparation that credited a group on a given day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Contributor {
    pub day: usize,
    pub group: GroupId,
    pub preparation: PreparationId,
    pub preparation_name: String,
}

impl Contributor {
    /// Display label of the day ("Lunes", ...).
    #[must_use]
    pub fn day_label(&self) -> &'static str {
        day_label(self.day).unwrap_or("")
    }
}

/// Day counts and contributors of every group seen in a week.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyUsage {
    /// Days on which each group appears, including groups with no quota.
    pub actual: BTreeMap<GroupId, u32>,
    pub contributors: BTreeMap<GroupId, Vec<Contributor>>,
}

impl WeeklyUsage {
    #[must_use]
    pub fn actual(&self, group: GroupId) -> u32 {
        self.actual.get(&group).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn contributors(&self, group: GroupId) -> &[Contributor] {
        self.contributors
            .get(&group)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether `group` was credited on `day`.
    #[must_use]
    pub fn credited(&self, group: GroupId, day: usize) -> bool {
        self.contributors(group).iter().any(|c| c.day == day)
    }
}

/// Count group occurrences over day menus (index = day).
pub fn group_usage<C: Catalog + ?Sized>(catalog: &C, menus: &[&Menu]) -> WeeklyUsage {
    let mut usage = WeeklyUsage::default();

    for (day, menu) in menus.iter().enumerate() {
        let mut seen_today = BTreeSet::new();
        for prep in &menu.preparations {
            let Some(group) = preparation_group(catalog, prep) else {
                tracing::debug!(
                    menu = menu.id.0,
                    preparation = prep.id.0,
                    "preparation has no food group"
                );
                continue;
            };
            seen_today.insert(group);
            usage
                .contributors
                .entry(group)
                .or_default()
                .push(Contributor {
                    day,
                    group,
                    preparation: prep.id,
                    preparation_name: prep.name.clone(),
                });
        }
        for group in seen_today {
            *usage.actual.entry(group).or_insert(0) += 1;
        }
    }

    usage
}

// =============================================================================
// FREQUENCY CHECK
// =============================================================================

/// Quota check of one required group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFrequency {
    pub group: GroupId,
    pub group_name: String,
    pub required: u32,
    pub actual: u32,
    pub complies: bool,
}

/// Check each weekly requirement against the usage.
pub fn check_frequencies<C: Catalog + ?Sized>(
    catalog: &C,
    requirements: &[&WeeklyGroupRequirement],
    usage: &WeeklyUsage,
) -> Vec<GroupFrequency> {
    requirements
        .iter()
        .map(|rule| {
            let actual = usage.actual(rule.group);
            GroupFrequency {
                group: rule.group,
                group_name: catalog.group_name(rule.group),
                required: rule.required,
                actual,
                complies: actual >= rule.required,
            }
        })
        .collect()
}
