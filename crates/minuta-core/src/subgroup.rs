//! # Sub-group Restrictions
//!
//! A restriction requires that at least `frequency` weekly occurrences of a
//! food group use an ingredient from a whitelist. Occurrences are distinct
//! days: the first matching ingredient of a day qualifies it and further
//! matches on the same day are ignored. A day only qualifies when the
//! frequency check credited the group on that day.

use crate::catalog::Catalog;
use crate::weekly::{WeeklyUsage, preparation_group};
use crate::{
    GroupId, IngredientCode, Menu, PreparationId, RestrictionId, SubgroupRestriction,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One ingredient used on one day, attributed to a food group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientUsage {
    pub group: GroupId,
    pub day: usize,
    pub preparation: PreparationId,
    pub preparation_name: String,
    pub ingredient: IngredientCode,
    pub ingredient_name: String,
}

/// Ingredient usage over day menus (index = day).
///
/// An ingredient is attributed to its own component's group, else to its
/// preparation's group. Ingredients with neither are skipped. Rows come out
/// by day, then menu order, then ingredient code.
pub fn ingredient_usage<C: Catalog + ?Sized>(catalog: &C, menus: &[&Menu]) -> Vec<IngredientUsage> {
    let mut usage = Vec::new();
    for (day, menu) in menus.iter().enumerate() {
        for prep in &menu.preparations {
            let prep_group = preparation_group(catalog, prep);
            for ingredient in prep.ingredients_by_code() {
                let composition = catalog.composition(&ingredient.code);
                let group = composition
                    .and_then(|c| catalog.group_of_component(c.component))
                    .or(prep_group);
                let Some(group) = group else {
                    continue;
                };
                usage.push(IngredientUsage {
                    group,
                    day,
                    preparation: prep.id,
                    preparation_name: prep.name.clone(),
                    ingredient: ingredient.code.clone(),
                    ingredient_name: composition
                        .map(|c| c.name.clone())
                        .unwrap_or_else(|| ingredient.code.to_string()),
                });
            }
        }
    }
    usage
}

/// A day that satisfied a restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionHit {
    pub day: usize,
    pub preparation: PreparationId,
    pub preparation_name: String,
    pub ingredient: IngredientCode,
    pub ingredient_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionResult {
    pub restriction: RestrictionId,
    pub name: String,
    pub group: GroupId,
    pub group_name: String,
    pub required: u32,
    /// Distinct qualifying days.
    pub actual: u32,
    pub complies: bool,
    /// One entry per qualifying day, by day.
    pub hits: Vec<RestrictionHit>,
}

/// Check one restriction against the usage rows.
///
/// Whitelist matches on days where `weekly` did not credit the group are
/// ignored, so `actual` never exceeds the group's weekly count.
pub fn check_restriction(
    restriction: &SubgroupRestriction,
    group_name: String,
    usage: &[IngredientUsage],
    weekly: &WeeklyUsage,
) -> RestrictionResult {
    let mut by_day: BTreeMap<usize, &IngredientUsage> = BTreeMap::new();
    for row in usage.iter().filter(|u| {
        u.group == restriction.group
            && restriction.allowed.contains(&u.ingredient)
            && weekly.credited(u.group, u.day)
    }) {
        by_day.entry(row.day).or_insert(row);
    }

    let hits: Vec<RestrictionHit> = by_day
        .into_values()
        .map(|row| RestrictionHit {
            day: row.day,
            preparation: row.preparation,
            preparation_name: row.preparation_name.clone(),
            ingredient: row.ingredient.clone(),
            ingredient_name: row.ingredient_name.clone(),
        })
        .collect();
    let actual = hits.len() as u32;

    RestrictionResult {
        restriction: restriction.id,
        name: restriction.name.clone(),
        group: restriction.group,
        group_name,
        required: restriction.frequency,
        actual,
        complies: actual >= restriction.frequency,
        hits,
    }
}

/// Check every restriction.
pub fn check_restrictions<C: Catalog + ?Sized>(
    catalog: &C,
    restrictions: &[&SubgroupRestriction],
    usage: &[IngredientUsage],
    weekly: &WeeklyUsage,
) -> Vec<RestrictionResult> {
    restrictions
        .iter()
        .map(|r| check_restriction(r, catalog.group_name(r.group), usage, weekly))
        .collect()
}
