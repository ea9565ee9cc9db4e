//! # Weekly Compliance
//!
//! Combines the frequency check, the exclusion adjustment and the sub-group
//! restrictions into one weekly verdict. The week complies only when every
//! adjusted group result and every restriction result complies.

use crate::catalog::Catalog;
use crate::exclusion::{AdjustedGroupResult, apply_exclusions};
use crate::primitives::day_label;
use crate::subgroup::{RestrictionResult, check_restrictions, ingredient_usage};
use crate::weekly::{WeekPlan, WeeklyUsage, check_frequencies, group_usage};
use crate::{EntityKind, Menu, MenuId, MinutaError, ModalityId};
use serde::{Deserialize, Serialize};

/// One day of the evaluated week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDay {
    pub day: usize,
    pub label: String,
    pub menu: MenuId,
    pub menu_name: String,
}

/// The weekly verdict of one modality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyCompliance {
    pub modality: ModalityId,
    pub days: Vec<PlanDay>,
    pub groups: Vec<AdjustedGroupResult>,
    pub restrictions: Vec<RestrictionResult>,
    pub usage: WeeklyUsage,
    pub complies: bool,
}

impl WeeklyCompliance {
    /// Groups and restrictions that fail, by name.
    #[must_use]
    pub fn failures(&self) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|g| !g.complies)
            .map(|g| g.group_name.as_str())
            .chain(
                self.restrictions
                    .iter()
                    .filter(|r| !r.complies)
                    .map(|r| r.name.as_str()),
            )
            .collect()
    }
}

/// Validate a week of menus against a modality's weekly rules.
pub fn validate_week<C: Catalog + ?Sized>(
    catalog: &C,
    modality: ModalityId,
    plan: &WeekPlan,
) -> Result<WeeklyCompliance, MinutaError> {
    if catalog.modality(modality).is_none() {
        return Err(MinutaError::not_found(EntityKind::Modality, modality));
    }

    let menus: Vec<&Menu> = plan
        .days()
        .iter()
        .map(|id| {
            catalog
                .menu(*id)
                .ok_or_else(|| MinutaError::not_found(EntityKind::Menu, id))
        })
        .collect::<Result<_, _>>()?;

    for menu in &menus {
        if menu.modality != modality {
            tracing::warn!(
                menu = menu.id.0,
                menu_modality = menu.modality.0,
                modality = modality.0,
                "menu belongs to a different modality"
            );
        }
    }

    let usage = group_usage(catalog, &menus);
    let base = check_frequencies(catalog, &catalog.weekly_requirements(modality), &usage);
    let groups = apply_exclusions(&base, &catalog.exclusion_sets(modality), &usage);

    let ingredients = ingredient_usage(catalog, &menus);
    let restrictions = check_restrictions(
        catalog,
        &catalog.subgroup_restrictions(modality),
        &ingredients,
        &usage,
    );

    let complies = groups.iter().all(|g| g.complies) && restrictions.iter().all(|r| r.complies);

    let days = menus
        .iter()
        .enumerate()
        .map(|(day, menu)| PlanDay {
            day,
            label: day_label(day).unwrap_or_default().to_string(),
            menu: menu.id,
            menu_name: menu.name.clone(),
        })
        .collect();

    tracing::debug!(
        modality = modality.0,
        days = menus.len(),
        complies,
        "week validated"
    );

    Ok(WeeklyCompliance {
        modality,
        days,
        groups,
        restrictions,
        usage,
        complies,
    })
}
