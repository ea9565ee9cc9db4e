//! # Calculation Engine
//!
//! Pure, side-effect-free nutrient arithmetic:
//! - weight conversion (net → gross through the edible portion)
//! - per-ingredient nutrient contribution from per-100 g composition
//! - aggregation of contributions into totals
//! - percent adequacy against a target and semaphore classification
//!
//! Every function here is total over finite inputs. Rejecting negative or
//! non-numeric weights is the caller's job (see `analysis`).

use crate::primitives::{
    ACEPTABLE_MAX_PCT, ADEQUACY_CAP_PCT, MAX_EDIBLE_PCT, MIN_EDIBLE_PCT, OPTIMO_MAX_PCT,
    REFERENCE_ACEPTABLE_BAND, REFERENCE_AZUL_BAND, REFERENCE_OPTIMO_BAND,
};
use crate::{CompositionValues, Nutrient, NutrientValues};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// WEIGHTS AND CONTRIBUTIONS
// =============================================================================

/// Edible-portion percentage actually used: zero or non-finite means 100,
/// anything else is clamped to `[1, 100]`.
#[must_use]
pub fn effective_edible_pct(edible_pct: f64) -> f64 {
    if edible_pct == 0.0 || !edible_pct.is_finite() {
        MAX_EDIBLE_PCT
    } else {
        edible_pct.clamp(MIN_EDIBLE_PCT, MAX_EDIBLE_PCT)
    }
}

/// Gross (as purchased) weight for a net (edible) weight.
#[must_use]
pub fn gross_weight(net_weight: f64, edible_pct: f64) -> f64 {
    net_weight * 100.0 / effective_edible_pct(edible_pct)
}

/// Nutrients delivered by `net_weight` grams of an ingredient.
#[must_use]
pub fn nutrient_contribution(per_100g: &CompositionValues, net_weight: f64) -> NutrientValues {
    NutrientValues::from_fn(|n| (per_100g.per_100g(n) * net_weight) / 100.0)
}

/// Anything that contributes nutrients and weight to a total.
///
/// A contribution either carries frozen values (an override saved earlier)
/// or is recomputed live from its per-100 g composition at its current net
/// weight. Frozen values always win.
pub trait Contribution {
    fn net_weight(&self) -> f64;
    fn gross_weight(&self) -> f64;
    /// Values frozen at save time, if any.
    fn frozen(&self) -> Option<&NutrientValues>;
    /// Live composition, if the ingredient exists in the composition table.
    fn per_100g(&self) -> Option<&CompositionValues>;

    /// The nutrient values this contribution adds to a total.
    fn resolved(&self) -> NutrientValues {
        match (self.frozen(), self.per_100g()) {
            (Some(frozen), _) => *frozen,
            (None, Some(per_100g)) => nutrient_contribution(per_100g, self.net_weight()),
            (None, None) => NutrientValues::zero(),
        }
    }
}

/// Summed nutrients and weights.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub nutrients: NutrientValues,
    pub net_weight: f64,
    pub gross_weight: f64,
}

impl Totals {
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Sum every nutrient and both weights across contributions.
///
/// The empty input yields all-zero totals.
pub fn aggregate<'a, C, I>(items: I) -> Totals
where
    C: Contribution + 'a,
    I: IntoIterator<Item = &'a C>,
{
    items.into_iter().fold(Totals::zero(), |mut acc, item| {
        acc.nutrients += item.resolved();
        acc.net_weight += item.net_weight();
        acc.gross_weight += item.gross_weight();
        acc
    })
}

// =============================================================================
// ADEQUACY
// =============================================================================

/// Percentage of `requirement` covered by `total`.
///
/// Zero when the requirement is not positive; never negative; capped at 100
/// when `cap_at_100` is set.
#[must_use]
pub fn percent_adequacy(total: f64, requirement: f64, cap_at_100: bool) -> f64 {
    if requirement.is_nan() || requirement <= 0.0 {
        return 0.0;
    }
    let pct = (total / requirement * 100.0).max(0.0);
    if cap_at_100 {
        pct.min(ADEQUACY_CAP_PCT)
    } else {
        pct
    }
}

/// Semaphore state of an adequacy percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdequacyState {
    Optimo,
    /// Only produced by the reference-relative scale.
    Azul,
    Aceptable,
    Alto,
}

impl AdequacyState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimo => "optimo",
            Self::Azul => "azul",
            Self::Aceptable => "aceptable",
            Self::Alto => "alto",
        }
    }
}

impl std::fmt::Display for AdequacyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semaphore thresholds for both classification scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdequacyThresholds {
    /// Fixed scale: `optimo` at or below.
    pub optimo_max: f64,
    /// Fixed scale: `aceptable` at or below (and above `optimo_max`).
    pub aceptable_max: f64,
    /// Reference scale: distance bands in percentage points.
    pub reference_optimo: f64,
    pub reference_azul: f64,
    pub reference_aceptable: f64,
}

impl Default for AdequacyThresholds {
    fn default() -> Self {
        Self {
            optimo_max: OPTIMO_MAX_PCT,
            aceptable_max: ACEPTABLE_MAX_PCT,
            reference_optimo: REFERENCE_OPTIMO_BAND,
            reference_azul: REFERENCE_AZUL_BAND,
            reference_aceptable: REFERENCE_ACEPTABLE_BAND,
        }
    }
}

impl AdequacyThresholds {
    /// Check that each scale's bands are increasing.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.optimo_max < self.aceptable_max
            && self.reference_optimo < self.reference_azul
            && self.reference_azul < self.reference_aceptable
    }

    /// Fixed 0–100 scale.
    #[must_use]
    pub fn fixed_state(&self, percentage: f64) -> AdequacyState {
        if percentage <= self.optimo_max {
            AdequacyState::Optimo
        } else if percentage <= self.aceptable_max {
            AdequacyState::Aceptable
        } else {
            AdequacyState::Alto
        }
    }

    /// Scale banded by absolute distance from an expected percentage.
    #[must_use]
    pub fn relative_state(&self, percentage: f64, reference: f64) -> AdequacyState {
        let distance = (percentage - reference).abs();
        if distance <= self.reference_optimo {
            AdequacyState::Optimo
        } else if distance <= self.reference_azul {
            AdequacyState::Azul
        } else if distance <= self.reference_aceptable {
            AdequacyState::Aceptable
        } else {
            AdequacyState::Alto
        }
    }

    /// Relative scale when a reference is supplied, fixed scale otherwise.
    #[must_use]
    pub fn classify(&self, percentage: f64, reference: Option<f64>) -> AdequacyState {
        match reference {
            Some(reference) => self.relative_state(percentage, reference),
            None => self.fixed_state(percentage),
        }
    }
}

/// Fixed-scale state with the default thresholds.
#[must_use]
pub fn adequacy_state(percentage: f64) -> AdequacyState {
    AdequacyThresholds::default().fixed_state(percentage)
}

/// Reference-relative state with the default thresholds.
#[must_use]
pub fn adequacy_state_relative(percentage: f64, reference: f64) -> AdequacyState {
    AdequacyThresholds::default().relative_state(percentage, reference)
}

/// Adequacy of one nutrient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientAdequacy {
    /// Uncapped, non-negative percentage; this is what gets stored.
    pub raw_percentage: f64,
    /// Percentage capped at 100 for display.
    pub percentage: f64,
    pub state: AdequacyState,
}

/// Adequacy of every nutrient of `totals` against `requirement`.
#[must_use]
pub fn adequacy(
    totals: &NutrientValues,
    requirement: &NutrientValues,
    reference: Option<f64>,
    thresholds: &AdequacyThresholds,
) -> BTreeMap<Nutrient, NutrientAdequacy> {
    Nutrient::ALL
        .into_iter()
        .map(|n| {
            let raw = percent_adequacy(totals.get(n), requirement.get(n), false);
            let capped = raw.min(ADEQUACY_CAP_PCT);
            let adequacy = NutrientAdequacy {
                raw_percentage: raw,
                percentage: capped,
                state: thresholds.classify(capped, reference),
            };
            (n, adequacy)
        })
        .collect()
}

/// Raw (uncapped) percentages only, as persisted on an analysis summary.
#[must_use]
pub fn raw_percentages(totals: &NutrientValues, requirement: &NutrientValues) -> NutrientValues {
    NutrientValues::from_fn(|n| percent_adequacy(totals.get(n), requirement.get(n), false))
}

// =============================================================================
// TESTS
// =============================================================================
