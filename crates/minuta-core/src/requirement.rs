//! # Requirement Resolution
//!
//! Two-step lookup of the nutrient targets used as the adequacy denominator:
//! first the row scoped to (level, modality), then the level-only row.
//! When neither exists the targets are zero and every percentage comes out
//! as zero; the gap is reported, never raised.

use crate::catalog::Catalog;
use crate::{LevelId, ModalityId, NutrientValues};
use serde::{Deserialize, Serialize};

/// Which lookup step produced the targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementScope {
    /// Row for exactly (level, modality).
    Scoped,
    /// Fallback row for the level with no modality.
    LevelOnly,
    /// No row found: zero targets.
    Missing,
}

/// Resolved targets for one (level, modality).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRequirement {
    pub values: NutrientValues,
    pub reference_adequacy: Option<f64>,
    pub scope: RequirementScope,
}

impl ResolvedRequirement {
    #[must_use]
    pub fn missing() -> Self {
        Self {
            values: NutrientValues::zero(),
            reference_adequacy: None,
            scope: RequirementScope::Missing,
        }
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.scope == RequirementScope::Missing
    }
}

/// Scoped-then-unscoped lookup.
pub fn resolve_requirement<C: Catalog + ?Sized>(
    catalog: &C,
    level: LevelId,
    modality: Option<ModalityId>,
) -> ResolvedRequirement {
    let scoped = modality.and_then(|m| catalog.requirement(level, Some(m)));
    if let Some(req) = scoped {
        return ResolvedRequirement {
            values: req.values,
            reference_adequacy: req.reference_adequacy,
            scope: RequirementScope::Scoped,
        };
    }

    match catalog.requirement(level, None) {
        Some(req) => {
            tracing::debug!(
                level = level.0,
                modality = modality.map(|m| m.0),
                "using level-only nutrient requirement"
            );
            ResolvedRequirement {
                values: req.values,
                reference_adequacy: req.reference_adequacy,
                scope: RequirementScope::LevelOnly,
            }
        }
        None => {
            tracing::warn!(
                level = level.0,
                modality = modality.map(|m| m.0),
                "no nutrient requirement configured; percentages will be zero"
            );
            ResolvedRequirement::missing()
        }
    }
}
