//! # Level Analysis Overrides
//!
//! User edits to a (menu, level) analysis: an explicit net weight per
//! (preparation, ingredient) plus the nutrient contribution frozen at save
//! time, and the summary (totals and raw percentages) recomputed from them.
//!
//! ## Storage Backends
//!
//! `OverrideStore` is implemented by:
//! - `MemoryOverrides`: BTreeMap-backed, volatile
//! - `storage::RedbOverrides`: disk-backed, one ACID transaction per batch
//!
//! Both commit a batch as a unit: the rows are upserted and the summary is
//! recomputed from every override row of that (menu, level), or nothing
//! changes at all.

use crate::calculation::{Contribution, Totals, aggregate, raw_percentages};
use crate::{
    CompositionValues, IngredientCode, LevelId, MenuId, MinutaError, NutrientValues, PreparationId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of an override inside one (menu, level) analysis.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OverrideKey {
    pub preparation: PreparationId,
    pub ingredient: IngredientCode,
}

/// A saved edit with its frozen contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelAnalysisOverride {
    pub menu: MenuId,
    pub level: LevelId,
    pub preparation: PreparationId,
    pub ingredient: IngredientCode,
    pub net_weight: f64,
    pub gross_weight: f64,
    /// Contribution computed from the composition table at save time.
    pub values: NutrientValues,
    pub composition_found: bool,
}

impl LevelAnalysisOverride {
    #[must_use]
    pub fn key(&self) -> OverrideKey {
        OverrideKey {
            preparation: self.preparation,
            ingredient: self.ingredient.clone(),
        }
    }
}

impl Contribution for LevelAnalysisOverride {
    fn net_weight(&self) -> f64 {
        self.net_weight
    }

    fn gross_weight(&self) -> f64 {
        self.gross_weight
    }

    fn frozen(&self) -> Option<&NutrientValues> {
        Some(&self.values)
    }

    fn per_100g(&self) -> Option<&CompositionValues> {
        None
    }
}

/// The persisted parent record of a (menu, level) analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub menu: MenuId,
    pub level: LevelId,
    pub totals: Totals,
    /// Uncapped, non-negative adequacy percentages.
    pub percentages: NutrientValues,
    pub updated_by: String,
    /// Incremented on every committed batch.
    pub revision: u64,
}

/// Storage of override sets and their summaries.
pub trait OverrideStore {
    /// All override rows of one analysis, ordered by key.
    fn overrides(
        &self,
        menu: MenuId,
        level: LevelId,
    ) -> Result<Vec<LevelAnalysisOverride>, MinutaError>;

    fn summary(&self, menu: MenuId, level: LevelId)
    -> Result<Option<AnalysisSummary>, MinutaError>;

    /// Upsert `rows` and recompute the summary against `requirement`, as one
    /// atomic unit.
    fn commit_overrides(
        &mut self,
        menu: MenuId,
        level: LevelId,
        rows: Vec<LevelAnalysisOverride>,
        requirement: &NutrientValues,
        user: &str,
    ) -> Result<AnalysisSummary, MinutaError>;

    /// Drop the override set and summary. Returns whether anything existed.
    fn reset(&mut self, menu: MenuId, level: LevelId) -> Result<bool, MinutaError>;

    /// Number of (menu, level) analyses with saved overrides.
    fn analysis_count(&self) -> Result<usize, MinutaError>;
}

// =============================================================================
// SHARED BATCH LOGIC
// =============================================================================

/// Merge `incoming` over `existing`, replacing rows with the same key.
pub(crate) fn merge_rows(
    existing: Vec<LevelAnalysisOverride>,
    incoming: Vec<LevelAnalysisOverride>,
) -> Vec<LevelAnalysisOverride> {
    let mut merged: BTreeMap<OverrideKey, LevelAnalysisOverride> =
        existing.into_iter().map(|row| (row.key(), row)).collect();
    for row in incoming {
        merged.insert(row.key(), row);
    }
    merged.into_values().collect()
}

/// Recompute a summary from the full override set.
pub(crate) fn summarize(
    menu: MenuId,
    level: LevelId,
    rows: &[LevelAnalysisOverride],
    requirement: &NutrientValues,
    user: &str,
    previous_revision: Option<u64>,
) -> AnalysisSummary {
    let totals = aggregate(rows);
    AnalysisSummary {
        menu,
        level,
        percentages: raw_percentages(&totals.nutrients, requirement),
        totals,
        updated_by: user.to_string(),
        revision: previous_revision.map_or(1, |r| r.saturating_add(1)),
    }
}

// =============================================================================
// IN-MEMORY BACKEND
// =============================================================================

#[derive(Debug, Clone)]
struct OverrideSet {
    rows: Vec<LevelAnalysisOverride>,
    summary: AnalysisSummary,
}

/// Volatile override store.
#[derive(Debug, Clone, Default)]
pub struct MemoryOverrides {
    sets: BTreeMap<(MenuId, LevelId), OverrideSet>,
}

impl MemoryOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl OverrideStore for MemoryOverrides {
    fn overrides(
        &self,
        menu: MenuId,
        level: LevelId,
    ) -> Result<Vec<LevelAnalysisOverride>, MinutaError> {
        Ok(self
            .sets
            .get(&(menu, level))
            .map(|set| set.rows.clone())
            .unwrap_or_default())
    }

    fn summary(
        &self,
        menu: MenuId,
        level: LevelId,
    ) -> Result<Option<AnalysisSummary>, MinutaError> {
        Ok(self.sets.get(&(menu, level)).map(|set| set.summary.clone()))
    }

    fn commit_overrides(
        &mut self,
        menu: MenuId,
        level: LevelId,
        rows: Vec<LevelAnalysisOverride>,
        requirement: &NutrientValues,
        user: &str,
    ) -> Result<AnalysisSummary, MinutaError> {
        // Stage into a fresh set; the map only changes once everything is built.
        let (existing, previous_revision) = match self.sets.get(&(menu, level)) {
            Some(set) => (set.rows.clone(), Some(set.summary.revision)),
            None => (Vec::new(), None),
        };
        let merged = merge_rows(existing, rows);
        let summary = summarize(menu, level, &merged, requirement, user, previous_revision);

        self.sets.insert(
            (menu, level),
            OverrideSet {
                rows: merged,
                summary: summary.clone(),
            },
        );
        Ok(summary)
    }

    fn reset(&mut self, menu: MenuId, level: LevelId) -> Result<bool, MinutaError> {
        Ok(self.sets.remove(&(menu, level)).is_some())
    }

    fn analysis_count(&self) -> Result<usize, MinutaError> {
        Ok(self.sets.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row(prep: u64, code: &str, net: f64, kcal: f64) -> LevelAnalysisOverride {
        let mut values = NutrientValues::zero();
        values.calorias = kcal;
        LevelAnalysisOverride {
            menu: MenuId(1),
            level: LevelId(1),
            preparation: PreparationId(prep),
            ingredient: IngredientCode::new(code),
            net_weight: net,
            gross_weight: net,
            values,
            composition_found: true,
        }
    }

    fn target(kcal: f64) -> NutrientValues {
        let mut values = NutrientValues::zero();
        values.calorias = kcal;
        values
    }

    #[test]
    fn merge_replaces_matching_keys() {
        let merged = merge_rows(
            vec![row(1, "A", 10.0, 10.0), row(1, "B", 20.0, 20.0)],
            vec![row(1, "A", 30.0, 30.0), row(2, "A", 5.0, 5.0)],
        );
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].net_weight, 30.0);
        assert_eq!(merged[2].preparation, PreparationId(2));
    }

    #[test]
    fn commit_recomputes_summary_over_all_rows() {
        let mut store = MemoryOverrides::new();
        store
            .commit_overrides(
                MenuId(1),
                LevelId(1),
                vec![row(1, "A", 50.0, 100.0)],
                &target(400.0),
                "ana",
            )
            .expect("first commit");
        let summary = store
            .commit_overrides(
                MenuId(1),
                LevelId(1),
                vec![row(1, "B", 25.0, 200.0)],
                &target(400.0),
                "luis",
            )
            .expect("second commit");

        assert_eq!(summary.totals.nutrients.calorias, 300.0);
        assert_eq!(summary.totals.net_weight, 75.0);
        assert_eq!(summary.percentages.calorias, 75.0);
        assert_eq!(summary.updated_by, "luis");
        assert_eq!(summary.revision, 2);
        assert_eq!(
            store.overrides(MenuId(1), LevelId(1)).expect("rows").len(),
            2
        );
    }

    #[test]
    fn stored_percentages_are_uncapped() {
        let mut store = MemoryOverrides::new();
        let summary = store
            .commit_overrides(
                MenuId(1),
                LevelId(1),
                vec![row(1, "A", 50.0, 600.0)],
                &target(400.0),
                "ana",
            )
            .expect("commit");
        assert_eq!(summary.percentages.calorias, 150.0);
    }

    #[test]
    fn reset_drops_rows_and_summary() {
        let mut store = MemoryOverrides::new();
        store
            .commit_overrides(
                MenuId(1),
                LevelId(1),
                vec![row(1, "A", 50.0, 100.0)],
                &target(400.0),
                "ana",
            )
            .expect("commit");

        assert!(store.reset(MenuId(1), LevelId(1)).expect("reset"));
        assert!(!store.reset(MenuId(1), LevelId(1)).expect("reset again"));
        assert!(store.summary(MenuId(1), LevelId(1)).expect("summary").is_none());
        assert_eq!(store.analysis_count().expect("count"), 0);
    }
}
