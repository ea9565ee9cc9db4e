//! # Engine
//!
//! The façade the binary talks to: a validated catalog, the analysis
//! options and an override backend.
//!
//! ## Storage Backends
//!
//! - `InMemory`: `MemoryOverrides` (fast, volatile)
//! - `Persistent`: `RedbOverrides` (disk-backed, ACID)

use crate::analysis::{self, AnalysisOptions, LevelAnalysis, SaveOutcome, SaveRow};
use crate::catalog::{Catalog, MemoryCatalog};
use crate::compliance::{self, WeeklyCompliance};
use crate::overrides::{AnalysisSummary, LevelAnalysisOverride, MemoryOverrides, OverrideStore};
use crate::storage::RedbOverrides;
use crate::weekly::WeekPlan;
use crate::{LevelId, MenuId, MinutaError, ModalityId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Override backend of an engine.
#[derive(Debug)]
pub enum OverrideBackend {
    /// In-memory overrides (fast, volatile).
    InMemory(MemoryOverrides),
    /// Disk-backed overrides using redb (ACID, persistent).
    Persistent(RedbOverrides),
}

impl Default for OverrideBackend {
    fn default() -> Self {
        Self::InMemory(MemoryOverrides::new())
    }
}

// NOTE: OverrideBackend does NOT implement Clone.
// RedbOverrides holds a database handle.

impl OverrideBackend {
    fn store(&self) -> &dyn OverrideStore {
        match self {
            Self::InMemory(memory) => memory,
            Self::Persistent(redb) => redb,
        }
    }

    fn store_mut(&mut self) -> &mut dyn OverrideStore {
        match self {
            Self::InMemory(memory) => memory,
            Self::Persistent(redb) => redb,
        }
    }
}

/// Counters reported by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub menus: usize,
    pub compositions: usize,
    pub levels: usize,
    /// (menu, level) analyses with saved overrides.
    pub saved_analyses: usize,
    pub persistent: bool,
}

/// Catalog plus override storage.
#[derive(Debug)]
pub struct Engine {
    catalog: MemoryCatalog,
    options: AnalysisOptions,
    backend: OverrideBackend,
}

impl Engine {
    /// Engine with in-memory overrides and default options.
    #[must_use]
    pub fn new(catalog: MemoryCatalog) -> Self {
        Self {
            catalog,
            options: AnalysisOptions::default(),
            backend: OverrideBackend::default(),
        }
    }

    /// Engine with persistent redb overrides.
    ///
    /// Opens or creates the database at the given path.
    pub fn with_redb(catalog: MemoryCatalog, path: impl AsRef<Path>) -> Result<Self, MinutaError> {
        let redb = RedbOverrides::open(path)?;
        Ok(Self {
            catalog,
            options: AnalysisOptions::default(),
            backend: OverrideBackend::Persistent(redb),
        })
    }

    /// Replace the analysis options.
    ///
    /// Thresholds whose bands are not increasing are rejected.
    pub fn with_options(mut self, options: AnalysisOptions) -> Result<Self, MinutaError> {
        if !options.thresholds.is_ordered() {
            return Err(MinutaError::ConfigError(
                "semaphore thresholds must be strictly increasing".to_string(),
            ));
        }
        if !options.default_net_weight.is_finite() || options.default_net_weight < 0.0 {
            return Err(MinutaError::ConfigError(format!(
                "default net weight {} is not a usable weight",
                options.default_net_weight
            )));
        }
        self.options = options;
        Ok(self)
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, OverrideBackend::Persistent(_))
    }

    #[must_use]
    pub fn catalog(&self) -> &MemoryCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    #[must_use]
    pub fn backend(&self) -> &OverrideBackend {
        &self.backend
    }

    // =========================================================================
    // ANALYSIS
    // =========================================================================

    pub fn analyze(&self, menu: MenuId, level: LevelId) -> Result<LevelAnalysis, MinutaError> {
        analysis::analyze(&self.catalog, self.backend.store(), menu, level, &self.options)
    }

    pub fn analyze_all_levels(&self, menu: MenuId) -> Result<Vec<LevelAnalysis>, MinutaError> {
        analysis::analyze_all_levels(&self.catalog, self.backend.store(), menu, &self.options)
    }

    pub fn save_override(
        &mut self,
        menu: MenuId,
        level: LevelId,
        rows: &[SaveRow],
        user: &str,
    ) -> Result<SaveOutcome, MinutaError> {
        analysis::save_override(
            &self.catalog,
            self.backend.store_mut(),
            menu,
            level,
            rows,
            user,
        )
    }

    pub fn reset_overrides(&mut self, menu: MenuId, level: LevelId) -> Result<bool, MinutaError> {
        analysis::reset_overrides(&self.catalog, self.backend.store_mut(), menu, level)
    }

    pub fn summary(
        &self,
        menu: MenuId,
        level: LevelId,
    ) -> Result<Option<AnalysisSummary>, MinutaError> {
        self.backend.store().summary(menu, level)
    }

    pub fn overrides(
        &self,
        menu: MenuId,
        level: LevelId,
    ) -> Result<Vec<LevelAnalysisOverride>, MinutaError> {
        self.backend.store().overrides(menu, level)
    }

    // =========================================================================
    // WEEKLY
    // =========================================================================

    pub fn validate_week(
        &self,
        modality: ModalityId,
        plan: &WeekPlan,
    ) -> Result<WeeklyCompliance, MinutaError> {
        compliance::validate_week(&self.catalog, modality, plan)
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    pub fn status(&self) -> Result<EngineStatus, MinutaError> {
        Ok(EngineStatus {
            menus: self.catalog.menu_count(),
            compositions: self.catalog.composition_count(),
            levels: self.catalog.levels().len(),
            saved_analyses: self.backend.store().analysis_count()?,
            persistent: self.is_persistent(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RawWeight;
    use crate::calculation::AdequacyThresholds;
    use crate::fixtures::{self, AM, PRESCHOOL, WEEK};
    use crate::{IngredientCode, PreparationId};
    use tempfile::tempdir;

    fn rice_row(weight: f64) -> SaveRow {
        SaveRow {
            preparation: PreparationId(12),
            ingredient: IngredientCode::new("ARZ"),
            net_weight: RawWeight::Number(weight),
        }
    }

    #[test]
    fn memory_engine_round_trip() {
        let mut engine = Engine::new(fixtures::catalog());
        assert!(!engine.is_persistent());

        let outcome = engine
            .save_override(MenuId(1), PRESCHOOL, &[rice_row(80.0)], "ana")
            .expect("save");
        assert!(outcome.summary.is_some());
        assert_eq!(engine.overrides(MenuId(1), PRESCHOOL).expect("rows").len(), 1);
        assert_eq!(engine.status().expect("status").saved_analyses, 1);

        let analysis = engine.analyze(MenuId(1), PRESCHOOL).expect("analyze");
        assert_eq!(analysis.override_count, 1);
    }

    #[test]
    fn persistent_engine_keeps_overrides_across_restarts() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("minuta.redb");

        {
            let mut engine = Engine::with_redb(fixtures::catalog(), &db_path).expect("open");
            engine
                .save_override(MenuId(1), PRESCHOOL, &[rice_row(80.0)], "ana")
                .expect("save");
        }

        let mut engine = Engine::with_redb(fixtures::catalog(), &db_path).expect("reopen");
        assert!(engine.is_persistent());
        let summary = engine.summary(MenuId(1), PRESCHOOL).expect("summary").expect("some");
        assert_eq!(summary.updated_by, "ana");

        assert!(engine.reset_overrides(MenuId(1), PRESCHOOL).expect("reset"));
        assert!(engine.summary(MenuId(1), PRESCHOOL).expect("summary").is_none());
    }

    #[test]
    fn unordered_thresholds_are_rejected() {
        let options = AnalysisOptions {
            thresholds: AdequacyThresholds {
                optimo_max: 80.0,
                ..AdequacyThresholds::default()
            },
            ..AnalysisOptions::default()
        };
        let err = Engine::new(fixtures::catalog())
            .with_options(options)
            .expect_err("should fail");
        assert!(matches!(err, MinutaError::ConfigError(_)));
    }

    #[test]
    fn engine_validates_weeks() {
        let engine = Engine::new(fixtures::catalog());
        let plan = WeekPlan::new(WEEK.to_vec()).expect("plan");
        assert!(engine.validate_week(AM, &plan).expect("validate").complies);
        assert_eq!(engine.analyze_all_levels(MenuId(1)).expect("all").len(), 3);
    }
}
