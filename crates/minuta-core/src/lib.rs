//! # minuta-core
//!
//! The nutritional menu analysis engine - THE LOGIC.
//!
//! This crate computes, for a school-feeding programme:
//! - per-ingredient nutrient contributions from a composition table
//! - per-level totals, percent adequacy and semaphore states
//! - weekly food-group frequency compliance, including shared quotas
//!   (exclusion sets) and sub-group whitelist restrictions
//!
//! ## Architectural Constraints
//!
//! - Synchronous and deterministic: every collection is a `BTreeMap`/`BTreeSet`
//!   or an explicitly sorted `Vec`
//! - No network, no async; the only I/O is the redb override store
//! - Master data is read through the `Catalog` trait and never mutated here
//! - Soft gaps (missing composition, missing targets) are payload flags,
//!   hard failures are `MinutaError`

// =============================================================================
// MODULES
// =============================================================================

pub mod analysis;
pub mod calculation;
pub mod catalog;
pub mod compliance;
pub mod composition;
pub mod engine;
pub mod exclusion;
pub mod overrides;
pub mod primitives;
pub mod requirement;
pub mod storage;
pub mod subgroup;
pub mod types;
pub mod weekly;

#[cfg(test)]
pub(crate) mod fixtures;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Component, ComponentId, CompositionValues, EntityKind, ExclusionSet, ExclusionSetId, FoodGroup,
    GroupId, IngredientCode, IngredientComposition, LevelId, Menu, MenuId, MinutaError, Modality,
    ModalityId, Nutrient, NutrientRequirement, NutrientValues, Preparation, PreparationId,
    PreparationIngredient, RestrictionId, RowError, SchoolLevel, SubgroupRestriction,
    WeeklyGroupRequirement,
};

// =============================================================================
// RE-EXPORTS: Calculation and Analysis
// =============================================================================

pub use analysis::{
    AnalysisOptions, IngredientRow, LevelAnalysis, PreparationAnalysis, RawWeight, SaveOutcome,
    SaveRow, WeightSource, analyze, analyze_all_levels, preparation_subtotals, reset_overrides,
    save_override,
};
pub use calculation::{
    AdequacyState, AdequacyThresholds, Contribution, NutrientAdequacy, Totals, adequacy,
    adequacy_state, adequacy_state_relative, aggregate, gross_weight, nutrient_contribution,
    percent_adequacy,
};
pub use catalog::{Catalog, CatalogDocument, MemoryCatalog};
pub use composition::CompositionTable;
pub use requirement::{RequirementScope, ResolvedRequirement, resolve_requirement};

// =============================================================================
// RE-EXPORTS: Overrides and Storage
// =============================================================================

pub use engine::{Engine, EngineStatus, OverrideBackend};
pub use overrides::{
    AnalysisSummary, LevelAnalysisOverride, MemoryOverrides, OverrideKey, OverrideStore,
};
pub use storage::RedbOverrides;

// =============================================================================
// RE-EXPORTS: Weekly Validation
// =============================================================================

pub use compliance::{PlanDay, WeeklyCompliance, validate_week};
pub use exclusion::{AdjustedGroupResult, ExclusionDetail, apply_exclusions};
pub use subgroup::{
    IngredientUsage, RestrictionHit, RestrictionResult, check_restriction, check_restrictions,
    ingredient_usage,
};
pub use weekly::{
    Contributor, GroupFrequency, WeekPlan, WeeklyUsage, check_frequencies, group_usage,
    preparation_group,
};
