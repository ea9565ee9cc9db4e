//! # Core Type Definitions
//!
//! This module contains the shared types of the minuta engine:
//! - Catalog identifiers (`MenuId`, `LevelId`, `GroupId`, `IngredientCode`, ...)
//! - Nutrient kinds and nutrient value records (`nutrient` submodule)
//! - Master-data records read through the catalog (`records` submodule)
//! - Error types (`MinutaError`, `RowError`)
//!
//! ## Determinism Guarantees
//!
//! All identifiers implement `Ord` so that every collection keyed by them can
//! be a `BTreeMap`/`BTreeSet` and iterate in a fixed order.

mod nutrient;
mod records;

pub use nutrient::{CompositionValues, Nutrient, NutrientValues};
pub use records::{
    Component, ExclusionSet, FoodGroup, IngredientComposition, Menu, Modality, NutrientRequirement,
    Preparation, PreparationIngredient, SchoolLevel, SubgroupRestriction, WeeklyGroupRequirement,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// CATALOG IDENTIFIERS
// =============================================================================

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

catalog_id!(
    /// A menu: one calendar day's food plan for a modality.
    MenuId
);
catalog_id!(
    /// A school level (age/grade band) with its own nutrient targets.
    LevelId
);
catalog_id!(
    /// A consumption modality (e.g. breakfast prepared on-site).
    ModalityId
);
catalog_id!(
    /// A preparation inside a menu.
    PreparationId
);
catalog_id!(
    /// A component; components belong to food groups.
    ComponentId
);
catalog_id!(
    /// A food group, the granularity of weekly frequency rules.
    GroupId
);
catalog_id!(
    /// A configured exclusion set (shared weekly quota).
    ExclusionSetId
);
catalog_id!(
    /// A configured sub-group whitelist restriction.
    RestrictionId
);

/// Key of an ingredient in the composition table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngredientCode(pub String);

impl IngredientCode {
    /// Create a new ingredient code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IngredientCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// The kind of catalog entity named by a `NotFound` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Menu,
    Level,
    Modality,
    Preparation,
    Ingredient,
    Requirement,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Menu => "menu",
            Self::Level => "school level",
            Self::Modality => "modality",
            Self::Preparation => "preparation",
            Self::Ingredient => "ingredient",
            Self::Requirement => "nutrient requirement",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in the minuta engine.
///
/// Hard failures only. Soft gaps (missing composition, missing nutrient
/// targets) are reported as flags inside result payloads and never appear
/// here.
#[derive(Debug, Error)]
pub enum MinutaError {
    /// A referenced catalog entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    /// The catalog violates one of its structural invariants.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// A weight could not be used (non-numeric, non-finite or negative).
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    /// A save batch carries more rows than a single transaction accepts.
    #[error("Save batch too large: {rows} rows (max {max})")]
    BatchTooLarge { rows: usize, max: usize },

    /// A weekly plan is empty or longer than a week.
    #[error("Invalid week plan: {0}")]
    InvalidWeekPlan(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or storage error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl MinutaError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// A rejected row of an override save batch.
///
/// Row errors are collected next to the rows that succeeded; a bad row never
/// aborts its siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub preparation: PreparationId,
    pub ingredient: IngredientCode,
    pub reason: String,
}

// =============================================================================
// TESTS
// =============================================================================
