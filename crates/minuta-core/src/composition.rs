//! # Composition Table
//!
//! Read-only reference data: nutrient content per 100 g for each ingredient
//! code. The analysis engine only ever reads from it.

use crate::{IngredientCode, IngredientComposition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ingredient compositions keyed by ingredient code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<IngredientComposition>", into = "Vec<IngredientComposition>")]
pub struct CompositionTable {
    rows: BTreeMap<IngredientCode, IngredientComposition>,
}

impl CompositionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a row, returning the previous one.
    pub fn insert(&mut self, row: IngredientComposition) -> Option<IngredientComposition> {
        self.rows.insert(row.code.clone(), row)
    }

    #[must_use]
    pub fn get(&self, code: &IngredientCode) -> Option<&IngredientComposition> {
        self.rows.get(code)
    }

    #[must_use]
    pub fn contains(&self, code: &IngredientCode) -> bool {
        self.rows.contains_key(code)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in code order.
    pub fn iter(&self) -> impl Iterator<Item = &IngredientComposition> {
        self.rows.values()
    }
}

impl From<Vec<IngredientComposition>> for CompositionTable {
    fn from(rows: Vec<IngredientComposition>) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.insert(row);
        }
        table
    }
}

impl From<CompositionTable> for Vec<IngredientComposition> {
    fn from(table: CompositionTable) -> Self {
        table.rows.into_values().collect()
    }
}
