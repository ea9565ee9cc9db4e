//! # Per-Level Analysis
//!
//! Produces the nutritional analysis of one (menu, school level) pair and
//! persists user edits to it.
//!
//! ## Weight Resolution
//!
//! For each ingredient of each preparation, in menu order and then by
//! ingredient code:
//! 1. a saved override wins: its frozen weights and values are used as-is;
//! 2. otherwise the preparation default net weight (or the configured
//!    default) is used and the contribution is computed live;
//! 3. an ingredient missing from the composition table contributes zero
//!    nutrients at 100 g and is flagged, never failing the analysis.
//!
//! ## Saving
//!
//! `save_override` validates a whole batch, recomputes each valid row from
//! the current composition table and hands the rows to the override store,
//! which commits them with the recomputed summary in one transaction. Rows
//! with an unusable weight are reported back and skipped; an unknown menu,
//! level, preparation or ingredient fails the whole call before anything is
//! written.

use crate::calculation::{
    AdequacyThresholds, Contribution, NutrientAdequacy, Totals, adequacy, aggregate,
    effective_edible_pct, gross_weight, nutrient_contribution,
};
use crate::catalog::Catalog;
use crate::overrides::{AnalysisSummary, LevelAnalysisOverride, OverrideKey, OverrideStore};
use crate::primitives::{DEFAULT_NET_WEIGHT_G, MAX_SAVE_BATCH_ROWS};
use crate::requirement::{RequirementScope, resolve_requirement};
use crate::{
    CompositionValues, EntityKind, IngredientCode, LevelId, Menu, MenuId, MinutaError, ModalityId,
    Nutrient, NutrientValues, PreparationId, RowError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// OPTIONS
// =============================================================================

/// Tunables of the analysis, normally taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Net weight used when a preparation ingredient has no default weight.
    pub default_net_weight: f64,
    pub thresholds: AdequacyThresholds,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            default_net_weight: DEFAULT_NET_WEIGHT_G,
            thresholds: AdequacyThresholds::default(),
        }
    }
}

// =============================================================================
// RESULT TYPES
// =============================================================================

/// Where an ingredient row's weight came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightSource {
    /// Preparation default (or the configured default).
    Default,
    /// A saved override with frozen values.
    Override,
    /// The ingredient is missing from the composition table.
    Placeholder,
}

/// One ingredient of one preparation in an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRow {
    pub preparation: PreparationId,
    pub ingredient: IngredientCode,
    pub name: String,
    pub net_weight: f64,
    pub gross_weight: f64,
    pub edible_pct: f64,
    /// Resolved contribution (frozen or live).
    pub values: NutrientValues,
    pub composition_found: bool,
    pub source: WeightSource,
}

impl Contribution for IngredientRow {
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

/// A preparation with its ingredient rows and subtotals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparationAnalysis {
    pub id: PreparationId,
    pub name: String,
    pub subtotals: Totals,
    pub ingredients: Vec<IngredientRow>,
}

/// The complete analysis of one (menu, level).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelAnalysis {
    pub menu: MenuId,
    pub menu_name: String,
    pub modality: ModalityId,
    pub level: LevelId,
    pub level_name: String,
    pub requirement: NutrientValues,
    pub reference_adequacy: Option<f64>,
    pub requirement_scope: RequirementScope,
    pub totals: Totals,
    pub adequacy: BTreeMap<Nutrient, NutrientAdequacy>,
    pub preparations: Vec<PreparationAnalysis>,
    /// Number of rows that came from saved overrides.
    pub override_count: usize,
}

impl LevelAnalysis {
    /// All ingredient rows, preparation by preparation.
    pub fn rows(&self) -> impl Iterator<Item = &IngredientRow> {
        self.preparations.iter().flat_map(|p| p.ingredients.iter())
    }

    /// Codes of ingredients missing from the composition table.
    #[must_use]
    pub fn missing_compositions(&self) -> Vec<&IngredientCode> {
        self.rows()
            .filter(|r| !r.composition_found)
            .map(|r| &r.ingredient)
            .collect()
    }
}

/// Sum of the rows belonging to one preparation.
#[must_use]
pub fn preparation_subtotals(rows: &[IngredientRow], preparation: PreparationId) -> Totals {
    aggregate(rows.iter().filter(|r| r.preparation == preparation))
}

// =============================================================================
// ANALYZE
// =============================================================================

/// One resolved line before it becomes a row: either frozen or live.
struct Line<'a> {
    net: f64,
    gross: f64,
    frozen: Option<NutrientValues>,
    per_100g: Option<&'a CompositionValues>,
}

impl Contribution for Line<'_> {
    fn net_weight(&self) -> f64 {
        self.net
    }

    fn gross_weight(&self) -> f64 {
        self.gross
    }

    fn frozen(&self) -> Option<&NutrientValues> {
        self.frozen.as_ref()
    }

    fn per_100g(&self) -> Option<&CompositionValues> {
        self.per_100g
    }
}

fn lookup_menu<C: Catalog + ?Sized>(catalog: &C, menu: MenuId) -> Result<&Menu, MinutaError> {
    catalog
        .menu(menu)
        .ok_or_else(|| MinutaError::not_found(EntityKind::Menu, menu))
}

/// Analyze one menu for one school level.
pub fn analyze<C, S>(
    catalog: &C,
    store: &S,
    menu_id: MenuId,
    level_id: LevelId,
    options: &AnalysisOptions,
) -> Result<LevelAnalysis, MinutaError>
where
    C: Catalog + ?Sized,
    S: OverrideStore + ?Sized,
{
    let menu = lookup_menu(catalog, menu_id)?;
    let level = catalog
        .level(level_id)
        .ok_or_else(|| MinutaError::not_found(EntityKind::Level, level_id))?;

    let requirement = resolve_requirement(catalog, level_id, Some(menu.modality));

    let saved = store.overrides(menu_id, level_id)?;
    let mut overrides: BTreeMap<OverrideKey, &LevelAnalysisOverride> =
        saved.iter().map(|row| (row.key(), row)).collect();

    let mut lines = Vec::new();
    let mut preparations = Vec::with_capacity(menu.preparations.len());
    let mut override_count = 0;

    for prep in &menu.preparations {
        let mut rows = Vec::with_capacity(prep.ingredients.len());

        for ingredient in prep.ingredients_by_code() {
            let key = OverrideKey {
                preparation: prep.id,
                ingredient: ingredient.code.clone(),
            };
            let composition = catalog.composition(&ingredient.code);
            let edible_pct =
                effective_edible_pct(composition.and_then(|c| c.edible_pct).unwrap_or(0.0));

            let (line, source, composition_found) = match (overrides.remove(&key), composition) {
                (Some(saved), _) => {
                    override_count += 1;
                    let line = Line {
                        net: saved.net_weight,
                        gross: saved.gross_weight,
                        frozen: Some(saved.values),
                        per_100g: None,
                    };
                    (line, WeightSource::Override, saved.composition_found)
                }
                (None, Some(found)) => {
                    let net = ingredient
                        .default_net_weight
                        .unwrap_or(options.default_net_weight);
                    let line = Line {
                        net,
                        gross: gross_weight(net, edible_pct),
                        frozen: None,
                        per_100g: Some(&found.per_100g),
                    };
                    (line, WeightSource::Default, true)
                }
                (None, None) => {
                    tracing::warn!(
                        menu = menu_id.0,
                        preparation = prep.id.0,
                        ingredient = %ingredient.code,
                        "ingredient missing from composition table"
                    );
                    let line = Line {
                        net: DEFAULT_NET_WEIGHT_G,
                        gross: DEFAULT_NET_WEIGHT_G,
                        frozen: None,
                        per_100g: None,
                    };
                    (line, WeightSource::Placeholder, false)
                }
            };

            rows.push(IngredientRow {
                preparation: prep.id,
                ingredient: ingredient.code.clone(),
                name: composition
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| ingredient.code.to_string()),
                net_weight: line.net,
                gross_weight: line.gross,
                edible_pct,
                values: line.resolved(),
                composition_found,
                source,
            });
            lines.push(line);
        }

        preparations.push(PreparationAnalysis {
            id: prep.id,
            name: prep.name.clone(),
            subtotals: preparation_subtotals(&rows, prep.id),
            ingredients: rows,
        });
    }

    if !overrides.is_empty() {
        tracing::debug!(
            menu = menu_id.0,
            level = level_id.0,
            orphaned = overrides.len(),
            "ignoring overrides for ingredients no longer in the menu"
        );
    }

    let totals = aggregate(&lines);
    let adequacy = adequacy(
        &totals.nutrients,
        &requirement.values,
        requirement.reference_adequacy,
        &options.thresholds,
    );

    tracing::debug!(
        menu = menu_id.0,
        level = level_id.0,
        calorias = totals.nutrients.calorias,
        overrides = override_count,
        "menu analyzed"
    );

    Ok(LevelAnalysis {
        menu: menu_id,
        menu_name: menu.name.clone(),
        modality: menu.modality,
        level: level_id,
        level_name: level.name.clone(),
        requirement: requirement.values,
        reference_adequacy: requirement.reference_adequacy,
        requirement_scope: requirement.scope,
        totals,
        adequacy,
        preparations,
        override_count,
    })
}

/// Analyze one menu for every school level in the catalog, by level id.
pub fn analyze_all_levels<C, S>(
    catalog: &C,
    store: &S,
    menu_id: MenuId,
    options: &AnalysisOptions,
) -> Result<Vec<LevelAnalysis>, MinutaError>
where
    C: Catalog + ?Sized,
    S: OverrideStore + ?Sized,
{
    lookup_menu(catalog, menu_id)?;
    catalog
        .levels()
        .into_iter()
        .map(|level| analyze(catalog, store, menu_id, level.id, options))
        .collect()
}

// =============================================================================
// SAVE
// =============================================================================

/// A weight as submitted by an editor: a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawWeight {
    Number(f64),
    Text(String),
}

impl RawWeight {
    /// The weight in grams, if usable.
    ///
    /// Strings are trimmed and accept a decimal comma.
    pub fn grams(&self) -> Result<f64, MinutaError> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .map_err(|_| MinutaError::InvalidWeight(format!("'{}' is not a number", text)))?,
        };
        if !value.is_finite() {
            return Err(MinutaError::InvalidWeight(format!("{} is not finite", value)));
        }
        if value < 0.0 {
            return Err(MinutaError::InvalidWeight(format!("{} is negative", value)));
        }
        Ok(value)
    }
}

impl From<f64> for RawWeight {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawWeight {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawWeight {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One edited row of a save batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRow {
    pub preparation: PreparationId,
    pub ingredient: IngredientCode,
    pub net_weight: RawWeight,
}

/// What a save batch did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub menu: MenuId,
    pub level: LevelId,
    pub saved: Vec<OverrideKey>,
    pub failed: Vec<RowError>,
    /// Recomputed summary; `None` when no row was valid and nothing was written.
    pub summary: Option<AnalysisSummary>,
}

/// Validate, recompute and atomically persist a batch of edits.
pub fn save_override<C, S>(
    catalog: &C,
    store: &mut S,
    menu_id: MenuId,
    level_id: LevelId,
    rows: &[SaveRow],
    user: &str,
) -> Result<SaveOutcome, MinutaError>
where
    C: Catalog + ?Sized,
    S: OverrideStore + ?Sized,
{
    let menu = lookup_menu(catalog, menu_id)?;
    if catalog.level(level_id).is_none() {
        return Err(MinutaError::not_found(EntityKind::Level, level_id));
    }
    if rows.len() > MAX_SAVE_BATCH_ROWS {
        return Err(MinutaError::BatchTooLarge {
            rows: rows.len(),
            max: MAX_SAVE_BATCH_ROWS,
        });
    }

    // Structural check of the whole batch before any row is processed.
    for row in rows {
        let prep = menu
            .preparation(row.preparation)
            .ok_or_else(|| MinutaError::not_found(EntityKind::Preparation, row.preparation))?;
        if prep.ingredient(&row.ingredient).is_none() {
            return Err(MinutaError::not_found(
                EntityKind::Ingredient,
                format!("{} in preparation {}", row.ingredient, row.preparation),
            ));
        }
    }

    // Last row for a key wins, whether it is valid or not.
    let mut valid: BTreeMap<OverrideKey, LevelAnalysisOverride> = BTreeMap::new();
    let mut failed: Vec<RowError> = Vec::new();

    for row in rows {
        let key = OverrideKey {
            preparation: row.preparation,
            ingredient: row.ingredient.clone(),
        };
        failed.retain(|f| f.preparation != key.preparation || f.ingredient != key.ingredient);

        let net = match row.net_weight.grams() {
            Ok(net) => net,
            Err(e) => {
                tracing::warn!(
                    menu = menu_id.0,
                    preparation = row.preparation.0,
                    ingredient = %row.ingredient,
                    error = %e,
                    "rejected override row"
                );
                valid.remove(&key);
                failed.push(RowError {
                    preparation: row.preparation,
                    ingredient: row.ingredient.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let composition = catalog.composition(&row.ingredient);
        let (gross, values) = match composition {
            Some(found) => (
                gross_weight(net, found.edible_pct.unwrap_or(0.0)),
                nutrient_contribution(&found.per_100g, net),
            ),
            None => (net, NutrientValues::zero()),
        };

        let entry = LevelAnalysisOverride {
            menu: menu_id,
            level: level_id,
            preparation: row.preparation,
            ingredient: row.ingredient.clone(),
            net_weight: net,
            gross_weight: gross,
            values,
            composition_found: composition.is_some(),
        };
        valid.insert(key, entry);
    }

    if valid.is_empty() {
        tracing::warn!(
            menu = menu_id.0,
            level = level_id.0,
            failed = failed.len(),
            "no valid override rows; nothing saved"
        );
        return Ok(SaveOutcome {
            menu: menu_id,
            level: level_id,
            saved: Vec::new(),
            failed,
            summary: None,
        });
    }

    let requirement = resolve_requirement(catalog, level_id, Some(menu.modality));
    let saved: Vec<OverrideKey> = valid.keys().cloned().collect();
    let rows: Vec<LevelAnalysisOverride> = valid.into_values().collect();
    let summary = store.commit_overrides(menu_id, level_id, rows, &requirement.values, user)?;

    tracing::info!(
        menu = menu_id.0,
        level = level_id.0,
        saved = saved.len(),
        failed = failed.len(),
        revision = summary.revision,
        user,
        "override batch committed"
    );

    Ok(SaveOutcome {
        menu: menu_id,
        level: level_id,
        saved,
        failed,
        summary: Some(summary),
    })
}

/// Drop every saved override of one (menu, level).
pub fn reset_overrides<C, S>(
    catalog: &C,
    store: &mut S,
    menu_id: MenuId,
    level_id: LevelId,
) -> Result<bool, MinutaError>
where
    C: Catalog + ?Sized,
    S: OverrideStore + ?Sized,
{
    lookup_menu(catalog, menu_id)?;
    if catalog.level(level_id).is_none() {
        return Err(MinutaError::not_found(EntityKind::Level, level_id));
    }
    let removed = store.reset(menu_id, level_id)?;
    if removed {
        tracing::info!(menu = menu_id.0, level = level_id.0, "overrides reset");
    }
    Ok(removed)
}

// =============================================================================
// TESTS
// =============================================================================
