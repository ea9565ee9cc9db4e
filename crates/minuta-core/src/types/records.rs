//! Master-data records read by the engine.
//!
//! These mirror the catalog rows the engine consumes. They are created by
//! master-data maintenance and never mutated by analysis.

use super::{
    ComponentId, CompositionValues, ExclusionSetId, GroupId, IngredientCode, LevelId, MenuId,
    ModalityId, NutrientValues, PreparationId, RestrictionId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Composition-table row: nutrient content per 100 g of one ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientComposition {
    pub code: IngredientCode,
    pub name: String,
    #[serde(default)]
    pub per_100g: CompositionValues,
    /// Edible portion, percent. Missing or zero means 100.
    #[serde(default)]
    pub edible_pct: Option<f64>,
    /// Ingredient-level component; wins over the preparation's component
    /// when an ingredient is attributed to a food group.
    #[serde(default)]
    pub component: Option<ComponentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparationIngredient {
    pub code: IngredientCode,
    /// Default net weight in grams; 100 g when unset.
    #[serde(default)]
    pub default_net_weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preparation {
    pub id: PreparationId,
    pub name: String,
    #[serde(default)]
    pub component: Option<ComponentId>,
    #[serde(default)]
    pub ingredients: Vec<PreparationIngredient>,
}

impl Preparation {
    /// Ingredients sorted by code, the engine's fixed iteration order.
    #[must_use]
    pub fn ingredients_by_code(&self) -> Vec<&PreparationIngredient> {
        let mut ingredients: Vec<_> = self.ingredients.iter().collect();
        ingredients.sort_by(|a, b| a.code.cmp(&b.code));
        ingredients
    }

    #[must_use]
    pub fn ingredient(&self, code: &IngredientCode) -> Option<&PreparationIngredient> {
        self.ingredients.iter().find(|i| &i.code == code)
    }
}

/// One calendar day's food plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub id: MenuId,
    pub name: String,
    pub modality: ModalityId,
    /// School-level grouping label the menu was planned for.
    #[serde(default)]
    pub level_group: Option<String>,
    #[serde(default)]
    pub preparations: Vec<Preparation>,
}

impl Menu {
    #[must_use]
    pub fn preparation(&self, id: PreparationId) -> Option<&Preparation> {
        self.preparations.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
    #[serde(default)]
    pub group: Option<GroupId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodGroup {
    pub id: GroupId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolLevel {
    pub id: LevelId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modality {
    pub id: ModalityId,
    pub name: String,
}

/// Nutrient targets for a school level, optionally scoped to a modality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientRequirement {
    pub level: LevelId,
    #[serde(default)]
    pub modality: Option<ModalityId>,
    #[serde(with = "keyed_targets")]
    pub values: NutrientValues,
    /// Expected adequacy percentage; switches the semaphore to the
    /// reference-relative scale when present.
    #[serde(default)]
    pub reference_adequacy: Option<f64>,
}

/// Required weekly occurrences of a food group for a modality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyGroupRequirement {
    pub modality: ModalityId,
    pub group: GroupId,
    pub required: u32,
}

/// Food groups sharing one combined weekly quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSet {
    pub id: ExclusionSetId,
    pub name: String,
    pub modality: ModalityId,
    pub groups: Vec<GroupId>,
    pub shared_frequency: u32,
}

/// At least `frequency` weekly occurrences of `group` must use an ingredient
/// from `allowed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgroupRestriction {
    pub id: RestrictionId,
    pub name: String,
    pub modality: ModalityId,
    pub group: GroupId,
    pub allowed: BTreeSet<IngredientCode>,
    pub frequency: u32,
}

/// Requirement targets travel as `{ "calorias_kcal": 450.0, ... }` maps and
/// are resolved through the fixed nutrient key table.
mod keyed_targets {
    use crate::types::{Nutrient, NutrientValues};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(values: &NutrientValues, s: S) -> Result<S::Ok, S::Error> {
        s.collect_map(Nutrient::ALL.iter().map(|n| (n.key(), values.get(*n))))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NutrientValues, D::Error> {
        let raw: BTreeMap<String, f64> = BTreeMap::deserialize(d)?;
        let (values, unknown) = NutrientValues::from_keyed(raw.iter().map(|(k, v)| (k.as_str(), *v)));
        if let Some(key) = unknown.first() {
            return Err(D::Error::custom(format!("unknown nutrient key: {key}")));
        }
        Ok(values)
    }
}
