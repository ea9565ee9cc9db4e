//! # Catalog
//!
//! The read seam between the engine and master data.
//!
//! The `Catalog` trait is everything the analysis and weekly validators need
//! to know about menus, ingredients and rules. `MemoryCatalog` is the
//! in-memory implementation, loaded from a JSON document and validated once
//! at load time so the engine can rely on its invariants.

use crate::composition::CompositionTable;
use crate::{
    Component, ComponentId, ExclusionSet, FoodGroup, GroupId, IngredientCode,
    IngredientComposition, LevelId, Menu, MenuId, MinutaError, Modality, ModalityId,
    NutrientRequirement, SchoolLevel, SubgroupRestriction, WeeklyGroupRequirement,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// CATALOG TRAIT
// =============================================================================

/// Read access to master data.
///
/// Collections are returned in a fixed order (by id) so every consumer
/// iterates deterministically.
pub trait Catalog {
    fn menu(&self, id: MenuId) -> Option<&Menu>;

    fn level(&self, id: LevelId) -> Option<&SchoolLevel>;

    /// All school levels, by id.
    fn levels(&self) -> Vec<&SchoolLevel>;

    fn modality(&self, id: ModalityId) -> Option<&Modality>;

    fn composition(&self, code: &IngredientCode) -> Option<&IngredientComposition>;

    fn component(&self, id: ComponentId) -> Option<&Component>;

    fn group(&self, id: GroupId) -> Option<&FoodGroup>;

    /// Requirement row with exactly this scope; `None` modality selects the
    /// level-only row.
    fn requirement(
        &self,
        level: LevelId,
        modality: Option<ModalityId>,
    ) -> Option<&NutrientRequirement>;

    fn weekly_requirements(&self, modality: ModalityId) -> Vec<&WeeklyGroupRequirement>;

    fn exclusion_sets(&self, modality: ModalityId) -> Vec<&ExclusionSet>;

    fn subgroup_restrictions(&self, modality: ModalityId) -> Vec<&SubgroupRestriction>;

    /// Food group of a component, if both exist and are linked.
    fn group_of_component(&self, component: Option<ComponentId>) -> Option<GroupId> {
        component
            .and_then(|id| self.component(id))
            .and_then(|c| c.group)
    }

    /// Display name of a group, falling back to its id.
    fn group_name(&self, id: GroupId) -> String {
        self.group(id)
            .map(|g| g.name.clone())
            .unwrap_or_else(|| format!("grupo {}", id))
    }
}

// =============================================================================
// CATALOG DOCUMENT
// =============================================================================

/// The serialized form of a catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDocument {
    pub compositions: CompositionTable,
    pub components: Vec<Component>,
    pub groups: Vec<FoodGroup>,
    pub levels: Vec<SchoolLevel>,
    pub modalities: Vec<Modality>,
    pub menus: Vec<Menu>,
    pub requirements: Vec<NutrientRequirement>,
    pub weekly_requirements: Vec<WeeklyGroupRequirement>,
    pub exclusion_sets: Vec<ExclusionSet>,
    pub subgroup_restrictions: Vec<SubgroupRestriction>,
}

// =============================================================================
// MEMORY CATALOG
// =============================================================================

/// Validated, indexed in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    compositions: CompositionTable,
    components: BTreeMap<ComponentId, Component>,
    groups: BTreeMap<GroupId, FoodGroup>,
    levels: BTreeMap<LevelId, SchoolLevel>,
    modalities: BTreeMap<ModalityId, Modality>,
    menus: BTreeMap<MenuId, Menu>,
    requirements: BTreeMap<(LevelId, Option<ModalityId>), NutrientRequirement>,
    weekly_requirements: Vec<WeeklyGroupRequirement>,
    exclusion_sets: Vec<ExclusionSet>,
    subgroup_restrictions: Vec<SubgroupRestriction>,
}

impl MemoryCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index and validate a catalog document.
    pub fn from_document(doc: CatalogDocument) -> Result<Self, MinutaError> {
        let mut catalog = Self {
            compositions: doc.compositions,
            ..Self::default()
        };

        for component in doc.components {
            catalog.components.insert(component.id, component);
        }
        for group in doc.groups {
            catalog.groups.insert(group.id, group);
        }
        for level in doc.levels {
            catalog.levels.insert(level.id, level);
        }
        for modality in doc.modalities {
            catalog.modalities.insert(modality.id, modality);
        }
        for menu in doc.menus {
            let id = menu.id;
            if catalog.menus.insert(id, menu).is_some() {
                return Err(MinutaError::InvalidCatalog(format!(
                    "duplicate menu id {}",
                    id
                )));
            }
        }
        for req in doc.requirements {
            let key = (req.level, req.modality);
            if catalog.requirements.insert(key, req).is_some() {
                return Err(MinutaError::InvalidCatalog(format!(
                    "duplicate requirement for level {} modality {:?}",
                    key.0,
                    key.1.map(|m| m.0)
                )));
            }
        }

        catalog.weekly_requirements = doc.weekly_requirements;
        catalog
            .weekly_requirements
            .sort_by_key(|r| (r.modality, r.group));
        catalog.exclusion_sets = doc.exclusion_sets;
        catalog.exclusion_sets.sort_by_key(|s| s.id);
        catalog.subgroup_restrictions = doc.subgroup_restrictions;
        catalog.subgroup_restrictions.sort_by_key(|r| r.id);

        catalog.validate()?;
        Ok(catalog)
    }

    /// Check the structural invariants the engine relies on.
    pub fn validate(&self) -> Result<(), MinutaError> {
        let invalid = |msg: String| Err(MinutaError::InvalidCatalog(msg));

        for component in self.components.values() {
            if let Some(group) = component.group {
                if !self.groups.contains_key(&group) {
                    return invalid(format!(
                        "component {} references unknown group {}",
                        component.id, group
                    ));
                }
            }
        }

        for row in self.compositions.iter() {
            if let Some(component) = row.component {
                if !self.components.contains_key(&component) {
                    return invalid(format!(
                        "ingredient {} references unknown component {}",
                        row.code, component
                    ));
                }
            }
        }

        for menu in self.menus.values() {
            if !self.modalities.contains_key(&menu.modality) {
                return invalid(format!(
                    "menu {} references unknown modality {}",
                    menu.id, menu.modality
                ));
            }
            let mut seen = BTreeSet::new();
            for prep in &menu.preparations {
                if !seen.insert(prep.id) {
                    return invalid(format!(
                        "menu {} lists preparation {} twice",
                        menu.id, prep.id
                    ));
                }
                if let Some(component) = prep.component {
                    if !self.components.contains_key(&component) {
                        return invalid(format!(
                            "preparation {} references unknown component {}",
                            prep.id, component
                        ));
                    }
                }
                let mut codes = BTreeSet::new();
                for ingredient in &prep.ingredients {
                    if !codes.insert(&ingredient.code) {
                        return invalid(format!(
                            "preparation {} lists ingredient {} twice",
                            prep.id, ingredient.code
                        ));
                    }
                    if let Some(weight) = ingredient.default_net_weight {
                        if !weight.is_finite() || weight < 0.0 {
                            return invalid(format!(
                                "preparation {} ingredient {} has invalid default weight {}",
                                prep.id, ingredient.code, weight
                            ));
                        }
                    }
                }
            }
        }

        for req in self.requirements.values() {
            if !self.levels.contains_key(&req.level) {
                return invalid(format!("requirement references unknown level {}", req.level));
            }
        }

        for rule in &self.weekly_requirements {
            if !self.groups.contains_key(&rule.group) {
                return invalid(format!(
                    "weekly requirement references unknown group {}",
                    rule.group
                ));
            }
        }

        let mut membership: BTreeMap<(ModalityId, GroupId), crate::ExclusionSetId> =
            BTreeMap::new();
        for set in &self.exclusion_sets {
            let distinct: BTreeSet<_> = set.groups.iter().copied().collect();
            if distinct.len() < 2 {
                return invalid(format!(
                    "exclusion set {} needs at least two distinct groups",
                    set.id
                ));
            }
            for group in distinct {
                if !self.groups.contains_key(&group) {
                    return invalid(format!(
                        "exclusion set {} references unknown group {}",
                        set.id, group
                    ));
                }
                if let Some(other) = membership.insert((set.modality, group), set.id) {
                    return invalid(format!(
                        "group {} belongs to exclusion sets {} and {}",
                        group, other, set.id
                    ));
                }
            }
        }

        for restriction in &self.subgroup_restrictions {
            if !self.groups.contains_key(&restriction.group) {
                return invalid(format!(
                    "restriction {} references unknown group {}",
                    restriction.id, restriction.group
                ));
            }
        }

        Ok(())
    }

    /// Number of menus.
    #[must_use]
    pub fn menu_count(&self) -> usize {
        self.menus.len()
    }

    /// Number of composition rows.
    #[must_use]
    pub fn composition_count(&self) -> usize {
        self.compositions.len()
    }

    /// Menus of one modality, by id.
    #[must_use]
    pub fn menus_of(&self, modality: ModalityId) -> Vec<&Menu> {
        self.menus
            .values()
            .filter(|m| m.modality == modality)
            .collect()
    }
}

impl Catalog for MemoryCatalog {
    fn menu(&self, id: MenuId) -> Option<&Menu> {
        self.menus.get(&id)
    }

    fn level(&self, id: LevelId) -> Option<&SchoolLevel> {
        self.levels.get(&id)
    }

    fn levels(&self) -> Vec<&SchoolLevel> {
        self.levels.values().collect()
    }

    fn modality(&self, id: ModalityId) -> Option<&Modality> {
        self.modalities.get(&id)
    }

    fn composition(&self, code: &IngredientCode) -> Option<&IngredientComposition> {
        self.compositions.get(code)
    }

    fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    fn group(&self, id: GroupId) -> Option<&FoodGroup> {
        self.groups.get(&id)
    }

    fn requirement(
        &self,
        level: LevelId,
        modality: Option<ModalityId>,
    ) -> Option<&NutrientRequirement> {
        self.requirements.get(&(level, modality))
    }

    fn weekly_requirements(&self, modality: ModalityId) -> Vec<&WeeklyGroupRequirement> {
        self.weekly_requirements
            .iter()
            .filter(|r| r.modality == modality)
            .collect()
    }

    fn exclusion_sets(&self, modality: ModalityId) -> Vec<&ExclusionSet> {
        self.exclusion_sets
            .iter()
            .filter(|s| s.modality == modality)
            .collect()
    }

    fn subgroup_restrictions(&self, modality: ModalityId) -> Vec<&SubgroupRestriction> {
        self.subgroup_restrictions
            .iter()
            .filter(|r| r.modality == modality)
            .collect()
    }
}
