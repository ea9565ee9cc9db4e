//! Shared catalog for unit tests: one breakfast modality, three school
//! levels and a Monday..Friday week of menus.

use crate::catalog::{CatalogDocument, MemoryCatalog};
use crate::{
    Component, ComponentId, CompositionValues, ExclusionSet, ExclusionSetId, FoodGroup, GroupId,
    IngredientCode, IngredientComposition, LevelId, Menu, MenuId, Modality, ModalityId,
    NutrientRequirement, NutrientValues, Preparation, PreparationId, PreparationIngredient,
    RestrictionId, SchoolLevel, SubgroupRestriction, WeeklyGroupRequirement,
};

pub const PRESCHOOL: LevelId = LevelId(1);
pub const PRIMARY: LevelId = LevelId(2);
/// Known level with no requirement rows.
pub const SECONDARY: LevelId = LevelId(3);

pub const AM: ModalityId = ModalityId(1);

pub const CEREALES: GroupId = GroupId(1);
pub const LACTEOS: GroupId = GroupId(3);
pub const CARNES: GroupId = GroupId(4);
pub const FRUTAS: GroupId = GroupId(5);
pub const LEGUMINOSAS: GroupId = GroupId(6);

pub const EGG: &str = "HUE";

pub const WEEK: [MenuId; 5] = [MenuId(1), MenuId(2), MenuId(3), MenuId(4), MenuId(5)];

fn composition(
    code: &str,
    name: &str,
    per_100g: CompositionValues,
    edible_pct: Option<f64>,
    component: Option<u64>,
) -> IngredientComposition {
    IngredientComposition {
        code: IngredientCode::new(code),
        name: name.to_string(),
        per_100g,
        edible_pct,
        component: component.map(ComponentId),
    }
}

fn values(kcal: f64, prot: f64, fat: f64, cho: f64, ca: f64, fe: f64, na: f64) -> CompositionValues {
    CompositionValues {
        energia_kcal: Some(kcal),
        proteina_g: Some(prot),
        grasa_g: Some(fat),
        carbohidratos_g: Some(cho),
        calcio_mg: Some(ca),
        hierro_mg: Some(fe),
        sodio_mg: Some(na),
    }
}

fn kcal_and_protein(kcal: f64, prot: f64) -> CompositionValues {
    CompositionValues {
        energia_kcal: Some(kcal),
        proteina_g: Some(prot),
        ..CompositionValues::default()
    }
}

fn prep(id: u64, name: &str, component: Option<u64>, ingredients: &[(&str, f64)]) -> Preparation {
    Preparation {
        id: PreparationId(id),
        name: name.to_string(),
        component: component.map(ComponentId),
        ingredients: ingredients
            .iter()
            .map(|(code, weight)| PreparationIngredient {
                code: IngredientCode::new(*code),
                default_net_weight: Some(*weight),
            })
            .collect(),
    }
}

fn menu(id: u64, preparations: Vec<Preparation>) -> Menu {
    Menu {
        id: MenuId(id),
        name: format!("Menú {id}"),
        modality: AM,
        level_group: Some("preescolar-primaria".to_string()),
        preparations,
    }
}

fn requirement(level: LevelId, modality: Option<ModalityId>, kcal: f64) -> NutrientRequirement {
    let mut values = NutrientValues::zero();
    values.calorias = kcal;
    values.proteina = 12.0;
    values.calcio = 200.0;
    NutrientRequirement {
        level,
        modality,
        values,
        reference_adequacy: None,
    }
}

/// The raw document, for tests that need to tweak it before loading.
pub fn document() -> CatalogDocument {
    let group = |id: GroupId, name: &str| FoodGroup {
        id,
        name: name.to_string(),
    };
    let component = |id: u64, name: &str, group: Option<GroupId>| Component {
        id: ComponentId(id),
        name: name.to_string(),
        group,
    };
    let weekly = |group: GroupId, required: u32| WeeklyGroupRequirement {
        modality: AM,
        group,
        required,
    };

    CatalogDocument {
        compositions: vec![
            composition("ARZ", "Arroz blanco", values(360.0, 7.0, 0.5, 79.0, 10.0, 0.8, 5.0), None, None),
            composition(EGG, "Huevo entero", values(150.0, 12.5, 10.0, 1.0, 50.0, 1.8, 140.0), Some(88.0), Some(4)),
            composition("LEC", "Leche entera", values(61.0, 3.2, 3.3, 4.8, 113.0, 0.0, 43.0), None, None),
            composition("FRJ", "Fríjol rojo", kcal_and_protein(340.0, 22.0), None, Some(6)),
            composition("BAN", "Banano", kcal_and_protein(90.0, 1.0), Some(65.0), Some(5)),
            composition("POL", "Pollo sin piel", kcal_and_protein(165.0, 31.0), Some(70.0), Some(4)),
        ]
        .into(),
        components: vec![
            component(1, "Cereal", Some(CEREALES)),
            component(3, "Bebida láctea", Some(LACTEOS)),
            component(4, "Proteico", Some(CARNES)),
            component(5, "Fruta", Some(FRUTAS)),
            component(6, "Leguminosa", Some(LEGUMINOSAS)),
            component(9, "Complemento", None),
        ],
        groups: vec![
            group(CEREALES, "Cereales"),
            group(LACTEOS, "Lácteos"),
            group(CARNES, "Carnes, huevos"),
            group(FRUTAS, "Frutas"),
            group(LEGUMINOSAS, "Leguminosas"),
        ],
        levels: vec![
            SchoolLevel { id: PRESCHOOL, name: "Preescolar".to_string() },
            SchoolLevel { id: PRIMARY, name: "Primaria".to_string() },
            SchoolLevel { id: SECONDARY, name: "Secundaria".to_string() },
        ],
        modalities: vec![Modality {
            id: AM,
            name: "Desayuno preparado en sitio".to_string(),
        }],
        menus: vec![
            menu(1, vec![
                prep(11, "Huevo revuelto", Some(4), &[(EGG, 50.0)]),
                prep(12, "Arroz", Some(1), &[("ARZ", 40.0)]),
                prep(13, "Leche", Some(3), &[("LEC", 200.0)]),
            ]),
            menu(2, vec![
                prep(21, "Frijoles", Some(6), &[("FRJ", 30.0)]),
                prep(22, "Arroz", Some(1), &[("ARZ", 40.0)]),
                prep(23, "Banano", Some(5), &[("BAN", 80.0)]),
            ]),
            menu(3, vec![
                prep(31, "Pollo", Some(4), &[("POL", 40.0)]),
                prep(32, "Huevo cocido", None, &[(EGG, 50.0)]),
                prep(33, "Leche", Some(3), &[("LEC", 200.0)]),
            ]),
            menu(4, vec![
                prep(41, "Arepa", Some(1), &[("XYZ", 10.0), ("ARZ", 50.0)]),
                prep(42, "Leche", Some(3), &[("LEC", 200.0)]),
            ]),
            menu(5, vec![
                prep(51, "Lentejas", Some(6), &[("FRJ", 30.0)]),
                prep(52, "Fruta", Some(5), &[("BAN", 100.0)]),
            ]),
        ],
        requirements: vec![
            requirement(PRESCHOOL, Some(AM), 400.0),
            requirement(PRESCHOOL, None, 380.0),
            requirement(PRIMARY, None, 500.0),
        ],
        weekly_requirements: vec![
            weekly(CEREALES, 3),
            weekly(LACTEOS, 3),
            weekly(CARNES, 2),
            weekly(FRUTAS, 2),
            weekly(LEGUMINOSAS, 1),
        ],
        exclusion_sets: vec![ExclusionSet {
            id: ExclusionSetId(1),
            name: "Proteicos".to_string(),
            modality: AM,
            groups: vec![CARNES, LEGUMINOSAS],
            shared_frequency: 2,
        }],
        subgroup_restrictions: vec![SubgroupRestriction {
            id: RestrictionId(1),
            name: "Huevo".to_string(),
            modality: AM,
            group: CARNES,
            allowed: [IngredientCode::new(EGG)].into_iter().collect(),
            frequency: 1,
        }],
    }
}

pub fn catalog() -> MemoryCatalog {
    MemoryCatalog::from_document(document()).expect("fixture catalog is valid")
}
