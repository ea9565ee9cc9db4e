//! # Validation Scenarios (T0-T3)
//!
//! End-to-end checks through the public API. If ANY tier fails, the engine
//! is INVALID.
//!
//! ## Tiers
//! - T0: Nutrient arithmetic
//! - T1: Per-level analysis and override saving
//! - T2: Weekly frequency, exclusion sets, sub-group restrictions
//! - T3: Combined weekly verdict

use minuta_core::{
    AdequacyState, CatalogDocument, Engine, EntityKind, GroupId, IngredientCode, LevelId,
    MemoryCatalog, MenuId, MinutaError, ModalityId, PreparationId, RawWeight, SaveRow, WeekPlan,
};

const CATALOG: &str = r#"{
  "compositions": [
    { "code": "HUE", "name": "Huevo", "edible_pct": 88.0, "component": 4,
      "per_100g": { "energia_kcal": 150.0, "proteina_g": 12.5, "calcio_mg": 50.0 } },
    { "code": "POL", "name": "Pollo", "edible_pct": 0.0, "component": 4,
      "per_100g": { "energia_kcal": 165.0, "proteina_g": 31.0 } },
    { "code": "FRJ", "name": "Fríjol", "component": 6,
      "per_100g": { "energia_kcal": 340.0, "proteina_g": 22.0 } },
    { "code": "ARZ", "name": "Arroz",
      "per_100g": { "energia_kcal": 100.0, "proteina_g": 5.0 } },
    { "code": "LEC", "name": "Leche",
      "per_100g": { "energia_kcal": 61.0, "calcio_mg": 113.0 } }
  ],
  "components": [
    { "id": 1, "name": "Cereal", "group": 1 },
    { "id": 3, "name": "Lácteo", "group": 3 },
    { "id": 4, "name": "Proteico", "group": 4 },
    { "id": 6, "name": "Leguminosa", "group": 6 }
  ],
  "groups": [
    { "id": 1, "name": "Cereales" },
    { "id": 3, "name": "Lácteos" },
    { "id": 4, "name": "Carnes y huevos" },
    { "id": 6, "name": "Leguminosas" }
  ],
  "levels": [ { "id": 1, "name": "Preescolar" }, { "id": 2, "name": "Primaria" } ],
  "modalities": [ { "id": 10, "name": "Desayuno" } ],
  "menus": [
    { "id": 1, "name": "Lunes", "modality": 10, "preparations": [
      { "id": 101, "name": "Huevo revuelto", "component": 4,
        "ingredients": [ { "code": "HUE", "default_net_weight": 50.0 } ] },
      { "id": 102, "name": "Arroz", "component": 1,
        "ingredients": [ { "code": "ARZ", "default_net_weight": 50.0 } ] }
    ] },
    { "id": 2, "name": "Martes", "modality": 10, "preparations": [
      { "id": 201, "name": "Fríjoles", "component": 6,
        "ingredients": [ { "code": "FRJ", "default_net_weight": 30.0 } ] },
      { "id": 202, "name": "Leche", "component": 3,
        "ingredients": [ { "code": "LEC", "default_net_weight": 200.0 } ] }
    ] },
    { "id": 3, "name": "Miércoles", "modality": 10, "preparations": [
      { "id": 301, "name": "Huevo cocido",
        "ingredients": [ { "code": "HUE", "default_net_weight": 50.0 } ] },
      { "id": 302, "name": "Pollo", "component": 4,
        "ingredients": [ { "code": "POL" } ] },
      { "id": 303, "name": "Tortilla", "component": 4,
        "ingredients": [ { "code": "HUE", "default_net_weight": 30.0 },
                         { "code": "ZZZ", "default_net_weight": 10.0 } ] }
    ] },
    { "id": 4, "name": "Jueves", "modality": 10, "preparations": [
      { "id": 401, "name": "Arroz", "component": 1,
        "ingredients": [ { "code": "ARZ", "default_net_weight": 60.0 } ] }
    ] },
    { "id": 5, "name": "Viernes", "modality": 10, "preparations": [
      { "id": 501, "name": "Leche", "component": 3,
        "ingredients": [ { "code": "LEC", "default_net_weight": 200.0 } ] }
    ] }
  ],
  "requirements": [
    { "level": 1, "modality": 10, "values": { "calorias_kcal": 200.0, "proteina_g": 10.0 } },
    { "level": 2, "values": { "calorias": 400.0 }, "reference_adequacy": 20.0 }
  ],
  "weekly_requirements": [
    { "modality": 10, "group": 1, "required": 2 },
    { "modality": 10, "group": 3, "required": 2 },
    { "modality": 10, "group": 4, "required": 2 },
    { "modality": 10, "group": 6, "required": 1 }
  ],
  "exclusion_sets": [
    { "id": 1, "name": "Proteicos", "modality": 10, "groups": [4, 6], "shared_frequency": 2 }
  ],
  "subgroup_restrictions": [
    { "id": 1, "name": "Huevo", "modality": 10, "group": 4, "allowed": ["HUE"], "frequency": 1 }
  ]
}"#;

const DESAYUNO: ModalityId = ModalityId(10);
const PRESCHOOL: LevelId = LevelId(1);
const PRIMARY: LevelId = LevelId(2);

fn catalog() -> MemoryCatalog {
    let doc: CatalogDocument = serde_json::from_str(CATALOG).expect("catalog json");
    MemoryCatalog::from_document(doc).expect("valid catalog")
}

fn engine() -> Engine {
    Engine::new(catalog())
}

fn week(ids: &[u64]) -> WeekPlan {
    WeekPlan::new(ids.iter().copied().map(MenuId).collect()).expect("plan")
}

// =============================================================================
// TIER T0: NUTRIENT ARITHMETIC
// =============================================================================

mod t0_arithmetic {
    use super::*;
    use minuta_core::{CompositionValues, adequacy_state, nutrient_contribution, percent_adequacy};

    /// T0.1: 50 g of a 100 kcal / 5 g protein food.
    #[test]
    fn contribution_scales_per_100g() {
        let comp = CompositionValues {
            energia_kcal: Some(100.0),
            proteina_g: Some(5.0),
            ..CompositionValues::default()
        };
        let values = nutrient_contribution(&comp, 50.0);
        assert!((values.calorias - 50.0).abs() < 1e-9);
        assert!((values.proteina - 2.5).abs() < 1e-9);
    }

    /// T0.2: 150 of 200 kcal is 75 %, `alto`.
    #[test]
    fn seventy_five_percent_is_alto() {
        let pct = percent_adequacy(150.0, 200.0, true);
        assert!((pct - 75.0).abs() < 1e-9);
        assert_eq!(adequacy_state(pct), AdequacyState::Alto);
    }

    /// T0.3: 60 of 200 kcal is 30 %, `optimo`.
    #[test]
    fn thirty_percent_is_optimo() {
        let pct = percent_adequacy(60.0, 200.0, true);
        assert!((pct - 30.0).abs() < 1e-9);
        assert_eq!(adequacy_state(pct), AdequacyState::Optimo);
    }
}

// =============================================================================
// TIER T1: PER-LEVEL ANALYSIS
// =============================================================================

mod t1_analysis {
    use super::*;
    use minuta_core::{Nutrient, RequirementScope, WeightSource};

    /// T1.1: scoped requirement and live contributions.
    #[test]
    fn monday_analysis_for_preschool() {
        let analysis = engine().analyze(MenuId(1), PRESCHOOL).expect("analyze");

        assert_eq!(analysis.requirement_scope, RequirementScope::Scoped);
        // Egg 50 g = 75 kcal, rice 50 g = 50 kcal.
        assert!((analysis.totals.nutrients.calorias - 125.0).abs() < 1e-9);
        let kcal = analysis.adequacy[&Nutrient::Calorias];
        assert!((kcal.raw_percentage - 62.5).abs() < 1e-9);
        assert_eq!(kcal.state, AdequacyState::Aceptable);
        assert_eq!(analysis.preparations.len(), 2);
        assert_eq!(analysis.preparations[0].name, "Huevo revuelto");
    }

    /// T1.2: level-only fallback with a reference adequacy uses the relative scale.
    #[test]
    fn reference_adequacy_switches_scale() {
        let analysis = engine().analyze(MenuId(1), PRIMARY).expect("analyze");

        assert_eq!(analysis.requirement_scope, RequirementScope::LevelOnly);
        assert_eq!(analysis.reference_adequacy, Some(20.0));
        // 125 / 400 = 31.25 %, 11.25 points from 20.
        assert_eq!(analysis.adequacy[&Nutrient::Calorias].state, AdequacyState::Alto);
    }

    /// T1.3: missing composition and unset weights never fail the analysis.
    #[test]
    fn wednesday_has_gaps_but_renders() {
        let analysis = engine().analyze(MenuId(3), PRESCHOOL).expect("analyze");

        let chicken = &analysis.preparations[1].ingredients[0];
        assert_eq!(chicken.net_weight, 100.0);
        // Zero edible percentage means fully edible.
        assert_eq!(chicken.gross_weight, 100.0);

        let tortilla = &analysis.preparations[2];
        let unknown = &tortilla.ingredients[1];
        assert_eq!(unknown.ingredient.as_str(), "ZZZ");
        assert!(!unknown.composition_found);
        assert_eq!(unknown.source, WeightSource::Placeholder);
        assert_eq!(analysis.missing_compositions().len(), 1);
    }

    /// T1.4: save is partial per row and recomputes the summary.
    #[test]
    fn save_reports_good_and_bad_rows() {
        let mut engine = engine();
        let rows = vec![
            SaveRow {
                preparation: PreparationId(102),
                ingredient: IngredientCode::new("ARZ"),
                net_weight: RawWeight::Text("100".to_string()),
            },
            SaveRow {
                preparation: PreparationId(101),
                ingredient: IngredientCode::new("HUE"),
                net_weight: RawWeight::Text("mucho".to_string()),
            },
        ];
        let outcome = engine
            .save_override(MenuId(1), PRESCHOOL, &rows, "nutricionista")
            .expect("save");

        assert_eq!(outcome.saved.len(), 1);
        assert_eq!(outcome.failed.len(), 1);
        let summary = outcome.summary.expect("summary");
        assert!((summary.totals.nutrients.calorias - 100.0).abs() < 1e-9);
        assert!((summary.percentages.calorias - 50.0).abs() < 1e-9);

        let analysis = engine.analyze(MenuId(1), PRESCHOOL).expect("analyze");
        // Rice now 100 kcal from the override, egg still 75 kcal live.
        assert!((analysis.totals.nutrients.calorias - 175.0).abs() < 1e-9);
    }

    /// T1.5: hard failures name the missing entity.
    #[test]
    fn missing_entities_fail_loudly() {
        let mut engine = engine();
        let err = engine.analyze(MenuId(9), PRESCHOOL).expect_err("menu");
        assert!(matches!(err, MinutaError::NotFound { entity: EntityKind::Menu, .. }));

        let rows = [SaveRow {
            preparation: PreparationId(999),
            ingredient: IngredientCode::new("ARZ"),
            net_weight: RawWeight::Number(10.0),
        }];
        let err = engine
            .save_override(MenuId(1), PRESCHOOL, &rows, "x")
            .expect_err("preparation");
        assert!(matches!(err, MinutaError::NotFound { entity: EntityKind::Preparation, .. }));
        assert!(engine.summary(MenuId(1), PRESCHOOL).expect("summary").is_none());
    }
}

// =============================================================================
// TIER T2: WEEKLY VALIDATORS
// =============================================================================

mod t2_weekly {
    use super::*;

    const CARNES: GroupId = GroupId(4);
    const LEGUMINOSAS: GroupId = GroupId(6);

    /// T2.1: three CARNES preparations on Wednesday count as one day.
    #[test]
    fn one_credit_per_day() {
        let report = engine().validate_week(DESAYUNO, &week(&[3])).expect("validate");
        assert_eq!(report.usage.actual(CARNES), 1);
        assert_eq!(report.usage.contributors(CARNES).len(), 3);
    }

    /// T2.2: shared quota {G4, G6} = 2 with one day each.
    #[test]
    fn split_shared_quota_complies() {
        let report = engine().validate_week(DESAYUNO, &week(&[1, 2])).expect("validate");

        let carnes = report.groups.iter().find(|g| g.group == CARNES).expect("carnes");
        let legumes = report.groups.iter().find(|g| g.group == LEGUMINOSAS).expect("legumes");
        assert_eq!((carnes.actual, legumes.actual), (1, 1));
        assert_eq!(carnes.effective_required, 1);
        assert_eq!(legumes.effective_required, 1);
        assert!(carnes.complies && legumes.complies);
        let detail = carnes.exclusion.as_ref().expect("detail");
        assert_eq!(detail.combined_usage, 2);
        assert_eq!(detail.sibling_contributors[0].preparation_name, "Fríjoles");
    }

    /// T2.3: egg on Monday and Wednesday satisfies the egg restriction twice.
    #[test]
    fn egg_restriction_counts_days() {
        let report = engine()
            .validate_week(DESAYUNO, &week(&[1, 2, 3]))
            .expect("validate");
        let egg = &report.restrictions[0];
        assert_eq!(egg.actual, 2);
        assert!(egg.complies);
        let days: Vec<_> = egg.hits.iter().map(|h| h.day).collect();
        assert_eq!(days, vec![0, 2]);
    }

    /// T2.4: two egg preparations on the same day qualify one day.
    #[test]
    fn same_day_egg_counts_once() {
        let report = engine().validate_week(DESAYUNO, &week(&[3])).expect("validate");
        assert_eq!(report.restrictions[0].actual, 1);
        assert_eq!(report.restrictions[0].hits[0].preparation_name, "Huevo cocido");
    }
}

// =============================================================================
// TIER T3: COMBINED WEEKLY VERDICT
// =============================================================================

mod t3_compliance {
    use super::*;

    /// T3.1: the full week passes every rule.
    #[test]
    fn full_week_complies() {
        let report = engine()
            .validate_week(DESAYUNO, &week(&[1, 2, 3, 4, 5]))
            .expect("validate");
        assert!(report.complies, "failures: {:?}", report.failures());
        assert_eq!(report.days.len(), 5);
        assert_eq!(report.days[4].label, "Viernes");
    }

    /// T3.2: a failing restriction alone fails the week.
    #[test]
    fn restriction_failure_fails_the_week() {
        let report = engine()
            .validate_week(DESAYUNO, &week(&[2, 4, 5, 4, 2]))
            .expect("validate");
        assert!(report.groups.iter().all(|g| g.complies));
        assert!(!report.restrictions[0].complies);
        assert!(!report.complies);
    }

    /// T3.3: unknown modality is a hard error.
    #[test]
    fn unknown_modality_fails() {
        let err = engine()
            .validate_week(ModalityId(77), &week(&[1]))
            .expect_err("modality");
        assert!(matches!(err, MinutaError::NotFound { entity: EntityKind::Modality, .. }));
    }
}
