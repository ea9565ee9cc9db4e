//! Nutrient kinds and nutrient value records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// The seven nutrients tracked by every analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    /// Energy, kcal.
    Calorias,
    /// Protein, g.
    Proteina,
    /// Fat, g.
    Grasa,
    /// Carbohydrate, g.
    Carbohidratos,
    /// Calcium, mg.
    Calcio,
    /// Iron, mg.
    Hierro,
    /// Sodium, mg.
    Sodio,
}

/// Legacy field keys accepted for each nutrient.
///
/// Every spelling that appears in requirement tables and analysis payloads is
/// listed explicitly. Keys are matched whole; nothing is derived by trimming.
const NUTRIENT_KEYS: &[(&str, Nutrient)] = &[
    ("calorias", Nutrient::Calorias),
    ("calorias_kcal", Nutrient::Calorias),
    ("energia_kcal", Nutrient::Calorias),
    ("proteina", Nutrient::Proteina),
    ("proteina_g", Nutrient::Proteina),
    ("grasa", Nutrient::Grasa),
    ("grasa_g", Nutrient::Grasa),
    ("carbohidratos", Nutrient::Carbohidratos),
    ("carbohidratos_g", Nutrient::Carbohidratos),
    ("calcio", Nutrient::Calcio),
    ("calcio_mg", Nutrient::Calcio),
    ("hierro", Nutrient::Hierro),
    ("hierro_mg", Nutrient::Hierro),
    ("sodio", Nutrient::Sodio),
    ("sodio_mg", Nutrient::Sodio),
];

impl Nutrient {
    /// All nutrients in display order.
    pub const ALL: [Nutrient; 7] = [
        Nutrient::Calorias,
        Nutrient::Proteina,
        Nutrient::Grasa,
        Nutrient::Carbohidratos,
        Nutrient::Calcio,
        Nutrient::Hierro,
        Nutrient::Sodio,
    ];

    /// Resolve a legacy field key (`"calorias_kcal"`, `"hierro"`, ...).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Nutrient> {
        NUTRIENT_KEYS
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, nutrient)| *nutrient)
    }

    /// Canonical key, as used in serialized payloads.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Nutrient::Calorias => "calorias",
            Nutrient::Proteina => "proteina",
            Nutrient::Grasa => "grasa",
            Nutrient::Carbohidratos => "carbohidratos",
            Nutrient::Calcio => "calcio",
            Nutrient::Hierro => "hierro",
            Nutrient::Sodio => "sodio",
        }
    }

    /// Unit of measure.
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Nutrient::Calorias => "kcal",
            Nutrient::Proteina | Nutrient::Grasa | Nutrient::Carbohidratos => "g",
            Nutrient::Calcio | Nutrient::Hierro | Nutrient::Sodio => "mg",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// NUTRIENT VALUES
// =============================================================================

/// One value per nutrient: a contribution, a total or a target.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientValues {
    pub calorias: f64,
    pub proteina: f64,
    pub grasa: f64,
    pub carbohidratos: f64,
    pub calcio: f64,
    pub hierro: f64,
    pub sodio: f64,
}

impl NutrientValues {
    /// All-zero values.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Read one nutrient.
    #[must_use]
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calorias => self.calorias,
            Nutrient::Proteina => self.proteina,
            Nutrient::Grasa => self.grasa,
            Nutrient::Carbohidratos => self.carbohidratos,
            Nutrient::Calcio => self.calcio,
            Nutrient::Hierro => self.hierro,
            Nutrient::Sodio => self.sodio,
        }
    }

    /// Overwrite one nutrient.
    pub fn set(&mut self, nutrient: Nutrient, value: f64) {
        let slot = match nutrient {
            Nutrient::Calorias => &mut self.calorias,
            Nutrient::Proteina => &mut self.proteina,
            Nutrient::Grasa => &mut self.grasa,
            Nutrient::Carbohidratos => &mut self.carbohidratos,
            Nutrient::Calcio => &mut self.calcio,
            Nutrient::Hierro => &mut self.hierro,
            Nutrient::Sodio => &mut self.sodio,
        };
        *slot = value;
    }

    /// Build values from a function of the nutrient kind.
    #[must_use]
    pub fn from_fn(mut f: impl FnMut(Nutrient) -> f64) -> Self {
        let mut values = Self::zero();
        for nutrient in Nutrient::ALL {
            values.set(nutrient, f(nutrient));
        }
        values
    }

    /// Iterate `(nutrient, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, f64)> + '_ {
        Nutrient::ALL.into_iter().map(|n| (n, self.get(n)))
    }

    /// Build values from legacy key/value pairs; unknown keys are returned.
    pub fn from_keyed<'a>(
        pairs: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> (Self, Vec<&'a str>) {
        let mut values = Self::zero();
        let mut unknown = Vec::new();
        for (key, value) in pairs {
            match Nutrient::from_key(key) {
                Some(nutrient) => values.set(nutrient, value),
                None => unknown.push(key),
            }
        }
        (values, unknown)
    }
}

impl Add for NutrientValues {
    type Output = NutrientValues;

    fn add(self, other: NutrientValues) -> NutrientValues {
        NutrientValues::from_fn(|n| self.get(n) + other.get(n))
    }
}

impl AddAssign for NutrientValues {
    fn add_assign(&mut self, other: NutrientValues) {
        *self = *self + other;
    }
}

impl std::iter::Sum for NutrientValues {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(NutrientValues::zero(), |acc, v| acc + v)
    }
}

// =============================================================================
// COMPOSITION VALUES
// =============================================================================

/// Nutrient content per 100 g as stored in the composition table.
///
/// Any value may be missing; a missing value counts as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CompositionValues {
    #[serde(default)]
    pub energia_kcal: Option<f64>,
    #[serde(default)]
    pub proteina_g: Option<f64>,
    #[serde(default)]
    pub grasa_g: Option<f64>,
    #[serde(default)]
    pub carbohidratos_g: Option<f64>,
    #[serde(default)]
    pub calcio_mg: Option<f64>,
    #[serde(default)]
    pub hierro_mg: Option<f64>,
    #[serde(default)]
    pub sodio_mg: Option<f64>,
}

impl CompositionValues {
    /// Content of one nutrient per 100 g, missing as zero.
    #[must_use]
    pub fn per_100g(&self, nutrient: Nutrient) -> f64 {
        let value = match nutrient {
            Nutrient::Calorias => self.energia_kcal,
            Nutrient::Proteina => self.proteina_g,
            Nutrient::Grasa => self.grasa_g,
            Nutrient::Carbohidratos => self.carbohidratos_g,
            Nutrient::Calcio => self.calcio_mg,
            Nutrient::Hierro => self.hierro_mg,
            Nutrient::Sodio => self.sodio_mg,
        };
        value.unwrap_or(0.0)
    }
}
