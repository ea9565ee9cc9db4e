//! # Engine Primitives
//!
//! Fixed constants of the minuta engine. Tunable values (semaphore
//! thresholds) start from these defaults and may be overridden through
//! `AdequacyThresholds`; everything else is compiled in.

/// Net weight assumed for an ingredient with no default weight, in grams.
///
/// Also the net and gross weight recorded for an ingredient whose code is
/// missing from the composition table.
pub const DEFAULT_NET_WEIGHT_G: f64 = 100.0;

/// Lower bound of the edible-portion percentage.
pub const MIN_EDIBLE_PCT: f64 = 1.0;

/// Upper bound of the edible-portion percentage; also the value used when
/// the percentage is missing or zero.
pub const MAX_EDIBLE_PCT: f64 = 100.0;

/// Fixed-scale semaphore: `optimo` up to and including this percentage.
pub const OPTIMO_MAX_PCT: f64 = 35.0;

/// Fixed-scale semaphore: `aceptable` up to and including this percentage.
pub const ACEPTABLE_MAX_PCT: f64 = 70.0;

/// Reference-relative semaphore bands, in percentage points of distance
/// from the expected adequacy.
pub const REFERENCE_OPTIMO_BAND: f64 = 3.0;
pub const REFERENCE_AZUL_BAND: f64 = 5.0;
pub const REFERENCE_ACEPTABLE_BAND: f64 = 7.0;

/// Display cap of an adequacy percentage.
pub const ADEQUACY_CAP_PCT: f64 = 100.0;

/// Maximum rows accepted in a single override save batch.
pub const MAX_SAVE_BATCH_ROWS: usize = 2000;

/// Maximum number of day menus in a weekly plan.
pub const MAX_WEEK_DAYS: usize = 7;

/// Day labels used when rendering weekly results.
pub const DAY_LABELS: [&str; MAX_WEEK_DAYS] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

/// Label of a day index, `None` past the end of the week.
#[must_use]
pub fn day_label(day: usize) -> Option<&'static str> {
    DAY_LABELS.get(day).copied()
}
