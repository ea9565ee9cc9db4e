//! # redb-backed Override Storage
//!
//! A disk-backed override store using the redb embedded database.
//!
//! Each (menu, level) analysis keeps two records:
//! - its override rows, postcard-encoded as one set
//! - its summary (totals and raw percentages)
//!
//! `commit_overrides` reads the current set, merges the batch, recomputes the
//! summary and writes both inside ONE write transaction. A failure at any
//! step drops the transaction, so readers never observe rows without the
//! matching summary.

use crate::overrides::{
    AnalysisSummary, LevelAnalysisOverride, OverrideStore, merge_rows, summarize,
};
use crate::{LevelId, MenuId, MinutaError, NutrientValues};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Override sets: (menu_id, level_id) -> postcard `Vec<LevelAnalysisOverride>`
const OVERRIDE_SETS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("override_sets");

/// Summaries: (menu_id, level_id) -> postcard `AnalysisSummary`
const SUMMARIES: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("summaries");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const BATCHES_COMMITTED: &str = "batches_committed";

fn io(e: impl std::fmt::Display) -> MinutaError {
    MinutaError::IoError(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, MinutaError> {
    postcard::to_allocvec(value).map_err(|e| MinutaError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, MinutaError> {
    postcard::from_bytes(bytes).map_err(|e| MinutaError::SerializationError(e.to_string()))
}

/// A disk-backed override store.
pub struct RedbOverrides {
    db: Database,
}

impl std::fmt::Debug for RedbOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbOverrides").finish_non_exhaustive()
    }
}

impl RedbOverrides {
    /// Open or create an override database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MinutaError> {
        let db = Database::create(path.as_ref()).map_err(io)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io)?;
            let _ = write_txn.open_table(OVERRIDE_SETS).map_err(io)?;
            let _ = write_txn.open_table(SUMMARIES).map_err(io)?;
            let _ = write_txn.open_table(METADATA).map_err(io)?;
            write_txn.commit().map_err(io)?;
        }

        Ok(Self { db })
    }

    /// Total number of batches committed over the life of the database.
    pub fn batches_committed(&self) -> Result<u64, MinutaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(METADATA).map_err(io)?;
        Ok(table
            .get(BATCHES_COMMITTED)
            .map_err(io)?
            .map(|v| v.value())
            .unwrap_or(0))
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), MinutaError> {
        self.db.compact().map_err(io)?;
        Ok(())
    }
}

impl OverrideStore for RedbOverrides {
    fn overrides(
        &self,
        menu: MenuId,
        level: LevelId,
    ) -> Result<Vec<LevelAnalysisOverride>, MinutaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(OVERRIDE_SETS).map_err(io)?;
        let rows = table
            .get((menu.0, level.0))
            .map_err(io)?
            .map(|v| decode::<Vec<LevelAnalysisOverride>>(v.value()))
            .transpose()?;
        Ok(rows.unwrap_or_default())
    }

    fn summary(
        &self,
        menu: MenuId,
        level: LevelId,
    ) -> Result<Option<AnalysisSummary>, MinutaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(SUMMARIES).map_err(io)?;
        table
            .get((menu.0, level.0))
            .map_err(io)?
            .map(|v| decode::<AnalysisSummary>(v.value()))
            .transpose()
    }

    fn commit_overrides(
        &mut self,
        menu: MenuId,
        level: LevelId,
        rows: Vec<LevelAnalysisOverride>,
        requirement: &NutrientValues,
        user: &str,
    ) -> Result<AnalysisSummary, MinutaError> {
        let key = (menu.0, level.0);
        let write_txn = self.db.begin_write().map_err(io)?;

        let summary = {
            let mut sets_table = write_txn.open_table(OVERRIDE_SETS).map_err(io)?;
            let mut summaries_table = write_txn.open_table(SUMMARIES).map_err(io)?;
            let mut meta_table = write_txn.open_table(METADATA).map_err(io)?;

            let existing = sets_table
                .get(key)
                .map_err(io)?
                .map(|v| decode::<Vec<LevelAnalysisOverride>>(v.value()))
                .transpose()?
                .unwrap_or_default();
            let previous_revision = summaries_table
                .get(key)
                .map_err(io)?
                .map(|v| decode::<AnalysisSummary>(v.value()))
                .transpose()?
                .map(|s| s.revision);

            let merged = merge_rows(existing, rows);
            let summary = summarize(menu, level, &merged, requirement, user, previous_revision);

            let set_bytes = encode(&merged)?;
            let summary_bytes = encode(&summary)?;
            sets_table.insert(key, set_bytes.as_slice()).map_err(io)?;
            summaries_table
                .insert(key, summary_bytes.as_slice())
                .map_err(io)?;

            let batches = meta_table
                .get(BATCHES_COMMITTED)
                .map_err(io)?
                .map(|v| v.value())
                .unwrap_or(0);
            meta_table
                .insert(BATCHES_COMMITTED, batches.saturating_add(1))
                .map_err(io)?;

            summary
        };

        write_txn.commit().map_err(io)?;
        Ok(summary)
    }

    fn reset(&mut self, menu: MenuId, level: LevelId) -> Result<bool, MinutaError> {
        let key = (menu.0, level.0);
        let write_txn = self.db.begin_write().map_err(io)?;
        let existed = {
            let mut sets_table = write_txn.open_table(OVERRIDE_SETS).map_err(io)?;
            let mut summaries_table = write_txn.open_table(SUMMARIES).map_err(io)?;
            let had_rows = sets_table.remove(key).map_err(io)?.is_some();
            let had_summary = summaries_table.remove(key).map_err(io)?.is_some();
            had_rows || had_summary
        };
        write_txn.commit().map_err(io)?;
        Ok(existed)
    }

    fn analysis_count(&self) -> Result<usize, MinutaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(SUMMARIES).map_err(io)?;
        let count = table.len().map_err(io)?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IngredientCode, PreparationId};
    use tempfile::tempdir;

    fn row(prep: u64, code: &str, net: f64, kcal: f64) -> LevelAnalysisOverride {
        let mut values = NutrientValues::zero();
        values.calorias = kcal;
        LevelAnalysisOverride {
            menu: MenuId(7),
            level: LevelId(2),
            preparation: PreparationId(prep),
            ingredient: IngredientCode::new(code),
            net_weight: net,
            gross_weight: net * 1.25,
            values,
            composition_found: true,
        }
    }

    fn target() -> NutrientValues {
        let mut values = NutrientValues::zero();
        values.calorias = 200.0;
        values
    }

    #[test]
    fn empty_store_has_nothing() {
        let temp = tempdir().expect("temp dir");
        let store = RedbOverrides::open(temp.path().join("test.redb")).expect("open db");

        assert!(store.overrides(MenuId(7), LevelId(2)).expect("rows").is_empty());
        assert!(store.summary(MenuId(7), LevelId(2)).expect("summary").is_none());
        assert_eq!(store.analysis_count().expect("count"), 0);
        assert_eq!(store.batches_committed().expect("batches"), 0);
    }

    #[test]
    fn commit_writes_rows_and_summary_together() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbOverrides::open(temp.path().join("test.redb")).expect("open db");

        let summary = store
            .commit_overrides(
                MenuId(7),
                LevelId(2),
                vec![row(1, "A", 40.0, 100.0), row(2, "B", 60.0, 50.0)],
                &target(),
                "nutricionista",
            )
            .expect("commit");

        assert_eq!(summary.totals.nutrients.calorias, 150.0);
        assert_eq!(summary.totals.net_weight, 100.0);
        assert_eq!(summary.totals.gross_weight, 125.0);
        assert_eq!(summary.percentages.calorias, 75.0);
        assert_eq!(summary.revision, 1);
        assert_eq!(
            store.summary(MenuId(7), LevelId(2)).expect("summary"),
            Some(summary)
        );
        assert_eq!(store.batches_committed().expect("batches"), 1);
    }

    #[test]
    fn upsert_replaces_only_the_matching_key() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbOverrides::open(temp.path().join("test.redb")).expect("open db");

        store
            .commit_overrides(
                MenuId(7),
                LevelId(2),
                vec![row(1, "A", 40.0, 100.0), row(2, "B", 60.0, 50.0)],
                &target(),
                "a",
            )
            .expect("first");
        let summary = store
            .commit_overrides(
                MenuId(7),
                LevelId(2),
                vec![row(1, "A", 80.0, 200.0)],
                &target(),
                "b",
            )
            .expect("second");

        let rows = store.overrides(MenuId(7), LevelId(2)).expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].net_weight, 80.0);
        assert_eq!(summary.totals.nutrients.calorias, 250.0);
        assert_eq!(summary.revision, 2);
    }

    #[test]
    fn overrides_survive_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let mut store = RedbOverrides::open(&db_path).expect("open db");
            store
                .commit_overrides(
                    MenuId(7),
                    LevelId(2),
                    vec![row(1, "A", 40.0, 100.0)],
                    &target(),
                    "a",
                )
                .expect("commit");
        }

        let store = RedbOverrides::open(&db_path).expect("reopen db");
        assert_eq!(store.overrides(MenuId(7), LevelId(2)).expect("rows").len(), 1);
        assert_eq!(store.analysis_count().expect("count"), 1);
    }

    #[test]
    fn reset_removes_both_records() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbOverrides::open(temp.path().join("test.redb")).expect("open db");
        store
            .commit_overrides(
                MenuId(7),
                LevelId(2),
                vec![row(1, "A", 40.0, 100.0)],
                &target(),
                "a",
            )
            .expect("commit");

        assert!(store.reset(MenuId(7), LevelId(2)).expect("reset"));
        assert!(store.overrides(MenuId(7), LevelId(2)).expect("rows").is_empty());
        assert!(store.summary(MenuId(7), LevelId(2)).expect("summary").is_none());
        assert!(!store.reset(MenuId(7), LevelId(2)).expect("reset again"));
    }
}
