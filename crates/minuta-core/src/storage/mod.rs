//! Persistent storage backends.

mod redb_overrides;

pub use redb_overrides::RedbOverrides;
