//! Flat-file collection store.
//!
//! One JSON-array file per collection, rewritten in full on every mutation.
//! This is deliberately not a storage engine: collections are small, traffic
//! is low, and the whole-file read-modify-write keeps the on-disk format
//! human-readable (pretty-printed, 2-space indent).
//!
//! There is no lock around [`CollectionStore::append`]. Two requests racing
//! to mutate the same collection can interleave their read-modify-write
//! sequences and one append can overwrite the other. That lost-update hazard
//! is part of the store's contract; callers that need stronger guarantees
//! need a different store, not a patched one.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::error::Error;

/// The registered collection names. Nothing else is ever resolved to a file.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Collection {
    Listings,
    Mints,
    TradeHistory,
    Escrows,
    Tents,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Listings,
        Collection::Mints,
        Collection::TradeHistory,
        Collection::Escrows,
        Collection::Tents,
    ];

    /// The logical collection name, as used in route payloads and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Listings => "listings",
            Self::Mints => "mints",
            Self::TradeHistory => "tradeHistory",
            Self::Escrows => "escrows",
            Self::Tents => "tents",
        }
    }

    /// The fixed on-disk file name. Never derived from user input.
    fn file_name(self) -> &'static str {
        match self {
            Self::Listings => "listings.json",
            Self::Mints => "mints.json",
            Self::TradeHistory => "tradeHistory.json",
            Self::Escrows => "escrows.json",
            Self::Tents => "tents.json",
        }
    }
}

/// Parses a logical collection name. Case-sensitive.
impl FromStr for Collection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| Error::UnknownCollection(s.to_owned()))
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// File-backed store for the registered collections.
///
/// Records are arbitrary [`serde_json::Value`]s; the store never interprets
/// their shape. Order on disk is insertion order.
pub struct CollectionStore {
    data_dir: PathBuf,
}

impl CollectionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    /// Creates the data directory and seeds every missing collection file
    /// with an empty array. Called once at startup; reads stay tolerant of
    /// empty files regardless.
    pub async fn ensure_files(&self) -> Result<(), Error> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        for collection in Collection::ALL {
            let path = self.path(collection);
            if tokio::fs::try_exists(&path).await? {
                continue;
            }
            tokio::fs::write(&path, b"[]").await?;
            debug!(collection = %collection, path = %path.display(), "seeded collection file");
        }
        Ok(())
    }

    /// Reads the full collection. An empty (or still-missing) file is `[]`;
    /// anything that fails to parse as a JSON array is a corrupt collection.
    pub async fn read_all(&self, collection: Collection) -> Result<Vec<Value>, Error> {
        let bytes = match tokio::fs::read(self.path(collection)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| Error::CorruptCollection {
            name: collection.name(),
            reason: e.to_string(),
        })
    }

    /// Overwrites the entire collection file, pretty-printed.
    ///
    /// Not atomic: a concurrent reader may observe a partially written file.
    pub async fn write_all(&self, collection: Collection, records: &[Value]) -> Result<(), Error> {
        let bytes = serde_json::to_vec_pretty(records)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        tokio::fs::write(self.path(collection), bytes).await?;
        Ok(())
    }

    /// Reads the collection, pushes `record` to the end, writes it back, and
    /// returns the record. Carries the lost-update hazard described in the
    /// module docs when called concurrently against one collection.
    pub async fn append(&self, collection: Collection, record: Value) -> Result<Value, Error> {
        let mut records = self.read_all(collection).await?;
        records.push(record.clone());
        self.write_all(collection, &records).await?;
        debug!(collection = %collection, total = records.len(), "appended record");
        Ok(record)
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.file_name())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Generates a `<prefix>_<token>` record identifier.
///
/// Uniqueness comes from the ULID's randomness; it is never checked against
/// existing collection contents.
pub fn record_id(prefix: &str) -> String {
    format!("{prefix}_{}", ulid::Ulid::new().to_string().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, CollectionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CollectionStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn ensure_files_seeds_empty_arrays() {
        let (dir, store) = store();
        store.ensure_files().await.unwrap();
        for collection in Collection::ALL {
            let path = dir.path().join(collection.file_name());
            assert_eq!(std::fs::read(&path).unwrap(), b"[]");
        }
    }

    #[tokio::test]
    async fn ensure_files_leaves_existing_contents_alone() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("listings.json"), r#"[{"id":"listing_x"}]"#).unwrap();
        store.ensure_files().await.unwrap();
        let records = store.read_all(Collection::Listings).await.unwrap();
        assert_eq!(records, vec![json!({"id": "listing_x"})]);
    }

    #[tokio::test]
    async fn read_empty_file_is_empty_sequence() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("mints.json"), b"").unwrap();
        assert!(store.read_all(Collection::Mints).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_missing_file_is_empty_sequence() {
        let (_dir, store) = store();
        assert!(store.read_all(Collection::Tents).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_then_read_ends_with_record() {
        let (_dir, store) = store();
        store.ensure_files().await.unwrap();
        store.append(Collection::Escrows, json!({"id": "escrow_1"})).await.unwrap();
        let record = json!({"id": "escrow_2", "price": 12});
        store.append(Collection::Escrows, record.clone()).await.unwrap();

        let records = store.read_all(Collection::Escrows).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.last(), Some(&record));
    }

    #[tokio::test]
    async fn write_read_round_trip_is_deep_equal() {
        let (_dir, store) = store();
        let record = json!({
            "id": "listing_a",
            "price": 3.5,
            "tags": ["rare", "shiny"],
            "seller": {"address": "abc", "verified": true},
            "note": null
        });
        store.write_all(Collection::Listings, std::slice::from_ref(&record)).await.unwrap();
        assert_eq!(store.read_all(Collection::Listings).await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn files_are_pretty_printed() {
        let (dir, store) = store();
        store.write_all(Collection::Tents, &[json!({"id": "tent_1"})]).await.unwrap();
        let text = std::fs::read_to_string(dir.path().join("tents.json")).unwrap();
        assert!(text.contains("\n  {"), "expected 2-space indented output, got: {text}");
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("listings.json"), b"{not json").unwrap();
        let err = store.read_all(Collection::Listings).await.unwrap_err();
        assert!(matches!(err, Error::CorruptCollection { name: "listings", .. }));
    }

    #[test]
    fn unknown_collection_name_is_rejected() {
        let err = "users".parse::<Collection>().unwrap_err();
        assert!(matches!(err, Error::UnknownCollection(name) if name == "users"));
        assert!(matches!("tradeHistory".parse(), Ok(Collection::TradeHistory)));
    }

    #[test]
    fn record_ids_carry_prefix_and_differ() {
        let a = record_id("listing");
        let b = record_id("listing");
        assert!(a.starts_with("listing_"));
        assert_ne!(a, b);
    }
}
