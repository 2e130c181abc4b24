use crate::kv::KeyValueStore;
use crate::types::Entry;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

/// Key the whole entry sequence is persisted under
pub const ENTRIES_KEY: &str = "virtueLogs";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("stored journal is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("failed to serialize journal: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("an entry with id {0} already exists")]
    DuplicateId(String),
}

/// Append-only journal, persisted as one JSON array
pub struct EntryStore<K: KeyValueStore> {
    kv: K,
}

impl<K: KeyValueStore> EntryStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Load every entry in creation order. A missing value is an empty journal.
    pub fn load_all(&self) -> Result<Vec<Entry>, StoreError> {
        match self.kv.get(ENTRIES_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(StoreError::Corrupt),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the persisted journal with `entries`
    pub fn persist(&self, entries: &[Entry]) -> Result<(), StoreError> {
        let json = serde_json::to_string(entries).map_err(StoreError::Serialize)?;
        self.kv.set(ENTRIES_KEY, &json)?;
        debug!(count = entries.len(), "persisted journal");
        Ok(())
    }

    /// Append one entry and rewrite the whole journal
    pub fn append(&self, entry: Entry) -> Result<(), StoreError> {
        let mut entries = self.load_all()?;

        if entries.iter().any(|e| e.id == entry.id) {
            return Err(StoreError::DuplicateId(entry.id));
        }

        info!(id = %entry.id, virtue = %entry.virtue, "appending entry");
        entries.push(entry);
        self.persist(&entries)
    }
}

/// Millisecond timestamp id, bumped past the largest existing id so two
/// entries created within the same millisecond never collide.
pub fn next_id(entries: &[Entry], now: DateTime<Utc>) -> String {
    let candidate = now.timestamp_millis();
    let largest = entries
        .iter()
        .filter_map(|e| e.id.parse::<i64>().ok())
        .max();

    match largest {
        Some(max) if max >= candidate => (max + 1).to_string(),
        _ => candidate.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{InMemoryKv, SqliteKv};
    use crate::types::{Feedback, Virtue};

    fn entry(id: &str, virtue: Virtue, reflection: &str) -> Entry {
        Entry {
            id: id.to_string(),
            timestamp: "2024-05-10T08:30:00Z".parse().unwrap(),
            virtue,
            reflection: reflection.to_string(),
            feedback: Some(Feedback {
                encouragement: "¡Sigue!".to_string(),
                practical_tip: "Hazlo otra vez".to_string(),
                score: 8,
            }),
        }
    }

    #[test]
    fn test_empty_store_loads_nothing() {
        let store = EntryStore::new(InMemoryKv::default());
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_keeps_creation_order() {
        let store = EntryStore::new(InMemoryKv::default());

        store.append(entry("1", Virtue::Honesty, "a")).unwrap();
        store.append(entry("2", Virtue::Respect, "b")).unwrap();
        store.append(entry("3", Virtue::Honesty, "c")).unwrap();

        let ids: Vec<_> = store.load_all().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let store = EntryStore::new(InMemoryKv::default());
        store.append(entry("42", Virtue::Honesty, "a")).unwrap();

        let err = store.append(entry("42", Virtue::Respect, "b")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(id) if id == "42"));
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_round_trip_through_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("journal.db");

        let written = vec![
            entry("100", Virtue::Gratitude, "Di las gracias"),
            entry("101", Virtue::Patience, "Esperé sin quejarme"),
        ];
        {
            let store = EntryStore::new(SqliteKv::open(&db_path).unwrap());
            for e in &written {
                store.append(e.clone()).unwrap();
            }
        }

        let reopened = EntryStore::new(SqliteKv::open(&db_path).unwrap());
        assert_eq!(reopened.load_all().unwrap(), written);
    }

    #[test]
    fn test_corrupt_value_is_an_error() {
        let kv = InMemoryKv::default();
        kv.set(ENTRIES_KEY, "{not json").unwrap();

        let store = EntryStore::new(kv);
        assert!(matches!(store.load_all(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_older_feedback_shapes_still_load() {
        let kv = InMemoryKv::default();
        kv.set(
            ENTRIES_KEY,
            r#"[{"id":"1","date":"2024-03-01T10:00:00Z","virtue":"Gratitud","reflection":"Di las gracias",
                "feedback":{"encouragement":"Bien","practicalTip":"Sigue","score":7.5,"tone":"cálido"}}]"#,
        )
        .unwrap();

        let entries = EntryStore::new(kv).load_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].feedback.as_ref().unwrap().score, 8);
    }

    #[test]
    fn test_next_id_uses_timestamp_when_free() {
        let now: DateTime<Utc> = "2024-05-10T08:30:00Z".parse().unwrap();
        assert_eq!(next_id(&[], now), now.timestamp_millis().to_string());
    }

    #[test]
    fn test_next_id_same_millisecond_does_not_collide() {
        let now: DateTime<Utc> = "2024-05-10T08:30:00Z".parse().unwrap();
        let first = next_id(&[], now);
        let existing = vec![entry(&first, Virtue::Honesty, "a")];

        let second = next_id(&existing, now);
        assert_ne!(first, second);
        assert_eq!(second, (now.timestamp_millis() + 1).to_string());
    }
}
