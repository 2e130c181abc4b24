use crate::completion::{CompletionClient, GeminiClient};
use crate::config::{api_key, find_journal_path, JournalConfig, JOURNAL_DIR};
use crate::gateway::FeedbackGateway;
use crate::insight::InsightSummarizer;
use crate::kv::{KeyValueStore, SqliteKv};
use crate::stats::aggregate;
use crate::store::{next_id, EntryStore, StoreError};
use crate::types::{AggregateStats, Entry, Virtue};
use chrono::{DateTime, NaiveDate, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("No .virtus directory found. Run 'virtus init' first.")]
    NotFound,

    #[error("Path does not exist: {0}")]
    MissingPath(PathBuf),

    #[error("failed to create {0}: {1}")]
    Create(PathBuf, #[source] std::io::Error),

    #[error("reflection must not be empty")]
    EmptyReflection,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The user's journal session: persisted history plus the AI services
pub struct Journal<K: KeyValueStore = SqliteKv> {
    journal_path: PathBuf,
    store: EntryStore<K>,
    client: Box<dyn CompletionClient>,
    model: String,
    entries: Vec<Entry>,
}

impl Journal<SqliteKv> {
    /// Open the journal found from the current directory
    pub fn open() -> Result<Self, JournalError> {
        let journal_path = find_journal_path().ok_or(JournalError::NotFound)?;
        Self::open_at(journal_path)
    }

    /// Open a journal at a specific .virtus path
    pub fn open_at(journal_path: PathBuf) -> Result<Self, JournalError> {
        if !journal_path.exists() {
            return Err(JournalError::MissingPath(journal_path));
        }

        let kv = SqliteKv::open(&journal_path.join("journal.db")).map_err(StoreError::from)?;

        let config = JournalConfig::new(journal_path.clone());
        let client = GeminiClient::new(&config.api_base(), api_key());

        Self::with_parts(journal_path, EntryStore::new(kv), Box::new(client), config.model())
    }

    /// Create a .virtus directory under `path`
    pub fn init(path: &Path) -> Result<Self, JournalError> {
        let journal_path = path.join(JOURNAL_DIR);
        fs::create_dir_all(&journal_path)
            .map_err(|e| JournalError::Create(journal_path.clone(), e))?;

        Self::open_at(journal_path)
    }
}

impl<K: KeyValueStore> Journal<K> {
    pub fn with_parts(
        journal_path: PathBuf,
        store: EntryStore<K>,
        client: Box<dyn CompletionClient>,
        model: String,
    ) -> Result<Self, JournalError> {
        let entries = store.load_all()?;
        Ok(Self {
            journal_path,
            store,
            client,
            model,
            entries,
        })
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    /// Re-read persisted history
    pub fn reload(&mut self) -> Result<(), JournalError> {
        self.entries = self.store.load_all()?;
        Ok(())
    }

    // =========================================================================
    // Check-in
    // =========================================================================

    /// Record today's reflection. AI failures never fail the check-in.
    pub fn check_in(&mut self, virtue: Virtue, reflection: &str) -> Result<Entry, JournalError> {
        self.check_in_at(virtue, reflection, Utc::now())
    }

    pub fn check_in_at(
        &mut self,
        virtue: Virtue,
        reflection: &str,
        now: DateTime<Utc>,
    ) -> Result<Entry, JournalError> {
        let reflection = reflection.trim();
        if reflection.is_empty() {
            return Err(JournalError::EmptyReflection);
        }

        let feedback =
            FeedbackGateway::new(self.client.as_ref(), &self.model).analyze_or_fallback(virtue, reflection);

        // Another session may have written since we last looked
        self.reload()?;

        let entry = Entry {
            id: next_id(&self.entries, now),
            timestamp: now,
            virtue,
            reflection: reflection.to_string(),
            feedback: Some(feedback),
        };

        self.store.append(entry.clone())?;
        self.entries.push(entry.clone());

        Ok(entry)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All entries in creation order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Most recent entries first
    pub fn recent(&self, limit: usize) -> Vec<Entry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    /// Statistics over a fresh load of the store
    pub fn stats(&mut self, today: NaiveDate) -> Result<AggregateStats, JournalError> {
        self.reload()?;
        Ok(aggregate(&self.entries, today))
    }

    /// Weekly narrative over the latest entries
    pub fn insight(&mut self) -> Result<String, JournalError> {
        self.reload()?;
        let newest_first = self.recent(self.entries.len());
        Ok(InsightSummarizer::new(self.client.as_ref(), &self.model).summarize(&newest_first))
    }
}
