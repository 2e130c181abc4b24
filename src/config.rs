use crate::completion::{DEFAULT_API_BASE, DEFAULT_MODEL};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-project journal directory
pub const JOURNAL_DIR: &str = ".virtus";

/// Keys understood by `virtus config`
pub const KNOWN_KEYS: &[&str] = &["model", "api_base"];

// -----------------------------------------------------------------------------
// Global config
// -----------------------------------------------------------------------------

fn global_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("virtus")
}

fn global_config_file() -> PathBuf {
    global_config_dir().join("config.yaml")
}

/// Get global config
pub fn get_global_config() -> HashMap<String, String> {
    read_yaml_map(&global_config_file())
}

/// Set a global config value
pub fn set_global_config(key: &str, value: &str) -> std::io::Result<()> {
    let dir = global_config_dir();
    fs::create_dir_all(&dir)?;

    let mut config = get_global_config();
    config.insert(key.to_string(), value.to_string());

    let content = serde_yaml::to_string(&config).unwrap_or_default();
    fs::write(global_config_file(), content)
}

fn read_yaml_map(path: &Path) -> HashMap<String, String> {
    if path.exists() {
        if let Ok(content) = fs::read_to_string(path) {
            if let Ok(config) = serde_yaml::from_str::<HashMap<String, String>>(&content) {
                return config;
            }
        }
    }
    HashMap::new()
}

/// API key from the environment; never stored on disk
pub fn api_key() -> Option<String> {
    ["GEMINI_API_KEY", "API_KEY"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

// -----------------------------------------------------------------------------
// Per-project config
// -----------------------------------------------------------------------------

/// Configuration for a .virtus directory, layered over the global file
pub struct JournalConfig {
    journal_path: PathBuf,
    config_file: PathBuf,
    global: HashMap<String, String>,
    config: HashMap<String, String>,
}

impl JournalConfig {
    pub fn new(journal_path: PathBuf) -> Self {
        Self::with_global(journal_path, get_global_config())
    }

    fn with_global(journal_path: PathBuf, global: HashMap<String, String>) -> Self {
        let config_file = journal_path.join("_config.yaml");
        let config = read_yaml_map(&config_file);
        Self {
            journal_path,
            config_file,
            global,
            config,
        }
    }

    fn save(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.journal_path)?;
        let content = serde_yaml::to_string(&self.config).unwrap_or_default();
        fs::write(&self.config_file, content)
    }

    /// Project value, falling back to the global one
    pub fn get(&self, key: &str) -> Option<String> {
        self.config
            .get(key)
            .or_else(|| self.global.get(key))
            .cloned()
    }

    pub fn set(&mut self, key: &str, value: &str) -> std::io::Result<()> {
        self.config.insert(key.to_string(), value.to_string());
        self.save()
    }

    pub fn model(&self) -> String {
        self.get("model").unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn api_base(&self) -> String {
        self.get("api_base")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }
}

/// Find the .virtus directory, searching upward from current directory
pub fn find_journal_path() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let journal = current.join(JOURNAL_DIR);
        if journal.is_dir() {
            return Some(journal);
        }

        if !current.pop() {
            break;
        }
    }

    // Check VIRTUS_PATH environment variable
    if let Ok(path) = std::env::var("VIRTUS_PATH") {
        let journal = PathBuf::from(path);
        if journal.is_dir() {
            return Some(journal);
        }
    }

    None
}
