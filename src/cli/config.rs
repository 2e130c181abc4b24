use crate::config::{
    api_key, find_journal_path, get_global_config, set_global_config, JournalConfig, KNOWN_KEYS,
};

/// Run the config command
pub fn run_config(key: Option<&str>, value: Option<&str>, global: bool) -> Result<(), String> {
    if let (Some(k), Some(_)) = (key, value) {
        if !KNOWN_KEYS.contains(&k) {
            return Err(format!(
                "Unknown key: {} (known: {})",
                k,
                KNOWN_KEYS.join(", ")
            ));
        }
    }

    if global {
        return run_global(key, value);
    }

    let journal_path =
        find_journal_path().ok_or("No .virtus directory found. Run 'virtus init' first.")?;
    let mut config = JournalConfig::new(journal_path);

    match (key, value) {
        (None, None) => {
            // Show current config
            println!("Current configuration:\n");
            println!("  model:    {}", config.model());
            println!("  api_base: {}", config.api_base());
            println!(
                "  api key:  {}",
                if api_key().is_some() {
                    "set"
                } else {
                    "(not set, export GEMINI_API_KEY)"
                }
            );
        }
        (Some(k), None) => match config.get(k) {
            Some(v) => println!("{}: {}", k, v),
            None => println!("{}: (not set)", k),
        },
        (Some(k), Some(v)) => {
            config.set(k, v).map_err(|e| format!("Failed to save: {}", e))?;
            println!("Set {} = {}", k, v);
        }
        (None, Some(_)) => {
            return Err("Key required when setting a value".to_string());
        }
    }

    Ok(())
}

fn run_global(key: Option<&str>, value: Option<&str>) -> Result<(), String> {
    match (key, value) {
        (None, None) => {
            let config = get_global_config();
            if config.is_empty() {
                println!("No global configuration.");
            }
            let mut keys: Vec<_> = config.iter().collect();
            keys.sort();
            for (k, v) in keys {
                println!("  {}: {}", k, v);
            }
        }
        (Some(k), None) => match get_global_config().get(k) {
            Some(v) => println!("{}: {}", k, v),
            None => println!("{}: (not set)", k),
        },
        (Some(k), Some(v)) => {
            set_global_config(k, v).map_err(|e| format!("Failed to save: {}", e))?;
            println!("Set global {} = {}", k, v);
        }
        (None, Some(_)) => {
            return Err("Key required when setting a value".to_string());
        }
    }

    Ok(())
}
