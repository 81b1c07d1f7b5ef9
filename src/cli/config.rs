use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the CLI keeps its state between invocations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationState {
    pub current: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl LocationState {
    pub fn at(path: &str) -> Self {
        Self {
            current: Some(path.to_string()),
            updated_at: Some(Utc::now()),
        }
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("FINTRACK_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("fintrack").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// The credential pair lives next to the rest of the CLI state
pub fn credentials_path() -> anyhow::Result<PathBuf> {
    Ok(get_config_dir()?.join("credentials.json"))
}

pub fn load_location() -> anyhow::Result<LocationState> {
    let location_file = get_config_dir()?.join("location.json");

    if !location_file.exists() {
        return Ok(LocationState::default());
    }

    let content = fs::read_to_string(location_file)?;
    let state: LocationState = serde_json::from_str(&content)?;
    Ok(state)
}

pub fn save_location(state: &LocationState) -> anyhow::Result<()> {
    let location_file = get_config_dir()?.join("location.json");

    let content = serde_json::to_string_pretty(state)?;
    fs::write(location_file, content)?;
    Ok(())
}
