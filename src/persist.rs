use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::settings::Settings;

const CONFIG_DIR: &str = "farm_terminal";
const SETTINGS_FILE: &str = "settings.json";

pub fn load_settings() -> Settings {
    let Some(path) = settings_path() else {
        return Settings::default();
    };
    load_settings_from(&path)
}

pub fn load_settings_from(path: &Path) -> Settings {
    let Ok(raw) = fs::read_to_string(path) else {
        return Settings::default();
    };
    Settings::merged_from_json(&raw)
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let Some(path) = settings_path() else {
        return Ok(());
    };
    save_settings_to(&path, settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("create settings dir")?;
    }
    let json = serde_json::to_string_pretty(settings).context("serialize settings")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).context("write settings")?;
    fs::rename(&tmp, path).context("swap settings")?;
    Ok(())
}

pub fn settings_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CONFIG_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CONFIG_DIR).join(SETTINGS_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR)
            .join(SETTINGS_FILE),
    )
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{load_settings_from, save_settings_to};
    use crate::settings::{Layout, Settings};

    fn scratch_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir()
            .join(format!("farm_terminal_{tag}_{nanos}"))
            .join("settings.json")
    }

    #[test]
    fn save_then_load_round_trips_through_disk() {
        let path = scratch_path("roundtrip");
        let mut settings = Settings::default();
        settings.layout = Layout::Grid;
        settings.api_key = "k".to_string();
        save_settings_to(&path, &settings).expect("save");
        assert_eq!(load_settings_from(&path), settings);
        assert!(!path.with_extension("json.tmp").exists());
        let _ = fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = scratch_path("missing");
        assert_eq!(load_settings_from(&path), Settings::default());
    }
}
