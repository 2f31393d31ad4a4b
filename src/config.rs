//! On-disk UI configuration: button pins, theme colors, loop timing.
//!
//! Stored as `ui_conf.json` under the runtime root. A missing file is
//! replaced with defaults so a fresh image boots without provisioning.

use std::{
    fs,
    io::Write,
    path::Path,
    process,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub pins: PinConfig,
    #[serde(default)]
    pub colors: ColorScheme,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinConfig {
    pub top_pin: u32,
    pub bottom_pin: u32,
    pub middle_pin: u32,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            top_pin: 16,
            bottom_pin: 20,
            middle_pin: 21,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    pub selected_text: String,
    pub selected_background: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            background: "#FFFFFF".to_string(),
            text: "#000000".to_string(),
            selected_text: "#FFFFFF".to_string(),
            selected_background: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Main loop poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// How long the statistics readout stays on screen.
    pub stats_hold_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 20,
            stats_hold_secs: 4,
        }
    }
}

impl UiConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let default = UiConfig::default();
            default.save(path)?;
            return Ok(default);
        }
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: UiConfig = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Write through a temp file and rename so a power cut mid-save cannot
    /// leave a torn config behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;

        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("ui_conf.json");
        let now_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|dur| dur.as_nanos())
            .unwrap_or(0);
        let mut tmp = path.to_path_buf();
        tmp.set_file_name(format!(".{filename}.tmp.{}.{}", process::id(), now_ns));

        let mut file = fs::File::create(&tmp)
            .with_context(|| format!("creating temp config {}", tmp.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("writing temp config {}", tmp.display()))?;
        file.write_all(b"\n")?;
        file.sync_all()
            .with_context(|| format!("syncing temp config {}", tmp.display()))?;
        drop(file);

        fs::rename(&tmp, path)
            .with_context(|| format!("replacing config {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui_conf.json");

        let config = UiConfig::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.timing.poll_interval_ms, 20);
        assert_eq!(config.pins.top_pin, 16);
    }

    #[test]
    fn round_trip_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui_conf.json");

        let mut config = UiConfig::default();
        config.pins.middle_pin = 26;
        config.colors.background = "#102030".to_string();
        config.timing.stats_hold_secs = 2;
        config.save(&path).unwrap();

        let loaded = UiConfig::load(&path).unwrap();
        assert_eq!(loaded.pins.middle_pin, 26);
        assert_eq!(loaded.colors.background, "#102030");
        assert_eq!(loaded.timing.stats_hold_secs, 2);
    }

    #[test]
    fn partial_file_fills_missing_sections_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui_conf.json");
        fs::write(&path, r##"{"colors":{"background":"#000000","text":"#FFFFFF","selected_text":"#000000","selected_background":"#FFFFFF"}}"##).unwrap();

        let config = UiConfig::load(&path).unwrap();
        assert_eq!(config.colors.background, "#000000");
        assert_eq!(config.pins.bottom_pin, 20);
        assert_eq!(config.timing.poll_interval_ms, 20);
    }
}
