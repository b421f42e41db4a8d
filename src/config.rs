use crate::model::{LoopMode, Settings, Theme};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "ambient";
const SETTINGS_FILE: &str = "settings.json";

/// Store key holding the namespaced settings object.
pub const NAMESPACE: &str = "ambient";
pub const APP_VERSION: &str = "1.1.1";
pub const MIGRATION_VERSION: &str = "1.1.1";

/// Flat keys written by releases that predate the namespaced object.
const LEGACY_KEYS: &[&str] = &[
    "loopMode",
    "isShuffled",
    "isMuted",
    "volume",
    "theme",
    "appVersion",
];

/// Host-provided persistent string map.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Settings store backed by a JSON object on disk. Every write is flushed
/// immediately.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                values: BTreeMap::new(),
            });
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let values = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse settings file {}", path.display()))?;
        Ok(Self { path, values })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(settings_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("AMBIENT_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_root()?.join(SETTINGS_FILE))
}

/// The namespaced settings object as persisted. Values are kept as strings
/// (`"0"`/`"1"` flags, `"0".."100"` volume) so older readers still parse them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    migrate_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    loop_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_shuffled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_muted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    theme: Option<String>,
}

impl StoredSettings {
    fn read(store: &dyn SettingsStore) -> Self {
        let Some(raw) = store.get(NAMESPACE) else {
            return Self::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!("ignoring unreadable settings object: {err}");
            Self::default()
        })
    }

    fn write(&self, store: &mut dyn SettingsStore) -> Result<()> {
        let json = serde_json::to_string(self)?;
        store.set(NAMESPACE, json)
    }

    fn to_settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            loop_mode: self
                .loop_mode
                .as_deref()
                .and_then(LoopMode::parse)
                .unwrap_or(defaults.loop_mode),
            shuffle: self
                .is_shuffled
                .as_deref()
                .map(parse_flag)
                .unwrap_or(defaults.shuffle),
            muted: self
                .is_muted
                .as_deref()
                .map(parse_flag)
                .unwrap_or(defaults.muted),
            volume: self
                .volume
                .as_deref()
                .and_then(parse_volume)
                .unwrap_or(defaults.volume),
            theme: self
                .theme
                .as_deref()
                .and_then(Theme::parse)
                .unwrap_or(defaults.theme),
        }
    }

    fn apply(&mut self, settings: &Settings) {
        self.loop_mode = Some(settings.loop_mode.as_str().to_string());
        self.is_shuffled = Some(flag(settings.shuffle));
        self.is_muted = Some(flag(settings.muted));
        self.volume = Some(settings.volume.min(100).to_string());
        self.theme = Some(settings.theme.as_str().to_string());
    }
}

fn flag(value: bool) -> String {
    String::from(if value { "1" } else { "0" })
}

fn parse_flag(value: &str) -> bool {
    value.trim() == "1"
}

fn parse_volume(value: &str) -> Option<u8> {
    let parsed = value.trim().parse::<f64>().ok()?;
    parsed.is_finite().then(|| parsed.clamp(0.0, 100.0).round() as u8)
}

/// Moves settings written as flat legacy keys into the namespaced object.
/// Returns `true` when a migration ran.
pub fn migrate(store: &mut dyn SettingsStore) -> Result<bool> {
    let current = StoredSettings::read(store);
    if current.migrate_version.as_deref() == Some(MIGRATION_VERSION) {
        return Ok(false);
    }

    let registered = current.migrate_version.as_deref().unwrap_or("0.0.0");
    tracing::info!("migrating settings from {registered} to {MIGRATION_VERSION}");

    let legacy = |key: &str, default: &str| store.get(key).unwrap_or_else(|| default.to_string());
    let migrated = StoredSettings {
        app_version: Some(APP_VERSION.to_string()),
        migrate_version: Some(MIGRATION_VERSION.to_string()),
        loop_mode: Some(legacy("loopMode", "none")),
        is_shuffled: Some(legacy("isShuffled", "0")),
        is_muted: Some(legacy("isMuted", "0")),
        volume: Some(legacy("volume", "100")),
        theme: Some(legacy("theme", "light")),
    };
    migrated.write(store)?;

    for key in LEGACY_KEYS {
        store.remove(key)?;
    }
    tracing::info!("settings migrated");
    Ok(true)
}

pub fn load_settings(store: &dyn SettingsStore) -> Settings {
    StoredSettings::read(store).to_settings()
}

pub fn save_settings(store: &mut dyn SettingsStore, settings: &Settings) -> Result<()> {
    let mut stored = StoredSettings::read(store);
    stored.apply(settings);
    stored.app_version.get_or_insert_with(|| APP_VERSION.to_string());
    stored
        .migrate_version
        .get_or_insert_with(|| MIGRATION_VERSION.to_string());
    stored.write(store)
}
