use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DataSourceKind {
    GoogleSheets,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserSettings {
    #[serde(default)]
    data_source: Option<DataSourceKind>,
    #[serde(default)]
    google_sheet_url: Option<String>,
}

/// Connection settings that survive restarts, kept as a small JSON file.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn data_source(&self) -> Option<DataSourceKind> {
        self.read().data_source
    }

    /// The sheet to auto-connect to on startup, if one was saved.
    pub fn saved_google_sheet(&self) -> Option<String> {
        let guard = self.read();
        match (guard.data_source, guard.google_sheet_url.as_deref()) {
            (Some(DataSourceKind::GoogleSheets), Some(url)) if !url.trim().is_empty() => {
                Some(url.to_string())
            }
            _ => None,
        }
    }

    pub fn save_google_sheet(&self, url: &str) -> Result<()> {
        let mut guard = self.write();
        guard.google_sheet_url = Some(url.to_string());
        guard.data_source = Some(DataSourceKind::GoogleSheets);
        self.persist(&guard)
    }

    pub fn clear(&self) -> Result<()> {
        let mut guard = self.write();
        *guard = UserSettings::default();
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, UserSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, UserSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
