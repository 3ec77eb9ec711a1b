use super::SpectrogramSettings;
use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use tracing::{debug, warn};

/// Owns the settings file path and its parsed contents.
#[derive(Debug)]
pub struct SettingsManager {
    path: PathBuf,
    pub data: SpectrogramSettings,
}

impl SettingsManager {
    /// Reads `path`; a missing or unparsable file yields defaults.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut data: SpectrogramSettings = fs::read_to_string(&path)
            .ok()
            .and_then(|s| {
                serde_json::from_str(&s)
                    .map_err(|e| warn!("[settings] parse error {path:?}: {e}"))
                    .ok()
            })
            .unwrap_or_default();
        data.sanitize();
        Self { path, data }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn settings(&self) -> &SpectrogramSettings {
        &self.data
    }

    pub fn update<F: FnOnce(&mut SpectrogramSettings) -> R, R>(&mut self, mutate: F) -> R {
        let result = mutate(&mut self.data);
        self.data.sanitize();
        result
    }

    /// Writes pretty JSON through a temp file and rename so readers never see a
    /// partial file.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.data).context("serializing settings")?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating settings directory {parent:?}"))?;
        }
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &json).with_context(|| format!("writing {temp_path:?}"))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("replacing {:?}", self.path))?;
        debug!("[settings] saved {:?}", self.path);
        Ok(())
    }
}
