use crate::config::load::SETTINGS_FILE;
use crate::config::types::UserSettings;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn save_settings(settings: &UserSettings) -> Result<()> {
    save_settings_to(Path::new(SETTINGS_FILE), settings)
}

pub fn save_settings_to(path: &Path, settings: &UserSettings) -> Result<()> {
    let content = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

    fs::write(path, content)
        .with_context(|| format!("Failed to write settings to {}", path.display()))?;

    Ok(())
}

/// 記住最後使用的影片資料夾
pub fn remember_folder(settings: &mut UserSettings, folder: &str) -> Result<()> {
    if settings.last_folder.as_deref() == Some(folder) {
        return Ok(());
    }
    settings.last_folder = Some(folder.to_string());
    save_settings(settings)
}
