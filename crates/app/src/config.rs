use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

/// Name of the environment variable carrying the Sheets API bearer token.
/// Obtaining the token (OAuth flow, service account) is outside this tool.
pub const TOKEN_ENV: &str = "RECKON_SHEETS_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Key of the spreadsheet holding the ledger and mapping worksheets.
    pub spreadsheet_id: String,
    /// Path to the YAML ruleset.
    #[serde(default = "default_mapping_path")]
    pub mapping_path: PathBuf,
    /// Bearer token; usually supplied via RECKON_SHEETS_TOKEN instead.
    pub token: Option<String>,
}

fn default_mapping_path() -> PathBuf {
    PathBuf::from("mapping.yaml")
}

impl Settings {
    /// Load settings from the platform config dir (e.g.
    /// `~/.config/reckon/reckon.toml`). Missing or invalid config is fatal.
    pub fn load() -> anyhow::Result<Settings> {
        let dirs = directories::ProjectDirs::from("io", "reckon", "reckon")
            .context("could not determine a config directory")?;
        let path = dirs.config_dir().join("reckon.toml");
        Settings::from_path(&path)
    }

    pub fn from_path(path: &std::path::Path) -> anyhow::Result<Settings> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("missing config file: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Resolve the API token: environment first, then the config file.
    pub fn token(&self) -> anyhow::Result<String> {
        std::env::var(TOKEN_ENV)
            .ok()
            .or_else(|| self.token.clone())
            .with_context(|| format!("no Sheets token: export {TOKEN_ENV} or set `token` in config"))
    }
}
