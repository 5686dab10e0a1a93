use std::path::PathBuf;

use anyhow::Context as _;

use crate::dates::DatePolicy;
use crate::notion::{DEFAULT_BASE_URL, DEFAULT_NOTION_VERSION};
use crate::render::{FileNaming, Layout};

pub const DEFAULT_OUTPUT_PATH: &str = "output";

/// How a CSV export is turned into per-date documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitOptions {
    pub date_policy: DatePolicy,
    pub layout: Layout,
    pub file_naming: FileNaming,
}

/// Process-wide settings, built once at startup and passed to handlers.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Relative output paths are resolved against this directory.
    pub base_dir: PathBuf,
    pub default_output_path: String,
    /// Used when the requested output directory cannot be created.
    pub write_fallback_dir: PathBuf,
    pub notion_base_url: String,
    pub notion_version: String,
    pub split: SplitOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            default_output_path: DEFAULT_OUTPUT_PATH.to_owned(),
            write_fallback_dir: std::env::temp_dir().join("chat2notion-output"),
            notion_base_url: DEFAULT_BASE_URL.to_owned(),
            notion_version: DEFAULT_NOTION_VERSION.to_owned(),
            split: SplitOptions::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        match env_var("CHAT2NOTION_BASE_DIR") {
            Some(dir) => config.base_dir = PathBuf::from(dir),
            None => {
                config.base_dir = std::env::current_dir().context("read current dir")?;
            }
        }
        if let Some(dir) = env_var("CHAT2NOTION_FALLBACK_DIR") {
            config.write_fallback_dir = PathBuf::from(dir);
        }
        if let Some(url) = env_var("CHAT2NOTION_NOTION_BASE_URL") {
            config.notion_base_url = url;
        }
        if let Some(raw) = env_var("CHAT2NOTION_DATE_POLICY") {
            config.split.date_policy = raw
                .parse()
                .with_context(|| format!("invalid CHAT2NOTION_DATE_POLICY={raw:?}"))?;
        }
        if let Some(raw) = env_var("CHAT2NOTION_LAYOUT") {
            config.split.layout = raw
                .parse()
                .with_context(|| format!("invalid CHAT2NOTION_LAYOUT={raw:?}"))?;
        }
        if let Some(raw) = env_var("CHAT2NOTION_FILE_NAMING") {
            config.split.file_naming = raw
                .parse()
                .with_context(|| format!("invalid CHAT2NOTION_FILE_NAMING={raw:?}"))?;
        }
        Ok(config)
    }
}

/// Credentials for one Notion workspace/database pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionSettings {
    pub token: String,
    pub database_id: String,
}

impl NotionSettings {
    /// Builds settings from explicit values, falling back to `NOTION_TOKEN`
    /// and `NOTION_DATABASE_ID`.
    pub fn resolve(token: Option<String>, database_id: Option<String>) -> anyhow::Result<Self> {
        let token = token
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env_var("NOTION_TOKEN"))
            .context("Notion token is required (--token or NOTION_TOKEN)")?;
        let database_id = database_id
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env_var("NOTION_DATABASE_ID"))
            .context("Notion database id is required (--database-id or NOTION_DATABASE_ID)")?;
        Ok(Self {
            token: token.trim().to_owned(),
            database_id: database_id.trim().to_owned(),
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
