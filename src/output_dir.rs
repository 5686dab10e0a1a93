use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::ListArgs;
use crate::config::{AppConfig, DEFAULT_OUTPUT_PATH};
use crate::error::Chat2NotionError;

pub fn resolve_path(base_dir: &Path, configured: &str) -> PathBuf {
    let configured = configured.trim();
    let configured = if configured.is_empty() {
        DEFAULT_OUTPUT_PATH
    } else {
        configured
    };
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Finds an existing directory to read generated files from.
///
/// Falls back to `<base_dir>/output` when the configured directory does not
/// exist; returns `None` when neither does.
pub fn resolve_existing_dir(base_dir: &Path, configured: &str) -> Option<PathBuf> {
    let dir = resolve_path(base_dir, configured);
    if dir.is_dir() {
        return Some(dir);
    }

    let fallback = base_dir.join(DEFAULT_OUTPUT_PATH);
    if fallback.is_dir() {
        tracing::warn!(
            requested = %dir.display(),
            fallback = %fallback.display(),
            "output directory missing; using fallback"
        );
        return Some(fallback);
    }

    None
}

/// Creates (if needed) the directory generated files are written to.
///
/// When the configured directory cannot be created, `fallback_dir` is tried
/// before giving up.
pub fn prepare_write_dir(
    base_dir: &Path,
    configured: &str,
    fallback_dir: &Path,
) -> Result<PathBuf, Chat2NotionError> {
    let dir = resolve_path(base_dir, configured);
    match std::fs::create_dir_all(&dir) {
        Ok(()) => return Ok(dir),
        Err(err) => {
            tracing::warn!(dir = %dir.display(), %err, "create output dir failed; trying fallback");
        }
    }

    std::fs::create_dir_all(fallback_dir).map_err(|err| {
        tracing::error!(dir = %fallback_dir.display(), %err, "create fallback output dir failed");
        Chat2NotionError::Filesystem(format!(
            "unable to create output directory {} or fallback {}: {err}",
            dir.display(),
            fallback_dir.display()
        ))
    })?;
    Ok(fallback_dir.to_path_buf())
}

/// Sorted `.md` file names directly inside `dir`.
pub fn list_markdown_files(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read output dir: {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("list output dir: {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        files.push(entry.file_name().to_string_lossy().to_string());
    }
    files.sort();
    Ok(files)
}

/// Rejects names that would escape the output directory.
pub fn validate_file_name(name: &str) -> Result<&str, Chat2NotionError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.split('.').all(str::is_empty)
        || trimmed.contains("..")
    {
        return Err(Chat2NotionError::InvalidInput(format!(
            "invalid file name: {name:?}"
        )));
    }
    Ok(trimmed)
}

pub fn run_list(args: ListArgs, config: &AppConfig) -> anyhow::Result<()> {
    let Some(dir) = resolve_existing_dir(&config.base_dir, &args.dir) else {
        tracing::warn!(dir = %args.dir, "output directory not found");
        return Ok(());
    };
    for name in list_markdown_files(&dir)? {
        println!("{name}");
    }
    Ok(())
}
