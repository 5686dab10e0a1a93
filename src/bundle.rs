use std::io::{Cursor, Write as _};
use std::path::Path;

use anyhow::Context as _;
use zip::write::SimpleFileOptions;

use crate::cli::BundleArgs;
use crate::config::AppConfig;
use crate::error::Chat2NotionError;
use crate::formats::GeneratedFile;
use crate::output_dir::{list_markdown_files, resolve_existing_dir, validate_file_name};

/// Zips in-memory documents, in the given order.
pub fn zip_documents(files: &[GeneratedFile]) -> anyhow::Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for file in files {
        let name = validate_file_name(&file.name)?;
        zip.start_file(name, options)
            .with_context(|| format!("zip start_file: {name}"))?;
        zip.write_all(file.content.as_bytes())
            .with_context(|| format!("zip write: {name}"))?;
    }

    let cursor = zip.finish().context("zip finish")?;
    Ok(cursor.into_inner())
}

/// Zips every `.md` file directly inside `dir`.
pub fn zip_directory(dir: &Path) -> anyhow::Result<Vec<u8>> {
    let mut files = Vec::new();
    for name in list_markdown_files(dir)? {
        let path = dir.join(&name);
        let content =
            std::fs::read_to_string(&path).with_context(|| format!("read: {}", path.display()))?;
        files.push(GeneratedFile {
            name,
            size: content.len(),
            content,
        });
    }
    if files.is_empty() {
        anyhow::bail!("no .md files found in {}", dir.display());
    }
    zip_documents(&files)
}

pub fn run(args: BundleArgs, config: &AppConfig) -> anyhow::Result<()> {
    if args.out.exists() && !args.force {
        anyhow::bail!("bundle output already exists: {}", args.out.display());
    }
    let dir = resolve_existing_dir(&config.base_dir, &args.dir)
        .ok_or_else(|| Chat2NotionError::OutputDirNotFound(args.dir.clone()))?;
    let bytes = zip_directory(&dir)?;
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create bundle output dir: {}", parent.display()))?;
    }
    std::fs::write(&args.out, &bytes)
        .with_context(|| format!("write bundle: {}", args.out.display()))?;
    tracing::info!(out = %args.out.display(), bytes = bytes.len(), "wrote bundle");
    Ok(())
}
