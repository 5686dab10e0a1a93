use std::path::Path;

use anyhow::Context as _;

use crate::cli::SplitArgs;
use crate::columns::detect_columns;
use crate::config::{AppConfig, SplitOptions};
use crate::error::Chat2NotionError;
use crate::formats::{ColumnMap, DateBuckets, GeneratedFile, SplitReport};
use crate::group::{group_messages, parse_csv};
use crate::output_dir::prepare_write_dir;
use crate::render::render_day;

#[derive(Debug, Clone)]
pub struct RenderedExport {
    pub buckets: DateBuckets,
    pub files: Vec<GeneratedFile>,
    pub columns: ColumnMap,
}

/// Parses, groups and renders a CSV export without touching the filesystem.
pub fn render_csv(
    bytes: &[u8],
    options: &SplitOptions,
) -> Result<RenderedExport, Chat2NotionError> {
    let table = parse_csv(bytes)?;
    if table.rows.is_empty() {
        return Err(Chat2NotionError::EmptyCsv);
    }

    let columns = detect_columns(&table.headers);
    tracing::debug!(?columns, "detected columns");

    let buckets = group_messages(&table.rows, &columns, options.date_policy)?;
    let files = buckets
        .days()
        .iter()
        .map(|day| {
            let content = render_day(&day.date, &day.messages, options.layout);
            GeneratedFile {
                name: options.file_naming.file_name(&day.date),
                size: content.len(),
                content,
            }
        })
        .collect();

    Ok(RenderedExport {
        buckets,
        files,
        columns,
    })
}

/// Splits a CSV export into one document per date and writes them to
/// `out_dir`.
pub fn split_csv(
    bytes: &[u8],
    out_dir: &Path,
    options: &SplitOptions,
) -> Result<SplitReport, Chat2NotionError> {
    write_export(render_csv(bytes, options)?, out_dir)
}

/// Writes rendered documents into `out_dir`.
///
/// A file that fails to write is logged and left out of the report; if no
/// file could be written the whole split fails.
pub fn write_export(
    export: RenderedExport,
    out_dir: &Path,
) -> Result<SplitReport, Chat2NotionError> {
    let RenderedExport {
        buckets,
        files,
        columns,
    } = export;

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = out_dir.join(&file.name);
        match std::fs::write(&path, &file.content) {
            Ok(()) => {
                tracing::info!(file = %path.display(), bytes = file.size, "created file");
                written.push(file);
            }
            Err(err) => {
                tracing::error!(file = %path.display(), %err, "write file failed");
            }
        }
    }

    if written.is_empty() {
        return Err(Chat2NotionError::Filesystem(format!(
            "no files could be written to {}",
            out_dir.display()
        )));
    }

    let date_range = match (buckets.dates().next(), buckets.dates().last()) {
        (Some(first), Some(last)) => format!("{first} ~ {last}"),
        _ => String::new(),
    };

    Ok(SplitReport {
        files: written,
        output_path: out_dir.display().to_string(),
        total_messages: buckets.total_messages(),
        date_range,
        columns,
    })
}

pub fn run(args: SplitArgs, config: &AppConfig) -> anyhow::Result<()> {
    let mut options = config.split;
    if let Some(raw) = args.date_policy.as_deref() {
        options.date_policy = raw.parse().context("parse --date-policy")?;
    }
    if let Some(raw) = args.layout.as_deref() {
        options.layout = raw.parse().context("parse --layout")?;
    }
    if let Some(raw) = args.file_naming.as_deref() {
        options.file_naming = raw.parse().context("parse --file-naming")?;
    }

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("read input: {}", args.input.display()))?;
    let export = render_csv(&bytes, &options)?;
    let out_dir = prepare_write_dir(&config.base_dir, &args.out, &config.write_fallback_dir)?;
    let report = write_export(export, &out_dir)?;

    for file in &report.files {
        println!("{}", out_dir.join(&file.name).display());
    }
    tracing::info!(
        files = report.files.len(),
        messages = report.total_messages,
        range = %report.date_range,
        "split complete"
    );
    Ok(())
}
