use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;

use crate::blocks::pack_blocks;
use crate::cli::{NotionArgs, RegisterArgs};
use crate::config::{AppConfig, NotionSettings};
use crate::error::Chat2NotionError;
use crate::notion::{HttpNotionClient, NotionApi, normalize_database_id};
use crate::output_dir::{list_markdown_files, resolve_existing_dir, validate_file_name};
use crate::render::title_from_file_name;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredPage {
    pub file: String,
    pub title: String,
    pub page_id: String,
    pub blocks: usize,
}

/// Creates one Notion page per file, in order.
///
/// Stops at the first failure; pages created before it are not rolled back.
pub async fn register_files(
    api: &dyn NotionApi,
    database_id: &str,
    dir: &Path,
    files: &[String],
) -> Result<Vec<RegisteredPage>, Chat2NotionError> {
    let database_id = normalize_database_id(database_id);
    let mut registered = Vec::with_capacity(files.len());

    for file in files {
        let name = validate_file_name(file)?;
        let path = dir.join(name);
        let content = tokio::fs::read_to_string(&path).await.map_err(|err| {
            Chat2NotionError::InvalidInput(format!("read {}: {err}", path.display()))
        })?;

        let title = title_from_file_name(name);
        let blocks = pack_blocks(&content);
        tracing::debug!(
            file = name,
            lines = content.lines().filter(|l| !l.trim().is_empty()).count(),
            blocks = blocks.len(),
            "packed blocks"
        );

        let page = api
            .create_page(&database_id, title, &blocks)
            .await
            .inspect_err(|err| tracing::error!(file = name, %err, "create page failed"))?;
        tracing::info!(file = name, page_id = %page.id, "created notion page");

        registered.push(RegisteredPage {
            file: name.to_owned(),
            title: title.to_owned(),
            page_id: page.id,
            blocks: blocks.len(),
        });
    }

    Ok(registered)
}

fn client_for(config: &AppConfig, settings: &NotionSettings) -> HttpNotionClient {
    HttpNotionClient::with_base_url(
        settings.token.clone(),
        config.notion_base_url.clone(),
        config.notion_version.clone(),
    )
}

pub async fn run(args: RegisterArgs, config: &AppConfig) -> anyhow::Result<()> {
    let settings = NotionSettings::resolve(args.notion.token, args.notion.database_id)?;
    let dir = resolve_existing_dir(&config.base_dir, &args.dir)
        .ok_or_else(|| Chat2NotionError::OutputDirNotFound(args.dir.clone()))?;
    let files = if args.files.is_empty() {
        list_markdown_files(&dir)?
    } else {
        args.files
    };
    if files.is_empty() {
        anyhow::bail!("no .md files to register in {}", dir.display());
    }

    let client = client_for(config, &settings);
    let pages = register_files(&client, &settings.database_id, &dir, &files)
        .await
        .context("register files")?;
    for page in &pages {
        println!("{}\t{}", page.title, page.page_id);
    }
    Ok(())
}

pub async fn check(args: NotionArgs, config: &AppConfig) -> anyhow::Result<()> {
    let settings = NotionSettings::resolve(args.token, args.database_id)?;
    let client = client_for(config, &settings);
    let database_id = normalize_database_id(&settings.database_id);
    let info = client
        .retrieve_database(&database_id)
        .await
        .map_err(Chat2NotionError::from)?;
    println!("{}", serde_json::to_string_pretty(&info).context("serialize database info")?);
    Ok(())
}
