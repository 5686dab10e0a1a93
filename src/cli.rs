use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split a chat CSV export into one Markdown file per date.
    Split(SplitArgs),
    /// List generated Markdown files.
    List(ListArgs),
    /// Create one Notion page per generated file.
    Register(RegisterArgs),
    /// Check that the Notion token can read the database.
    CheckNotion(NotionArgs),
    /// Zip the generated Markdown files.
    Bundle(BundleArgs),
}

#[derive(Debug, Args)]
pub struct SplitArgs {
    /// CSV file with a header row.
    #[arg(long)]
    pub input: PathBuf,

    /// Output directory (relative paths resolve against the working dir).
    #[arg(long, default_value = "output")]
    pub out: String,

    /// What to do with rows whose date cannot be parsed: drop, unknown, carry-forward.
    #[arg(long)]
    pub date_policy: Option<String>,

    /// Document layout: heading or flat.
    #[arg(long)]
    pub layout: Option<String>,

    /// File naming: date (`<date>.md`) or chat (`chat_<date>.md`).
    #[arg(long)]
    pub file_naming: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, default_value = "output")]
    pub dir: String,
}

#[derive(Debug, Args)]
pub struct NotionArgs {
    /// Notion integration token (defaults to NOTION_TOKEN).
    #[arg(long)]
    pub token: Option<String>,

    /// Notion database ID, with or without hyphens (defaults to NOTION_DATABASE_ID).
    #[arg(long)]
    pub database_id: Option<String>,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[command(flatten)]
    pub notion: NotionArgs,

    #[arg(long, default_value = "output")]
    pub dir: String,

    /// Files to register, in order. Defaults to every `.md` file in `--dir`.
    pub files: Vec<String>,
}

#[derive(Debug, Args)]
pub struct BundleArgs {
    #[arg(long, default_value = "output")]
    pub dir: String,

    /// Zip file to write.
    #[arg(long)]
    pub out: PathBuf,

    /// Overwrite `--out` if it exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}
