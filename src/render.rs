use std::fmt::Write as _;
use std::str::FromStr;

use crate::formats::ChatMessage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// `# <date>` heading, then a `**user** (time)` line and the message text
    /// per message, separated by blank lines.
    #[default]
    Heading,
    /// One `time user: message` line per message, no heading.
    Flat,
}

impl FromStr for Layout {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "heading" | "markdown" => Ok(Self::Heading),
            "flat" | "plain" => Ok(Self::Flat),
            other => anyhow::bail!("unsupported layout: {other} (expected heading or flat)"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileNaming {
    /// `<date>.md`
    #[default]
    DateOnly,
    /// `chat_<date>.md`
    ChatPrefixed,
}

const CHAT_PREFIX: &str = "chat_";
const MD_EXTENSION: &str = ".md";

impl FileNaming {
    pub fn file_name(self, date_key: &str) -> String {
        match self {
            Self::DateOnly => format!("{date_key}{MD_EXTENSION}"),
            Self::ChatPrefixed => format!("{CHAT_PREFIX}{date_key}{MD_EXTENSION}"),
        }
    }
}

impl FromStr for FileNaming {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "" | "date" | "date-only" => Ok(Self::DateOnly),
            "chat" | "chat-prefixed" => Ok(Self::ChatPrefixed),
            other => anyhow::bail!("unsupported file naming: {other} (expected date or chat)"),
        }
    }
}

/// Page title for a generated file: the date key without extension or prefix.
pub fn title_from_file_name(file_name: &str) -> &str {
    let stem = file_name.strip_suffix(MD_EXTENSION).unwrap_or(file_name);
    stem.strip_prefix(CHAT_PREFIX).unwrap_or(stem)
}

pub fn render_day(date_key: &str, messages: &[ChatMessage], layout: Layout) -> String {
    match layout {
        Layout::Heading => render_heading(date_key, messages),
        Layout::Flat => render_flat(messages),
    }
}

fn render_heading(date_key: &str, messages: &[ChatMessage]) -> String {
    let mut out = format!("# {date_key}\n\n");
    for msg in messages {
        let _ = write!(out, "**{}**", msg.user);
        if !msg.time.is_empty() {
            let _ = write!(out, " ({})", msg.time);
        }
        let _ = write!(out, "\n{}\n\n", msg.message);
    }
    out
}

fn render_flat(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|msg| format!("{} {}: {}", msg.time, msg.user, msg.message))
        .collect::<Vec<_>>()
        .join("\n")
}
