use std::collections::HashMap;

use serde::Serialize;

/// Date key used for rows whose date could not be parsed under
/// [`crate::dates::DatePolicy::BucketAsUnknown`].
pub const UNKNOWN_DATE_KEY: &str = "unknown-date";

/// One parsed CSV line, keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    values: HashMap<String, String>,
}

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A parsed CSV export: header names in file order plus the data rows.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMap {
    pub date_col: Option<String>,
    pub user_col: Option<String>,
    pub message_col: Option<String>,
    /// Separate time-of-day column, when the export has one besides the date.
    pub time_col: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub date: String,
    pub time: String,
    pub user: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBucket {
    pub date: String,
    pub messages: Vec<ChatMessage>,
}

/// Messages grouped by date key, in the order each key was first seen.
#[derive(Debug, Clone, Default)]
pub struct DateBuckets {
    days: Vec<DayBucket>,
    index: HashMap<String, usize>,
}

impl DateBuckets {
    pub fn push(&mut self, message: ChatMessage) {
        match self.index.get(&message.date) {
            Some(&idx) => self.days[idx].messages.push(message),
            None => {
                self.index.insert(message.date.clone(), self.days.len());
                self.days.push(DayBucket {
                    date: message.date.clone(),
                    messages: vec![message],
                });
            }
        }
    }

    pub fn get(&self, date: &str) -> Option<&DayBucket> {
        self.index.get(date).map(|&idx| &self.days[idx])
    }

    pub fn days(&self) -> &[DayBucket] {
        &self.days
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.days.iter().map(|d| d.date.as_str())
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn total_messages(&self) -> usize {
        self.days.iter().map(|d| d.messages.len()).sum()
    }
}

/// A rendered per-date document as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitReport {
    pub files: Vec<GeneratedFile>,
    pub output_path: String,
    pub total_messages: usize,
    pub date_range: String,
    pub columns: ColumnMap,
}
