use crate::dates::{DatePolicy, normalize_date};
use crate::error::Chat2NotionError;
use crate::formats::{ChatMessage, ColumnMap, CsvTable, DateBuckets, RawRow, UNKNOWN_DATE_KEY};

/// Rows beyond this index no longer get per-row date warnings.
const WARN_ROW_LIMIT: usize = 10;

const UNKNOWN_USER: &str = "Unknown";

/// Parses CSV bytes with a header row into a [`CsvTable`].
///
/// Blank lines are skipped and rows with fewer cells than the header are
/// accepted (missing cells read as absent). Invalid UTF-8 is decoded lossily
/// to U+FFFD rather than rejecting the file.
pub fn parse_csv(bytes: &[u8]) -> Result<CsvTable, Chat2NotionError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|err| Chat2NotionError::MalformedCsv(err.to_string()))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_owned())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(Chat2NotionError::MalformedCsv(
            "missing header row".to_owned(),
        ));
    }

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|err| Chat2NotionError::MalformedCsv(err.to_string()))?;
        let cells: Vec<String> = record
            .iter()
            .map(|cell| String::from_utf8_lossy(cell).into_owned())
            .collect();
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let row: RawRow = headers.iter().cloned().zip(cells).collect();
        rows.push(row);
    }

    tracing::debug!(rows = rows.len(), ?headers, "parsed csv");
    Ok(CsvTable { headers, rows })
}

/// Groups rows into per-date buckets in a single pass.
///
/// `columns.date_col` must be set; a missing user column falls back to
/// `"Unknown"` and a missing message column to the raw date cell.
pub fn group_messages(
    rows: &[RawRow],
    columns: &ColumnMap,
    policy: DatePolicy,
) -> Result<DateBuckets, Chat2NotionError> {
    let date_col = columns
        .date_col
        .as_deref()
        .ok_or(Chat2NotionError::MissingDateColumn)?;

    let mut buckets = DateBuckets::default();
    let mut current_date: Option<String> = None;

    for (index, row) in rows.iter().enumerate() {
        let raw_date = row.get(date_col).unwrap_or_default();
        let parsed = normalize_date(raw_date);
        if parsed.is_none() && index < WARN_ROW_LIMIT {
            tracing::warn!(
                row = index,
                value = raw_date,
                policy = policy.as_str(),
                "unrecognized date"
            );
        }

        let date_key = match policy {
            DatePolicy::DropUnparseable => parsed,
            DatePolicy::BucketAsUnknown => {
                Some(parsed.unwrap_or_else(|| UNKNOWN_DATE_KEY.to_owned()))
            }
            DatePolicy::CarryForwardPrevious => {
                if parsed.is_some() {
                    current_date = parsed;
                }
                current_date.clone()
            }
        };
        let Some(date_key) = date_key else {
            continue;
        };

        buckets.push(build_message(row, columns, date_col, date_key));
    }

    if buckets.is_empty() {
        return Err(Chat2NotionError::NoDatedRows);
    }

    tracing::info!(
        dates = buckets.len(),
        messages = buckets.total_messages(),
        "grouped messages by date"
    );
    Ok(buckets)
}

fn build_message(row: &RawRow, columns: &ColumnMap, date_col: &str, date: String) -> ChatMessage {
    let raw_date = row.get(date_col).unwrap_or_default();
    let time = match columns.time_col.as_deref() {
        Some(col) => row.get(col).unwrap_or_default(),
        None => raw_date,
    };
    let user = match columns.user_col.as_deref() {
        Some(col) => row.get(col).unwrap_or_default(),
        None => UNKNOWN_USER,
    };
    let message = match columns.message_col.as_deref() {
        Some(col) => row.get(col).unwrap_or_default(),
        None => raw_date,
    };

    ChatMessage {
        date,
        time: time.to_owned(),
        user: user.to_owned(),
        message: message.to_owned(),
    }
}
