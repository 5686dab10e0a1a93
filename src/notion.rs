use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::blocks::ParagraphBlock;

pub const DEFAULT_BASE_URL: &str = "https://api.notion.com";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Strips hyphens from a database ID as copied from a Notion URL.
pub fn normalize_database_id(raw: &str) -> String {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '-').collect();
    if cleaned.len() != 32 {
        tracing::warn!(
            original = raw,
            cleaned = %cleaned,
            "database id is not 32 characters after removing hyphens"
        );
    }
    cleaned
}

/// An error response (or transport failure) from the Notion API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionApiError {
    /// HTTP status, absent when the request never got a response.
    pub status: Option<u16>,
    /// Notion's machine-readable code, e.g. `object_not_found`.
    pub code: Option<String>,
    pub message: String,
}

impl NotionApiError {
    /// A user-facing explanation with remediation steps for known codes.
    pub fn describe(&self) -> String {
        match self.code.as_deref() {
            Some("object_not_found") => format!(
                "Notion database not found ({}).\n\
                 How to fix:\n\
                 1. Check that the database ID is correct\n\
                 2. Open the database page in Notion\n\
                 3. Use \"...\" > \"Connections\" to add your integration\n\
                 4. Make sure the database has not been deleted",
                self.message
            ),
            Some("unauthorized") => "Notion API token is invalid or lacks permission.\n\
                 How to fix:\n\
                 1. Check that the Notion API token is correct\n\
                 2. Check that the integration is enabled\n\
                 3. Issue a new token and try again"
                .to_owned(),
            _ => format!("Notion API error: {}", self.message),
        }
    }
}

impl fmt::Display for NotionApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.code) {
            (Some(status), Some(code)) => {
                write!(f, "notion error {status} {code}: {}", self.message)
            }
            (Some(status), None) => write!(f, "notion error {status}: {}", self.message),
            _ => write!(f, "notion request failed: {}", self.message),
        }
    }
}

impl std::error::Error for NotionApiError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseInfo {
    pub id: String,
    pub title: String,
    pub created_time: Option<String>,
    pub last_edited_time: Option<String>,
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPage {
    pub id: String,
    pub url: Option<String>,
}

/// The subset of the Notion API this crate uses.
#[async_trait]
pub trait NotionApi: Send + Sync {
    async fn create_page(
        &self,
        database_id: &str,
        title: &str,
        blocks: &[ParagraphBlock],
    ) -> Result<CreatedPage, NotionApiError>;

    async fn retrieve_database(&self, database_id: &str) -> Result<DatabaseInfo, NotionApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpNotionClient {
    client: reqwest::Client,
    base_url: String,
    version: String,
    token: String,
}

impl HttpNotionClient {
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            version: version.into(),
            token: token.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.base_url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, NotionApiError> {
        let response = request
            .bearer_auth(&self.token)
            .header("Notion-Version", self.version.as_str())
            .send()
            .await
            .map_err(|err| NotionApiError {
                status: None,
                code: None,
                message: err.to_string(),
            })?;

        let status = response.status();
        let raw = response.text().await.map_err(|err| NotionApiError {
            status: Some(status.as_u16()),
            code: None,
            message: format!("read response body: {err}"),
        })?;

        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &raw));
        }

        serde_json::from_str(&raw).map_err(|err| NotionApiError {
            status: Some(status.as_u16()),
            code: None,
            message: format!("parse response json: {err}"),
        })
    }
}

#[async_trait]
impl NotionApi for HttpNotionClient {
    async fn create_page(
        &self,
        database_id: &str,
        title: &str,
        blocks: &[ParagraphBlock],
    ) -> Result<CreatedPage, NotionApiError> {
        let children: Vec<_> = blocks.iter().map(ParagraphBlock::to_notion).collect();
        let body = serde_json::json!({
            "parent": { "database_id": database_id },
            "properties": {
                "title": {
                    "title": [ { "text": { "content": title } } ]
                }
            },
            "children": children,
        });

        let endpoint = self.endpoint("pages");
        let value = self.send(self.client.post(&endpoint).json(&body)).await?;
        Ok(CreatedPage {
            id: value
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_owned(),
            url: value.get("url").and_then(|v| v.as_str()).map(str::to_owned),
        })
    }

    async fn retrieve_database(&self, database_id: &str) -> Result<DatabaseInfo, NotionApiError> {
        let endpoint = self.endpoint(&format!("databases/{database_id}"));
        let value = self.send(self.client.get(&endpoint)).await?;
        Ok(database_info(&value))
    }
}

fn parse_error(status: u16, raw: &str) -> NotionApiError {
    let value: Option<serde_json::Value> = serde_json::from_str(raw).ok();
    let field = |name: &str| {
        value
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(|v| v.as_str())
            .map(str::to_owned)
    };
    NotionApiError {
        status: Some(status),
        code: field("code"),
        message: field("message").unwrap_or_else(|| raw.to_owned()),
    }
}

fn database_info(value: &serde_json::Value) -> DatabaseInfo {
    let str_field = |name: &str| value.get(name).and_then(|v| v.as_str()).map(str::to_owned);
    let title = value
        .pointer("/title/0/plain_text")
        .and_then(|v| v.as_str())
        .unwrap_or("Untitled")
        .to_owned();
    let mut properties: Vec<String> = value
        .get("properties")
        .and_then(|v| v.as_object())
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default();
    properties.sort();

    DatabaseInfo {
        id: str_field("id").unwrap_or_default(),
        title,
        created_time: str_field("created_time"),
        last_edited_time: str_field("last_edited_time"),
        properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_hyphens_from_database_id() {
        assert_eq!(
            normalize_database_id("1a2b3c4d-1a2b-1a2b-1a2b-1a2b3c4d5e6f"),
            "1a2b3c4d1a2b1a2b1a2b1a2b3c4d5e6f"
        );
        assert_eq!(normalize_database_id(" abc "), "abc");
    }

    #[test]
    fn parse_error_reads_notion_error_body() {
        let err = parse_error(
            404,
            r#"{"object":"error","status":404,"code":"object_not_found","message":"Could not find database."}"#,
        );
        assert_eq!(err.status, Some(404));
        assert_eq!(err.code.as_deref(), Some("object_not_found"));
        assert_eq!(err.message, "Could not find database.");
    }

    #[test]
    fn parse_error_falls_back_to_raw_body() {
        let err = parse_error(502, "bad gateway");
        assert_eq!(err.code, None);
        assert_eq!(err.message, "bad gateway");
    }

    #[test]
    fn describe_lists_remediation_steps() {
        let not_found = NotionApiError {
            status: Some(404),
            code: Some("object_not_found".into()),
            message: "Could not find database.".into(),
        };
        let text = not_found.describe();
        assert!(text.contains("database not found"));
        assert!(text.lines().count() > 3);

        let other = NotionApiError {
            status: Some(400),
            code: Some("validation_error".into()),
            message: "body failed validation".into(),
        };
        assert_eq!(other.describe(), "Notion API error: body failed validation");
    }

    #[test]
    fn database_info_extracts_title_and_properties() {
        let value = serde_json::json!({
            "id": "db-1",
            "title": [ { "plain_text": "Chats" } ],
            "created_time": "2025-01-01T00:00:00.000Z",
            "properties": { "Name": {}, "Date": {} }
        });
        let info = database_info(&value);
        assert_eq!(info.title, "Chats");
        assert_eq!(info.properties, vec!["Date", "Name"]);
        assert_eq!(info.last_edited_time, None);

        assert_eq!(database_info(&serde_json::json!({})).title, "Untitled");
    }
}
