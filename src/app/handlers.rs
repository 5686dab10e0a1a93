use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderValue, header};
use axum::response::Response;
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::ApiError;
use crate::bundle::zip_documents;
use crate::error::Chat2NotionError;
use crate::formats::{GeneratedFile, SplitReport};
use crate::notion::{DatabaseInfo, HttpNotionClient, NotionApi as _, normalize_database_id};
use crate::output_dir::{
    list_markdown_files, prepare_write_dir, resolve_existing_dir, validate_file_name,
};
use crate::register::{RegisteredPage, register_files};
use crate::split::{render_csv, write_export};

#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Bytes)>,
    output_path: Option<String>,
    date_policy: Option<String>,
    layout: Option<String>,
    file_naming: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub report: SplitReport,
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart?;
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("invalid multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::bad_request(format!("read upload: {err}")))?;
                form.file = Some((file_name, bytes));
            }
            "outputPath" => form.output_path = Some(field_text(field).await?),
            "datePolicy" => form.date_policy = Some(field_text(field).await?),
            "layout" => form.layout = Some(field_text(field).await?),
            "fileNaming" => form.file_naming = Some(field_text(field).await?),
            other => tracing::debug!(field = other, "ignoring multipart field"),
        }
    }

    let Some((file_name, bytes)) = form.file else {
        return Err(ApiError::bad_request("no file uploaded"));
    };
    if !file_name.to_ascii_lowercase().ends_with(".csv") {
        return Err(ApiError::bad_request("only CSV files can be uploaded"));
    }

    let mut options = state.config.split;
    if let Some(raw) = non_blank(form.date_policy) {
        options.date_policy = parse_option(&raw)?;
    }
    if let Some(raw) = non_blank(form.layout) {
        options.layout = parse_option(&raw)?;
    }
    if let Some(raw) = non_blank(form.file_naming) {
        options.file_naming = parse_option(&raw)?;
    }

    let config = Arc::clone(&state.config);
    let output_path =
        non_blank(form.output_path).unwrap_or_else(|| config.default_output_path.clone());
    tracing::info!(
        file = %file_name,
        bytes = bytes.len(),
        output = %output_path,
        "upload received"
    );

    let report = tokio::task::spawn_blocking(move || -> Result<SplitReport, Chat2NotionError> {
        let export = render_csv(&bytes, &options)?;
        let out_dir =
            prepare_write_dir(&config.base_dir, &output_path, &config.write_fallback_dir)?;
        write_export(export, &out_dir)
    })
    .await
    .map_err(|err| ApiError::internal(format!("split task failed: {err}")))??;

    Ok(Json(UploadResponse {
        success: true,
        message: format!("created {} files", report.files.len()),
        report,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub output_path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub files: Vec<String>,
    pub output_path: Option<String>,
}

pub async fn list_files(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(query) = query?;
    let requested =
        non_blank(query.output_path).unwrap_or_else(|| state.config.default_output_path.clone());
    let Some(dir) = resolve_existing_dir(&state.config.base_dir, &requested) else {
        return Ok(Json(ListResponse {
            files: Vec::new(),
            output_path: None,
        }));
    };

    let files = list_markdown_files(&dir).unwrap_or_else(|err| {
        tracing::warn!(dir = %dir.display(), error = %format!("{err:#}"), "list output dir failed");
        Vec::new()
    });
    Ok(Json(ListResponse {
        files,
        output_path: Some(dir.display().to_string()),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub notion_token: Option<String>,
    #[serde(default)]
    pub notion_db_id: Option<String>,
    #[serde(default)]
    pub selected_files: Option<Vec<String>>,
    #[serde(default)]
    pub output_path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub pages: Vec<RegisteredPage>,
}

pub async fn notion_register(
    State(state): State<AppState>,
    req: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(req) = req?;
    let (Some(token), Some(database_id)) =
        (non_blank(req.notion_token), non_blank(req.notion_db_id))
    else {
        return Err(ApiError::bad_request(
            "notionToken, notionDbId and selectedFiles are required",
        ));
    };
    let files = req.selected_files.unwrap_or_default();
    if files.is_empty() {
        return Err(ApiError::bad_request(
            "notionToken, notionDbId and selectedFiles are required",
        ));
    }

    let requested =
        non_blank(req.output_path).unwrap_or_else(|| state.config.default_output_path.clone());
    let dir = resolve_existing_dir(&state.config.base_dir, &requested)
        .ok_or(Chat2NotionError::OutputDirNotFound(requested))?;

    let client = notion_client(&state, token);
    let pages = register_files(&client, &database_id, &dir, &files).await?;

    Ok(Json(RegisterResponse {
        success: true,
        message: format!("registered {} files in Notion", pages.len()),
        pages,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestNotionRequest {
    #[serde(default)]
    pub notion_token: Option<String>,
    #[serde(default)]
    pub notion_db_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestNotionResponse {
    pub success: bool,
    pub message: String,
    pub database: DatabaseInfo,
}

pub async fn test_notion(
    State(state): State<AppState>,
    req: Result<Json<TestNotionRequest>, JsonRejection>,
) -> Result<Json<TestNotionResponse>, ApiError> {
    let Json(req) = req?;
    let (Some(token), Some(database_id)) =
        (non_blank(req.notion_token), non_blank(req.notion_db_id))
    else {
        return Err(ApiError::bad_request("notionToken and notionDbId are required"));
    };

    let client = notion_client(&state, token);
    let database = client
        .retrieve_database(&normalize_database_id(&database_id))
        .await
        .map_err(Chat2NotionError::from)?;
    tracing::info!(database = %database.id, title = %database.title, "notion connection ok");

    Ok(Json(TestNotionResponse {
        success: true,
        message: "connected to Notion database".to_owned(),
        database,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

pub async fn download(
    req: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = req?;
    let (Some(file_name), Some(content)) = (non_blank(req.file_name), req.content) else {
        return Err(ApiError::bad_request("fileName and content are required"));
    };
    let file_name = validate_file_name(&file_name)?;

    attachment(
        content.into_bytes(),
        "text/plain; charset=utf-8",
        file_name,
    )
}

#[derive(Debug, Deserialize)]
pub struct DownloadFile {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadZipRequest {
    #[serde(default)]
    pub files: Vec<DownloadFile>,
}

pub async fn download_zip(
    req: Result<Json<DownloadZipRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = req?;
    if req.files.is_empty() {
        return Err(ApiError::bad_request("no files to download"));
    }

    let files: Vec<GeneratedFile> = req
        .files
        .into_iter()
        .map(|f| GeneratedFile {
            size: f.content.len(),
            name: f.name,
            content: f.content,
        })
        .collect();
    let bytes = zip_documents(&files)?;
    let name = format!(
        "chat-split-{}.zip",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    );
    tracing::info!(files = files.len(), bytes = bytes.len(), %name, "built zip download");

    attachment(bytes, "application/zip", &name)
}

async fn field_text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|err| ApiError::bad_request(format!("invalid multipart field: {err}")))
}

fn parse_option<T>(raw: &str) -> Result<T, ApiError>
where
    T: std::str::FromStr<Err = anyhow::Error>,
{
    raw.parse()
        .map_err(|err: anyhow::Error| ApiError::bad_request(format!("{err:#}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn notion_client(state: &AppState, token: String) -> HttpNotionClient {
    HttpNotionClient::with_base_url(
        token,
        state.config.notion_base_url.clone(),
        state.config.notion_version.clone(),
    )
}

fn attachment(
    body: Vec<u8>,
    content_type: &'static str,
    file_name: &str,
) -> Result<Response, ApiError> {
    let mut resp = Response::new(axum::body::Body::from(body));
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    resp.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition(file_name))
            .map_err(|err| ApiError::internal(format!("content-disposition: {err}")))?,
    );
    Ok(resp)
}

/// `attachment` header with an ASCII fallback name and an RFC 5987 UTF-8 name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        percent_encode_rfc3986(file_name)
    )
}

fn percent_encode_rfc3986(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        let is_unreserved = matches!(
            b,
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~'
        );
        if is_unreserved {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}
