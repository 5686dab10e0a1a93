use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct NotionStubConfig {
    /// 1-based index of the `POST /v1/pages` call that should fail.
    pub fail_page_at: Option<usize>,
    /// Fail `GET /v1/databases/{id}` with this error.
    pub fail_database: bool,
    pub error_status: u16,
    pub error_code: String,
}

#[allow(dead_code)]
impl NotionStubConfig {
    pub fn failing_page(index: usize, status: u16, code: &str) -> Self {
        Self {
            fail_page_at: Some(index),
            fail_database: false,
            error_status: status,
            error_code: code.to_owned(),
        }
    }

    pub fn failing_database(status: u16, code: &str) -> Self {
        Self {
            fail_page_at: None,
            fail_database: true,
            error_status: status,
            error_code: code.to_owned(),
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub notion_version: Option<String>,
    pub body: Value,
}

pub struct NotionStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

#[allow(dead_code)]
impl NotionStub {
    pub fn spawn(config: NotionStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start notion stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let mut pages_created = 0usize;
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let header = |name: &str| {
                    request
                        .headers()
                        .iter()
                        .find(|h| h.field.to_string().eq_ignore_ascii_case(name))
                        .map(|h| h.value.to_string())
                };
                let authorization = header("Authorization");
                let notion_version = header("Notion-Version");
                let method = request.method().to_string();
                let path = request.url().to_string();

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

                recorded
                    .lock()
                    .expect("lock recorded requests")
                    .push(RecordedRequest {
                        method: method.clone(),
                        path: path.clone(),
                        authorization,
                        notion_version,
                        body,
                    });

                let (status, response_body) = if method == "POST" && path == "/v1/pages" {
                    pages_created += 1;
                    if config.fail_page_at == Some(pages_created) {
                        error_body(&config)
                    } else {
                        (
                            200,
                            serde_json::json!({
                                "object": "page",
                                "id": format!("page-{pages_created}"),
                                "url": format!("https://www.notion.so/page-{pages_created}"),
                            }),
                        )
                    }
                } else if method == "GET" && path.starts_with("/v1/databases/") {
                    if config.fail_database {
                        error_body(&config)
                    } else {
                        let id = path.trim_start_matches("/v1/databases/");
                        (
                            200,
                            serde_json::json!({
                                "object": "database",
                                "id": id,
                                "title": [ { "plain_text": "Chat Archive" } ],
                                "created_time": "2025-01-01T00:00:00.000Z",
                                "last_edited_time": "2025-01-02T00:00:00.000Z",
                                "properties": { "Name": {}, "Date": {} },
                            }),
                        )
                    }
                } else {
                    (404, serde_json::json!({ "message": "not found" }))
                };

                let mut response = tiny_http::Response::from_string(response_body.to_string())
                    .with_status_code(status);
                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                response = response.with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("lock recorded requests").clone()
    }

    pub fn page_requests(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "POST" && r.path == "/v1/pages")
            .collect()
    }
}

impl Drop for NotionStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn error_body(config: &NotionStubConfig) -> (u16, Value) {
    (
        config.error_status,
        serde_json::json!({
            "object": "error",
            "status": config.error_status,
            "code": config.error_code,
            "message": format!("stub {} error", config.error_code),
        }),
    )
}
