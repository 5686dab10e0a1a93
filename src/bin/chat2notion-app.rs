use std::net::SocketAddr;
use std::path::PathBuf;

use axum::response::Html;
use clap::Parser;
use tower_http::services::{ServeDir, ServeFile};

use chat2notion::app::{AppState, router};
use chat2notion::config::AppConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Static web assets directory (serve if exists).
    #[arg(long, default_value = "web/dist")]
    web_dir: PathBuf,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    chat2notion::logging::init(chat2notion::logging::SERVER_DEFAULT_FILTER)?;

    let args = AppArgs::parse();
    tracing::info!(?args, "starting chat2notion-app");

    let config = AppConfig::from_env()?;
    tracing::info!(
        base_dir = %config.base_dir.display(),
        fallback_dir = %config.write_fallback_dir.display(),
        notion = %config.notion_base_url,
        "loaded config"
    );

    let mut app = router(AppState::new(config));

    let web_index = args.web_dir.join("index.html");
    if web_index.exists() {
        let static_files = ServeDir::new(args.web_dir).not_found_service(ServeFile::new(web_index));
        app = app.fallback_service(static_files);
    } else {
        app = app.fallback(|| async {
            Html(
                r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>chat2notion-app</title></head>
  <body>
    <h1>chat2notion-app</h1>
    <p>web assets not found. Build the web app into <code>web/dist</code> or use the <code>/api</code> routes directly.</p>
  </body>
</html>
"#,
            )
        });
    }

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "listen for ctrl-c failed");
        return;
    }
    tracing::info!("shutting down");
}
