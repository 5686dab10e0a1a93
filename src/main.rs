use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    chat2notion::logging::init(chat2notion::logging::CLI_DEFAULT_FILTER)
        .context("init logging")?;

    let cli = chat2notion::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let config = chat2notion::config::AppConfig::from_env().context("load config")?;

    match cli.command {
        chat2notion::cli::Command::Split(args) => {
            chat2notion::split::run(args, &config).context("split")?;
        }
        chat2notion::cli::Command::List(args) => {
            chat2notion::output_dir::run_list(args, &config).context("list")?;
        }
        chat2notion::cli::Command::Register(args) => {
            chat2notion::register::run(args, &config)
                .await
                .context("register")?;
        }
        chat2notion::cli::Command::CheckNotion(args) => {
            chat2notion::register::check(args, &config)
                .await
                .context("check notion")?;
        }
        chat2notion::cli::Command::Bundle(args) => {
            chat2notion::bundle::run(args, &config).context("bundle")?;
        }
    }

    Ok(())
}
