//! playsync - Android package downloader and manager

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use crossterm::style::Stylize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use playsync_cli::cmd::{self, Context, Flow};
use playsync_cli::config::{Settings, token_override};
use playsync_cli::exit::ExitStatus;
use playsync_cli::ui::ConsoleReporter;
use playsync_cli::{Cli, USER_AGENT};

#[tokio::main]
async fn main() -> ExitCode {
    // No arguments at all: show help instead of doing nothing.
    if std::env::args_os().len() < 2 {
        let _ = Cli::command().print_help();
        return ExitStatus::Ok.into();
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitStatus::Ok.into(),
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitStatus::from_error(&e).into()
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,playsync_core=info,playsync_cli=info,playsync=info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    info!("{USER_AGENT}");
    let settings = Settings::load(cli.config.as_deref())?;
    info!("Configuration file is {}", settings.source.display());
    let passed_token = token_override(cli.token_str.as_deref(), cli.gsf_id.as_deref())?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing downloads in flight");
            ctrl_c.cancel();
        }
    });

    let ctx = Context {
        reporter: Arc::new(ConsoleReporter::stdio(cli.progress)),
        cancel,
        expansion_files: cli.additional_files,
        jobs: cli.jobs,
        audit_dir: cli.log.then(|| std::path::PathBuf::from(".")),
    };

    let session = if cli.needs_catalog() {
        let options = cmd::session::SessionOptions {
            device_codename: cli.device_codename.clone(),
            token: cli.token,
            token_url: cli.token_url.clone(),
            passed_token,
        };
        Some(cmd::session::open(&options, &settings).await?)
    } else {
        None
    };

    if let Some(folder) = &cli.list {
        cmd::list::list(folder)?;
    }

    let Some(session) = session else {
        return Ok(());
    };

    if let Some(folder) = &cli.update {
        let stdin = std::io::stdin();
        let flow = cmd::update::update(
            &session,
            folder,
            cli.yes,
            &ctx,
            stdin.lock(),
            std::io::stdout(),
        )
        .await?;
        if flow == Flow::Stop {
            return Ok(());
        }
    }

    if let Some(query) = &cli.search {
        cmd::search::search(&session, query, cli.number, cli.paid).await?;
    }

    let ids = match (&cli.file, &cli.download) {
        (Some(file), _) => Some(cmd::download::load_from_file(file)?),
        (None, Some(ids)) => Some(ids.clone()),
        (None, None) => None,
    };
    if let Some(ids) = ids {
        cmd::download::download(&session, ids, &cli.folder, &ctx).await?;
    }

    Ok(())
}
