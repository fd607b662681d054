mod cli;

use crate::cli::{Cli, Command, ConfigCommand, SyncArgs};
use clap::Parser;
use miette::{IntoDiagnostic, Report, miette};
use shelfnote_config::Settings;
use shelfnote_library::Importer;
use shelfnote_remote::{Client, HttpTransport};
use shelfnote_storage::BackendHandle;
use shelfnote_storage::backend::{LocalBackend, ReadOnlyBackend};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Render an `exn` error tree (with its locations) for miette.
fn report<E>(err: exn::Exn<E>) -> Report
where
    E: std::error::Error + Send + Sync + 'static,
{
    miette!("{err:?}")
}

fn config_path(cli: &Cli) -> miette::Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => shelfnote_config::default_path().map_err(report),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<ExitCode> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let path = config_path(&cli)?;
    match &cli.command {
        Command::Sync(args) => sync(&cli, &path, args).await,
        Command::Config(command) => config(&path, command),
    }
}

async fn sync(cli: &Cli, path: &Path, args: &SyncArgs) -> miette::Result<ExitCode> {
    let mut settings = Settings::load(path).map_err(report)?;
    let vault = cli
        .vault
        .clone()
        .or_else(|| settings.vault.clone())
        .ok_or_else(|| miette!("no vault configured: pass --vault or set `vault` in {}", path.display()))?;
    let vault = std::path::absolute(&vault).into_diagnostic()?;
    settings.resolve_templates(&vault).map_err(report)?;

    let local: BackendHandle = Arc::new(LocalBackend::new("vault", &vault).map_err(report)?);
    let backend: BackendHandle = if args.dry_run { Arc::new(ReadOnlyBackend::new(local)) } else { local };
    let transport = HttpTransport::new(Duration::from_secs(settings.timeout_secs)).map_err(report)?;
    let client = Client::new(Arc::new(transport), &settings.host, settings.api_key.clone());

    tracing::info!(vault = %vault.display(), dry_run = args.dry_run, "Syncing");
    let importer = Importer::new(client, backend, settings);
    let outcome = importer.run(args.only).await.map_err(report)?;
    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!(failed = ?outcome.failed, "Sync finished with errors");
        Ok(ExitCode::FAILURE)
    }
}

fn config(path: &Path, command: &ConfigCommand) -> miette::Result<ExitCode> {
    match command {
        ConfigCommand::Init { force } => {
            if !shelfnote_config::init(path, *force).map_err(report)? {
                return Err(miette!("{} already exists, pass --force to overwrite it", path.display()));
            }
            println!("{}", path.display());
        },
        ConfigCommand::Show => {
            let settings = Settings::load(path).map_err(report)?;
            print!("{}", settings.redacted().to_toml().map_err(report)?);
        },
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::ImportPlugin { data, force } => {
            let json = std::fs::read_to_string(data).into_diagnostic()?;
            let settings = Settings::from_plugin_data(&json).map_err(report)?;
            let contents = settings.to_toml().map_err(report)?;
            if !shelfnote_config::write(path, &contents, *force).map_err(report)? {
                return Err(miette!("{} already exists, pass --force to overwrite it", path.display()));
            }
            println!("{}", path.display());
        },
    }
    Ok(ExitCode::SUCCESS)
}
