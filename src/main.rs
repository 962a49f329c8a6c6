mod config;
mod error;
mod ledger;
mod logging;
mod ports;
mod reconcile;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    config::Config,
    logging::init_tracing,
    reconcile::executor::RunMode,
    services::{
        ledger_sync::{LedgerSyncService, reset_mirror},
        library_scan::{LibraryScanService, ScanOutcome},
        metadata::AudioTagResolver,
        mirror::WorkbookMirror,
        reconcile_run::{absorb, sync_then_scan},
        sheets::client::GoogleSheet,
        spotify::client::SpotifyLikedTracks,
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "MUSIC_LEDGER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive, e.g. `debug` or `music_ledger=trace`
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append recently liked Spotify tracks that are missing from the ledger
    Sync {
        /// How many of the most recent liked tracks to look at (max 50)
        #[arg(short, long, default_value_t = 10)]
        top: u32,
    },
    /// Match unresolved ledger records against a local music library
    Scan {
        /// Root of the music library; one folder per artist
        #[arg(short, long)]
        path: PathBuf,

        #[arg(short, long, value_enum, default_value_t = RunMode::Report)]
        mode: RunMode,
    },
    /// Overwrite the local mirror with the contents of the ledger
    ResetMirror,
    /// Sync liked tracks, then scan the local library
    Reconcile {
        #[arg(short, long, default_value_t = 10)]
        top: u32,

        #[arg(short, long)]
        path: PathBuf,

        #[arg(short, long, value_enum, default_value_t = RunMode::Report)]
        mode: RunMode,
    },
    /// Manage the config file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a commented default config file
    CreateDefault,
    /// Print where the config file is read from
    Path,
}

fn log_scan_outcome(outcome: &ScanOutcome) {
    tracing::info!(
        "Scan finished: {} matches, {} updated, {} failed",
        outcome.matches.len(),
        outcome.commit.updated,
        outcome.commit.failed
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_tracing(&args.log_level)?;

    if let Commands::Config(command) = &args.command {
        match command {
            ConfigCommands::CreateDefault => {
                let path = Config::create_default()?;
                println!("Config file at {}", path.display());
            }
            ConfigCommands::Path => match &args.config {
                Some(path) => println!("{}", path.display()),
                None => match Config::config_path() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("No config directory for this platform"),
                },
            },
        }
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    let google = config.google_credentials()?;
    let mirror = WorkbookMirror::new(config.mirror_path());

    match args.command {
        Commands::Sync { top } => {
            let feed = SpotifyLikedTracks::new(config.spotify_credentials()?);
            let ledger = GoogleSheet::open(&google.access_token, &google.spreadsheet).await?;
            let sync = LedgerSyncService::new(&feed, &ledger, &mirror);
            absorb("Sync", sync.sync_liked_tracks(top).await).wrap_err("Sync failed")?;
        }
        Commands::Scan { path, mode } => {
            let ledger = GoogleSheet::open(&google.access_token, &google.spreadsheet).await?;
            let scan =
                LibraryScanService::new(&ledger, &mirror, &AudioTagResolver, &config.matching);
            if let Some(outcome) =
                absorb("Scan", scan.scan(&path, mode).await).wrap_err("Scan failed")?
            {
                log_scan_outcome(&outcome);
            }
        }
        Commands::ResetMirror => {
            let ledger = GoogleSheet::open(&google.access_token, &google.spreadsheet).await?;
            let count = reset_mirror(&ledger, &mirror)
                .await
                .wrap_err("Failed to reset the local mirror")?;
            tracing::info!("Wrote {} rows to {}", count, mirror.path().display());
        }
        Commands::Reconcile { top, path, mode } => {
            let feed = SpotifyLikedTracks::new(config.spotify_credentials()?);
            let ledger = GoogleSheet::open(&google.access_token, &google.spreadsheet).await?;

            let sync = LedgerSyncService::new(&feed, &ledger, &mirror);
            let scan =
                LibraryScanService::new(&ledger, &mirror, &AudioTagResolver, &config.matching);
            if let Some(outcome) = sync_then_scan(&sync, &scan, top, &path, mode)
                .await
                .wrap_err("Reconcile failed")?
            {
                log_scan_outcome(&outcome);
            }
        }
        Commands::Config(_) => {}
    }

    Ok(())
}
