//! circlecache - command-line driver for the circle snapshot tracker.
//!
//! Logs in, loads every circle once, answers one query, and exits. `watch`
//! keeps the background refresh loop running and reports movement.

mod config;
mod credentials;
mod output;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use circlecache_core::{ApiClient, DirectionsOracle, LatLng, Tracker, TrackerConfig};

use config::Config;
use credentials::CredentialStore;

/// Environment variable holding the provider password
const SECRET_ENV: &str = "CIRCLECACHE_SECRET";

/// Environment variable naming a directory for daily log files
const LOG_DIR_ENV: &str = "CIRCLECACHE_LOG_DIR";

#[derive(Parser)]
#[command(name = "circlecache", version, about = "Who is where, who moved, how far apart")]
struct Cli {
    /// Login phone number or email address
    #[arg(short, long, global = true, env = "CIRCLECACHE_IDENTIFIER")]
    identifier: Option<String>,

    /// Log in with an email address instead of a phone number
    #[arg(long, global = true)]
    email: bool,

    /// Save the identifier and password for later runs
    #[arg(long, global = true)]
    remember: bool,

    /// Seconds between background refresh passes
    #[arg(long, global = true)]
    interval: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every member name in the snapshot
    List,
    /// List circles with their member counts
    Circles,
    /// Show members whose names contain any of the given fragments
    Find { names: Vec<String> },
    /// Show the member registered under an email address
    Email { address: String },
    /// Show the current address and timestamp of each named member
    Locate { names: Vec<String> },
    /// Distance between every pair of the named members
    Distance {
        #[arg(num_args = 2..)]
        names: Vec<String>,
    },
    /// Distance from each named member to a coordinate
    DistanceTo {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Keep refreshing and report when the named members move
    Watch {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Remove the saved identifier and password
    Forget,
}

/// Initialize the tracing subscriber for logging.
///
/// RUST_LOG controls the level (default `warn`). When CIRCLECACHE_LOG_DIR is
/// set, a daily rotated file receives the same events.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "circlecache.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();
    let cli = Cli::parse();
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring unreadable config file");
        Config::default()
    });

    if let Command::Forget = cli.command {
        return forget(&mut config);
    }

    let identifier = cli
        .identifier
        .clone()
        .or_else(|| config.last_identifier.clone())
        .context("No identifier given; pass --identifier or set CIRCLECACHE_IDENTIFIER")?;
    let secret = resolve_secret(&identifier)?;

    if cli.remember {
        CredentialStore::store(&identifier, &secret)?;
        config.remember(&identifier, cli.email, cli.interval);
        config.save()?;
    }

    let interval = cli
        .interval
        .or(config.refresh_interval_secs)
        .unwrap_or(circlecache_core::config::DEFAULT_REFRESH_INTERVAL_SECS);
    let watching = matches!(cli.command, Command::Watch { .. });
    let tracker_config = TrackerConfig::new(identifier, secret)
        .with_auto_refresh(watching)
        .with_refresh_interval_secs(interval);

    let gateway = Arc::new(ApiClient::new(config.login_kind(cli.email))?);
    let oracle = Arc::new(DirectionsOracle::new()?);

    info!("Connecting");
    let mut tracker = Tracker::connect(tracker_config, gateway, oracle).await;
    if !tracker.is_logged_in() {
        bail!("Login failed; check the identifier and password");
    }
    if !tracker.is_connected() {
        warn!("No circles loaded; results will be empty");
    }

    run_command(&cli, &mut tracker).await
}

/// Password from the environment, then the keychain, then a prompt
fn resolve_secret(identifier: &str) -> Result<String> {
    if let Ok(secret) = std::env::var(SECRET_ENV) {
        return Ok(secret);
    }
    match CredentialStore::get_password(identifier) {
        Ok(secret) => Ok(secret),
        Err(_) => rpassword::prompt_password(format!("Password for {}: ", identifier))
            .context("Failed to read password"),
    }
}

fn forget(config: &mut Config) -> Result<()> {
    match config.last_identifier.take() {
        Some(identifier) => {
            if let Err(e) = CredentialStore::delete(&identifier) {
                warn!(error = %e, "No stored password to delete");
            }
            config.save()?;
            println!("Forgot {}", identifier);
        }
        None => println!("Nothing saved"),
    }
    Ok(())
}

async fn run_command(cli: &Cli, tracker: &mut Tracker) -> Result<()> {
    match &cli.command {
        Command::List => {
            let names = tracker.list_all_members();
            if cli.json {
                output::print_json(&names)?;
            } else {
                names.iter().for_each(|n| println!("{}", n));
            }
        }
        Command::Circles => {
            let circles = tracker.circles();
            if cli.json {
                output::print_json(&circles)?;
            } else {
                output::print_circles(&circles);
                println!("Updated {}", tracker.snapshot().age_display());
            }
        }
        Command::Find { names } => {
            let members = tracker.find_members_by_name(names);
            if cli.json {
                output::print_json(&members)?;
            } else {
                output::print_members(&members);
            }
        }
        Command::Email { address } => {
            let member = tracker
                .find_member_by_email(address)
                .with_context(|| format!("No member with email {}", address))?;
            if cli.json {
                output::print_json(&member)?;
            } else {
                println!("{}", output::member_line(&member));
            }
        }
        Command::Locate { names } => {
            let tags = tracker.current_location(names);
            if cli.json {
                output::print_json(&tags)?;
            } else {
                for tag in &tags {
                    println!("{}: {} (since {})", tag.name, tag.address, tag.since);
                }
            }
        }
        Command::Distance { names } => {
            let distances = tracker.distance_between_users(names).await?;
            if cli.json {
                output::print_json(&distances)?;
            } else {
                output::print_member_distances(&distances);
            }
        }
        Command::DistanceTo { lat, lng, names } => {
            let distances = tracker
                .distance_from_lat_lng(names, LatLng::new(*lat, *lng))
                .await?;
            if cli.json {
                output::print_json(&distances)?;
            } else {
                output::print_point_distances(&distances);
            }
        }
        Command::Watch { names } => watch(cli.json, tracker, names).await?,
        Command::Forget => {}
    }
    Ok(())
}

/// Poll the snapshot once per refresh interval until Ctrl-C, reporting
/// members whose location timestamp changed.
async fn watch(json: bool, tracker: &mut Tracker, names: &[String]) -> Result<()> {
    let mut tags = tracker.current_location(names);
    if tags.is_empty() {
        bail!("No members match {}", names.join(", "));
    }
    if !tracker.start() {
        bail!("Refresh loop could not be started");
    }
    let interval: Duration = tracker.config().refresh_interval();
    info!(members = tags.len(), ?interval, "Watching");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let snapshot = tracker.snapshot();
        if snapshot.is_stale(interval) {
            warn!(updated = %snapshot.age_display(), "Snapshot is stale, refreshes are failing");
        }

        let movements = match tracker.has_member_moved(&tags) {
            Ok(movements) => movements,
            Err(e) => {
                warn!(error = %e, "Watched member disappeared from the snapshot");
                continue;
            }
        };
        if movements.iter().any(|m| m.moved) {
            if json {
                output::print_json(&movements)?;
            } else {
                output::print_movements(&movements);
            }
            tags = tracker.current_location(names);
        }
    }

    tracker.shutdown().await;
    Ok(())
}
