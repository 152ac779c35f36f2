//! `slots` CLI — resolve available days and bookable slots from a JSON snapshot.
//!
//! ## Usage
//!
//! ```sh
//! # Days with any availability in March (snapshot from a file)
//! slots days -i snapshot.json --resource room-1 --from 2026-03-01 --to 2026-03-31
//!
//! # Bookable start times on one day, snapshot piped through stdin
//! cat snapshot.json | slots slots --resource room-1 --date 2026-03-02
//!
//! # Pick a service, pin "now" and use a 10-minute grid
//! slots slots -i snapshot.json --resource room-1 --date 2026-03-02 \
//!     --service consult --now 2026-03-02T08:30:00Z --step 10
//! ```
//!
//! Output is a JSON array on stdout. Set `RUST_LOG=debug` for resolver logs
//! on stderr.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use slot_engine::{EngineConfig, ServicePolicy, Snapshot};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Resolve resource availability from a JSON snapshot"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List days in an inclusive date range that have any availability
    Days {
        #[command(flatten)]
        common: CommonArgs,
        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last day of the range, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
        /// Longest range accepted, in days
        #[arg(long)]
        max_range_days: Option<u32>,
    },
    /// List bookable slot start times on one day
    Slots {
        #[command(flatten)]
        common: CommonArgs,
        /// Day to resolve (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Service id from the snapshot (first active service if omitted)
        #[arg(long)]
        service: Option<String>,
        /// Current instant, RFC 3339 (defaults to the system clock)
        #[arg(long)]
        now: Option<DateTime<Utc>>,
        /// Grid step between candidate start times, in minutes
        #[arg(long)]
        step: Option<u32>,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Snapshot JSON file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,
    /// Resource to resolve availability for
    #[arg(long)]
    resource: String,
}

/// Snapshot file layout: the engine snapshot plus optional engine settings.
#[derive(Deserialize)]
struct SnapshotFile {
    #[serde(flatten)]
    snapshot: Snapshot,
    #[serde(default)]
    config: Option<EngineConfig>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Days {
            common,
            from,
            to,
            max_range_days,
        } => {
            let file = load_snapshot(common.input.as_deref())?;
            let mut config = file.config.unwrap_or_default();
            if let Some(max) = max_range_days {
                config.max_range_days = max;
            }

            let days =
                slot_engine::find_available_days(&file.snapshot, &common.resource, from, to, &config)
                    .context("Failed to resolve available days")?;
            write_output(common.output.as_deref(), &serde_json::to_string(&days)?)?;
        }
        Commands::Slots {
            common,
            date,
            service,
            now,
            step,
        } => {
            let file = load_snapshot(common.input.as_deref())?;
            let mut config = file.config.unwrap_or_default();
            if let Some(step) = step {
                config.slot_step_minutes = step;
            }

            let policy = service
                .as_deref()
                .map(|id| find_service(&file.snapshot, &common.resource, id))
                .transpose()?;
            let now = now.unwrap_or_else(Utc::now);

            let slots = slot_engine::find_available_slots(
                &file.snapshot,
                &common.resource,
                date,
                policy.as_ref(),
                now,
                &config,
            )
            .context("Failed to resolve available slots")?;
            write_output(common.output.as_deref(), &serde_json::to_string(&slots)?)?;
        }
    }

    Ok(())
}

/// Look up a service policy by id among the resource's services.
fn find_service(snapshot: &Snapshot, resource_id: &str, service_id: &str) -> Result<ServicePolicy> {
    snapshot
        .services
        .iter()
        .find(|s| s.resource_id == resource_id && s.id == service_id)
        .map(|s| s.policy.clone())
        .with_context(|| {
            format!(
                "Unknown service '{}' for resource '{}'",
                service_id, resource_id
            )
        })
}

fn load_snapshot(path: Option<&str>) -> Result<SnapshotFile> {
    let json = read_input(path)?;
    let file: SnapshotFile = serde_json::from_str(&json).context("Failed to parse snapshot JSON")?;
    tracing::debug!(
        rules = file.snapshot.weekly_rules.len(),
        windows = file.snapshot.dated_windows.len(),
        exceptions = file.snapshot.exceptions.len(),
        reservations = file.snapshot.reservations.len(),
        "loaded snapshot"
    );
    Ok(file)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
