//! `cedit` command-line front end
//!
//! Offline access to the update engine over JSON files:
//! - `apply`: run an update batch against section rows
//! - `reconcile`: run a reconciliation cycle over a report/row snapshot
//! - `fields`: list requestable fields of a section type
//!
//! Every command prints JSON on stdout. Logs go to stderr, filtered by
//! `RUST_LOG` (default `info`).

#![warn(unreachable_pub)]

pub mod commands;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Build the command tree
#[must_use]
pub fn cli() -> Command {
    Command::new("cedit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Clinical evaluation field-update engine")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration (TOML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("apply")
                .about("Apply an update batch to section rows")
                .arg(
                    Arg::new("rows")
                        .long("rows")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of section rows"),
                )
                .arg(
                    Arg::new("batch")
                        .long("batch")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Update batch: { \"updates\": [...] } or a bare array"),
                )
                .arg(
                    Arg::new("schemas")
                        .long("schemas")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of section schemas"),
                )
                .arg(
                    Arg::new("write")
                        .long("write")
                        .action(ArgAction::SetTrue)
                        .help("Write updated rows back to the rows file"),
                ),
        )
        .subcommand(
            Command::new("reconcile")
                .about("Reconcile embedded sections with section rows")
                .arg(
                    Arg::new("snapshot")
                        .long("snapshot")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON { \"reports\": [...], \"rows\": [...] }"),
                )
                .arg(
                    Arg::new("owner")
                        .long("owner")
                        .required(true)
                        .help("Caller; only reports this owner holds are reconciled"),
                )
                .arg(Arg::new("report").long("report").help("Reconcile a single report of the owner"))
                .arg(
                    Arg::new("write")
                        .long("write")
                        .action(ArgAction::SetTrue)
                        .help("Write the repaired snapshot back to the snapshot file"),
                ),
        )
        .subcommand(
            Command::new("fields")
                .about("List requestable fields of a section type")
                .arg(
                    Arg::new("schemas")
                        .long("schemas")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of section schemas"),
                )
                .arg(
                    Arg::new("section-type")
                        .long("section-type")
                        .required(true)
                        .help("Section type to describe"),
                ),
        )
}

/// Install the global subscriber; later calls are no-ops
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Run a parsed command, returning its JSON output
///
/// # Errors
/// Returns error if an input file cannot be read or decoded, or the
/// engine rejects the request
pub async fn run(matches: &ArgMatches) -> anyhow::Result<serde_json::Value> {
    let config = commands::load_config(matches.get_one::<PathBuf>("config")).await?;

    match matches.subcommand() {
        Some(("apply", args)) => {
            commands::apply(
                &config,
                commands::ApplyArgs {
                    rows: path(args, "rows")?,
                    batch: path(args, "batch")?,
                    schemas: args.get_one::<PathBuf>("schemas").cloned(),
                    write: args.get_flag("write"),
                },
            )
            .await
        }
        Some(("reconcile", args)) => {
            commands::reconcile(commands::ReconcileArgs {
                snapshot: path(args, "snapshot")?,
                owner: args
                    .get_one::<String>("owner")
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("missing --owner"))?,
                report: args.get_one::<String>("report").cloned(),
                write: args.get_flag("write"),
            })
            .await
        }
        Some(("fields", args)) => {
            let section_type = args
                .get_one::<String>("section-type")
                .ok_or_else(|| anyhow::anyhow!("missing --section-type"))?;
            commands::fields(&path(args, "schemas")?, section_type).await
        }
        Some((other, _)) => anyhow::bail!("unknown command: {other}"),
        None => anyhow::bail!("no command given"),
    }
}

fn path(args: &ArgMatches, name: &str) -> anyhow::Result<PathBuf> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("missing --{name}"))
}
