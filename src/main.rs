use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use draftdex::ingest::{self, ExportKind, FileOutcome, FileReport};
use draftdex::stats::rank_costs;
use draftdex::{Config, ConfigError, Database, DbError, IngestError, IngestOutcome, CURRENT_SCHEMA};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "draftdex")]
#[command(author, version, about = "Pokemon draft exports into SQLite, with cost and player statistics")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database file (default: DRAFTDEX_DB_PATH, then the nearest .draftdex/draftdex.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file (default: the nearest .draftdex/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress at info level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest every CSV export in a directory
    Ingest {
        /// Directory to scan (default: ingest.source_dir, or ingest.flat_source_dir with --flat)
        dir: Option<PathBuf>,
        /// Read files as flat exports dated by a YYYYMMDD_HHMMSS file name prefix
        #[arg(long)]
        flat: bool,
    },

    /// Copy drafts from the old table families into the unified tables
    Migrate,

    /// Rename a species across all picks, ignoring case
    RenameSpecies {
        /// Current name
        from: String,
        /// New name
        to: String,
        /// Only report how many picks would change
        #[arg(long)]
        dry_run: bool,
    },

    /// Query ingested drafts
    Stats {
        #[command(subcommand)]
        view: StatsView,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum StatsView {
    /// Average cost per Pokemon
    Pokemon {
        /// Show the N most expensive
        #[arg(long, conflicts_with = "bottom")]
        top: Option<usize>,
        /// Show the N cheapest
        #[arg(long)]
        bottom: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Most expensive picks of every draft
    TopPicks {
        /// Picks per draft
        #[arg(short, default_value = "3")]
        n: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drafts, picks and average cost per patch
    Patches {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Participation and spend per player
    Players {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Row counts and schema version
    Tables {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Db(#[from] DbError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("cannot create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn init_logging(verbose: bool) {
    let default = if verbose { "draftdex=info" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();

    if let Command::Completion { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "draftdex", &mut io::stdout());
        return;
    }

    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(2);
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, CliError> {
    match path {
        Some(path) => Ok(Config::load_from(path)?),
        None => Ok(Config::load()),
    }
}

fn open_database(path: Option<&Path>) -> Result<Database, CliError> {
    let Some(path) = path else {
        return Ok(Database::open()?);
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| CliError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(Database::open_at(path)?)
}

/// Runs a command and returns the process exit code
fn run(cli: Cli) -> Result<i32, CliError> {
    let config = load_config(cli.config.as_deref())?;
    let db = open_database(cli.db.as_deref())?;

    match cli.command {
        Command::Ingest { dir, flat } => {
            let (kind, default_dir) = if flat {
                (ExportKind::Flat, &config.ingest.flat_source_dir)
            } else {
                (ExportKind::Draft, &config.ingest.source_dir)
            };
            let dir = dir.unwrap_or_else(|| default_dir.clone());
            println!("{} {}", "Ingesting".cyan().bold(), dir.display());

            let report = ingest::ingest_dir_as(&db, &dir, kind, &config.ingest, print_file_report)?;

            let summary = format!(
                "{} inserted, {} skipped, {} failed",
                report.inserted(),
                report.skipped(),
                report.failed()
            );
            if report.failed() > 0 {
                println!("\n{}", summary.yellow().bold());
            } else {
                println!("\n{}", summary.green().bold());
            }
            Ok(report.exit_code())
        }

        Command::Migrate => {
            let report = db.migrate_legacy()?;
            if report.is_empty() {
                println!("No legacy tables found.");
            }
            for family in &report.families {
                println!(
                    "   {} {}: {} copied, {} duplicate, {} invalid",
                    "Migrated".green(),
                    family.source,
                    family.copied,
                    family.duplicates,
                    family.invalid
                );
            }
            Ok(0)
        }

        Command::RenameSpecies { from, to, dry_run } => {
            if dry_run {
                let count = db.count_species(&from)?;
                println!("Would rename {} pick(s) of '{}' to '{}'", count, from, to);
            } else {
                let changed = db.rename_species(&from, &to)?;
                println!("   {} {} pick(s) of '{}' to '{}'", "Renamed".green(), changed, from, to);
            }
            Ok(0)
        }

        Command::Stats { view } => {
            print_stats(&db, view)?;
            Ok(0)
        }

        Command::Completion { .. } => Ok(0),
    }
}

fn print_file_report(file: &FileReport) {
    let name = file.file_name();
    match &file.outcome {
        FileOutcome::Ingested(outcome @ IngestOutcome::Inserted { .. }) => {
            println!("   {} {}: {}", "ok".green(), name, outcome);
        }
        FileOutcome::Ingested(outcome) => {
            println!("   {} {}: {}", "--".dimmed(), name, outcome);
        }
        FileOutcome::Failed { reason } => {
            println!("   {} {}: failed: {}", "!!".red(), name, reason);
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fmt_avg(avg: Option<f64>) -> String {
    avg.map(|a| format!("{:.2}", a)).unwrap_or_else(|| "-".to_string())
}

fn print_stats(db: &Database, view: StatsView) -> Result<(), CliError> {
    match view {
        StatsView::Pokemon { top, bottom, json } => {
            let mut costs = db.pokemon_costs()?;
            if let Some(n) = top {
                costs = rank_costs(costs, n, false);
            } else if let Some(n) = bottom {
                costs = rank_costs(costs, n, true);
            }
            if json {
                return print_json(&costs);
            }
            println!("{}", format!("{:<24} {:>10} {:>8}", "Pokemon", "Avg Cost", "Drafted").bold());
            for c in &costs {
                println!("{:<24} {:>10.2} {:>8}", c.pokemon, c.avg_cost, c.times_drafted);
            }
        }

        StatsView::TopPicks { n, json } => {
            let picks = db.top_picks_per_draft(n)?;
            if json {
                return print_json(&picks);
            }
            let mut current = None;
            for pick in &picks {
                if current != Some(pick.draft_id) {
                    current = Some(pick.draft_id);
                    let label = pick.external_draft_id.as_deref().unwrap_or("legacy");
                    println!("{}", format!("Draft {} ({})", label, pick.date_time).bold());
                }
                let order = pick.draft_order.map(|o| format!("#{}", o)).unwrap_or_else(|| "-".to_string());
                println!(
                    "   {}. {:<24} {:<16} {:>6} {:>5}",
                    pick.rank, pick.pokemon, pick.drafted_by, pick.cost, order
                );
            }
        }

        StatsView::Patches { json } => {
            let trends = db.patch_trends()?;
            if json {
                return print_json(&trends);
            }
            println!("{}", format!("{:<12} {:>8} {:>8} {:>10}", "Patch", "Drafts", "Picks", "Avg Cost").bold());
            for t in &trends {
                println!(
                    "{:<12} {:>8} {:>8} {:>10}",
                    t.patch.as_deref().unwrap_or("(none)"),
                    t.drafts,
                    t.picks,
                    fmt_avg(t.avg_cost)
                );
            }
        }

        StatsView::Players { json } => {
            let players = db.player_summaries()?;
            if json {
                return print_json(&players);
            }
            println!(
                "{}",
                format!("{:<20} {:>7} {:>7} {:>12} {:>10}", "Player", "Drafts", "Picks", "Total Spent", "Avg Cost").bold()
            );
            for p in &players {
                println!(
                    "{:<20} {:>7} {:>7} {:>12} {:>10}",
                    p.player,
                    p.drafts,
                    p.picks,
                    p.total_spent,
                    fmt_avg(p.avg_cost)
                );
            }
        }

        StatsView::Tables { json } => {
            let counts = db.table_counts()?;
            if json {
                return print_json(&counts);
            }
            println!("Schema: {}", CURRENT_SCHEMA);
            println!("draft_events         {:>8}", counts.events);
            println!("draft_event_players  {:>8}", counts.players);
            println!("draft_event_picks    {:>8}", counts.picks);
        }
    }
    Ok(())
}
