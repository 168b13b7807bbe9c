//! Roster CLI - maintain the player roster table
//!
//! Every command works on `2025member.csv` in the working directory unless
//! `--input` (or `ROSTER_FILE`) says otherwise.
//!
//! # Passes
//!
//! ```bash
//! roster fix-levels                 # Pull ratings into tier ranges, then analyze
//! roster analyze [--json]           # Rating distribution by tier
//! roster optimize --seed 7          # Seeded rating nudges and tag filling
//! roster specialize                 # Position-based attribute adjustments
//! roster cap-outliers               # Redraw attributes stuck at 99
//! roster value                      # Seeded market value per player
//! roster run fix-levels optimize    # Several passes, one load and one save
//! ```
//!
//! # Inspection
//!
//! ```bash
//! roster check                      # Bounds and tier consistency, exit 1 on problems
//! roster config > roster.json       # Print the configuration as JSON
//! ```

use clap::{Parser, Subcommand};
use roster::logs::{drain, LogEntry, LOG_BROADCASTER};
use roster::{
    check_table, load_table, process_file, RosterConfig, RunOptions, RunResult, Stage,
    StageReport, DEFAULT_TABLE_FILE,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Correct, analyze and vary player ratings in the roster table", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Roster table
    #[arg(short, long, global = true, env = "ROSTER_FILE", default_value = DEFAULT_TABLE_FILE)]
    input: PathBuf,

    /// JSON configuration file (built-in defaults if not specified)
    #[arg(short, long, global = true, env = "ROSTER_CONFIG")]
    config: Option<PathBuf>,

    /// Seed for the random passes
    #[arg(short, long, global = true, env = "ROSTER_SEED")]
    seed: Option<u64>,

    /// Write the result here instead of replacing the input
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Run the passes without writing anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Copy the input aside before replacing it
    #[arg(long, global = true)]
    backup: bool,

    /// Also write every log entry to this file as JSON lines
    #[arg(long, global = true)]
    log_json: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Correct overall ratings into their tier range, then show the distribution
    FixLevels,

    /// Show the rating distribution and consistency problems
    Analyze {
        /// Print the report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Nudge overall ratings and fill empty tags
    Optimize,

    /// Adjust attributes according to position
    Specialize,

    /// Redraw attributes sitting at the ceiling
    CapOutliers,

    /// Compute every player's market value
    Value,

    /// Run several passes in one load/save cycle
    Run {
        /// Passes, in order (fix-levels, analyze, optimize, specialize, cap-outliers, value)
        #[arg(required = true)]
        stages: Vec<Stage>,
    },

    /// Check rating bounds and tier consistency
    Check {
        /// Print the result as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the configuration as JSON
    Config,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut log_receiver = cli.log_json.as_ref().map(|_| LOG_BROADCASTER.subscribe());

    let result = run(&cli);

    if let (Some(path), Some(receiver)) = (&cli.log_json, log_receiver.as_mut()) {
        let (entries, lost) = drain(receiver);
        if lost > 0 {
            eprintln!("⚠️  {} log entries dropped from {}", lost, path.display());
        }
        if let Err(e) = write_log(path, &entries) {
            eprintln!("⚠️  Cannot write log to {}: {}", path.display(), e);
        }
    }

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run the selected command. `Ok(false)` means it ran but found problems.
fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let config = load_config(cli.config.as_deref(), cli.seed)?;
    let options = RunOptions {
        output: cli.output.clone(),
        dry_run: cli.dry_run,
        backup: cli.backup,
    };

    match &cli.command {
        Commands::FixLevels => {
            cmd_stages(&cli.input, &[Stage::FixLevels, Stage::Analyze], &config, &options)
        }
        Commands::Analyze { json } => cmd_analyze(&cli.input, *json, &config),
        Commands::Optimize => cmd_stages(&cli.input, &[Stage::Optimize], &config, &options),
        Commands::Specialize => cmd_stages(&cli.input, &[Stage::Specialize], &config, &options),
        Commands::CapOutliers => cmd_stages(&cli.input, &[Stage::CapOutliers], &config, &options),
        Commands::Value => cmd_stages(&cli.input, &[Stage::Value], &config, &options),
        Commands::Run { stages } => cmd_stages(&cli.input, stages, &config, &options),
        Commands::Check { json } => cmd_check(&cli.input, *json, &config),
        Commands::Config => {
            println!("{}", config.to_json()?);
            Ok(true)
        }
    }
}

fn load_config(
    path: Option<&Path>,
    seed: Option<u64>,
) -> Result<RosterConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => {
            eprintln!("⚙️  Config: {}", path.display());
            let (config, warnings) = RosterConfig::load(path)?;
            for warning in warnings {
                eprintln!("   ⚠️  {}", warning);
            }
            config
        }
        None => RosterConfig::default(),
    };
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    Ok(config)
}

fn cmd_stages(
    input: &Path,
    stages: &[Stage],
    config: &RosterConfig,
    options: &RunOptions,
) -> Result<bool, Box<dyn std::error::Error>> {
    let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
    eprintln!("📄 Processing: {} ({})", input.display(), names.join(" → "));

    let result = process_file(input, stages, config, options)?;
    print_summary(&result);

    eprintln!("\n✨ Done!");
    Ok(true)
}

fn print_summary(result: &RunResult) {
    eprintln!();
    for report in &result.reports {
        match report {
            StageReport::FixLevels(r) => eprintln!("   🔧 Ratings corrected: {}", r.count()),
            StageReport::Analyze(r) => {
                if r.findings.is_empty() {
                    eprintln!("   📊 Distribution consistent");
                } else {
                    eprintln!("   📊 Consistency problems: {}", r.findings.len());
                }
            }
            StageReport::Optimize(r) => eprintln!(
                "   🎲 Ratings changed: {}, tags filled: {}",
                r.ratings_changed, r.tags_filled
            ),
            StageReport::Specialize(r) => {
                eprintln!("   🎯 Attribute cells changed: {}", r.attributes_changed)
            }
            StageReport::CapOutliers(r) => eprintln!("   ✂️  Cells capped: {}", r.cells_capped()),
            StageReport::Value(r) => eprintln!(
                "   💰 Players valued: {}, total: {}, at cap: {}",
                r.records, r.total, r.capped
            ),
        }
    }
    if let Some(ref backup) = result.backup {
        eprintln!("   💾 Backup: {}", backup.display());
    }
    if let Some(ref written) = result.written {
        eprintln!("   💾 Written: {}", written.display());
    }
}

fn cmd_analyze(
    input: &Path,
    json: bool,
    config: &RosterConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let result = process_file(input, &[Stage::Analyze], config, &RunOptions::default())?;
    if json {
        if let Some(report) = result.distribution() {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }
    Ok(true)
}

fn cmd_check(
    input: &Path,
    json: bool,
    config: &RosterConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    eprintln!("✔️  Checking: {}", input.display());

    let table = load_table(input)?;
    let report = check_table(&table, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if report.is_clean() {
        eprintln!("\n✅ All {} players valid!", report.records);
        return Ok(true);
    }

    for violation in report.violations.iter().take(20) {
        eprintln!("   ❌ {}", violation);
    }
    if report.violations.len() > 20 {
        eprintln!("   ... and {} more", report.violations.len() - 20);
    }
    eprintln!(
        "\n📊 Results: {} players, {} problem(s)",
        report.records,
        report.violations.len()
    );
    Ok(false)
}

fn write_log(path: &Path, entries: &[LogEntry]) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = BufWriter::new(File::create(path)?);
    for entry in entries {
        writeln!(out, "{}", serde_json::to_string(entry)?)?;
    }
    out.flush()?;
    Ok(())
}
