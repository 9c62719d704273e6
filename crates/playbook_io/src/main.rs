//! Playbook CLI
//!
//! Inspect, convert and sample formation / strategy CSV files.

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use playbook_core::{EngineConfig, Formation, Session};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "playbook")]
#[command(about = "Inspect and convert recorded plays", long_about = None)]
struct Cli {
    /// Engine settings JSON (defaults apply to missing keys)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Import a strategy file and summarize it
    Inspect {
        /// Strategy CSV file
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Export the positions at time `t` of a strategy as a formation file
    Frame {
        /// Strategy CSV file
        input: PathBuf,

        /// Continuous step time (e.g. 2.5)
        #[arg(long)]
        at: f64,

        /// Output formation CSV (default: ultimate_<timestamp>.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write the default 7-on-7 lineup
    DefaultFormation {
        /// Output formation CSV (default: ultimate_<timestamp>.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Re-export a strategy file in canonical form
    Normalize {
        /// Strategy CSV file
        input: PathBuf,

        /// Output strategy CSV (default: strategy_<timestamp>.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => playbook_io::load_config(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Inspect { input, json } => {
            let (timeline, report) = playbook_io::load_strategy(&input, None)?;
            let summary = playbook_io::StrategySummary::new(&timeline, &report);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("Strategy: {}", input.display());
            println!("   Entities: {}", summary.entities);
            println!("   Steps:    {} ({} idle)", summary.steps, summary.idle_steps);
            println!("   Import:   {}", report);
            for skipped in &report.skipped {
                println!("      line {}: {}", skipped.line, skipped.issue);
            }
            for (step, moves) in summary.moves_per_step.iter().enumerate() {
                println!("   step {:>3}: {} entities", step, moves);
            }

            let epsilon = config.recording.change_epsilon;
            let redundant = playbook_io::redundant_moves(&timeline, epsilon)?;
            for (step, label) in &redundant {
                println!("   warning: step {} stores {} without movement", step, label);
            }
        }

        Commands::Frame { input, at, out } => {
            let (timeline, report) = playbook_io::load_strategy(&input, None)?;
            println!("Import: {}", report);

            let mut session = Session::new(Formation::default(), config);
            session.load_strategy(timeline)?;
            let positions = session.query_snapshot_at(at)?;
            let formation = Formation { roster: session.roster().clone(), positions };

            let out = output_path(out, playbook_io::FileKind::Formation);
            playbook_io::save_formation(&out, &formation)?;
            println!("Wrote frame t={} to {}", at, out.display());
        }

        Commands::DefaultFormation { out } => {
            let out = output_path(out, playbook_io::FileKind::Formation);
            playbook_io::save_formation(&out, &Formation::default())?;
            println!("Wrote default formation to {}", out.display());
        }

        Commands::Normalize { input, out } => {
            let (timeline, report) = playbook_io::load_strategy(&input, None)?;
            println!("Import: {}", report);
            let out = output_path(out, playbook_io::FileKind::Strategy);
            ensure_distinct(&input, &out)?;
            playbook_io::save_strategy(&out, &timeline)?;
            println!("Wrote {} steps to {}", timeline.step_count(), out.display());
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(feature = "cli")]
fn output_path(out: Option<PathBuf>, kind: playbook_io::FileKind) -> PathBuf {
    match out {
        Some(path) => {
            let name = path.to_string_lossy();
            PathBuf::from(playbook_io::ensure_csv_ext(&name))
        }
        None => PathBuf::from(playbook_io::default_file_name(kind, &chrono::Local::now())),
    }
}

#[cfg(feature = "cli")]
fn ensure_distinct(input: &Path, out: &Path) -> Result<()> {
    if input == out {
        anyhow::bail!("Refusing to overwrite the input file: {}", input.display());
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("playbook CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
