mod file_store;
mod report;
mod simulation;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use file_store::FileStore;
use simulation::SimulationPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored human-readable summary
    Console,
    /// Machine-readable JSON
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "cozy-sim", version)]
#[command(about = "Simulate Cozy Block missions against a persistent profile")]
struct Args {
    /// JSON file holding the profile (defaults to one in the temp dir)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Number of missions to run
    #[arg(long, default_value_t = 10)]
    missions: u32,

    /// Length of each mission in minutes
    #[arg(long, default_value_t = 15.0)]
    minutes: f64,

    /// Seed for the outfit drop rolls
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Strategy to select before the run (safe, spicy, degen)
    #[arg(long)]
    strategy: Option<String>,

    /// Closet outfits to buy after the run (comma-separated)
    #[arg(long)]
    buy: Option<String>,

    /// Wipe the profile before running
    #[arg(long)]
    fresh: bool,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn plan(&self) -> SimulationPlan {
        SimulationPlan {
            missions: self.missions,
            minutes: self.minutes,
            seed: self.seed,
            strategy: self.strategy.clone(),
            purchases: self.buy.as_deref().map(split_csv).unwrap_or_default(),
            fresh: self.fresh,
        }
    }

    fn store_path(&self) -> PathBuf {
        self.store
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("cozy-sim-profile.json"))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.report == ReportFormat::Console {
        announce_banner();
    }

    let store_path = args.store_path();
    let store = FileStore::open(&store_path)
        .with_context(|| format!("failed to open store {}", store_path.display()))?;
    log::info!("using profile {}", store.path().display());

    let report = simulation::run(store, &args.plan())?;

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Console => report::write_console(&mut output_target, &report)?,
        ReportFormat::Json => report::write_json(&mut output_target, &report)?,
    }
    output_target.flush_inner()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn announce_banner() {
    println!("{}", "🌸 Cozy Block Simulator".bright_magenta().bold());
    println!("{}", "=======================".magenta());
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        self.writer().flush()
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let args = Args::try_parse_from(["cozy-sim"]).unwrap();
        assert_eq!(args.missions, 10);
        assert!((args.minutes - 15.0).abs() < f64::EPSILON);
        assert_eq!(args.seed, 1337);
        assert_eq!(args.report, ReportFormat::Console);
        assert!(args.plan().purchases.is_empty());
        assert!(args.store_path().ends_with("cozy-sim-profile.json"));
    }

    #[test]
    fn buy_list_is_split_and_trimmed() {
        let args =
            Args::try_parse_from(["cozy-sim", "--buy", "cool_cat, gamer_mode,,", "--fresh"])
                .unwrap();
        let plan = args.plan();
        assert_eq!(plan.purchases, vec!["cool_cat", "gamer_mode"]);
        assert!(plan.fresh);
    }

    #[test]
    fn unknown_report_format_is_rejected() {
        assert!(Args::try_parse_from(["cozy-sim", "--report", "markdown"]).is_err());
    }

    #[test]
    fn output_target_writes_files() {
        let path = std::env::temp_dir().join(format!("cozy-sim-out-{}.txt", std::process::id()));
        let mut target = OutputTarget::new(Some(path.clone())).unwrap();
        writeln!(target, "hello").unwrap();
        target.flush_inner().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        let _ = std::fs::remove_file(path);
    }
}
