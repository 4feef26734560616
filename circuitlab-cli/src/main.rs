//! CircuitLab CLI - score, inspect and save virtual lab circuits from the command line.

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use circuitlab::{
    Inspection, LabConfig, LabCore, LabDocument, ScoreReport, ScoringEngine, SqliteBackend,
    StepProgress,
};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "circuitlab")]
#[command(about = "Virtual electronics lab scoring and persistence tool", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file (editor defaults, pass threshold)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace); also shows check details
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a student's circuit against the reference circuit
    Score {
        /// Instructor's lab document
        #[arg(short, long, value_name = "FILE")]
        reference: PathBuf,

        /// Student's lab document
        #[arg(short, long, value_name = "FILE")]
        candidate: PathBuf,

        /// Steps the student has marked complete
        #[arg(long, default_value_t = 0)]
        completed: usize,

        /// Total steps (defaults to the reference's step count)
        #[arg(long)]
        total: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if the score is below this value
        #[arg(long, value_name = "SCORE")]
        fail_under: Option<u8>,
    },

    /// Show structural statistics for a lab document
    Inspect {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Save a lab document to SQLite and write back permanent identities
    Save {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// SQLite database path (created if missing)
        #[arg(long, value_name = "PATH")]
        db: PathBuf,

        /// Where to write the reconciled document (stdout if omitted)
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// List scoring checks
    Checks,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    let exit_code = match cli.command {
        Commands::Score {
            reference,
            candidate,
            completed,
            total,
            format,
            fail_under,
        } => {
            let threshold = fail_under.unwrap_or(config.scoring.pass_threshold);
            handle_score(&reference, &candidate, completed, total, format, threshold)
        }
        Commands::Inspect { file, format } => handle_inspect(&file, format),
        Commands::Save { file, db, out } => handle_save(&file, &db, out.as_deref()),
        Commands::Checks => {
            handle_checks(cli.verbose > 0);
            0
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<LabConfig> {
    match path {
        Some(path) => LabConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(LabConfig::default()),
    }
}

fn report_error(e: anyhow::Error) -> i32 {
    eprintln!("Error: {:#}", e);
    1
}

fn handle_score(
    reference: &Path,
    candidate: &Path,
    completed: usize,
    total: Option<usize>,
    format: OutputFormat,
    threshold: u8,
) -> i32 {
    let result = (|| -> anyhow::Result<ScoreReport> {
        let reference = LabDocument::from_path(reference)
            .with_context(|| format!("failed to read {}", reference.display()))?;
        let candidate = LabDocument::from_path(candidate)
            .with_context(|| format!("failed to read {}", candidate.display()))?;
        let total = total.unwrap_or(reference.steps.len());
        let progress = StepProgress::new(completed, total);
        Ok(LabCore::score_documents(&reference, &candidate, progress))
    })();

    let report = match result {
        Ok(report) => report,
        Err(e) => return report_error(e),
    };

    let printed = match format {
        OutputFormat::Human => {
            output_score_human(&report, threshold);
            Ok(())
        }
        OutputFormat::Json => output_json(&report),
    };
    if let Err(e) = printed {
        return report_error(e);
    }

    if report.score < threshold {
        1
    } else {
        0
    }
}

fn output_score_human(report: &ScoreReport, threshold: u8) {
    println!("\nScore: {}/100", report.score);
    println!("{}", "─".repeat(60));

    if !report.feedback.is_empty() {
        println!("\n  PASSED:");
        for line in &report.feedback {
            println!("    {}", line);
        }
    }
    if !report.errors.is_empty() {
        println!("\n  TO FIX:");
        for line in &report.errors {
            println!("    {}", line);
        }
    }

    println!("\n  Summary:");
    println!(
        "    Checks passed: {}/{}",
        report.passed_checks(),
        report.total_checks()
    );
    println!("    Threshold:     {}", threshold);
    println!(
        "    Result:        {}",
        if report.score >= threshold { "PASS" } else { "FAIL" }
    );
}

fn output_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_inspect(file: &Path, format: OutputFormat) -> i32 {
    let document = match LabDocument::from_path(file)
        .with_context(|| format!("failed to read {}", file.display()))
    {
        Ok(document) => document,
        Err(e) => return report_error(e),
    };
    let inspection = LabCore::inspect(&document);

    match format {
        OutputFormat::Human => {
            output_inspect_human(file, &inspection);
            0
        }
        OutputFormat::Json => match output_json(&inspection) {
            Ok(()) => 0,
            Err(e) => report_error(e),
        },
    }
}

fn output_inspect_human(file: &Path, inspection: &Inspection) {
    let stats = &inspection.stats;
    println!("\nLab: {} ({})", inspection.lab_id, file.display());
    println!("{}", "─".repeat(60));
    println!("  Placements:       {}", stats.placement_count);
    println!("  Unsaved:          {}", inspection.local_placements);
    println!("  Connections:      {}", stats.connection_count);
    println!("  Connected groups: {}", stats.connected_groups);
    println!("  Steps:            {}", inspection.steps);

    if !inspection.isolated.is_empty() {
        println!("\n  Unwired placements:");
        for id in &inspection.isolated {
            println!("    - {}", id);
        }
    }
    if !inspection.unresolved.is_empty() {
        println!("\n  Unresolved connections:");
        for id in &inspection.unresolved {
            println!("    - {}", id);
        }
    }
}

fn handle_save(file: &Path, db: &Path, out: Option<&Path>) -> i32 {
    let result = (|| -> anyhow::Result<LabDocument> {
        let document = LabDocument::from_path(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let backend = SqliteBackend::open(db)
            .with_context(|| format!("failed to open database {}", db.display()))?;

        let runtime = tokio::runtime::Runtime::new()?;
        let saved = runtime.block_on(LabCore::save_document(&document, Arc::new(backend)))?;
        tracing::info!("Saved lab {} to {}", saved.lab_id, db.display());
        Ok(saved)
    })();

    let saved = match result {
        Ok(saved) => saved,
        Err(e) => return report_error(e),
    };

    let written = match out {
        Some(path) => saved
            .write_to(path)
            .with_context(|| format!("failed to write {}", path.display()))
            .map(|()| eprintln!("Wrote {}", path.display())),
        None => output_json(&saved),
    };
    match written {
        Ok(()) => 0,
        Err(e) => report_error(e),
    }
}

fn handle_checks(verbose: bool) {
    println!("Scoring checks (one point each):\n");

    let engine = ScoringEngine::with_default_checks();
    for check in engine.checks() {
        println!("  {}", check.id());
        println!("    {}", check.name());
        if verbose {
            println!("    {}", check.description());
        }
        println!();
    }
}
