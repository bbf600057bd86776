//! cargo-worstcase CLI - Worst-Case Complexity Estimator
//!
//! Analyzes Rust projects and reports the estimated time and space
//! complexity of every file. Features parallel processing for large
//! codebases.
//!
//! Usage:
//!   cargo worstcase [OPTIONS] [PATH]
//!   cargo-worstcase [OPTIONS] [PATH]

use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{Level, debug, info, warn};
use tracing_subscriber::FmtSubscriber;

use cargo_worstcase::{
    CompiledConfig, ComplexityExpr, analyze_project_filtered, generate_check_output,
    generate_json_output, generate_report, generate_summary, load_compiled_config,
    load_compiled_config_file, run_check,
};

/// cargo-worstcase - Estimate the worst-case complexity of your Rust code
#[derive(Parser, Debug)]
#[command(name = "cargo")]
#[command(bin_name = "cargo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Estimate time and space complexity of a Rust project
    Worstcase(Args),
}

#[derive(Parser, Debug)]
struct Args {
    /// Path to the file or directory to analyze
    #[arg(default_value = "./src")]
    path: PathBuf,

    /// Output file for the report (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show summary only (no per-node tables)
    #[arg(short, long)]
    summary: bool,

    /// Machine-readable JSON output
    #[arg(long)]
    json: bool,

    /// Keep coefficients in rendered complexities (O(3n) instead of O(n))
    #[arg(long)]
    keep_coefficients: bool,

    /// Skip #[test] functions and #[cfg(test)] items
    #[arg(long)]
    exclude_tests: bool,

    /// Fail when any file's time complexity exceeds this budget (e.g. "n^2")
    #[arg(long, value_name = "EXPR")]
    max_time: Option<String>,

    /// Config file path (default: search for .worstcase.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show timing information
    #[arg(long)]
    timing: bool,

    /// Number of threads for parallel processing (default: all CPU cores)
    #[arg(long, short = 'j', value_name = "N")]
    jobs: Option<usize>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Commands::Worstcase(args) = cli.command;

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Detect available CPU cores
    let available_cores = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);

    // Configure thread pool
    let num_threads = args.jobs.unwrap_or(available_cores);
    if args.jobs.is_some() {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .unwrap_or_else(|e| warn!("could not set thread count: {}", e));
    }
    debug!(
        threads = num_threads,
        cores = available_cores,
        "configured thread pool"
    );

    let total_start = Instant::now();

    // Load configuration file; an explicit --config must exist and parse
    let mut config = match &args.config {
        Some(path) => load_compiled_config_file(path)?,
        None => match load_compiled_config(&args.path) {
            Ok(config) => config,
            Err(e) => {
                warn!("no config file loaded: {}", e);
                CompiledConfig::empty()
            }
        },
    };

    // CLI args override config, which overrides defaults
    if args.keep_coefficients {
        config.options.clean = false;
    }
    if args.exclude_tests {
        config.options.exclude_tests = true;
    }
    if let Some(text) = &args.max_time {
        config.max_time = Some(text.parse::<ComplexityExpr>()?);
    }

    eprintln!("Analyzing project at '{}'...", args.path.display());

    let analyzer = config.analyzer();
    let analysis_start = Instant::now();
    let project = analyze_project_filtered(&args.path, &analyzer, |path| {
        !config.should_exclude_path(path)
    })?;
    let analysis_time = analysis_start.elapsed();
    info!(
        files = project.files.len(),
        skipped = project.failures.len(),
        "analysis complete"
    );

    if args.timing {
        eprintln!(
            "Analysis complete: {} files, {} skipped (took {:.2?})\n",
            project.files.len(),
            project.failures.len(),
            analysis_time
        );
    } else {
        eprintln!(
            "Analysis complete: {} files, {} skipped\n",
            project.files.len(),
            project.failures.len()
        );
    }

    // Generate output
    let output: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path)?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(stdout()),
    };

    let mut writer = output;

    let mut exit_code = 0;
    if args.json {
        let check = config
            .max_time
            .as_ref()
            .map(|max_time| run_check(&project, max_time));
        generate_json_output(&project, check.as_ref(), &mut writer)?;
        if check.is_some_and(|check| !check.passed) {
            exit_code = 1;
        }
    } else {
        if args.summary {
            generate_summary(&project, &mut writer)?;
        } else {
            generate_report(&project, &mut writer)?;
        }

        if let Some(max_time) = &config.max_time {
            writeln!(writer)?;
            exit_code = generate_check_output(&project, max_time, &mut writer)?;
        }
    }
    writer.flush()?;

    // Notify about output file
    if let Some(path) = &args.output {
        eprintln!("Report written to: {}", path.display());
    }

    // Show total timing
    if args.timing {
        let total_time = total_start.elapsed();
        let files_per_sec = project.total_files() as f64 / total_time.as_secs_f64();
        eprintln!(
            "Total time: {:.2?} ({:.1} files/sec)",
            total_time, files_per_sec
        );
    }

    if exit_code != 0 {
        process::exit(exit_code);
    }

    Ok(())
}
