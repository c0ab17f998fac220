use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use dictattack_cli::{Error, load_credentials, load_wordlist, write_results};
use dictattack_core::{BarReporter, Coordinator, HashAlgorithm, LineReporter, ProgressReporter, RunConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dictattack", version)]
#[command(about = "Recover plaintext passwords from unsalted hashes using a wordlist")]
struct Args {
    /// Credential file with one `username,hashed_password` per line
    credentials: PathBuf,

    /// Wordlist with one candidate password per line
    wordlist: PathBuf,

    /// CSV file for recovered passwords (only written if any are found)
    output: PathBuf,

    /// Number of hashing/matching workers (default: available parallelism)
    #[arg(short = 'j', long, env = "DICTATTACK_WORKERS")]
    workers: Option<usize>,

    /// Digest algorithm the credential hashes were produced with
    #[arg(short, long, value_enum, env = "DICTATTACK_ALGORITHM", default_value_t = HashAlgorithm::Sha256)]
    algorithm: HashAlgorithm,

    /// Show a progress bar instead of checkpoint lines
    #[arg(long)]
    progress_bar: bool,

    /// Progress polling interval in milliseconds
    #[arg(long, default_value = "50")]
    poll_interval_ms: u64,

    /// Records between progress lines
    #[arg(long, default_value = "1000")]
    checkpoint_step: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn run_config(&self) -> RunConfig {
        let defaults = RunConfig::default();
        RunConfig {
            workers: self.workers.unwrap_or(defaults.workers),
            algorithm: self.algorithm,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            checkpoint_step: self.checkpoint_step,
            ..defaults
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<(), Error> {
    // Starts the clock before loading so the total covers the whole run.
    let coordinator = Coordinator::new(args.run_config())?;

    let wordlist = load_wordlist(&args.wordlist)?;
    let credentials = load_credentials(&args.credentials)?;

    let algorithm = coordinator.config().algorithm;
    let unmatchable = credentials.unmatchable(algorithm);
    if unmatchable > 0 {
        warn!(
            "{} credential records do not hold a {}-character {} hex digest and cannot be recovered",
            unmatchable,
            algorithm.hex_len(),
            algorithm
        );
    }

    println!("Starting attack with {} total tasks...", credentials.len());

    let reporter: Box<dyn ProgressReporter> = if args.progress_bar {
        Box::new(BarReporter::new(credentials.len() as u64))
    } else {
        Box::new(LineReporter::stdout())
    };

    let report = coordinator.run(&credentials, wordlist, reporter)?;

    println!();
    println!("Total passwords found: {}", report.passwords_found);
    println!("Total hashes computed: {}", report.hashes_computed);
    println!("Total time spent (milliseconds): {}", report.elapsed.as_millis());
    info!(
        "Resolved {}/{} records against {} distinct digests",
        report.passwords_found, report.records, report.index_size
    );

    if !report.failures.is_empty() {
        println!("Chunk failures: {}", report.failures.len());
        for failure in &report.failures {
            warn!("{}", failure);
        }
    }

    if report.passwords_found > 0 {
        let rows = write_results(&args.output, &credentials)?;
        println!();
        println!("Cracked password details have been written to {}", args.output.display());
        info!("Wrote {} rows", rows);
    } else {
        info!("No passwords recovered; {} not written", args.output.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
