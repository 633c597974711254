use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use ts_cli::report::fifo_verdict;
use ts_cli::{init_tracing, Status};
use ts_offload::config::DEFAULT_BATCH;
use ts_offload::{
    fifo_design, FifoValidator, OffloadConfig, OffloadError, PatternEngine, ValidatorConfig,
};
use ts_stream::ANY_DEVICE;

/// Drain a synthetic marker stream through the batch queue and check every
/// record arrives in order.
#[derive(Parser, Debug)]
#[command(name = "fifo-check")]
struct Cli {
    /// First marker value.
    #[arg(long, default_value_t = 0)]
    base: u64,
    /// Records to drain in total; 64 batches if omitted.
    #[arg(long)]
    words: Option<u64>,
    /// Records per run.
    #[arg(long, default_value_t = DEFAULT_BATCH)]
    batch: usize,
    /// Give up acquiring the config slot after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl Cli {
    fn validator_config(&self, env: &OffloadConfig) -> ValidatorConfig {
        ValidatorConfig {
            base: self.base,
            word_count: self.words.unwrap_or(64 * self.batch as u64),
            batch: self.batch,
            slots: self.batch.max(1),
            timeout: self
                .timeout_ms
                .map(Duration::from_millis)
                .or(env.acquire_timeout),
            ..ValidatorConfig::default()
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_tracing() {
        eprintln!("warning: {}", err);
    }

    match run(&cli) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("error: {}", err);
            Status::from(&err).into()
        }
    }
}

fn run(cli: &Cli) -> Result<Status, OffloadError> {
    let env = OffloadConfig::from_env()?;
    let validator = FifoValidator::new(cli.validator_config(&env))?;
    let mut engine = PatternEngine::load(fifo_design(), ANY_DEVICE)?;

    let report = validator.run_with(&mut engine, |m| println!("{}", m))?;
    println!("{}", fifo_verdict(&report));
    Ok(Status::from_match(report.passed()))
}
