use std::io::Write;
use std::process::ExitCode;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::{CommandFactory, Parser};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ts_cli::report::{dgemm_summary, format_seconds, offload_timing, verdict};
use ts_cli::{init_tracing, Status};
use ts_offload::{dgemm_design, OffloadConfig, OffloadError, Session, TileEngine};
use ts_stream::ANY_DEVICE;
use ts_tile::{compare_exact, dgemm_reference, Matrix, Transpose};

/// Offload one random DGEMM to the tile engine and check it against the
/// software reference.
#[derive(Parser, Debug)]
#[command(name = "dgemm")]
struct Cli {
    /// Use `size x size` matrices; random dimensions below 5 tiles if omitted.
    size: Option<usize>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            // Help and version text; nothing else to report if stdout is gone.
            err.print().ok();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            println!("{}", Cli::command().render_usage());
            return Status::InvalidArgument.into();
        }
    };
    if let Err(err) = init_tracing() {
        eprintln!("warning: {}", err);
    }

    match run(cli) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("error: {}", err);
            Status::from(&err).into()
        }
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn pick_dims(size: Option<usize>, tile: usize, rng: &mut StdRng) -> (usize, usize, usize) {
    match size {
        Some(s) => (s, s, s),
        None => {
            let bound = 5 * tile;
            (
                rng.gen_range(0..bound),
                rng.gen_range(0..bound),
                rng.gen_range(0..bound),
            )
        }
    }
}

/// Print an unterminated progress label so it shows before the timed step.
fn progress<W: Write>(out: &mut W, what: &str) -> std::io::Result<()> {
    write!(out, "Running {}... ", what)?;
    out.flush()
}

fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Matrix {
    Matrix::from_fn(rows, cols, |_, _| rng.gen_range(0..100) as f64)
}

fn run(cli: Cli) -> Result<Status, OffloadError> {
    let config = OffloadConfig::from_env()?;
    let seed = config.seed.unwrap_or_else(clock_seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let engine = TileEngine::load(dgemm_design(), ANY_DEVICE)?;
    let mut session = Session::open(Box::new(engine))?;
    let (m, n, k) = pick_dims(cli.size, session.tile_size(), &mut rng);
    tracing::debug!(m, n, k, seed, "dgemm problem chosen");

    let grid = session.grid(m, n, k)?;
    let efficiency = session.efficiency(m, n, k)?;
    for line in dgemm_summary(seed, &grid, &efficiency, session.frequency_mhz()) {
        println!("{}", line);
    }

    let a = random_matrix(&mut rng, m, k);
    let b = random_matrix(&mut rng, k, n);
    let mut c_engine = random_matrix(&mut rng, m, n);
    let mut c_reference = c_engine.clone();
    let (alpha, beta) = (1.0, 0.0);

    // A lost progress label must not abort the run; the verdict still prints.
    progress(&mut std::io::stdout(), "HW").ok();
    let report = session.dgemm(
        Transpose::No,
        Transpose::No,
        alpha,
        a.view(),
        b.view(),
        beta,
        &mut c_engine.view_mut(),
    )?;
    println!("{}", offload_timing(&report.timings));

    progress(&mut std::io::stdout(), "SW").ok();
    let started = Instant::now();
    dgemm_reference(
        Transpose::No,
        Transpose::No,
        alpha,
        a.view(),
        b.view(),
        beta,
        &mut c_reference.view_mut(),
    )?;
    println!("took: {} s", format_seconds(started.elapsed()));

    print!("Comparing results... ");
    let matched = compare_exact(c_reference.view(), c_engine.view());
    println!("{}", verdict(matched));
    println!("Done.");
    Ok(Status::from_match(matched))
}
