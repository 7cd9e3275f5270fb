//! Equihash solver CLI
//!
//! # Commands
//!
//! - `solve` - Find every solution for a block header
//! - `verify` - Check one index list against a block header

use anyhow::Context;
use clap::{Parser, Subcommand};
use equihash::{
    EquihashBuilder, Header, RoundObserver, RoundReport, RuntimeOption, SolutionSet,
    DEFAULT_DEPTH, DEFAULT_K, DEFAULT_N,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Sample block header with a zero nonce tail
const DEFAULT_HEADER: &str = concat!(
    "04000000e54c27544050668f272ec3b460e1cde745c6b21239a81dae637fde47040000",
    "00844bc0c55696ef9920eeda11c1eb41b0c2e7324b46cc2e7aa0c2aa7736448d7a0000",
    "00000000000000000000000000000000000000000000000000000000000068241a587e",
    "7e061d250e000000000000010000000000000000000000000000000000000000000000",
);

#[derive(Parser)]
#[command(name = "equihash-cli")]
#[command(version)]
#[command(about = "Bucketized Equihash solver for Zcash style block headers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Block header as 280 hex digits, last 12 bytes zero
    #[arg(long, global = true, default_value = DEFAULT_HEADER)]
    header: String,

    /// Bit string width
    #[arg(short, global = true, default_value_t = DEFAULT_N)]
    n: u32,

    /// Number of collision rounds
    #[arg(short, global = true, default_value_t = DEFAULT_K)]
    k: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for solutions
    Solve {
        /// Entry slots per bucket
        #[arg(long, default_value_t = DEFAULT_DEPTH)]
        depth: usize,

        /// Execution runtime: sequential or parallel
        #[arg(long, default_value_t = RuntimeOption::Parallel)]
        runtime: RuntimeOption,

        /// Worker threads for the parallel runtime (default: one per CPU)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify one solution
    Verify {
        /// Comma separated solution indices, in tree order
        #[arg(long, value_delimiter = ',', required = true)]
        indices: Vec<u32>,
    },
}

/// Logs each phase as it finishes
struct LogObserver;

impl RoundObserver for LogObserver {
    fn phase_end(&self, report: &RoundReport) {
        info!(
            phase = %report.phase,
            entries = report.entries,
            overflow = report.overflow,
            elapsed = ?report.elapsed,
            "phase finished"
        );
        if let Some((min, max)) = report.occupancy_range() {
            debug!(
                phase = %report.phase,
                min,
                max,
                histogram = ?report.occupancy,
                "bucket occupancy"
            );
        }
    }
}

/// JSON form of a solver run
#[derive(Serialize)]
struct SolveOutput<'a> {
    n: u32,
    k: u32,
    header: String,
    overflow: u64,
    complete: bool,
    solutions: Vec<&'a [u32]>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let header = Header::decode(&cli.header).context("invalid --header")?;

    match cli.command {
        Commands::Solve {
            depth,
            runtime,
            threads,
            json,
        } => cmd_solve(&header, cli.n, cli.k, depth, runtime, threads, json),
        Commands::Verify { indices } => cmd_verify(&header, cli.n, cli.k, &indices),
    }
}

fn cmd_solve(
    header: &Header,
    n: u32,
    k: u32,
    depth: usize,
    runtime: RuntimeOption,
    threads: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let mut builder = EquihashBuilder::new();
    builder
        .params(n, k)
        .depth(depth)
        .runtime(runtime)
        .observer(Arc::new(LogObserver));
    if let Some(threads) = threads {
        builder.threads(threads);
    }
    let solver = builder.build()?;

    info!(n, k, depth, %runtime, "solving");
    let result = solver.solve(header)?;
    if !result.is_complete() {
        info!(
            overflow = result.overflow(),
            "buckets overflowed, some solutions may be missing"
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&solve_output(header, n, k, &result))?);
    } else {
        for solution in &result {
            let indices: Vec<String> = solution.indices().iter().map(u32::to_string).collect();
            println!("{}", indices.join(","));
        }
    }
    info!(solutions = result.len(), "done");
    Ok(())
}

fn solve_output<'a>(header: &Header, n: u32, k: u32, result: &'a SolutionSet) -> SolveOutput<'a> {
    SolveOutput {
        n,
        k,
        header: header.encode(),
        overflow: result.overflow(),
        complete: result.is_complete(),
        solutions: result.iter().map(|solution| solution.indices()).collect(),
    }
}

fn cmd_verify(header: &Header, n: u32, k: u32, indices: &[u32]) -> anyhow::Result<()> {
    let solver = EquihashBuilder::new()
        .params(n, k)
        .runtime(RuntimeOption::Sequential)
        .build()?;
    solver
        .verify(header, indices)
        .context("solution rejected")?;
    println!("valid");
    Ok(())
}
