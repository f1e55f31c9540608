//! locklab CLI: lock-contention and deadlock demonstration harness.

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use std::fmt::Display;
use std::time::Duration;

use locklab::bench::{BenchConfig, RaceBenchmark};
use locklab::cli::{exit_code_for, ExitCode};
use locklab::error::ScenarioError;
use locklab::scenario::{reentrant_demo, DeadlockConfig, DeadlockScenario};

#[derive(Parser, Debug)]
#[command(name = "locklab", version, about = "Lock-contention and deadlock demonstrations")]
struct Cli {
    /// Emit the report as pretty-printed JSON instead of text
    #[arg(long = "json", global = true, action = ArgAction::SetTrue)]
    json: bool,

    /// Suppress per-event debug logging
    #[arg(short = 'q', long = "quiet", global = true, action = ArgAction::SetTrue)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare unsynchronized vs mutex-guarded counter increments
    Benchmark(BenchmarkArgs),

    /// Crossed lock order with unbounded waits; hangs forever by design
    Deadlock(DeadlockArgs),

    /// Crossed lock order where one worker times out and recovers
    DeadlockTimeout(DeadlockArgs),

    /// Recursive acquisition over a reentrant lock
    ReentrantDemo(ReentrantDemoArgs),
}

#[derive(Args, Debug)]
struct BenchmarkArgs {
    /// Increments performed by each worker per trial
    #[arg(long = "iterations", default_value_t = 100_000)]
    iterations: u64,

    /// Number of concurrent workers
    #[arg(long = "workers", default_value_t = 2)]
    workers: usize,

    /// Trials per mode; elapsed times are averaged
    #[arg(long = "trials", default_value_t = 10)]
    trials: usize,
}

#[derive(Args, Debug)]
struct DeadlockArgs {
    /// How long each worker holds its first lock before going for the second
    #[arg(long = "hold-ms", default_value_t = 100)]
    hold_ms: u64,

    /// Second-lock acquisition timeout (deadlock-timeout only)
    #[arg(long = "timeout-ms", default_value_t = 2_000)]
    timeout_ms: u64,
}

#[derive(Args, Debug)]
struct ReentrantDemoArgs {
    /// Recursion depth to traverse
    #[arg(long = "depth", default_value_t = 3)]
    depth: u32,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            tracing::error!(error = %err, "scenario failed");
            std::process::exit(exit_code_for(&err));
        }
    }
}

fn init_logging(quiet: bool) {
    let level = if quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::DEBUG
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_thread_names(true)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<i32, ScenarioError> {
    match &cli.command {
        Command::Benchmark(args) => {
            let config = BenchConfig {
                iterations: args.iterations,
                workers: args.workers,
                trials: args.trials,
            };
            let report = RaceBenchmark::new(config).run()?;
            Ok(emit(&report, cli.json))
        }
        Command::Deadlock(args) => {
            let scenario = DeadlockScenario::new(deadlock_config(args));
            tracing::warn!("this mode deadlocks by design; interrupt to stop");
            // Reached only if the deadlock fails to manifest.
            let report = scenario.run_plain()?;
            Ok(emit(&report, cli.json))
        }
        Command::DeadlockTimeout(args) => {
            let scenario = DeadlockScenario::new(deadlock_config(args));
            let report = scenario.run_with_timeout()?;
            Ok(emit(&report, cli.json))
        }
        Command::ReentrantDemo(args) => {
            let report = reentrant_demo::run(args.depth)?;
            Ok(emit(&report, cli.json))
        }
    }
}

fn deadlock_config(args: &DeadlockArgs) -> DeadlockConfig {
    DeadlockConfig {
        hold_delay: Duration::from_millis(args.hold_ms),
        second_timeout: Duration::from_millis(args.timeout_ms),
    }
}

/// Prints the report and returns the exit code for the run. A report
/// that cannot be serialized produces no output and must not exit 0.
fn emit<R: Serialize + Display>(report: &R, json: bool) -> i32 {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(pretty) => println!("{pretty}"),
            Err(err) => {
                tracing::error!(error = %err, "report serialization failed");
                return ExitCode::RUNTIME_ERROR;
            }
        }
    } else {
        println!("{report}");
    }
    ExitCode::SUCCESS
}
