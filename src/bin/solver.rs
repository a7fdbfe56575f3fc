//! Command-line entry point for the CostSolver (§6, §10.1, §10.3).

use clap::{CommandFactory, Parser};
use pimprof_solver::ids::CostConfig;
use pimprof_solver::solver::{self, Mode, SolverInputs};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "solver",
    about = "PIMProf CostSolver: decides CPU vs PIM per basic block from profiled stats",
    version
)]
struct Cli {
    /// Solver mode: mpki, reuse, debug, or para (reserved, rejected at runtime).
    mode: Mode,

    /// CPU-side stats file.
    #[arg(short = 'c', long = "cpu")]
    cpu: Option<PathBuf>,

    /// PIM-side stats file.
    #[arg(short = 'p', long = "pim")]
    pim: Option<PathBuf>,

    /// Combined reuse-segment + switch-count file (required for reuse/debug).
    #[arg(short = 'r', long = "reuse")]
    reuse: Option<PathBuf>,

    /// Report output file.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// CTS decision file (reuse mode only, for report comparison).
    #[arg(short = 't', long = "cts")]
    cts: Option<PathBuf>,

    /// SCA decision file (reuse mode only, for report comparison).
    #[arg(short = 's', long = "sca")]
    sca: Option<PathBuf>,

    /// Overrides `data_move_threshold` used by cache-line-traffic coalescing.
    #[arg(short = 'd', long = "data")]
    data: Option<f64>,

    /// Also dump the final decision and cost breakdown as JSON.
    #[arg(long = "json")]
    json: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Missing required arguments print usage and exit 0, matching the
/// reference tool's behavior rather than clap's native `required = true`
/// (which would exit 2).
fn usage_and_exit() -> ! {
    let _ = Cli::command().print_help();
    println!();
    std::process::exit(0);
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if cli.mode == Mode::Para {
        eprintln!("Error: mode 'para' is reserved but not implemented");
        std::process::exit(1);
    }

    let Some(cpu) = cli.cpu.clone() else { usage_and_exit() };
    let Some(pim) = cli.pim.clone() else { usage_and_exit() };
    let Some(output) = cli.output.clone() else { usage_and_exit() };
    if matches!(cli.mode, Mode::Reuse | Mode::Debug) && cli.reuse.is_none() {
        usage_and_exit();
    }

    let mut cfg = CostConfig::default();
    if let Some(d) = cli.data {
        cfg.data_move_threshold = d;
    }

    let inputs = SolverInputs {
        mode: cli.mode,
        cpu_path: cpu.display().to_string(),
        pim_path: pim.display().to_string(),
        reuse_path: cli.reuse.as_ref().map(|p| p.display().to_string()),
        cts_path: cli.cts.as_ref().map(|p| p.display().to_string()),
        sca_path: cli.sca.as_ref().map(|p| p.display().to_string()),
        cfg,
    };

    let report = match solver::run(&inputs) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let text = report.render();
    if let Err(e) = std::fs::write(&output, &text) {
        eprintln!("Error: cannot write '{}': {e}", output.display());
        std::process::exit(1);
    }

    if let Some(json_path) = &cli.json {
        if let Err(e) = solver::write_json(&report, json_path) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
