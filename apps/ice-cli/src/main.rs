mod case;

use case::{Case, CliError, CliResult, load_yaml};
use clap::{Parser, Subcommand};
use ice_stream::{DEFAULT_FD_STEP, DifferenceScheme, JacobianDiscrepancy, StressDecomposition};
use ice_stream::{StressBalance, compare_jacobians};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "ice-cli")]
#[command(about = "Ice stream stress balance diagnostics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a case file and build its model
    Validate {
        /// Path to the case YAML file
        case_path: PathBuf,
    },
    /// Print the residual at the case velocity
    Residual {
        /// Path to the case YAML file
        case_path: PathBuf,
    },
    /// Compare analytic and finite-difference Jacobians
    Check {
        /// One or more case YAML files, checked in parallel
        #[arg(required = true)]
        case_paths: Vec<PathBuf>,
        /// Finite difference step
        #[arg(long, default_value_t = DEFAULT_FD_STEP)]
        step: f64,
        /// Maximum accepted relative discrepancy
        #[arg(long, default_value_t = 1e-4)]
        tolerance: f64,
        /// Use forward instead of central differences
        #[arg(long)]
        forward: bool,
    },
    /// Print the unmixed stress terms of a confined case
    Components {
        /// Path to the case YAML file
        case_path: PathBuf,
    },
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Residual { case_path } => cmd_residual(&case_path),
        Commands::Check {
            case_paths,
            step,
            tolerance,
            forward,
        } => {
            let scheme = if forward {
                DifferenceScheme::Forward
            } else {
                DifferenceScheme::Central
            };
            cmd_check(&case_paths, step, tolerance, scheme)
        }
        Commands::Components { case_path } => cmd_components(&case_path),
    }
}

fn cmd_validate(case_path: &Path) -> CliResult<()> {
    println!("Validating case: {}", case_path.display());
    let case = load_yaml(case_path)?;
    let profile = case.profile()?;
    let model = case.model(&profile)?;
    println!(
        "✓ Case '{}' is valid ({} model, {} nodes)",
        case.name,
        case.model.label(),
        model.size()
    );
    Ok(())
}

fn cmd_residual(case_path: &Path) -> CliResult<()> {
    let case = load_yaml(case_path)?;
    let profile = case.profile()?;
    let mut model = case.model(&profile)?;
    let r = model.residual(&case.velocity(), case.scale)?;

    let n = model.size();
    println!("Residual for '{}' (scale = {:.3e}):", case.name, case.scale);
    for (i, value) in r.iter().take(n).enumerate() {
        println!("  node {:>4}: {:>14.6e}", i, value);
    }
    println!("  upstream:  {:>14.6e}", r[n]);
    println!("  calving:   {:>14.6e}", r[n + 1]);
    println!("  norm:      {:>14.6e}", r.norm());
    Ok(())
}

struct CheckOutcome {
    name: String,
    discrepancy: JacobianDiscrepancy,
    elapsed_s: f64,
}

fn check_case(
    case_path: &Path,
    step: f64,
    scheme: DifferenceScheme,
) -> CliResult<CheckOutcome> {
    let start = Instant::now();
    let case = load_yaml(case_path)?;
    let profile = case.profile()?;
    // Each worker owns its model and buffers
    let mut model = case.model(&profile)?;
    let u = case.velocity();

    let analytic = model.jacobian(&u, case.scale)?;
    let numerical = model.numerical_jacobian_with(&u, case.scale, step, scheme)?;
    let discrepancy = compare_jacobians(&analytic, &numerical);

    let elapsed_s = start.elapsed().as_secs_f64();
    info!(case = %case.name, relative = discrepancy.relative, elapsed_s, "case checked");

    Ok(CheckOutcome {
        name: case.name,
        discrepancy,
        elapsed_s,
    })
}

fn cmd_check(
    case_paths: &[PathBuf],
    step: f64,
    tolerance: f64,
    scheme: DifferenceScheme,
) -> CliResult<()> {
    println!(
        "Checking {} case(s) with {:?} differences (step = {:.1e})",
        case_paths.len(),
        scheme,
        step
    );

    let outcomes: Vec<(&PathBuf, CliResult<CheckOutcome>)> = case_paths
        .par_iter()
        .map(|path| (path, check_case(path, step, scheme)))
        .collect();

    let mut failed = 0;
    for (path, outcome) in &outcomes {
        match outcome {
            Ok(o) if o.discrepancy.relative <= tolerance => {
                println!(
                    "✓ {}: relative {:.3e} (abs {:.3e}) in {:.3}s",
                    o.name, o.discrepancy.relative, o.discrepancy.max_abs, o.elapsed_s
                );
            }
            Ok(o) => {
                failed += 1;
                let (row, col) = o.discrepancy.location;
                println!(
                    "✗ {}: relative {:.3e} exceeds {:.1e} at row {}, column {}",
                    o.name, o.discrepancy.relative, tolerance, row, col
                );
            }
            Err(e) => {
                failed += 1;
                println!("✗ {}: {}", path.display(), e);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::CheckFailed {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}

fn cmd_components(case_path: &Path) -> CliResult<()> {
    let case: Case = load_yaml(case_path)?;
    let profile = case.profile()?;
    let model = case.confined_model(&profile)?;
    let parts = model.residual_components(&case.velocity(), case.scale)?;

    println!("Stress components for '{}':", case.name);
    print!("  {:>4}", "node");
    for (name, _) in parts.iter() {
        print!(" {:>14}", name);
    }
    println!();
    for i in 0..model.size() {
        print!("  {:>4}", i);
        for (_, values) in parts.iter() {
            print!(" {:>14.6e}", values[i]);
        }
        println!();
    }
    Ok(())
}
