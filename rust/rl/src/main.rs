use anyhow::{Context, Result};
use clap::Parser;
use gridworld::{ui::*, *};
use gridworld_rl::algos::mbased::mdp::{exec_observed, StopReason};
use gridworld_rl::algos::model_free::gradient_free::on_policy::monte_carlo::max_deviation;
use gridworld_rl::config::{AppConfig, Algorithm};
use gridworld_rl::*;
use itertools::Itertools;
use rand::prelude::*;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Solve a stochastic grid world and cross-check the result by simulation.
#[derive(Parser)]
#[command(name = "gridworld-mdp", about = "Solve a stochastic grid world MDP")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "gridworld.toml")]
    config: PathBuf,

    /// Solver to run
    #[arg(long, value_enum)]
    algorithm: Option<Algorithm>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Solve the fixed 4x3 textbook grid instead of a generated one
    #[arg(long)]
    classic: bool,

    /// Redraw the grid after every solver step
    #[arg(long)]
    animate: bool,

    /// Print a JSON report instead of the value table
    #[arg(long)]
    json: bool,

    #[arg(long)]
    discount: Option<f64>,

    #[arg(long)]
    reward: Option<f64>,

    #[arg(long)]
    noise: Option<f64>,

    /// Override Monte Carlo rollouts per state
    #[arg(long)]
    rollouts: Option<usize>,
}

#[derive(Serialize)]
struct Report {
    algorithm: Algorithm,
    stop_reason: StopReason,
    iterations: usize,
    params: MdpParams,
    layout: String,
    values: Vec<CellReport>,
    max_monte_carlo_deviation: Continous,
}

#[derive(Serialize)]
struct CellReport {
    x: Discrete,
    y: Discrete,
    value: Continous,
    direction: Option<Direction>,
    monte_carlo: Option<Continous>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(algorithm) = cli.algorithm {
        config.solver.algorithm = algorithm;
    }
    if let Some(seed) = cli.seed {
        config.scenario.seed = seed;
    }
    if let Some(width) = cli.width {
        config.scenario.width = width;
    }
    if let Some(height) = cli.height {
        config.scenario.height = height;
    }
    if let Some(discount) = cli.discount {
        config.mdp.discount = discount;
    }
    if let Some(reward) = cli.reward {
        config.mdp.reward = reward;
    }
    if let Some(noise) = cli.noise {
        config.mdp.noise = noise;
    }
    if let Some(rollouts) = cli.rollouts {
        config.monte_carlo.rollouts_per_state = rollouts;
    }
    config.validate().context("invalid configuration")?;

    let mut grid = if cli.classic {
        GridWorld::classic()
    } else {
        config.build_grid().context("building scenario")?
    };
    info!(
        width = grid.width(),
        height = grid.height(),
        algorithm = ?config.solver.algorithm,
        "solving grid world"
    );

    let mut solver: Box<dyn MdpSolver> = match config.solver.algorithm {
        Algorithm::Value => {
            Box::new(ValueIteration::new(config.mdp)?.with_theta(config.solver.theta))
        }
        Algorithm::Policy => {
            Box::new(PolicyIteration::new(config.mdp)?.with_theta(config.solver.theta))
        }
    };

    let (stop_reason, iterations) = if cli.animate {
        let display = &mut TextDisplay::new(io::stdout()).with_clear_screen(true);
        exec_observed(
            solver.as_mut(),
            &mut grid,
            config.solver.max_iterations,
            display,
        )?
    } else {
        solver.exec(&mut grid, config.solver.max_iterations)
    };

    let mc = MonteCarloEvaluator::new(config.mdp)?
        .with_max_steps(config.monte_carlo.max_steps)
        .with_rollouts_per_state(config.monte_carlo.rollouts_per_state)?;
    let rng = &mut StdRng::seed_from_u64(config.monte_carlo.seed);
    let estimates = mc.evaluate_all(&grid, rng);
    let deviation = max_deviation(&grid, &estimates);

    if cli.json {
        let report = Report {
            algorithm: config.solver.algorithm,
            stop_reason,
            iterations,
            params: config.mdp,
            layout: render_layout(&grid),
            values: grid
                .cells()
                .filter(|c| !c.is_wall())
                .map(|c| CellReport {
                    x: c.position().x,
                    y: c.position().y,
                    value: c.value(),
                    direction: (c.kind() == CellKind::Empty).then(|| c.direction()),
                    monte_carlo: estimates.get(&c.position()).copied(),
                })
                .collect(),
            max_monte_carlo_deviation: deviation,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render_values(&grid));
        println!();
        println!(
            "{}: {:?} after {} iterations",
            solver.name(),
            stop_reason,
            iterations
        );
        println!(
            "Monte Carlo estimates ({} rollouts per state): {}",
            config.monte_carlo.rollouts_per_state,
            estimates
                .iter()
                .map(|(p, v)| format!("{p}={v:+.3}"))
                .join(", ")
        );
        println!("Largest deviation from solved values: {deviation:.4}");
    }

    Ok(())
}
