pub mod common;
pub mod pi;
pub mod vi;

pub use pi::PolicyIteration;
pub use vi::ValueIteration;

use gridworld::{ui::SweepObserver, *};
use serde::Serialize;
use std::io;
use tracing::{info, warn};

/// Largest per-cell value change treated as no change.
pub const DEFAULT_THETA: Continous = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SolverState {
    Running,
    Converged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum StopReason {
    Converged,
    IterationCap,
}

/// Dynamic programming over a fully known grid world - Sutton & Barto 2018.
///
/// Solvers mutate the grid's values and directions in place, one `step` at a
/// time. Hosts that want to show intermediate state drive `step` themselves
/// (see [`exec_observed`]); `exec` runs to the end.
pub trait MdpSolver {
    fn name(&self) -> &'static str;

    /// Forget progress from a previous run. `num_iterations` also bounds any
    /// inner fixed point the solver runs.
    fn restart(&mut self, num_iterations: Option<usize>);

    fn step(&mut self, grid: &mut GridWorld) -> SolverState;

    /// Steps that changed the grid since the last restart.
    fn iterations(&self) -> usize;

    /// Whether the last step was cut short by an inner cap.
    fn capped(&self) -> bool {
        false
    }

    fn exec(&mut self, grid: &mut GridWorld, num_iterations: Option<usize>) -> (StopReason, usize) {
        self.restart(num_iterations);
        loop {
            let state = self.step(grid);
            if let Some(stop) = self.stop_reason(state, num_iterations) {
                return (stop, self.iterations());
            }
        }
    }

    fn stop_reason(&self, state: SolverState, num_iterations: Option<usize>) -> Option<StopReason> {
        let iterations = self.iterations();
        if state == SolverState::Converged && !self.capped() {
            info!(solver = self.name(), iterations, "converged");
            Some(StopReason::Converged)
        } else if self.capped() || num_iterations.is_some_and(|n| iterations >= n) {
            warn!(solver = self.name(), iterations, "stopped by iteration cap");
            Some(StopReason::IterationCap)
        } else {
            None
        }
    }
}

/// Like [`MdpSolver::exec`], handing the grid to `observer` before the first
/// step and after every step.
pub fn exec_observed(
    solver: &mut dyn MdpSolver,
    grid: &mut GridWorld,
    num_iterations: Option<usize>,
    observer: &mut dyn SweepObserver,
) -> io::Result<(StopReason, usize)> {
    solver.restart(num_iterations);
    observer.on_sweep(grid, 0)?;
    loop {
        let state = solver.step(grid);
        observer.on_sweep(grid, solver.iterations())?;
        if let Some(stop) = solver.stop_reason(state, num_iterations) {
            return Ok((stop, solver.iterations()));
        }
    }
}

/// Value iteration to convergence with the default tolerance.
pub fn run_value_iteration(grid: &mut GridWorld, params: MdpParams) -> Result<usize> {
    let (_, iterations) = ValueIteration::new(params)?.exec(grid, None);
    Ok(iterations)
}

/// Policy iteration to a stable policy with the default tolerance.
pub fn run_policy_iteration(grid: &mut GridWorld, params: MdpParams) -> Result<usize> {
    let (_, iterations) = PolicyIteration::new(params)?.exec(grid, None);
    Ok(iterations)
}
