use super::{common::*, MdpSolver, SolverState, DEFAULT_THETA};
use gridworld::*;
use tracing::debug;

/// Value iteration with synchronous Bellman optimality backups.
#[derive(Clone, Debug)]
pub struct ValueIteration {
    params: MdpParams,
    theta: Continous,
    state: SolverState,
    iterations: usize,
}

impl ValueIteration {
    pub fn new(params: MdpParams) -> Result<Self> {
        params.validate()?;

        Ok(Self {
            params,
            theta: DEFAULT_THETA,
            state: SolverState::Running,
            iterations: 0,
        })
    }

    pub fn with_theta(mut self, theta: Continous) -> Self {
        self.theta = theta;
        self
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    /// One sweep over the grid. Values move only by at least `theta`; the
    /// greedy direction is always refreshed. Returns whether any value moved.
    pub fn sweep(&self, grid: &mut GridWorld) -> bool {
        let updates = compute(grid, |g, c| {
            let (value, direction) = g.best_action(c, &self.params);
            (value, Some(direction))
        });

        commit(grid, &updates, self.theta)
    }
}

impl MdpSolver for ValueIteration {
    fn name(&self) -> &'static str {
        "value-iteration"
    }

    fn restart(&mut self, _num_iterations: Option<usize>) {
        self.state = SolverState::Running;
        self.iterations = 0;
    }

    fn step(&mut self, grid: &mut GridWorld) -> SolverState {
        if self.state == SolverState::Converged {
            return self.state;
        }

        let changed = self.sweep(grid);
        debug!(iteration = self.iterations, changed, "value iteration sweep");
        if changed {
            self.iterations += 1;
        } else {
            self.state = SolverState::Converged;
        }

        self.state
    }

    fn iterations(&self) -> usize {
        self.iterations
    }
}
