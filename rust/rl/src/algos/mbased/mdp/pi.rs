use super::{common::*, MdpSolver, SolverState, StopReason, DEFAULT_THETA};
use gridworld::*;
use tracing::debug;

/// Policy iteration: evaluate the stored policy to a fixed point, then act
/// greedily on the result, until the greedy policy stops changing.
#[derive(Clone, Debug)]
pub struct PolicyIteration {
    params: MdpParams,
    theta: Continous,
    state: SolverState,
    iterations: usize,
    max_evaluation_sweeps: Option<usize>,
    last_evaluation: (StopReason, usize),
}

impl PolicyIteration {
    pub fn new(params: MdpParams) -> Result<Self> {
        params.validate()?;

        Ok(Self {
            params,
            theta: DEFAULT_THETA,
            state: SolverState::Running,
            iterations: 0,
            max_evaluation_sweeps: None,
            last_evaluation: (StopReason::Converged, 0),
        })
    }

    pub fn with_theta(mut self, theta: Continous) -> Self {
        self.theta = theta;
        self
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Stop reason and sweep count of the most recent evaluation phase.
    pub fn last_evaluation(&self) -> (StopReason, usize) {
        self.last_evaluation
    }

    /// Sweeps `V(s) <- Q(s, pi(s))` until no value moves by `theta`, or until
    /// `max_sweeps` sweeps have changed something.
    pub fn evaluate(&self, grid: &mut GridWorld, max_sweeps: Option<usize>) -> (StopReason, usize) {
        let mut sweeps = 0;
        loop {
            let updates = compute(grid, |g, c| {
                (g.apply_policy_action(c, c.direction(), &self.params), None)
            });
            if !commit(grid, &updates, self.theta) {
                return (StopReason::Converged, sweeps);
            }

            sweeps += 1;
            if max_sweeps.is_some_and(|n| sweeps >= n) {
                return (StopReason::IterationCap, sweeps);
            }
        }
    }

    /// Greedy one-step lookahead on the current values. Returns whether any
    /// non-terminal cell changed its action.
    pub fn improve(&self, grid: &mut GridWorld) -> bool {
        let greedy = grid
            .cells()
            .filter(|c| !c.is_wall())
            .map(|c| (c.position(), grid.best_action(c, &self.params).1))
            .collect::<Vec<_>>();

        let mut changed = false;
        for (p, direction) in greedy {
            let Some(cell) = grid.get_mut(p) else {
                continue;
            };
            if !cell.is_terminal() && cell.direction() != direction {
                changed = true;
            }
            cell.set_direction(direction);
        }

        changed
    }
}

impl MdpSolver for PolicyIteration {
    fn name(&self) -> &'static str {
        "policy-iteration"
    }

    fn restart(&mut self, num_iterations: Option<usize>) {
        self.state = SolverState::Running;
        self.iterations = 0;
        self.max_evaluation_sweeps = num_iterations;
        self.last_evaluation = (StopReason::Converged, 0);
    }

    fn step(&mut self, grid: &mut GridWorld) -> SolverState {
        if self.state == SolverState::Converged {
            return self.state;
        }

        self.last_evaluation = self.evaluate(grid, self.max_evaluation_sweeps);
        let changed = self.improve(grid);
        debug!(
            iteration = self.iterations,
            evaluation_sweeps = self.last_evaluation.1,
            changed,
            "policy iteration cycle"
        );
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

    fn capped(&self) -> bool {
        self.last_evaluation.0 == StopReason::IterationCap
    }
}
