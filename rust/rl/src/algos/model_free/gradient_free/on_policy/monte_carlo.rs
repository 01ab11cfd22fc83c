use super::super::super::pick_next;
use gridworld::common::defs::{Policy, StoredPolicy};
use gridworld::*;
use rand::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

pub const DEFAULT_MAX_STEPS: usize = 1000;
pub const DEFAULT_ROLLOUTS_PER_STATE: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RolloutEnd {
    /// Reached an absorbing cell.
    Terminal,
    /// Used up `max_steps` moves.
    StepCap,
    /// No outcome of the chosen action leaves the cell.
    Stuck,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rollout {
    pub ret: Continous,
    pub steps: usize,
    pub end: RolloutEnd,
    pub last: Position,
}

/// Empirical returns under a fixed policy, used to sanity-check solved values.
///
/// A rollout accumulates the flat per-step reward for every move that changes
/// cell. A move that bumps into a wall or the boundary is redrawn without
/// consuming a step or a reward, unlike a real environment step. On reaching
/// a terminal its fixed value is added; otherwise the final cell's value is
/// added discounted by the number of moves taken.
#[derive(Clone, Debug)]
pub struct MonteCarloEvaluator {
    params: MdpParams,
    max_steps: usize,
    rollouts_per_state: usize,
}

impl MonteCarloEvaluator {
    pub fn new(params: MdpParams) -> Result<Self> {
        params.validate()?;

        Ok(Self {
            params,
            max_steps: DEFAULT_MAX_STEPS,
            rollouts_per_state: DEFAULT_ROLLOUTS_PER_STATE,
        })
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_rollouts_per_state(mut self, rollouts_per_state: usize) -> Result<Self> {
        if rollouts_per_state == 0 {
            return Err(GridError::InvalidParameter(
                "rollouts per state must be > 0".to_string(),
            ));
        }
        self.rollouts_per_state = rollouts_per_state;
        Ok(self)
    }

    /// One rollout from `start` following the grid's stored policy.
    pub fn evaluate<R: Rng>(&self, grid: &GridWorld, start: &Cell, rng: &mut R) -> Continous {
        self.rollout(grid, &StoredPolicy, start, rng).ret
    }

    pub fn rollout<'g, P, R>(
        &self,
        grid: &'g GridWorld,
        policy: &P,
        start: &'g Cell,
        rng: &mut R,
    ) -> Rollout
    where
        P: Policy + ?Sized,
        R: Rng,
    {
        let mut current = start;
        let mut ret = 0.;
        let mut steps = 0;

        let end = loop {
            if current.is_terminal() {
                break RolloutEnd::Terminal;
            }
            if steps >= self.max_steps {
                break RolloutEnd::StepCap;
            }

            let outcomes =
                grid.transition_outcomes(current, policy.policy(current), self.params.noise);
            let can_move = outcomes
                .iter()
                .any(|t| t.probability > 0. && t.landing.position() != current.position());
            if !can_move {
                break RolloutEnd::Stuck;
            }

            let next = loop {
                let landing: Option<&Cell> = pick_next(rng, &outcomes);
                match landing {
                    Some(c) if c.position() == current.position() => continue,
                    other => break other,
                }
            };
            let Some(next) = next else {
                break RolloutEnd::Stuck;
            };

            ret += self.params.reward;
            steps += 1;
            current = next;
        };

        ret += match current.kind().terminal_value() {
            Some(v) => v,
            None => current.value() * tail_discount(self.params.discount, steps),
        };
        trace!(start = %start.position(), steps, ?end, ret, "rollout");

        Rollout {
            ret,
            steps,
            end,
            last: current.position(),
        }
    }

    /// Mean return over `rollouts_per_state` rollouts from every non-wall,
    /// non-terminal cell.
    pub fn evaluate_all<R: Rng>(&self, grid: &GridWorld, rng: &mut R) -> BTreeMap<Position, Continous> {
        let estimates = grid
            .cells()
            .filter(|c| c.kind() == CellKind::Empty)
            .map(|c| {
                let total: Continous = (0..self.rollouts_per_state)
                    .map(|_| self.evaluate(grid, c, rng))
                    .sum();
                (c.position(), total / self.rollouts_per_state as Continous)
            })
            .collect::<BTreeMap<_, _>>();
        debug!(
            states = estimates.len(),
            rollouts_per_state = self.rollouts_per_state,
            "monte carlo evaluation"
        );

        estimates
    }
}

/// `discount^steps`, saturating the exponent at `i32::MAX`.
fn tail_discount(discount: Continous, steps: usize) -> Continous {
    discount.powi(i32::try_from(steps).unwrap_or(i32::MAX))
}

/// Largest absolute gap between an estimate and the grid's current value.
pub fn max_deviation(grid: &GridWorld, estimates: &BTreeMap<Position, Continous>) -> Continous {
    estimates
        .iter()
        .filter_map(|(p, e)| grid.get(*p).map(|c| (c.value() - e).abs()))
        .fold(0., Continous::max)
}
