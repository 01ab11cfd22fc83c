extern crate float_eq;
extern crate gridworld;
extern crate gridworld_rl;
mod common;

use common::*;
use float_eq::*;
use gridworld::ui::SweepObserver;
use gridworld::*;
use gridworld_rl::algos::mbased::mdp::{exec_observed, DEFAULT_THETA};
use gridworld_rl::*;
use rand::prelude::*;
use rstest::*;
use std::io;

#[fixture]
fn classic() -> GridWorld {
    GridWorld::classic()
}

#[rstest]
fn value_iteration_on_classic_grid(mut classic: GridWorld) {
    let iterations = run_value_iteration(&mut classic, MdpParams::default()).unwrap();
    assert_eq!(iterations, 16);

    let expected = [
        ((0, 2), 0.644737, Direction::Right),
        ((1, 2), 0.744237, Direction::Right),
        ((2, 2), 0.847671, Direction::Right),
        ((0, 1), 0.566062, Direction::Up),
        ((2, 1), 0.571766, Direction::Up),
        ((0, 0), 0.490373, Direction::Up),
        ((1, 0), 0.430531, Direction::Left),
        ((2, 0), 0.475272, Direction::Up),
        ((3, 0), 0.277127, Direction::Left),
    ];
    for ((x, y), v, d) in expected {
        assert_float_eq!(value(&classic, x, y), v, abs <= 1e-3);
        assert_eq!(direction(&classic, x, y), d, "at ({x}, {y})");
    }
    assert_eq!(value(&classic, 3, 2), 1.);
    assert_eq!(value(&classic, 3, 1), -1.);
    assert_eq!(value(&classic, 1, 1), 0.);
}

#[rstest]
fn policy_iteration_matches_value_iteration_on_classic_grid(classic: GridWorld) {
    let params = MdpParams::default();
    let mut by_value = classic.clone();
    let mut by_policy = classic;

    run_value_iteration(&mut by_value, params).unwrap();
    let iterations = run_policy_iteration(&mut by_policy, params).unwrap();

    assert_eq!(iterations, 2);
    assert_eq!(by_value.policy(), by_policy.policy());
    for ((p, a), (_, b)) in by_value.values().iter().zip(by_policy.values().iter()) {
        assert_float_eq!(*a, *b, abs <= 1e-3, "at {}", p);
    }
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
#[case(2718)]
fn solvers_agree_on_generated_grids(#[case] seed: u64) {
    let params = MdpParams::new(0.9, -0.04, 0.2);
    let mut by_value = ScenarioGenerator::default().from_seed(6, 5, seed).unwrap();
    let mut by_policy = by_value.clone();

    run_value_iteration(&mut by_value, params).unwrap();
    run_policy_iteration(&mut by_policy, params).unwrap();

    let (a, b) = (by_value.values(), by_policy.values());
    assert_eq!(a.len(), b.len());
    for (p, v) in &a {
        assert_float_eq!(*v, b[p], abs <= 5e-3, "at {}", p);
    }

    // Exact Q ties may legitimately resolve differently; clear winners may not.
    let pi_policy = by_policy.policy();
    for c in by_value.cells().filter(|c| c.kind() == CellKind::Empty) {
        let mut qs = Direction::ALL.map(|d| by_value.bellman_q(c, d, &params));
        qs.sort_by(|x, y| y.total_cmp(x));
        if qs[0] - qs[1] > DEFAULT_THETA {
            assert_eq!(
                c.direction(),
                pi_policy[&c.position()],
                "at {}",
                c.position()
            );
        }
    }
}

#[rstest]
fn converged_grid_needs_no_more_iterations(mut classic: GridWorld) {
    let params = MdpParams::default();
    run_value_iteration(&mut classic, params).unwrap();
    let before = classic.values();

    assert_eq!(run_value_iteration(&mut classic, params).unwrap(), 0);
    assert_eq!(classic.values(), before);
}

#[rstest]
fn zero_cap_on_solved_grid_reports_convergence(mut classic: GridWorld) {
    let params = MdpParams::default();
    run_value_iteration(&mut classic, params).unwrap();

    let by_value = ValueIteration::new(params)
        .unwrap()
        .exec(&mut classic, Some(0));
    assert_eq!(by_value, (StopReason::Converged, 0));

    let by_policy = PolicyIteration::new(params)
        .unwrap()
        .exec(&mut classic, Some(0));
    assert_eq!(by_policy, (StopReason::Converged, 0));

    let mut single = GridWorld::new(1, 1).unwrap();
    let stop = ValueIteration::new(params).unwrap().exec(&mut single, Some(0));
    assert_eq!(stop, (StopReason::Converged, 0));
}

#[rstest]
fn solved_policy_rendering(mut classic: GridWorld) {
    run_value_iteration(&mut classic, MdpParams::default()).unwrap();

    insta::assert_snapshot!(arrows(&classic), @r###"
    >>>+
    ^#^-
    ^<^<
    "###);
}

#[rstest]
fn reset_makes_runs_repeatable(mut classic: GridWorld) {
    let params = MdpParams::new(0.9, -0.04, 0.2);
    let first = run_value_iteration(&mut classic, params).unwrap();
    let values = classic.values();

    classic.reset();
    assert_eq!(run_value_iteration(&mut classic, params).unwrap(), first);
    assert_eq!(classic.values(), values);
}

#[test]
fn single_cell_without_reward_is_already_solved() {
    let params = MdpParams::default();
    let mut grid = GridWorld::new(1, 1).unwrap();

    assert_eq!(run_value_iteration(&mut grid, params).unwrap(), 0);
    assert_eq!(run_policy_iteration(&mut grid, params).unwrap(), 0);
    assert_eq!(value(&grid, 0, 0), 0.);
}

#[test]
fn single_cell_with_reward_approaches_geometric_sum() {
    // Every action bumps in place, so V = r / (1 - discount).
    let params = MdpParams::new(0.9, -1., 0.2);

    let mut grid = GridWorld::new(1, 1).unwrap();
    assert!(run_value_iteration(&mut grid, params).unwrap() > 0);
    assert_float_eq!(value(&grid, 0, 0), -10., abs <= 1e-2);

    let mut grid = GridWorld::new(1, 1).unwrap();
    assert_eq!(run_policy_iteration(&mut grid, params).unwrap(), 0);
    assert_float_eq!(value(&grid, 0, 0), -10., abs <= 1e-2);
}

#[derive(Default)]
struct Recorder {
    iterations: Vec<usize>,
    values_at_goal_neighbour: Vec<Continous>,
}

impl SweepObserver for Recorder {
    fn on_sweep(&mut self, grid: &GridWorld, iteration: usize) -> io::Result<()> {
        self.iterations.push(iteration);
        self.values_at_goal_neighbour.push(value(grid, 2, 2));
        Ok(())
    }
}

#[rstest]
fn observer_sees_every_sweep(mut classic: GridWorld) {
    let mut solver = ValueIteration::new(MdpParams::default()).unwrap();
    let mut recorder = Recorder::default();

    let (stop, iterations) =
        exec_observed(&mut solver, &mut classic, None, &mut recorder).unwrap();

    assert_eq!(stop, StopReason::Converged);
    assert_eq!(iterations, 16);
    // Initial frame, 16 changing sweeps and the final quiet one.
    assert_eq!(recorder.iterations.len(), 18);
    assert_eq!(recorder.iterations[0], 0);
    assert_eq!(recorder.iterations[1], 1);
    assert_eq!(recorder.iterations[17], 16);
    assert_eq!(recorder.values_at_goal_neighbour[0], 0.);
    assert_float_eq!(recorder.values_at_goal_neighbour[1], 0.72, abs <= 1e-12);
}

#[rstest]
fn observed_cap_matches_plain_cap(classic: GridWorld) {
    let mut plain = classic.clone();
    let mut observed = classic;
    let mut recorder = Recorder::default();

    let a = ValueIteration::new(MdpParams::default())
        .unwrap()
        .exec(&mut plain, Some(4));
    let b = exec_observed(
        &mut ValueIteration::new(MdpParams::default()).unwrap(),
        &mut observed,
        Some(4),
        &mut recorder,
    )
    .unwrap();

    assert_eq!(a, (StopReason::IterationCap, 4));
    assert_eq!(a, b);
    assert_eq!(plain, observed);
    assert_eq!(recorder.iterations, vec![0, 1, 2, 3, 4]);
}

#[rstest]
fn monte_carlo_agrees_with_solved_values(mut classic: GridWorld) {
    let params = MdpParams::new(0.9, -0.04, 0.2);
    run_value_iteration(&mut classic, params).unwrap();

    let mc = MonteCarloEvaluator::new(params)
        .unwrap()
        .with_rollouts_per_state(400)
        .unwrap();
    let estimates = mc.evaluate_all(&classic, &mut StdRng::seed_from_u64(11));

    assert_eq!(estimates.len(), 9);
    // Rollouts are undiscounted, so only the sign and rough ordering carry over.
    assert!(estimates[&Position::new(2, 2)] > 0.);
    assert!(estimates[&Position::new(2, 2)] > estimates[&Position::new(0, 0)]);
}
