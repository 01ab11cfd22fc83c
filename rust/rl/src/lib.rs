pub mod algos;
pub mod config;

pub use algos::mbased::mdp::{
    run_policy_iteration, run_value_iteration, MdpSolver, PolicyIteration, SolverState,
    StopReason, ValueIteration,
};
pub use algos::model_free::gradient_free::on_policy::monte_carlo::MonteCarloEvaluator;
