use crate::*;

/// Chooses the action taken in a cell.
pub trait Policy {
    fn policy(&self, cell: &Cell) -> Direction;
}

/// The policy stored on the grid itself, as written by the last solver run.
#[derive(Clone, Copy, Debug, Default)]
pub struct StoredPolicy;

impl Policy for StoredPolicy {
    fn policy(&self, cell: &Cell) -> Direction {
        cell.direction()
    }
}

/// Always takes the same action. Handy for probing the dynamics.
#[derive(Clone, Copy, Debug)]
pub struct FixedPolicy(pub Direction);

impl Policy for FixedPolicy {
    fn policy(&self, _cell: &Cell) -> Direction {
        self.0
    }
}
