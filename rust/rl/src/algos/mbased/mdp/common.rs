//! Synchronous (Jacobi) sweeps: every backup in a sweep reads the values as
//! they stood before the sweep, and nothing is written until all backups are
//! computed.

use gridworld::*;

/// A backup waiting to be committed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Update {
    pub position: Position,
    pub value: Continous,
    pub direction: Option<Direction>,
}

/// Compute phase. Walls are skipped.
pub fn compute<F>(grid: &GridWorld, backup: F) -> Vec<Update>
where
    F: Fn(&GridWorld, &Cell) -> (Continous, Option<Direction>),
{
    grid.cells()
        .filter(|c| !c.is_wall())
        .map(|c| {
            let (value, direction) = backup(grid, c);
            Update {
                position: c.position(),
                value,
                direction,
            }
        })
        .collect()
}

/// Commit phase. A value is written only if it moved by at least `theta`;
/// a direction, when present, is always written. Returns whether any value
/// was written.
pub fn commit(grid: &mut GridWorld, updates: &[Update], theta: Continous) -> bool {
    let mut changed = false;
    for u in updates {
        let Some(cell) = grid.get_mut(u.position) else {
            continue;
        };
        if (cell.value() - u.value).abs() >= theta {
            cell.set_value(u.value);
            changed = true;
        }
        if let Some(direction) = u.direction {
            cell.set_direction(direction);
        }
    }

    changed
}
