use gridworld::*;

#[allow(dead_code)]
pub fn count_kind(grid: &GridWorld, kind: CellKind) -> usize {
    grid.cells().filter(|c| c.kind() == kind).count()
}

#[allow(dead_code)]
pub fn layout(grid: &GridWorld) -> Vec<(Position, CellKind)> {
    grid.cells().map(|c| (c.position(), c.kind())).collect()
}

#[allow(dead_code)]
pub fn cell(grid: &GridWorld, x: Discrete, y: Discrete) -> &Cell {
    grid.cell_at(x, y)
        .unwrap_or_else(|e| panic!("{e}"))
}
