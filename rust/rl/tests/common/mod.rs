use gridworld::*;

#[allow(dead_code)]
pub fn value(grid: &GridWorld, x: Discrete, y: Discrete) -> Continous {
    grid.cell_at(x, y).unwrap_or_else(|e| panic!("{e}")).value()
}

#[allow(dead_code)]
pub fn direction(grid: &GridWorld, x: Discrete, y: Discrete) -> Direction {
    grid.cell_at(x, y)
        .unwrap_or_else(|e| panic!("{e}"))
        .direction()
}

/// Layout symbols with empty cells replaced by their policy arrow, top row first.
#[allow(dead_code)]
pub fn arrows(grid: &GridWorld) -> String {
    grid.to_string()
        .lines()
        .enumerate()
        .map(|(i, row)| {
            let y = (grid.height() - 1 - i) as Discrete;
            row.chars()
                .enumerate()
                .map(|(x, symbol)| match direction_if_empty(grid, x as Discrete, y) {
                    Some(d) => d.arrow(),
                    None => symbol,
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[allow(dead_code)]
fn direction_if_empty(grid: &GridWorld, x: Discrete, y: Discrete) -> Option<Direction> {
    grid.cell_at(x, y)
        .ok()
        .filter(|c| c.kind() == CellKind::Empty)
        .map(|c| c.direction())
}
