//! Text presentation of a grid world. Nothing in here is called by the
//! solvers; the host renders between solver steps.

use super::*;
use itertools::Itertools;
use std::io::{self, Write};

/// Receives the grid after each committed sweep.
pub trait SweepObserver {
    fn on_sweep(&mut self, grid: &GridWorld, iteration: usize) -> io::Result<()>;
}

/// Cell kinds only, top row first, using the same symbols the layout parser reads.
pub fn render_layout(grid: &GridWorld) -> String {
    rows(grid)
        .map(|row| row.iter().map(|c| c.kind().symbol()).collect::<String>())
        .join("\n")
}

/// Values and greedy arrows, top row first.
pub fn render_values(grid: &GridWorld) -> String {
    rows(grid)
        .map(|row| row.iter().map(|c| format!("{:>7}", cell_text(c))).join(" "))
        .join("\n")
}

fn cell_text(cell: &Cell) -> String {
    match cell.kind() {
        CellKind::Wall => "#####".to_string(),
        CellKind::PositiveTerminal | CellKind::NegativeTerminal => {
            format!("{:+.2}", cell.value())
        }
        CellKind::Empty => format!("{:+.2}{}", cell.value(), cell.direction().arrow()),
    }
}

fn rows(grid: &GridWorld) -> impl Iterator<Item = Vec<&Cell>> + '_ {
    (0..grid.height()).rev().map(move |y| {
        (0..grid.width())
            .filter_map(|x| grid.get(Position::new(x as Discrete, y as Discrete)))
            .collect()
    })
}

/// Writes one frame per sweep to any writer, e.g. stdout.
pub struct TextDisplay<W: Write> {
    out: W,
    clear_screen: bool,
}

impl<W: Write> TextDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            clear_screen: false,
        }
    }

    pub fn with_clear_screen(mut self, clear_screen: bool) -> Self {
        self.clear_screen = clear_screen;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SweepObserver for TextDisplay<W> {
    fn on_sweep(&mut self, grid: &GridWorld, iteration: usize) -> io::Result<()> {
        if self.clear_screen {
            write!(self.out, "{esc}[2J{esc}[1;1H", esc = 27 as char)?;
        }
        writeln!(self.out, "iteration {iteration}")?;
        writeln!(self.out, "{}", render_values(grid))?;
        self.out.flush()
    }
}
