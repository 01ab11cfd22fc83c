extern crate ndarray;
extern crate rand;
extern crate serde;

pub mod common;
pub mod error;
pub mod scenario;
pub mod ui;

pub use error::{GridError, Result};
pub use scenario::ScenarioGenerator;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type Discrete = i32;
pub type Continous = f64;

/// Unit moves on the grid. Up is +y.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Enumeration order. Argmax ties go to the earliest entry.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn offset(&self) -> (Discrete, Discrete) {
        match self {
            Direction::Up => (0, 1),
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// The direction itself followed by the two directions perpendicular to it,
    /// i.e. every direction except the opposite one, in enumeration order.
    pub fn with_perpendiculars(&self) -> [Direction; 3] {
        let opposite = self.opposite();
        let mut out = [*self; 3];
        let mut i = 1;
        for d in Direction::ALL {
            if d != *self && d != opposite {
                out[i] = d;
                i += 1;
            }
        }
        out
    }

    pub fn arrow(&self) -> char {
        match self {
            Direction::Up => '^',
            Direction::Right => '>',
            Direction::Down => 'v',
            Direction::Left => '<',
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Empty,
    Wall,
    PositiveTerminal,
    NegativeTerminal,
}

impl CellKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CellKind::PositiveTerminal | CellKind::NegativeTerminal)
    }

    /// Fixed value of an absorbing cell.
    pub fn terminal_value(&self) -> Option<Continous> {
        match self {
            CellKind::PositiveTerminal => Some(1.),
            CellKind::NegativeTerminal => Some(-1.),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            CellKind::Empty => '.',
            CellKind::Wall => '#',
            CellKind::PositiveTerminal => '+',
            CellKind::NegativeTerminal => '-',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '.' => Some(CellKind::Empty),
            '#' => Some(CellKind::Wall),
            '+' => Some(CellKind::PositiveTerminal),
            '-' => Some(CellKind::NegativeTerminal),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: Discrete,
    pub y: Discrete,
}

impl Position {
    pub fn new(x: Discrete, y: Discrete) -> Self {
        Self { x, y }
    }

    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One grid position. The kind is fixed at construction; value and direction
/// are owned by whichever solver is running against the grid.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Cell {
    position: Position,
    kind: CellKind,
    value: Continous,
    direction: Direction,
}

impl Cell {
    fn new(position: Position, kind: CellKind) -> Self {
        Self {
            position,
            kind,
            value: kind.terminal_value().unwrap_or_default(),
            direction: Direction::default(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn value(&self) -> Continous {
        self.value
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }

    pub fn is_wall(&self) -> bool {
        self.kind == CellKind::Wall
    }

    pub fn set_value(&mut self, value: Continous) {
        debug_assert!(
            !self.is_terminal() || Some(value) == self.kind.terminal_value(),
            "terminal value at {} is fixed",
            self.position
        );
        self.value = value;
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }
}

/// One stochastic outcome of taking an action in a cell.
#[derive(Clone, Copy, Debug)]
pub struct Transition<'a> {
    pub probability: Continous,
    pub landing: &'a Cell,
    pub direction: Direction,
}

/// Discount, flat per-step reward and action noise shared by all solvers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdpParams {
    pub discount: Continous,
    pub reward: Continous,
    pub noise: Continous,
}

impl Default for MdpParams {
    fn default() -> Self {
        Self {
            discount: 0.9,
            reward: 0.,
            noise: 0.2,
        }
    }
}

impl MdpParams {
    pub fn new(discount: Continous, reward: Continous, noise: Continous) -> Self {
        Self {
            discount,
            reward,
            noise,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.discount > 0. && self.discount <= 1.) {
            return Err(GridError::InvalidParameter(format!(
                "discount must be in (0, 1], got {}",
                self.discount
            )));
        }
        if !(0. ..1.).contains(&self.noise) {
            return Err(GridError::InvalidParameter(format!(
                "noise must be in [0, 1), got {}",
                self.noise
            )));
        }
        if !self.reward.is_finite() {
            return Err(GridError::InvalidParameter(format!(
                "reward must be finite, got {}",
                self.reward
            )));
        }
        Ok(())
    }
}

/// Rectangular grid of cells, indexed `[x, y]` with `(0, 0)` at the bottom left.
#[derive(Clone, Debug, PartialEq)]
pub struct GridWorld {
    width: usize,
    height: usize,
    cells: Array2<Cell>,
}

impl GridWorld {
    /// All-empty grid.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::from_layout(width, height, &[])
    }

    /// Grid with the listed special cells; everything else is empty.
    pub fn from_layout(
        width: usize,
        height: usize,
        specials: &[(Position, CellKind)],
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidScenario(format!(
                "grid dimensions must be at least 1x1, got {width}x{height}"
            )));
        }

        let mut kinds = Array2::from_elem((width, height), None::<CellKind>);
        for &(p, kind) in specials {
            let ix = Self::index_of(width, height, p).ok_or(GridError::OutOfBounds {
                x: p.x,
                y: p.y,
                width,
                height,
            })?;
            let slot = &mut kinds[ix];
            if slot.is_some() {
                return Err(GridError::InvalidScenario(format!(
                    "position {p} is assigned more than once"
                )));
            }
            *slot = Some(kind);
        }

        for terminal in [CellKind::PositiveTerminal, CellKind::NegativeTerminal] {
            let n = kinds.iter().filter(|&&k| k == Some(terminal)).count();
            if n > 1 {
                return Err(GridError::InvalidScenario(format!(
                    "at most one {terminal:?} allowed, got {n}"
                )));
            }
        }

        Ok(Self::build(width, height, |x, y| {
            kinds[[x, y]].unwrap_or_default()
        }))
    }

    /// The 4x3 textbook layout: `+` at (3,2), `-` at (3,1), wall at (1,1).
    pub fn classic() -> Self {
        Self::build(4, 3, |x, y| match (x, y) {
            (3, 2) => CellKind::PositiveTerminal,
            (3, 1) => CellKind::NegativeTerminal,
            (1, 1) => CellKind::Wall,
            _ => CellKind::Empty,
        })
    }

    fn build(width: usize, height: usize, kind: impl Fn(usize, usize) -> CellKind) -> Self {
        let cells = Array2::from_shape_fn((width, height), |(x, y)| {
            Cell::new(Position::new(x as Discrete, y as Discrete), kind(x, y))
        });

        Self {
            width,
            height,
            cells,
        }
    }

    fn index_of(width: usize, height: usize, p: Position) -> Option<[usize; 2]> {
        let in_bounds = p.x >= 0 && p.y >= 0 && (p.x as usize) < width && (p.y as usize) < height;
        in_bounds.then(|| [p.x as usize, p.y as usize])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, p: Position) -> Option<&Cell> {
        let ix = Self::index_of(self.width, self.height, p)?;
        self.cells.get(ix)
    }

    pub fn get_mut(&mut self, p: Position) -> Option<&mut Cell> {
        let ix = Self::index_of(self.width, self.height, p)?;
        self.cells.get_mut(ix)
    }

    pub fn cell_at(&self, x: Discrete, y: Discrete) -> Result<&Cell> {
        let (width, height) = (self.width, self.height);
        self.get(Position::new(x, y))
            .ok_or(GridError::OutOfBounds {
                x,
                y,
                width,
                height,
            })
    }

    pub fn cell_at_mut(&mut self, x: Discrete, y: Discrete) -> Result<&mut Cell> {
        let (width, height) = (self.width, self.height);
        self.get_mut(Position::new(x, y))
            .ok_or(GridError::OutOfBounds {
                x,
                y,
                width,
                height,
            })
    }

    /// All cells, x-major then y.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Adjacent cell regardless of its kind, `None` past the boundary.
    pub fn neighbor(&self, cell: &Cell, direction: Direction) -> Option<&Cell> {
        self.get(cell.position().step(direction))
    }

    /// The stochastic action model: the intended direction with probability
    /// `1 - noise`, each perpendicular with `noise / 2`, never the reverse.
    /// Moves into a wall or off the grid land back on `cell`.
    pub fn transition_outcomes<'a>(
        &'a self,
        cell: &'a Cell,
        intended: Direction,
        noise: Continous,
    ) -> [Transition<'a>; 3] {
        intended.with_perpendiculars().map(|direction| {
            let probability = if direction == intended {
                1. - noise
            } else {
                noise / 2.
            };
            let landing = match self.neighbor(cell, direction) {
                Some(n) if !n.is_wall() => n,
                _ => cell,
            };

            Transition {
                probability,
                landing,
                direction,
            }
        })
    }

    /// Expected one-step return of `direction` from `cell` against the
    /// current values. Terminals short-circuit to their fixed value.
    pub fn bellman_q(&self, cell: &Cell, direction: Direction, params: &MdpParams) -> Continous {
        if let Some(v) = cell.kind().terminal_value() {
            return v;
        }

        self.transition_outcomes(cell, direction, params.noise)
            .iter()
            .map(|t| t.probability * (params.reward + params.discount * t.landing.value()))
            .sum()
    }

    /// Max over actions of [`GridWorld::bellman_q`]; first maximum in
    /// [`Direction::ALL`] order wins.
    pub fn best_action(&self, cell: &Cell, params: &MdpParams) -> (Continous, Direction) {
        let mut best = (Continous::NEG_INFINITY, Direction::Up);
        for direction in Direction::ALL {
            let q = self.bellman_q(cell, direction, params);
            if q > best.0 {
                best = (q, direction);
            }
        }

        best
    }

    /// Backup for a fixed policy action. Same arithmetic as `bellman_q`.
    pub fn apply_policy_action(
        &self,
        cell: &Cell,
        direction: Direction,
        params: &MdpParams,
    ) -> Continous {
        self.bellman_q(cell, direction, params)
    }

    /// Restore every empty cell to value 0 and direction Up.
    pub fn reset(&mut self) {
        self.cells
            .iter_mut()
            .filter(|c| c.kind() == CellKind::Empty)
            .for_each(|c| {
                c.value = 0.;
                c.direction = Direction::default();
            });
    }

    /// Current value of every non-wall cell.
    pub fn values(&self) -> BTreeMap<Position, Continous> {
        self.cells()
            .filter(|c| !c.is_wall())
            .map(|c| (c.position(), c.value()))
            .collect()
    }

    /// Current action of every empty cell.
    pub fn policy(&self) -> BTreeMap<Position, Direction> {
        self.cells()
            .filter(|c| c.kind() == CellKind::Empty)
            .map(|c| (c.position(), c.direction()))
            .collect()
    }
}

impl FromStr for GridWorld {
    type Err = GridError;

    /// Parses a layout drawn top row first, e.g. `"...+\n.#.-\n...."`.
    fn from_str(s: &str) -> Result<Self> {
        let rows = s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>();
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);

        let mut specials = vec![];
        for (i, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(GridError::InvalidScenario(format!(
                    "row {i} has {} cells, expected {width}",
                    row.chars().count()
                )));
            }
            let y = (height - 1 - i) as Discrete;
            for (x, c) in row.chars().enumerate() {
                let kind = CellKind::from_symbol(c).ok_or_else(|| {
                    GridError::InvalidScenario(format!("unknown cell symbol '{c}'"))
                })?;
                if kind != CellKind::Empty {
                    specials.push((Position::new(x as Discrete, y), kind));
                }
            }
        }

        Self::from_layout(width, height, &specials)
    }
}

impl fmt::Display for GridWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ui::render_layout(self))
    }
}
