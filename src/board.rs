//! Board: dense grid of bubble slots, flood-fill selection, pop, collapse, refill and move scan.

use crate::Adjacency;
use crate::bubble::Bubble;
use log::debug;
use rand::Rng;
use thiserror::Error;

/// Largest palette the themes provide colours for.
pub const MAX_KINDS: u8 = 8;

const NEIGHBOURS_4: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];
#[rustfmt::skip]
const NEIGHBOURS_8: [(i32, i32); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

fn neighbour_offsets(adjacency: Adjacency) -> &'static [(i32, i32)] {
    match adjacency {
        Adjacency::Four => &NEIGHBOURS_4,
        Adjacency::Eight => &NEIGHBOURS_8,
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("board must be at least 1x1 (got {width}x{height})")]
    EmptyGrid { width: usize, height: usize },
    #[error("palette must have between 1 and 8 colours (got {0})")]
    Palette(u8),
    #[error("minimum group size must be at least 2 (got {0})")]
    MinGroup(usize),
    #[error("expected {expected} bubbles for the board, got {got}")]
    KindCount { expected: usize, got: usize },
    #[error("kind {kind} at index {index} is outside the palette of {kinds}")]
    KindOutOfPalette { index: usize, kind: u8, kinds: u8 },
}

/// Engine parameters fixed for the lifetime of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    /// Number of bubble kinds (colours) in play.
    pub kinds: u8,
    /// Smallest group that can be popped; also decides whether a move remains.
    pub min_group: usize,
    pub adjacency: Adjacency,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 24,
            height: 17,
            kinds: 5,
            min_group: 2,
            adjacency: Adjacency::Four,
        }
    }
}

impl BoardConfig {
    pub fn new(width: usize, height: usize, kinds: u8) -> Self {
        Self {
            width,
            height,
            kinds,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        if self.width == 0 || self.height == 0 {
            return Err(BoardError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.kinds == 0 || self.kinds > MAX_KINDS {
            return Err(BoardError::Palette(self.kinds));
        }
        if self.min_group < 2 {
            return Err(BoardError::MinGroup(self.min_group));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardState {
    /// Not yet initialised.
    Empty,
    Settled,
    Selecting,
    GameOver,
}

/// Grid of bubbles. Slot for (column, row) is `slots[row * width + column]`; row 0 is the top.
#[derive(Debug, Clone)]
pub struct Board {
    config: BoardConfig,
    slots: Vec<Option<Bubble>>,
    /// Slot indices of the current group, ascending.
    selection: Vec<usize>,
    /// Bubbles removed by the last pop, for the pop animation.
    popped: Vec<Bubble>,
}

impl Board {
    /// Empty board; call [`Board::init`] before playing.
    pub fn new(config: BoardConfig) -> Result<Self, BoardError> {
        config.validate()?;
        Ok(Self {
            slots: vec![None; config.width * config.height],
            selection: Vec::new(),
            popped: Vec::new(),
            config,
        })
    }

    /// Settled board from row-major kinds, top row first.
    #[allow(dead_code)]
    pub fn from_kinds(config: BoardConfig, kinds: &[u8]) -> Result<Self, BoardError> {
        let mut board = Self::new(config)?;
        if kinds.len() != board.slots.len() {
            return Err(BoardError::KindCount {
                expected: board.slots.len(),
                got: kinds.len(),
            });
        }
        for (index, &kind) in kinds.iter().enumerate() {
            if kind >= config.kinds {
                return Err(BoardError::KindOutOfPalette {
                    index,
                    kind,
                    kinds: config.kinds,
                });
            }
            let (column, row) = board.cell_of(index);
            board.slots[index] = Some(Bubble::new(kind, column, row));
        }
        Ok(board)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.config.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.config.height
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[inline]
    fn index(&self, column: usize, row: usize) -> usize {
        row * self.config.width + column
    }

    #[inline]
    fn cell_of(&self, index: usize) -> (usize, usize) {
        (index % self.config.width, index / self.config.width)
    }

    fn index_checked(&self, column: i32, row: i32) -> Option<usize> {
        let column = usize::try_from(column).ok()?;
        let row = usize::try_from(row).ok()?;
        (column < self.config.width && row < self.config.height).then(|| self.index(column, row))
    }

    pub fn get(&self, column: usize, row: usize) -> Option<&Bubble> {
        if column >= self.config.width || row >= self.config.height {
            return None;
        }
        self.slots[self.index(column, row)].as_ref()
    }

    /// Occupied slots in row-major order.
    pub fn bubbles(&self) -> impl Iterator<Item = &Bubble> {
        self.slots.iter().flatten()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Fill every slot with a random kind and drop any selection.
    pub fn init<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let kinds = self.config.kinds;
        for index in 0..self.slots.len() {
            let (column, row) = self.cell_of(index);
            self.slots[index] = Some(Bubble::new(rng.random_range(0..kinds), column, row));
        }
        self.selection.clear();
        self.popped.clear();
        debug!(
            "board init {}x{} with {} kinds",
            self.config.width, self.config.height, kinds
        );
    }

    /// Same-kind component containing `origin`, found with an explicit stack.
    /// Every member is marked in `visited`.
    fn component(&self, origin: usize, visited: &mut [bool]) -> Vec<usize> {
        let Some(kind) = self.slots[origin].map(|b| b.kind()) else {
            return Vec::new();
        };
        let (w, h) = (self.config.width as i32, self.config.height as i32);
        let mut component = Vec::new();
        let mut stack = vec![origin];
        visited[origin] = true;

        while let Some(index) = stack.pop() {
            component.push(index);
            let (x, y) = self.cell_of(index);
            for &(dx, dy) in neighbour_offsets(self.config.adjacency) {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                let next = self.index(nx as usize, ny as usize);
                if !visited[next] && self.slots[next].is_some_and(|b| b.kind() == kind) {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
        component
    }

    /// Select the group under (column, row). Out-of-range cells are ignored.
    pub fn select(&mut self, column: i32, row: i32) {
        let Some(origin) = self.index_checked(column, row) else {
            return;
        };
        if self.slots[origin].is_none() {
            return;
        }
        self.clear_selection();
        let mut visited = vec![false; self.slots.len()];
        let mut group = self.component(origin, &mut visited);
        group.sort_unstable();
        for &index in &group {
            if let Some(bubble) = self.slots[index].as_mut() {
                bubble.set_selected(true);
            }
        }
        self.selection = group;
    }

    pub fn clear_selection(&mut self) {
        for index in self.selection.drain(..) {
            if let Some(bubble) = self.slots[index].as_mut() {
                bubble.set_selected(false);
            }
        }
    }

    /// Selected cells as (column, row), row-major.
    #[allow(dead_code)]
    pub fn selection(&self) -> Vec<(usize, usize)> {
        self.selection.iter().map(|&i| self.cell_of(i)).collect()
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    /// Whether the current selection is big enough to pop.
    pub fn selection_poppable(&self) -> bool {
        self.selection.len() >= self.config.min_group
    }

    /// Remove the selected group, collapse and refill the touched columns.
    /// Returns the number of bubbles removed (0 when the group is below `min_group`).
    pub fn pop<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        if !self.selection_poppable() {
            return 0;
        }
        let selection = std::mem::take(&mut self.selection);
        self.popped.clear();
        let mut touched = vec![false; self.config.width];
        for index in selection {
            if let Some(mut bubble) = self.slots[index].take() {
                bubble.mark_popped();
                touched[bubble.column()] = true;
                self.popped.push(bubble);
            }
        }
        for column in 0..self.config.width {
            if touched[column] {
                self.collapse_column(column);
                self.refill_column(column, rng);
            }
        }
        debug!(
            "popped {} bubbles of kind {:?}",
            self.popped.len(),
            self.popped.first().map(Bubble::kind)
        );
        self.popped.len()
    }

    /// Drop survivors to the bottom of the column, keeping their order.
    fn collapse_column(&mut self, column: usize) {
        let mut write_row = self.config.height;
        for row in (0..self.config.height).rev() {
            let index = self.index(column, row);
            if let Some(mut bubble) = self.slots[index].take() {
                write_row -= 1;
                bubble.move_to_row(write_row);
                let target = self.index(column, write_row);
                self.slots[target] = Some(bubble);
            }
        }
    }

    /// Fill the empty run at the top of a collapsed column.
    fn refill_column<R: Rng + ?Sized>(&mut self, column: usize, rng: &mut R) {
        let kinds = self.config.kinds;
        for row in 0..self.config.height {
            let index = self.index(column, row);
            if self.slots[index].is_some() {
                break;
            }
            self.slots[index] = Some(Bubble::new(rng.random_range(0..kinds), column, row));
        }
    }

    /// True while some group of at least `min_group` bubbles exists.
    pub fn has_more_moves(&self) -> bool {
        let mut visited = vec![false; self.slots.len()];
        for index in 0..self.slots.len() {
            if visited[index] || self.slots[index].is_none() {
                continue;
            }
            if self.component(index, &mut visited).len() >= self.config.min_group {
                return true;
            }
        }
        false
    }

    pub fn popped(&self) -> &[Bubble] {
        &self.popped
    }

    pub fn take_popped(&mut self) -> Vec<Bubble> {
        std::mem::take(&mut self.popped)
    }

    pub fn state(&self) -> BoardState {
        if !self.is_full() {
            BoardState::Empty
        } else if !self.selection.is_empty() {
            BoardState::Selecting
        } else if !self.has_more_moves() {
            BoardState::GameOver
        } else {
            BoardState::Settled
        }
    }
}
