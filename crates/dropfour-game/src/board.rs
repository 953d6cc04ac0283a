//! The playing grid: cell occupancy, gravity drops and terminal detection.

use std::fmt;

use dropfour_protocol::Slot;

use crate::{COLUMNS, DropError, ROWS, WIN_LENGTH};

/// One cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Occupied(Slot),
}

/// A cell coordinate. Row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

/// Outcome classification of the board after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    /// No line of four and at least one column still has room.
    Ongoing,
    Win(Slot),
    Draw,
}

/// Axis and diagonal directions as (row step, column step). Each line is
/// walked both ways from the last move, so these four cover all eight.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// A `COLUMNS × ROWS` grid.
///
/// Pieces only ever enter through [`try_drop`](Board::try_drop), which
/// keeps every column packed from the bottom up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; COLUMNS]; ROWS],
    /// Pieces per column.
    heights: [usize; COLUMNS],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; COLUMNS]; ROWS],
            heights: [0; COLUMNS],
        }
    }

    /// Drops a piece for `player` into `column`.
    ///
    /// The piece lands in the lowest empty row. On error the board is
    /// untouched.
    pub fn try_drop(
        &mut self,
        column: i64,
        player: Slot,
    ) -> Result<Position, DropError> {
        let col = usize::try_from(column)
            .ok()
            .filter(|c| *c < COLUMNS)
            .ok_or(DropError::InvalidColumn(column))?;

        let height = self.heights[col];
        if height == ROWS {
            return Err(DropError::ColumnFull(col));
        }

        let row = ROWS - 1 - height;
        self.cells[row][col] = Cell::Occupied(player);
        self.heights[col] += 1;
        Ok(Position { row, column: col })
    }

    /// Classifies the board after the piece at `last_move` was placed.
    ///
    /// Only lines through `last_move` are checked: any new line of four
    /// must include the piece that was just dropped.
    pub fn evaluate_terminal(&self, last_move: Position) -> TerminalStatus {
        if let Some(Cell::Occupied(player)) =
            self.cell(last_move.row, last_move.column)
        {
            for (dr, dc) in DIRECTIONS {
                let line = 1
                    + self.run_length(last_move, dr, dc, player)
                    + self.run_length(last_move, -dr, -dc, player);
                if line >= WIN_LENGTH {
                    return TerminalStatus::Win(player);
                }
            }
        }

        if self.is_full() {
            TerminalStatus::Draw
        } else {
            TerminalStatus::Ongoing
        }
    }

    /// Clears every cell. Used when a rematch starts.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Returns the cell at `(row, column)`, or `None` off the board.
    pub fn cell(&self, row: usize, column: usize) -> Option<Cell> {
        self.cells.get(row)?.get(column).copied()
    }

    /// Number of pieces in `column` (0 for a nonexistent column).
    pub fn fill_level(&self, column: usize) -> usize {
        self.heights.get(column).copied().unwrap_or(0)
    }

    /// Returns `true` when every column is full.
    pub fn is_full(&self) -> bool {
        self.heights.iter().all(|h| *h == ROWS)
    }

    /// Total pieces on the board.
    pub fn pieces(&self) -> usize {
        self.heights.iter().sum()
    }

    /// Counts consecutive `player` pieces from `from` (exclusive) stepping
    /// by `(dr, dc)`.
    fn run_length(
        &self,
        from: Position,
        dr: isize,
        dc: isize,
        player: Slot,
    ) -> usize {
        let mut count = 0;
        let mut row = from.row as isize + dr;
        let mut col = from.column as isize + dc;
        while row >= 0
            && col >= 0
            && self.cell(row as usize, col as usize)
                == Some(Cell::Occupied(player))
        {
            count += 1;
            row += dr;
            col += dc;
        }
        count
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the grid top row first: `.` empty, `X` Player1, `O` Player2.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for cell in row {
                let c = match cell {
                    Cell::Empty => '.',
                    Cell::Occupied(Slot::Player1) => 'X',
                    Cell::Occupied(Slot::Player2) => 'O',
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
