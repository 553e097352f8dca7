//! Square cell grid shared by generation, pursuit and rendering.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::GridVec;

/// Tag stored in every grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellCode {
    /// Open floor that can be traversed.
    #[default]
    Empty,
    /// Solid wall.
    Wall,
    /// Cell currently occupied by the chaser.
    Chaser,
}

impl CellCode {
    /// Numeric code of the cell: `0` empty, `1` wall, `2` chaser.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Wall => 1,
            Self::Chaser => 2,
        }
    }

    /// Reports whether a ray or a walker stops at this cell.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

impl TryFrom<u8> for CellCode {
    type Error = GridError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Empty),
            1 => Ok(Self::Wall),
            2 => Ok(Self::Chaser),
            code => Err(GridError::UnknownCellCode { code }),
        }
    }
}

/// Errors raised while constructing or accessing a [`Grid`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The coordinate does not address a cell of the grid.
    #[error("cell ({x}, {y}) lies outside the {size}x{size} grid")]
    OutOfBounds {
        /// Requested column.
        x: i32,
        /// Requested row.
        y: i32,
        /// Side length of the grid.
        size: u32,
    },
    /// The numeric value does not correspond to a [`CellCode`].
    #[error("unknown cell code {code}")]
    UnknownCellCode {
        /// Value that failed to decode.
        code: u8,
    },
    /// The textual layout contained a character without a cell meaning.
    #[error("unknown cell symbol {symbol:?} at row {row}")]
    UnknownSymbol {
        /// Offending character.
        symbol: char,
        /// Row containing the character.
        row: usize,
    },
    /// The textual layout was empty or not square.
    #[error("layout row {row} has {found} cells but the grid is {expected} wide")]
    NotSquare {
        /// Row whose width disagreed with the row count.
        row: usize,
        /// Width implied by the number of rows.
        expected: usize,
        /// Width found on the row.
        found: usize,
    },
}

/// Capability required by searches that walk a grid.
///
/// Both transient validation grids and the live world grid satisfy it.
pub trait CellLookup {
    /// Side length of the square grid.
    fn size(&self) -> u32;

    /// Code stored at `at`, or `None` when the coordinate is out of bounds.
    fn cell(&self, at: GridVec) -> Option<CellCode>;

    /// Reports whether `at` addresses a cell of the grid.
    fn contains(&self, at: GridVec) -> bool {
        let size = i64::from(self.size());
        (0..size).contains(&i64::from(at.x())) && (0..size).contains(&i64::from(at.y()))
    }
}

/// Dense square grid of [`CellCode`] values stored in row-major order.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    size: u32,
    cells: Vec<CellCode>,
}

impl Grid {
    /// Creates a grid whose border is walled and whose interior is empty.
    #[must_use]
    pub fn bordered(size: u32) -> Self {
        let side = size as usize;
        let mut grid = Self {
            size,
            cells: vec![CellCode::Empty; side * side],
        };
        let border: Vec<GridVec> = grid.border_cells().collect();
        for at in border {
            if let Some(index) = grid.index(at) {
                grid.cells[index] = CellCode::Wall;
            }
        }
        grid
    }

    /// Parses a square layout where `.` or `0` is empty, `1` or `#` is a wall
    /// and `2` is the chaser. Blank lines and surrounding whitespace are ignored.
    pub fn from_ascii(layout: &str) -> Result<Self, GridError> {
        let rows: Vec<&str> = layout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let side = rows.len();
        let mut cells = Vec::with_capacity(side * side);

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != side {
                return Err(GridError::NotSquare {
                    row,
                    expected: side,
                    found,
                });
            }

            for symbol in line.chars() {
                let code = match symbol {
                    '.' => CellCode::Empty,
                    '#' => CellCode::Wall,
                    symbol => match symbol.to_digit(10) {
                        Some(digit) => CellCode::try_from(digit as u8)?,
                        None => return Err(GridError::UnknownSymbol { symbol, row }),
                    },
                };
                cells.push(code);
            }
        }

        Ok(Self {
            size: u32::try_from(side).unwrap_or(u32::MAX),
            cells,
        })
    }

    /// Side length of the grid.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Code stored at `at`.
    pub fn get(&self, at: GridVec) -> Result<CellCode, GridError> {
        self.index(at)
            .map(|index| self.cells[index])
            .ok_or_else(|| self.out_of_bounds(at))
    }

    /// Overwrites the code stored at `at`.
    pub fn set(&mut self, at: GridVec, code: CellCode) -> Result<(), GridError> {
        let index = self.index(at).ok_or_else(|| self.out_of_bounds(at))?;
        self.cells[index] = code;
        Ok(())
    }

    /// Reports whether `at` lies on the outermost ring of cells.
    #[must_use]
    pub fn is_border(&self, at: GridVec) -> bool {
        let last = i64::from(self.size) - 1;
        let (x, y) = (i64::from(at.x()), i64::from(at.y()));
        self.contains(at) && (x == 0 || y == 0 || x == last || y == last)
    }

    /// Reports whether `at` lies inside the border ring.
    #[must_use]
    pub fn is_interior(&self, at: GridVec) -> bool {
        self.contains(at) && !self.is_border(at)
    }

    /// Every coordinate of the grid in row-major order.
    pub fn coordinates(&self) -> impl Iterator<Item = GridVec> + '_ {
        let side = i32::try_from(self.size).unwrap_or(i32::MAX);
        (0..side).flat_map(move |y| (0..side).map(move |x| GridVec::new(x, y)))
    }

    /// Coordinates on the outermost ring of cells.
    pub fn border_cells(&self) -> impl Iterator<Item = GridVec> + '_ {
        self.coordinates().filter(|at| self.is_border(*at))
    }

    /// Coordinates strictly inside the border ring.
    pub fn interior_cells(&self) -> impl Iterator<Item = GridVec> + '_ {
        self.coordinates().filter(|at| self.is_interior(*at))
    }

    /// Coordinates currently holding `code`.
    pub fn cells_with(&self, code: CellCode) -> impl Iterator<Item = GridVec> + '_ {
        self.coordinates()
            .filter(move |at| self.cell(*at) == Some(code))
    }

    fn index(&self, at: GridVec) -> Option<usize> {
        if !self.contains(at) {
            return None;
        }

        let x = usize::try_from(at.x()).ok()?;
        let y = usize::try_from(at.y()).ok()?;
        y.checked_mul(self.size as usize)?.checked_add(x)
    }

    fn out_of_bounds(&self, at: GridVec) -> GridError {
        GridError::OutOfBounds {
            x: at.x(),
            y: at.y(),
            size: self.size,
        }
    }
}

impl CellLookup for Grid {
    fn size(&self) -> u32 {
        self.size
    }

    fn cell(&self, at: GridVec) -> Option<CellCode> {
        self.index(at).map(|index| self.cells[index])
    }
}

impl fmt::Display for Grid {
    /// Writes one line per row: `.` for empty cells, the numeric code otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = self.size as usize;
        for (row, chunk) in self.cells.chunks(side.max(1)).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for code in chunk {
                match code {
                    CellCode::Empty => write!(f, ".")?,
                    code => write!(f, "{}", code.value())?,
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid {}x{}", self.size, self.size)?;
        fmt::Display::fmt(self, f)
    }
}
