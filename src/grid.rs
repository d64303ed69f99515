use std::fmt;

use shakmaty::{Bitboard, Square};

/// Number of rows (and columns) of the reed switch array.
pub const SIZE: usize = 8;

/// Maps a sensor cell to its board square.
///
/// Row 0 is the far side of the board (rank 8) and column 0 is file a, so
/// `square = (7 - row) * 8 + col`. This is the only conversion from sensor
/// space into board space; [`cell_of`] is its inverse.
///
/// # Panics
///
/// Panics if `row` or `col` is not in `0..8`.
#[inline]
pub fn square_at(row: usize, col: usize) -> Square {
    assert!(row < SIZE && col < SIZE, "cell ({row}, {col}) is off the board");
    Square::new(((SIZE - 1 - row) * SIZE + col) as u32)
}

/// Maps a board square back to its sensor cell as `(row, col)`.
#[inline]
pub fn cell_of(square: Square) -> (usize, usize) {
    let index = usize::from(square);
    (SIZE - 1 - index / SIZE, index % SIZE)
}

/// One complete 8×8 reading of the reed switches.
///
/// `true` means a piece is sitting on the cell. A grid is always fully
/// populated and never changed after capture; every poll produces a new one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OccupancyGrid {
    cells: [[bool; SIZE]; SIZE],
}

impl OccupancyGrid {
    /// A grid with no pieces on it.
    pub const EMPTY: Self = Self {
        cells: [[false; SIZE]; SIZE],
    };

    #[inline]
    pub const fn from_cells(cells: [[bool; SIZE]; SIZE]) -> Self {
        Self { cells }
    }

    /// Decodes the eight row bytes read from the board controller.
    ///
    /// Bit `c` of byte `r` is the cell at row `r`, column `c`.
    pub fn from_row_bytes(rows: [u8; SIZE]) -> Self {
        let mut cells = [[false; SIZE]; SIZE];
        for (row, byte) in rows.iter().enumerate() {
            for (col, cell) in cells[row].iter_mut().enumerate() {
                *cell = (byte >> col) & 0x01 == 1;
            }
        }
        Self { cells }
    }

    /// Encodes the grid back into row bytes, the inverse of [`Self::from_row_bytes`].
    pub fn to_row_bytes(&self) -> [u8; SIZE] {
        let mut rows = [0u8; SIZE];
        for (row, byte) in rows.iter_mut().enumerate() {
            for col in 0..SIZE {
                if self.cells[row][col] {
                    *byte |= 1 << col;
                }
            }
        }
        rows
    }

    #[inline]
    pub fn cells(&self) -> &[[bool; SIZE]; SIZE] {
        &self.cells
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[row][col]
    }

    /// Whether the switch under `square` is closed.
    #[inline]
    pub fn is_occupied(&self, square: Square) -> bool {
        let (row, col) = cell_of(square);
        self.cells[row][col]
    }

    /// Returns a copy of this grid with the cell under `square` flipped.
    #[must_use]
    pub fn toggled(&self, square: Square) -> Self {
        let mut cells = self.cells;
        let (row, col) = cell_of(square);
        cells[row][col] = !cells[row][col];
        Self { cells }
    }

    /// Number of occupied cells.
    pub fn count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&cell| cell).count()
    }

    /// Returns this grid as the sensors would read it after turning the
    /// board 90° clockwise.
    #[must_use]
    pub fn rotated_cw(&self) -> Self {
        let mut cells = [[false; SIZE]; SIZE];
        for (row, line) in self.cells.iter().enumerate() {
            for (col, &cell) in line.iter().enumerate() {
                cells[col][SIZE - 1 - row] = cell;
            }
        }
        Self { cells }
    }

    /// Mirrors the grid left to right.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        let mut cells = self.cells;
        for line in &mut cells {
            line.reverse();
        }
        Self { cells }
    }

    /// Applies a mounting correction to a raw reading.
    #[must_use]
    pub fn oriented(&self, orientation: Orientation) -> Self {
        let mut grid = *self;
        for _ in 0..orientation.rotation.quarter_turns() {
            grid = grid.rotated_cw();
        }
        if orientation.mirror {
            grid = grid.mirrored();
        }
        grid
    }
}

impl From<Bitboard> for OccupancyGrid {
    fn from(bitboard: Bitboard) -> Self {
        let mut cells = [[false; SIZE]; SIZE];
        for square in bitboard {
            let (row, col) = cell_of(square);
            cells[row][col] = true;
        }
        Self { cells }
    }
}

impl From<OccupancyGrid> for Bitboard {
    fn from(grid: OccupancyGrid) -> Self {
        let mut bitboard = Bitboard::EMPTY;
        for (row, line) in grid.cells.iter().enumerate() {
            for (col, &cell) in line.iter().enumerate() {
                if cell {
                    bitboard.add(square_at(row, col));
                }
            }
        }
        bitboard
    }
}

/// Renders the grid the way the board controller dumps it over serial:
/// `#` for an occupied cell, `.` for an empty one.
impl fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, line) in self.cells.iter().enumerate() {
            write!(f, "{} ", SIZE - row)?;
            for &cell in line {
                write!(f, "{} ", if cell { '#' } else { '.' })?;
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}

impl fmt::Debug for OccupancyGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OccupancyGrid({:#018X})", Bitboard::from(*self).0)
    }
}

/// Clockwise rotation of the sensor array relative to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    #[inline]
    pub fn quarter_turns(self) -> usize {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 1,
            Rotation::Cw180 => 2,
            Rotation::Cw270 => 3,
        }
    }

    /// Parses a rotation in degrees (0, 90, 180 or 270).
    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Cw90),
            180 => Some(Rotation::Cw180),
            270 => Some(Rotation::Cw270),
            _ => None,
        }
    }
}

/// How the reed switch array is mounted under the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation {
    pub rotation: Rotation,
    pub mirror: bool,
}

/// Squares whose occupancy changed between two grids.
///
/// Both lists are in row-major order (rank 8 first, then file a to h), so
/// the same pair of grids always yields the same delta.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SquareDelta {
    pub added: Vec<Square>,
    pub removed: Vec<Square>,
}

impl SquareDelta {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// The `(from, to)` pair if exactly one square emptied and exactly one filled.
    pub fn single_relocation(&self) -> Option<(Square, Square)> {
        match (self.removed.as_slice(), self.added.as_slice()) {
            ([from], [to]) => Some((*from, *to)),
            _ => None,
        }
    }
}

/// Classifies every cell as added, removed or unchanged going from `before` to `after`.
///
/// Always scans all 64 cells.
pub fn diff(before: &OccupancyGrid, after: &OccupancyGrid) -> SquareDelta {
    let mut delta = SquareDelta::default();
    for row in 0..SIZE {
        for col in 0..SIZE {
            match (before.cells[row][col], after.cells[row][col]) {
                (false, true) => delta.added.push(square_at(row, col)),
                (true, false) => delta.removed.push(square_at(row, col)),
                _ => {}
            }
        }
    }
    delta
}

/// True iff all 64 cells match.
#[inline]
pub fn equals(a: &OccupancyGrid, b: &OccupancyGrid) -> bool {
    a.cells == b.cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{Chess, Position};
    use test_case::test_case;

    fn start_grid() -> OccupancyGrid {
        Chess::default().board().occupied().into()
    }

    #[test_case(0, 0, Square::A8; "top left is a8")]
    #[test_case(0, 7, Square::H8; "top right is h8")]
    #[test_case(7, 0, Square::A1; "bottom left is a1")]
    #[test_case(6, 4, Square::E2; "e2")]
    #[test_case(4, 4, Square::E4; "e4")]
    fn test_square_mapping(row: usize, col: usize, expected: Square) {
        assert_eq!(square_at(row, col), expected);
        assert_eq!(cell_of(expected), (row, col));
    }

    #[test]
    fn test_cell_of_inverts_square_at_everywhere() {
        for row in 0..SIZE {
            for col in 0..SIZE {
                assert_eq!(cell_of(square_at(row, col)), (row, col));
            }
        }
    }

    #[test]
    fn test_start_grid_occupies_first_and_last_two_rows() {
        let grid = start_grid();
        assert_eq!(grid.count(), 32);
        for col in 0..SIZE {
            assert!(grid.get(0, col) && grid.get(1, col));
            assert!(grid.get(6, col) && grid.get(7, col));
            assert!(!grid.get(3, col));
        }
    }

    #[test]
    fn test_bitboard_conversion_preserves_squares() {
        let bitboard = Chess::default().board().occupied();
        let grid = OccupancyGrid::from(bitboard);
        assert_eq!(Bitboard::from(grid), bitboard);
    }

    #[test]
    fn test_row_bytes_decode_bit_per_column() {
        let grid = OccupancyGrid::from_row_bytes([0b0000_0001, 0, 0, 0, 0, 0, 0, 0b1000_0000]);

        assert!(grid.is_occupied(Square::A8));
        assert!(grid.is_occupied(Square::H1));
        assert_eq!(grid.count(), 2);
        assert_eq!(grid.to_row_bytes(), [0b0000_0001, 0, 0, 0, 0, 0, 0, 0b1000_0000]);
    }

    #[test]
    fn test_diff_is_row_major() {
        let before = start_grid();
        let after = before
            .toggled(Square::E2)
            .toggled(Square::E4)
            .toggled(Square::B8)
            .toggled(Square::C6);

        let delta = diff(&before, &after);

        assert_eq!(delta.added, vec![Square::C6, Square::E4]);
        assert_eq!(delta.removed, vec![Square::B8, Square::E2]);
    }

    #[test]
    fn test_diff_sets_are_disjoint_and_empty_iff_equal() {
        let base = start_grid();
        let variants = [
            base,
            base.toggled(Square::E2),
            base.toggled(Square::E4),
            base.toggled(Square::E2).toggled(Square::E4),
            OccupancyGrid::EMPTY,
            base.rotated_cw(),
        ];

        for a in &variants {
            for b in &variants {
                let delta = diff(a, b);
                assert!(delta.added.iter().all(|sq| !delta.removed.contains(sq)));
                assert_eq!(equals(a, b), delta.is_empty());
            }
        }
    }

    #[test_case(&[Square::E2], &[Square::E4], Some((Square::E2, Square::E4)); "one each")]
    #[test_case(&[Square::E2], &[], None; "lift only")]
    #[test_case(&[], &[Square::E4], None; "place only")]
    #[test_case(&[Square::E1, Square::H1], &[Square::G1, Square::F1], None; "two each")]
    fn test_single_relocation(removed: &[Square], added: &[Square], expected: Option<(Square, Square)>) {
        let delta = SquareDelta {
            added: added.to_vec(),
            removed: removed.to_vec(),
        };
        assert_eq!(delta.single_relocation(), expected);
    }

    #[test]
    fn test_four_rotations_are_identity() {
        let grid = start_grid().toggled(Square::E2).toggled(Square::C6);
        let turned = grid.rotated_cw().rotated_cw().rotated_cw().rotated_cw();
        assert_eq!(turned, grid);
    }

    #[test]
    fn test_rotation_moves_a8_to_h8() {
        let grid = OccupancyGrid::EMPTY.toggled(Square::A8);
        assert!(grid.rotated_cw().is_occupied(Square::H8));
    }

    #[test]
    fn test_orientation_applies_rotation_then_mirror() {
        let grid = OccupancyGrid::EMPTY.toggled(Square::A8);
        let oriented = grid.oriented(Orientation {
            rotation: Rotation::Cw90,
            mirror: true,
        });
        assert!(oriented.is_occupied(Square::A8));
        assert_eq!(oriented.count(), 1);
    }

    #[test]
    fn test_display_matches_serial_dump() {
        let text = OccupancyGrid::EMPTY.toggled(Square::A8).to_string();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("8 # . . . . . . . "));
        assert_eq!(text.lines().last(), Some("  a b c d e f g h"));
    }
}
