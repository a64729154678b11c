use serde::{Deserialize, Serialize};

/// Number of outer slots around the center of a 3×3 grid.
pub const RING_LEN: usize = 8;

/// Grid positions of outer indices 0..8, walking the ring clockwise from the
/// top-left corner and skipping the center.
///
/// ```text
/// 0 1 2        0 1 2
/// 3 4 5  --->  7 · 3
/// 6 7 8        6 5 4
/// ```
pub const OUTER_RING: [u8; RING_LEN] = [0, 1, 2, 5, 8, 7, 6, 3];

/// One of the nine visual slots of a 3×3 layout, in row-major order.
///
/// Values outside 0..=8 cannot be constructed, so every `GridPosition` is
/// either the center or resolves to an outer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct GridPosition(u8);

/// What a grid position refers to, independent of view mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Center,
    /// Index into the ring (0..8)
    Outer(usize),
}

/// Cursor movement on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl GridPosition {
    pub const CENTER: GridPosition = GridPosition(4);

    pub fn new(pos: u8) -> Option<Self> {
        (pos <= 8).then_some(GridPosition(pos))
    }

    pub fn from_row_col(row: u8, col: u8) -> Option<Self> {
        if row > 2 || col > 2 {
            return None;
        }
        Some(GridPosition(row * 3 + col))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn row(self) -> u8 {
        self.0 / 3
    }

    pub fn col(self) -> u8 {
        self.0 % 3
    }

    pub fn is_center(self) -> bool {
        self == Self::CENTER
    }

    pub fn slot(self) -> Slot {
        match position_to_index(self) {
            Some(idx) => Slot::Outer(idx),
            None => Slot::Center,
        }
    }

    /// Move one step, clamped at the grid edges.
    pub fn step(self, dir: Direction) -> Self {
        let (row, col) = (self.row(), self.col());
        let (row, col) = match dir {
            Direction::Up => (row.saturating_sub(1), col),
            Direction::Down => ((row + 1).min(2), col),
            Direction::Left => (row, col.saturating_sub(1)),
            Direction::Right => (row, (col + 1).min(2)),
        };
        GridPosition(row * 3 + col)
    }

    /// All nine positions in row-major order.
    pub fn all() -> impl Iterator<Item = GridPosition> {
        (0..9).map(GridPosition)
    }
}

impl TryFrom<u8> for GridPosition {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        GridPosition::new(value).ok_or_else(|| format!("grid position out of range: {}", value))
    }
}

impl From<GridPosition> for u8 {
    fn from(pos: GridPosition) -> u8 {
        pos.0
    }
}

impl std::fmt::Display for GridPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outer index for a grid position, or `None` for the center.
pub fn position_to_index(pos: GridPosition) -> Option<usize> {
    OUTER_RING.iter().position(|&p| p == pos.0)
}

/// Grid position for an outer index. Indices past the ring are a caller bug.
pub fn index_to_position(idx: usize) -> Option<GridPosition> {
    debug_assert!(idx < RING_LEN, "outer index out of range: {}", idx);
    OUTER_RING.get(idx).map(|&p| GridPosition(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_order_is_clockwise_from_top_left() {
        let positions: Vec<u8> = (0..RING_LEN)
            .map(|i| index_to_position(i).unwrap().get())
            .collect();
        assert_eq!(positions, vec![0, 1, 2, 5, 8, 7, 6, 3]);
    }

    #[test]
    fn position_index_round_trip() {
        for pos in GridPosition::all() {
            match position_to_index(pos) {
                Some(idx) => assert_eq!(index_to_position(idx), Some(pos)),
                None => assert!(pos.is_center()),
            }
        }
    }

    #[test]
    fn center_has_no_index() {
        assert_eq!(position_to_index(GridPosition::CENTER), None);
        assert_eq!(GridPosition::CENTER.slot(), Slot::Center);
    }

    #[test]
    fn out_of_range_positions_do_not_construct() {
        assert!(GridPosition::new(9).is_none());
        assert!(GridPosition::new(255).is_none());
        assert!(GridPosition::from_row_col(3, 0).is_none());
        assert!(GridPosition::try_from(12u8).is_err());
    }

    #[test]
    fn slot_for_outer_positions() {
        let pos = |p| GridPosition::new(p).unwrap();
        assert_eq!(pos(5).slot(), Slot::Outer(3));
        assert_eq!(pos(3).slot(), Slot::Outer(7));
        assert_eq!(pos(8).slot(), Slot::Outer(4));
    }

    #[test]
    fn step_clamps_at_edges() {
        let top_left = GridPosition::new(0).unwrap();
        assert_eq!(top_left.step(Direction::Up), top_left);
        assert_eq!(top_left.step(Direction::Left), top_left);
        assert_eq!(top_left.step(Direction::Right).get(), 1);
        assert_eq!(top_left.step(Direction::Down).get(), 3);
        let bottom_right = GridPosition::new(8).unwrap();
        assert_eq!(bottom_right.step(Direction::Down), bottom_right);
        assert_eq!(bottom_right.step(Direction::Right), bottom_right);
    }

    #[test]
    fn row_col_round_trip() {
        for pos in GridPosition::all() {
            assert_eq!(GridPosition::from_row_col(pos.row(), pos.col()), Some(pos));
        }
    }

    #[test]
    fn serde_as_plain_integer() {
        let pos = GridPosition::new(7).unwrap();
        assert_eq!(serde_json::to_string(&pos).unwrap(), "7");
        let back: GridPosition = serde_json::from_str("7").unwrap();
        assert_eq!(back, pos);
        assert!(serde_json::from_str::<GridPosition>("9").is_err());
    }
}
