use super::chart::{CellRef, SUB_GOAL_COUNT};
use super::grid::{GridPosition, Slot};

/// Which 3×3 grid is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Main goal in the center, sub-goals around it
    #[default]
    Main,
    /// A sub-goal in the center (the focus), its tasks around it
    Sub(usize),
}

impl ViewMode {
    /// The focused sub-goal index, if drilled in
    pub fn focus(self) -> Option<usize> {
        match self {
            ViewMode::Main => None,
            ViewMode::Sub(i) => Some(i),
        }
    }

    pub fn is_main(self) -> bool {
        self == ViewMode::Main
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Main => "MAIN",
            ViewMode::Sub(_) => "SUB",
        }
    }
}

/// Navigation state: the view mode plus the selected cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewState {
    pub mode: ViewMode,
    pub selection: Option<CellRef>,
}

impl ViewState {
    pub fn main() -> Self {
        ViewState::default()
    }

    pub fn sub(focus: usize) -> Self {
        ViewState {
            mode: ViewMode::Sub(focus),
            selection: None,
        }
    }

    /// Resolve a grid position to the cell it shows in this view.
    ///
    /// Returns `None` when the view is inconsistent (a focus outside 0..8).
    pub fn resolve(&self, pos: GridPosition) -> Option<CellRef> {
        match (self.mode, pos.slot()) {
            (ViewMode::Main, Slot::Center) => Some(CellRef::Main),
            (ViewMode::Main, Slot::Outer(i)) => Some(CellRef::SubGoal(i)),
            (ViewMode::Sub(f), _) if f >= SUB_GOAL_COUNT => None,
            (ViewMode::Sub(f), Slot::Center) => Some(CellRef::SubGoal(f)),
            (ViewMode::Sub(f), Slot::Outer(j)) => Some(CellRef::Task(f, j)),
        }
    }

    /// Grid position where a cell is shown in this view, if visible.
    pub fn position_of(&self, cell_ref: CellRef) -> Option<GridPosition> {
        GridPosition::all().find(|&pos| self.resolve(pos) == Some(cell_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(p: u8) -> GridPosition {
        GridPosition::new(p).unwrap()
    }

    #[test]
    fn main_view_resolution() {
        let view = ViewState::main();
        assert_eq!(view.resolve(GridPosition::CENTER), Some(CellRef::Main));
        assert_eq!(view.resolve(pos(0)), Some(CellRef::SubGoal(0)));
        assert_eq!(view.resolve(pos(5)), Some(CellRef::SubGoal(3)));
        assert_eq!(view.resolve(pos(3)), Some(CellRef::SubGoal(7)));
    }

    #[test]
    fn sub_view_resolution() {
        let view = ViewState::sub(2);
        assert_eq!(view.resolve(GridPosition::CENTER), Some(CellRef::SubGoal(2)));
        assert_eq!(view.resolve(pos(8)), Some(CellRef::Task(2, 4)));
        assert_eq!(view.resolve(pos(6)), Some(CellRef::Task(2, 6)));
    }

    #[test]
    fn inconsistent_focus_does_not_resolve() {
        let view = ViewState::sub(8);
        assert_eq!(view.resolve(GridPosition::CENTER), None);
        assert_eq!(view.resolve(pos(0)), None);
    }

    #[test]
    fn position_of_inverts_resolve() {
        let view = ViewState::sub(5);
        assert_eq!(view.position_of(CellRef::Task(5, 3)), Some(pos(5)));
        assert_eq!(view.position_of(CellRef::SubGoal(5)), Some(GridPosition::CENTER));
        assert_eq!(view.position_of(CellRef::Main), None);
        assert_eq!(view.position_of(CellRef::Task(4, 3)), None);
    }

    #[test]
    fn mode_focus() {
        assert_eq!(ViewMode::Main.focus(), None);
        assert_eq!(ViewMode::Sub(6).focus(), Some(6));
        assert_eq!(ViewMode::Sub(6).label(), "SUB");
    }
}
