use crate::model::chart::CellRef;
use crate::model::grid::{GridPosition, Slot};
use crate::model::view::{ViewMode, ViewState};

/// Error type for view transitions that are not allowed in the current state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error("already focused on a sub-goal; go back to the overview first")]
    NotInOverview,
    #[error("the center cell cannot be zoomed into")]
    CenterPosition,
    #[error("already at the overview")]
    NotFocused,
}

/// What a "clear current view" request resets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearRequest {
    /// Everything: main goal, sub-goals and tasks
    WholeChart,
    /// One sub-goal and its eight tasks
    Subtree(usize),
}

/// Result of activating (double-clicking / pressing Enter on) a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    ZoomedIn(usize),
    BackToMain,
    Nothing,
}

/// State machine over the overview (MAIN) and a focused sub-goal (SUB).
///
/// Starts in MAIN with nothing selected. There is no terminal state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewNavigator {
    state: ViewState,
}

impl ViewNavigator {
    pub fn new() -> Self {
        ViewNavigator::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn mode(&self) -> ViewMode {
        self.state.mode
    }

    pub fn selection(&self) -> Option<CellRef> {
        self.state.selection
    }

    /// MAIN → SUB(idx) for an outer position. Clears the selection.
    pub fn zoom_in(&mut self, pos: GridPosition) -> Result<usize, NavError> {
        if !self.state.mode.is_main() {
            return Err(NavError::NotInOverview);
        }
        match pos.slot() {
            Slot::Center => Err(NavError::CenterPosition),
            Slot::Outer(idx) => {
                self.state = ViewState::sub(idx);
                Ok(idx)
            }
        }
    }

    /// SUB → MAIN. Clears the focus and the selection.
    pub fn back_to_main(&mut self) -> Result<(), NavError> {
        if self.state.mode.is_main() {
            return Err(NavError::NotFocused);
        }
        self.state = ViewState::main();
        Ok(())
    }

    /// Select the cell at `pos` without changing the mode.
    pub fn select_cell(&mut self, pos: GridPosition) -> Option<CellRef> {
        self.state.selection = self.state.resolve(pos);
        self.state.selection
    }

    /// Double activation: an outer cell in MAIN zooms in, the center in SUB
    /// goes back. Anything else does nothing.
    pub fn activate(&mut self, pos: GridPosition) -> Activation {
        match (self.state.mode, pos.slot()) {
            (ViewMode::Main, Slot::Outer(_)) => match self.zoom_in(pos) {
                Ok(idx) => Activation::ZoomedIn(idx),
                Err(_) => Activation::Nothing,
            },
            (ViewMode::Sub(_), Slot::Center) => match self.back_to_main() {
                Ok(()) => Activation::BackToMain,
                Err(_) => Activation::Nothing,
            },
            _ => Activation::Nothing,
        }
    }

    /// What clearing the current view would reset. Does not change the mode;
    /// the caller performs the reset once the user confirms.
    pub fn clear_current_view(&self) -> ClearRequest {
        match self.state.mode {
            ViewMode::Main => ClearRequest::WholeChart,
            ViewMode::Sub(f) => ClearRequest::Subtree(f),
        }
    }

    pub fn clear_selection(&mut self) {
        self.state.selection = None;
    }

    /// Back to the initial state (MAIN, nothing selected).
    pub fn reset(&mut self) {
        self.state = ViewState::main();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(p: u8) -> GridPosition {
        GridPosition::new(p).unwrap()
    }

    #[test]
    fn starts_in_main_without_selection() {
        let nav = ViewNavigator::new();
        assert_eq!(nav.mode(), ViewMode::Main);
        assert_eq!(nav.selection(), None);
    }

    #[test]
    fn zoom_in_maps_position_to_focus() {
        let mut nav = ViewNavigator::new();
        nav.select_cell(pos(1));
        assert_eq!(nav.zoom_in(pos(8)), Ok(4));
        assert_eq!(nav.mode(), ViewMode::Sub(4));
        assert_eq!(nav.selection(), None);
    }

    #[test]
    fn zoom_in_rejects_center_and_sub_mode() {
        let mut nav = ViewNavigator::new();
        assert_eq!(nav.zoom_in(GridPosition::CENTER), Err(NavError::CenterPosition));
        assert_eq!(nav.mode(), ViewMode::Main);

        nav.zoom_in(pos(0)).unwrap();
        assert_eq!(nav.zoom_in(pos(1)), Err(NavError::NotInOverview));
        assert_eq!(nav.mode(), ViewMode::Sub(0));
    }

    #[test]
    fn back_to_main_clears_focus_and_selection() {
        let mut nav = ViewNavigator::new();
        assert_eq!(nav.back_to_main(), Err(NavError::NotFocused));

        nav.zoom_in(pos(3)).unwrap();
        nav.select_cell(pos(0));
        nav.back_to_main().unwrap();
        assert_eq!(*nav.state(), ViewState::main());
    }

    #[test]
    fn select_cell_depends_on_mode() {
        let mut nav = ViewNavigator::new();
        assert_eq!(nav.select_cell(GridPosition::CENTER), Some(CellRef::Main));
        assert_eq!(nav.select_cell(pos(2)), Some(CellRef::SubGoal(2)));

        nav.zoom_in(pos(5)).unwrap();
        assert_eq!(nav.select_cell(GridPosition::CENTER), Some(CellRef::SubGoal(3)));
        // Task selection carries the focused sub-goal
        assert_eq!(nav.select_cell(pos(7)), Some(CellRef::Task(3, 5)));
        assert_eq!(nav.mode(), ViewMode::Sub(3));
    }

    #[test]
    fn activate_zooms_in_and_back() {
        let mut nav = ViewNavigator::new();
        assert_eq!(nav.activate(GridPosition::CENTER), Activation::Nothing);
        assert_eq!(nav.activate(pos(6)), Activation::ZoomedIn(6));
        assert_eq!(nav.activate(pos(0)), Activation::Nothing);
        assert_eq!(nav.activate(GridPosition::CENTER), Activation::BackToMain);
        assert_eq!(nav.mode(), ViewMode::Main);
    }

    #[test]
    fn clear_request_follows_mode() {
        let mut nav = ViewNavigator::new();
        assert_eq!(nav.clear_current_view(), ClearRequest::WholeChart);
        nav.zoom_in(pos(2)).unwrap();
        assert_eq!(nav.clear_current_view(), ClearRequest::Subtree(2));
        assert_eq!(nav.mode(), ViewMode::Sub(2));
    }
}
