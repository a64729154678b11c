/// Side panels next to the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Chat,
    Media,
    Progress,
}

impl Panel {
    pub fn title(self) -> &'static str {
        match self {
            Panel::Chat => "Assistant",
            Panel::Media => "Media",
            Panel::Progress => "Progress",
        }
    }
}

/// Error type for panel requests
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    #[error("select a cell first to use the media panel")]
    MediaNeedsSelection,
}

/// Keeps at most one side panel open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelController {
    open: Option<Panel>,
}

impl PanelController {
    pub fn new() -> Self {
        PanelController::default()
    }

    pub fn open_panel(&self) -> Option<Panel> {
        self.open
    }

    pub fn is_open(&self, panel: Panel) -> bool {
        self.open == Some(panel)
    }

    /// Open `panel`, closing any other. The media panel needs a selected cell.
    pub fn open(&mut self, panel: Panel, has_selection: bool) -> Result<(), PanelError> {
        if panel == Panel::Media && !has_selection {
            return Err(PanelError::MediaNeedsSelection);
        }
        self.open = Some(panel);
        Ok(())
    }

    /// Close `panel` if it is open, otherwise open it.
    pub fn toggle(&mut self, panel: Panel, has_selection: bool) -> Result<(), PanelError> {
        if self.is_open(panel) {
            self.open = None;
            return Ok(());
        }
        self.open(panel, has_selection)
    }

    pub fn close_all(&mut self) {
        self.open = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_one_closes_others() {
        let mut panels = PanelController::new();
        panels.open(Panel::Chat, false).unwrap();
        panels.open(Panel::Progress, false).unwrap();
        assert!(panels.is_open(Panel::Progress));
        assert!(!panels.is_open(Panel::Chat));
        assert!(!panels.is_open(Panel::Media));
    }

    #[test]
    fn toggle_closes_open_panel() {
        let mut panels = PanelController::new();
        panels.toggle(Panel::Chat, false).unwrap();
        assert_eq!(panels.open_panel(), Some(Panel::Chat));
        panels.toggle(Panel::Chat, false).unwrap();
        assert_eq!(panels.open_panel(), None);
    }

    #[test]
    fn toggle_switches_between_panels() {
        let mut panels = PanelController::new();
        panels.toggle(Panel::Chat, true).unwrap();
        panels.toggle(Panel::Media, true).unwrap();
        assert_eq!(panels.open_panel(), Some(Panel::Media));
    }

    #[test]
    fn media_without_selection_is_rejected() {
        let mut panels = PanelController::new();
        assert_eq!(panels.open(Panel::Media, false), Err(PanelError::MediaNeedsSelection));
        assert_eq!(panels.open_panel(), None);

        // State is unchanged even if another panel was open
        panels.open(Panel::Chat, false).unwrap();
        assert_eq!(panels.toggle(Panel::Media, false), Err(PanelError::MediaNeedsSelection));
        assert_eq!(panels.open_panel(), Some(Panel::Chat));
    }

    #[test]
    fn close_all() {
        let mut panels = PanelController::new();
        panels.open(Panel::Media, true).unwrap();
        panels.close_all();
        assert_eq!(panels.open_panel(), None);
    }
}
