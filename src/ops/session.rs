use crate::model::cell::{Cell, CellPatch, Frequency};
use crate::model::chart::{CellRef, Chart};
use crate::model::config::{FontSize, MandalaConfig, ThemeMode};
use crate::model::grid::{GridPosition, index_to_position};
use crate::model::view::{ViewMode, ViewState};
use crate::ops::assist::{self, AssistError, ChatMessage, SuggestionRequest};
use crate::ops::chart_ops::{self, ChartError};
use crate::ops::navigate::{Activation, ClearRequest, NavError, ViewNavigator};
use crate::ops::panels::{Panel, PanelController, PanelError};

/// First message in every chat log
pub const GREETING: &str = "Hi! I'm your Mandala assistant. What would you like to plan today?";

/// Emitted synchronously after each state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ChartChanged,
    ViewChanged,
    PanelsChanged,
    ChatChanged,
}

pub type Observer = Box<dyn FnMut(&SessionEvent)>;

/// A destructive action waiting for the user to confirm it
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    Clear(ClearRequest),
    Import(Box<Chart>),
}

impl PendingAction {
    /// Question shown before performing the action
    pub fn prompt(&self) -> &'static str {
        match self {
            PendingAction::Clear(ClearRequest::WholeChart) => {
                "Clear everything, including all sub-goals and tasks?"
            }
            PendingAction::Clear(ClearRequest::Subtree(_)) => {
                "Clear this sub-goal and all of its tasks?"
            }
            PendingAction::Import(_) => "Importing replaces the current chart. Continue?",
        }
    }
}

/// Handle for one in-flight suggestion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionTicket {
    pub request: SuggestionRequest,
    mode: ViewMode,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionOutcome {
    /// Number of cells filled
    Applied(usize),
    /// The view or chart changed while the request was in flight
    Stale,
    Failed(AssistError),
}

/// All state of one planning session.
///
/// Owned by whichever surface drives it (a CLI command or the TUI app).
/// Every mutation goes through a method so observers see each change.
pub struct Session {
    chart: Chart,
    nav: ViewNavigator,
    panels: PanelController,
    chat: Vec<ChatMessage>,
    theme: ThemeMode,
    font_size: FontSize,
    pending: Option<PendingAction>,
    generation: u64,
    history_window: usize,
    min_context_chars: usize,
    observers: Vec<Observer>,
}

impl Session {
    pub fn new(chart: Chart, config: &MandalaConfig) -> Self {
        Session {
            chart,
            nav: ViewNavigator::new(),
            panels: PanelController::new(),
            chat: vec![ChatMessage::model(GREETING)],
            theme: config.ui.theme,
            font_size: config.ui.font_size,
            pending: None,
            generation: 0,
            history_window: config.assist.history_window,
            min_context_chars: config.assist.min_context_chars,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    fn emit(&mut self, event: SessionEvent) {
        for observer in self.observers.iter_mut() {
            observer(&event);
        }
    }

    fn set_chart(&mut self, chart: Chart) {
        if chart != self.chart {
            self.chart = chart;
            self.emit(SessionEvent::ChartChanged);
        }
    }

    /// Run a navigator change and emit `ViewChanged` if the view moved.
    fn navigate<T>(&mut self, f: impl FnOnce(&mut ViewNavigator) -> T) -> T {
        let before = *self.nav.state();
        let result = f(&mut self.nav);
        if *self.nav.state() != before {
            self.emit(SessionEvent::ViewChanged);
            if self.nav.selection().is_none() && self.panels.is_open(Panel::Media) {
                self.panels.close_all();
                self.emit(SessionEvent::PanelsChanged);
            }
        }
        result
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn view(&self) -> &ViewState {
        self.nav.state()
    }

    pub fn mode(&self) -> ViewMode {
        self.nav.mode()
    }

    pub fn selection(&self) -> Option<CellRef> {
        self.nav.selection()
    }

    pub fn selected_cell(&self) -> Option<&Cell> {
        self.chart.cell(self.nav.selection()?)
    }

    pub fn cell_at(&self, pos: GridPosition) -> Cell {
        chart_ops::get_cell(&self.chart, self.nav.state(), pos)
    }

    pub fn open_panel(&self) -> Option<Panel> {
        self.panels.open_panel()
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn font_size(&self) -> FontSize {
        self.font_size
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn select(&mut self, pos: GridPosition) -> Option<CellRef> {
        self.navigate(|nav| nav.select_cell(pos))
    }

    /// Select a cell by reference, switching views when it is not visible.
    pub fn select_ref(&mut self, cell_ref: CellRef) {
        self.navigate(|nav| {
            let visible = nav.state().position_of(cell_ref);
            let pos = match visible {
                Some(pos) => pos,
                None => {
                    nav.reset();
                    if let Some(sub) = cell_ref.sub_index()
                        && cell_ref.is_task()
                        && let Some(outer) = index_to_position(sub)
                    {
                        let _ = nav.zoom_in(outer);
                    }
                    match nav.state().position_of(cell_ref) {
                        Some(pos) => pos,
                        None => return,
                    }
                }
            };
            nav.select_cell(pos);
        });
    }

    pub fn zoom_in(&mut self, pos: GridPosition) -> Result<usize, NavError> {
        self.navigate(|nav| nav.zoom_in(pos))
    }

    pub fn back_to_main(&mut self) -> Result<(), NavError> {
        self.navigate(|nav| nav.back_to_main())
    }

    pub fn activate(&mut self, pos: GridPosition) -> Activation {
        self.navigate(|nav| nav.activate(pos))
    }

    pub fn clear_selection(&mut self) {
        self.navigate(|nav| nav.clear_selection());
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    pub fn update_cell(&mut self, pos: GridPosition, patch: &CellPatch) {
        let next = chart_ops::update_cell(&self.chart, self.nav.state(), pos, patch);
        self.set_chart(next);
    }

    pub fn update_ref(&mut self, cell_ref: CellRef, patch: &CellPatch) {
        let next = chart_ops::update_ref(&self.chart, cell_ref, patch);
        self.set_chart(next);
    }

    pub fn toggle_task(&mut self, cell_ref: CellRef) -> Result<(), ChartError> {
        let next = chart_ops::toggle_task(&self.chart, cell_ref)?;
        self.set_chart(next);
        Ok(())
    }

    /// Advance a task's frequency (one-time → daily → weekly → one-time).
    pub fn cycle_frequency(&mut self, cell_ref: CellRef) -> Result<Frequency, ChartError> {
        let current = self
            .chart
            .cell(cell_ref)
            .and_then(|c| c.frequency)
            .unwrap_or_default();
        let next_freq = current.next();
        let next = chart_ops::set_frequency(&self.chart, cell_ref, next_freq)?;
        self.set_chart(next);
        Ok(next_freq)
    }

    pub fn set_frequency(&mut self, cell_ref: CellRef, frequency: Frequency) -> Result<(), ChartError> {
        let next = chart_ops::set_frequency(&self.chart, cell_ref, frequency)?;
        self.set_chart(next);
        Ok(())
    }

    /// Mark a task done or not done regardless of its current state.
    pub fn set_completed(&mut self, cell_ref: CellRef, done: bool) -> Result<(), ChartError> {
        let is_done = self.chart.cell(cell_ref).is_some_and(Cell::completed);
        if is_done != done {
            self.toggle_task(cell_ref)?;
        } else if !cell_ref.is_task() {
            return Err(ChartError::NotATask(cell_ref.id()));
        }
        Ok(())
    }

    /// Set the image reference of the selected cell. Returns false (and does
    /// nothing) when no cell is selected.
    pub fn set_selected_media(&mut self, image_ref: Option<String>) -> bool {
        let Some(cell_ref) = self.nav.selection() else {
            return false;
        };
        self.update_ref(cell_ref, &CellPatch::image(image_ref));
        true
    }

    // -----------------------------------------------------------------------
    // Destructive actions
    // -----------------------------------------------------------------------

    /// Stage clearing whatever the current view shows.
    pub fn request_clear_current_view(&mut self) -> ClearRequest {
        let request = self.nav.clear_current_view();
        self.pending = Some(PendingAction::Clear(request));
        request
    }

    /// Stage replacing the chart with an already validated one.
    pub fn request_import(&mut self, chart: Chart) {
        self.pending = Some(PendingAction::Import(Box::new(chart)));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Perform the staged action. Returns the chart as it was before, so the
    /// caller can journal what was discarded.
    pub fn confirm(&mut self) -> Option<Chart> {
        let action = self.pending.take()?;
        let previous = self.chart.clone();
        match action {
            PendingAction::Clear(ClearRequest::WholeChart) => {
                self.set_chart(chart_ops::clear_chart());
                self.navigate(|nav| nav.reset());
            }
            PendingAction::Clear(ClearRequest::Subtree(sub)) => {
                let next = chart_ops::clear_subtree(&self.chart, sub);
                self.set_chart(next);
                self.navigate(|nav| nav.clear_selection());
            }
            PendingAction::Import(incoming) => {
                let next = chart_ops::replace_all(&self.chart, *incoming);
                self.set_chart(next);
                self.navigate(|nav| nav.reset());
            }
        }
        self.generation += 1;
        Some(previous)
    }

    // -----------------------------------------------------------------------
    // Panels and display
    // -----------------------------------------------------------------------

    pub fn toggle_panel(&mut self, panel: Panel) -> Result<(), PanelError> {
        let has_selection = self.nav.selection().is_some();
        self.panels.toggle(panel, has_selection)?;
        self.emit(SessionEvent::PanelsChanged);
        Ok(())
    }

    pub fn close_panels(&mut self) {
        if self.panels.open_panel().is_some() {
            self.panels.close_all();
            self.emit(SessionEvent::PanelsChanged);
        }
    }

    pub fn toggle_theme(&mut self) -> ThemeMode {
        self.theme = self.theme.toggled();
        self.emit(SessionEvent::ViewChanged);
        self.theme
    }

    pub fn cycle_font_size(&mut self) -> FontSize {
        self.font_size = self.font_size.next();
        self.emit(SessionEvent::ViewChanged);
        self.font_size
    }

    // -----------------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------------

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.chat.push(ChatMessage::user(text));
        self.emit(SessionEvent::ChatChanged);
    }

    pub fn push_model(&mut self, text: impl Into<String>) {
        self.chat.push(ChatMessage::model(text));
        self.emit(SessionEvent::ChatChanged);
    }

    /// The last `window` chat messages as `User:` / `AI:` lines
    pub fn transcript(&self, window: usize) -> String {
        assist::transcript(&self.chat, window)
    }

    // -----------------------------------------------------------------------
    // Suggestions
    // -----------------------------------------------------------------------

    /// Check the preconditions and capture the context of a suggestion.
    ///
    /// Starting a new suggestion makes any earlier ticket stale.
    pub fn begin_suggestion(&mut self) -> Result<SuggestionTicket, AssistError> {
        let view = *self.nav.state();
        // The seeded greeting carries no user intent
        let history = self.chat.get(1..).unwrap_or(&[]);
        let transcript = assist::transcript(history, self.history_window);
        let main_goal = self.chart.main_goal.text.clone();
        let (target, sub_goal) = match view.mode {
            ViewMode::Main => (main_goal.clone(), None),
            ViewMode::Sub(f) => {
                let text = self
                    .chart
                    .sub_goals
                    .get(f)
                    .map(|c| c.text.clone())
                    .unwrap_or_default();
                (text.clone(), Some(text))
            }
        };
        assist::check_context(
            &target,
            sub_goal.is_some(),
            &transcript,
            self.min_context_chars,
        )?;

        self.generation += 1;
        Ok(SuggestionTicket {
            request: SuggestionRequest {
                main_goal,
                sub_goal,
                existing: chart_ops::existing_texts(&self.chart, &view),
                transcript,
            },
            mode: view.mode,
            generation: self.generation,
        })
    }

    /// Apply a suggestion result if its context is still current.
    pub fn complete_suggestion(
        &mut self,
        ticket: SuggestionTicket,
        result: Result<Vec<String>, AssistError>,
    ) -> SuggestionOutcome {
        let ideas = match result {
            Ok(ideas) => ideas,
            Err(e) => return SuggestionOutcome::Failed(e),
        };
        if ticket.generation != self.generation || ticket.mode != self.nav.mode() {
            return SuggestionOutcome::Stale;
        }
        let view = ViewState {
            mode: ticket.mode,
            selection: None,
        };
        let before = chart_ops::existing_texts(&self.chart, &view).len();
        let next = chart_ops::apply_suggestions(&self.chart, &view, &ideas);
        let filled = chart_ops::existing_texts(&next, &view).len() - before;
        self.set_chart(next);
        SuggestionOutcome::Applied(filled)
    }
}
