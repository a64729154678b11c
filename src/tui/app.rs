use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::io::recovery::{self, RecoveryCategory};
use crate::io::workspace_io::{self, discover_workspace, load_workspace};
use crate::model::cell::CellPatch;
use crate::model::chart::CellRef;
use crate::model::grid::{Direction, GridPosition, index_to_position};
use crate::model::workspace::Workspace;
use crate::ops::assist::{
    self, AssistError, ChatService, CommandService, MediaGenerator, Suggester,
};
use crate::ops::navigate::{Activation, ClearRequest};
use crate::ops::panels::Panel;
use crate::ops::session::{
    PendingAction, Session, SessionEvent, SuggestionOutcome, SuggestionTicket,
};

use super::input;
use super::render;
use super::theme::Theme;

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    Edit,
    Confirm,
    Help,
}

/// What the edit line writes to when confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Text(CellRef),
    Notes(CellRef),
    Chat,
    ImagePrompt(CellRef),
    AnalyzePrompt(CellRef),
}

impl EditTarget {
    pub fn label(self) -> String {
        match self {
            EditTarget::Text(r) => format!("{} text", r),
            EditTarget::Notes(r) => format!("{} notes", r),
            EditTarget::Chat => "ask".to_string(),
            EditTarget::ImagePrompt(r) => format!("{} image prompt", r),
            EditTarget::AnalyzePrompt(r) => format!("{} image question", r),
        }
    }
}

/// Single-line edit buffer. `cursor` is a byte offset on a grapheme boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub target: EditTarget,
    pub buffer: String,
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Result of an assistant request that ran on the worker thread
#[derive(Debug)]
pub enum WorkerResult {
    Suggestion {
        ticket: SuggestionTicket,
        result: Result<Vec<String>, AssistError>,
    },
    ChatReply(Result<String, AssistError>),
    Image {
        cell_ref: CellRef,
        result: Result<Option<String>, AssistError>,
    },
    Analysis {
        cell_ref: CellRef,
        result: Result<String, AssistError>,
    },
}

/// Main application state
pub struct App {
    pub workspace: Workspace,
    pub session: Session,
    pub theme: Theme,
    pub mode: Mode,
    /// Grid position under the cursor
    pub cursor: GridPosition,
    pub edit: Option<EditState>,
    pub status: Option<StatusMessage>,
    /// Latest image description and the cell it belongs to
    pub analysis: Option<(CellRef, String)>,
    /// Requests still running on worker threads
    pub in_flight: usize,
    pub should_quit: bool,
    quit_armed: bool,
    unsaved: Rc<std::cell::Cell<bool>>,
    assist: Option<CommandService>,
    worker_tx: Sender<WorkerResult>,
    worker_rx: Receiver<WorkerResult>,
}

impl App {
    pub fn new(workspace: Workspace) -> Self {
        let mut session = Session::new(workspace.chart.clone(), &workspace.config);
        let unsaved = Rc::new(std::cell::Cell::new(false));
        let flag = Rc::clone(&unsaved);
        session.subscribe(Box::new(move |event| {
            if *event == SessionEvent::ChartChanged {
                flag.set(true);
            }
        }));
        session.select(GridPosition::CENTER);

        let theme = Theme::from_config(&workspace.config.ui, session.theme());
        let assist = CommandService::from_config(&workspace.config.assist);
        let (worker_tx, worker_rx) = mpsc::channel();

        App {
            workspace,
            session,
            theme,
            mode: Mode::Navigate,
            cursor: GridPosition::CENTER,
            edit: None,
            status: None,
            analysis: None,
            in_flight: 0,
            should_quit: false,
            quit_armed: false,
            unsaved,
            assist,
            worker_tx,
            worker_rx,
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved.get()
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    // -----------------------------------------------------------------------
    // Cursor and views
    // -----------------------------------------------------------------------

    fn place_cursor(&mut self, pos: GridPosition) {
        self.cursor = pos;
        self.session.select(pos);
    }

    pub fn move_cursor(&mut self, dir: Direction) {
        self.place_cursor(self.cursor.step(dir));
    }

    /// Enter on a cell: zoom in, go back, or edit the cell.
    pub fn activate(&mut self) {
        let focus = self.session.mode().focus();
        match self.session.activate(self.cursor) {
            Activation::ZoomedIn(_) => self.place_cursor(GridPosition::CENTER),
            Activation::BackToMain => {
                let pos = focus
                    .and_then(index_to_position)
                    .unwrap_or(GridPosition::CENTER);
                self.place_cursor(pos);
            }
            Activation::Nothing => {
                self.place_cursor(self.cursor);
                self.begin_text_edit();
            }
        }
    }

    /// Esc: leave the focused sub-goal, or drop the selection in the overview.
    pub fn go_back(&mut self) {
        let focus = self.session.mode().focus();
        match focus {
            Some(sub) => {
                if self.session.back_to_main().is_ok() {
                    let pos = index_to_position(sub).unwrap_or(GridPosition::CENTER);
                    self.place_cursor(pos);
                }
            }
            None => self.session.clear_selection(),
        }
    }

    fn selection_or_error(&mut self) -> Option<CellRef> {
        let selection = self.session.selection();
        if selection.is_none() {
            self.set_error("select a cell first");
        }
        selection
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    fn start_edit(&mut self, target: EditTarget, initial: String) {
        self.edit = Some(EditState {
            target,
            cursor: initial.len(),
            buffer: initial,
        });
        self.mode = Mode::Edit;
    }

    pub fn begin_text_edit(&mut self) {
        if let Some(cell_ref) = self.selection_or_error() {
            let text = self.session.selected_cell().map(|c| c.text.clone());
            self.start_edit(EditTarget::Text(cell_ref), text.unwrap_or_default());
        }
    }

    pub fn begin_notes_edit(&mut self) {
        if let Some(cell_ref) = self.selection_or_error() {
            let notes = self.session.selected_cell().and_then(|c| c.notes.clone());
            self.start_edit(EditTarget::Notes(cell_ref), notes.unwrap_or_default());
        }
    }

    pub fn begin_chat_input(&mut self) {
        if self.session.open_panel() != Some(Panel::Chat) {
            let _ = self.session.toggle_panel(Panel::Chat);
        }
        self.start_edit(EditTarget::Chat, String::new());
    }

    pub fn begin_image_prompt(&mut self) {
        if let Some(cell_ref) = self.selection_or_error() {
            let text = self.session.selected_cell().map(|c| c.text.clone());
            self.start_edit(EditTarget::ImagePrompt(cell_ref), text.unwrap_or_default());
        }
    }

    /// Ask a question about the selected cell's image; opens the media panel.
    pub fn begin_analyze_prompt(&mut self) {
        let Some(cell_ref) = self.selection_or_error() else {
            return;
        };
        if self.session.selected_cell().and_then(|c| c.image_ref.as_ref()).is_none() {
            self.set_error(format!("{} has no image to describe", cell_ref));
            return;
        }
        if self.session.open_panel() != Some(Panel::Media) {
            self.toggle_panel(Panel::Media);
        }
        self.start_edit(EditTarget::AnalyzePrompt(cell_ref), String::new());
    }

    pub fn confirm_edit(&mut self) {
        self.mode = Mode::Navigate;
        let Some(edit) = self.edit.take() else {
            return;
        };
        let value = edit.buffer.trim().to_string();
        match edit.target {
            EditTarget::Text(cell_ref) => {
                self.session.update_ref(cell_ref, &CellPatch::text(value));
            }
            EditTarget::Notes(cell_ref) => {
                let notes = (!value.is_empty()).then_some(value);
                self.session.update_ref(cell_ref, &CellPatch::notes(notes));
            }
            EditTarget::Chat => self.send_chat(value),
            EditTarget::ImagePrompt(cell_ref) => self.generate_image(cell_ref, value),
            EditTarget::AnalyzePrompt(cell_ref) => self.analyze_image(cell_ref, value),
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
        self.mode = Mode::Navigate;
    }

    // -----------------------------------------------------------------------
    // Cell actions
    // -----------------------------------------------------------------------

    pub fn toggle_task(&mut self) {
        if let Some(cell_ref) = self.selection_or_error()
            && let Err(e) = self.session.toggle_task(cell_ref)
        {
            self.set_error(e.to_string());
        }
    }

    pub fn cycle_frequency(&mut self) {
        let Some(cell_ref) = self.selection_or_error() else {
            return;
        };
        match self.session.cycle_frequency(cell_ref) {
            Ok(freq) => self.set_status(format!("{} repeats {}", cell_ref, freq)),
            Err(e) => self.set_error(e.to_string()),
        }
    }

    pub fn remove_media(&mut self) {
        if self.session.set_selected_media(None) {
            self.set_status("Image removed");
        } else {
            self.set_error("select a cell first");
        }
    }

    // -----------------------------------------------------------------------
    // Panels and display
    // -----------------------------------------------------------------------

    pub fn toggle_panel(&mut self, panel: Panel) {
        if let Err(e) = self.session.toggle_panel(panel) {
            self.set_error(e.to_string());
        }
    }

    pub fn toggle_theme(&mut self) {
        let mode = self.session.toggle_theme();
        self.theme = Theme::from_config(&self.workspace.config.ui, mode);
    }

    pub fn cycle_font_size(&mut self) {
        let size = self.session.cycle_font_size();
        self.set_status(format!("Font size: {}", size.as_str()));
    }

    // -----------------------------------------------------------------------
    // Destructive actions
    // -----------------------------------------------------------------------

    pub fn request_clear(&mut self) {
        self.session.request_clear_current_view();
        self.mode = Mode::Confirm;
    }

    pub fn confirm_pending(&mut self) {
        self.mode = Mode::Navigate;
        let description = match self.session.pending() {
            Some(PendingAction::Clear(ClearRequest::WholeChart)) => "whole chart cleared".to_string(),
            Some(PendingAction::Clear(ClearRequest::Subtree(sub))) => {
                format!("sub-goal {} cleared", sub)
            }
            Some(PendingAction::Import(_)) => "chart replaced by import".to_string(),
            None => return,
        };
        let category = match self.session.pending() {
            Some(PendingAction::Import(_)) => RecoveryCategory::Import,
            _ => RecoveryCategory::Clear,
        };
        if let Some(previous) = self.session.confirm() {
            recovery::log_discarded_chart(
                &self.workspace.mandala_dir,
                category,
                &description,
                Vec::new(),
                &previous,
            );
            let pos = if self.session.mode().is_main() {
                GridPosition::CENTER
            } else {
                self.cursor
            };
            self.place_cursor(pos);
            self.set_status(format!("{} (kept in the recovery log)", description));
        }
    }

    pub fn cancel_pending(&mut self) {
        self.session.cancel();
        self.mode = Mode::Navigate;
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn save(&mut self) {
        self.workspace.chart = self.session.chart().clone();
        match workspace_io::save_chart(&self.workspace) {
            Ok(()) => {
                self.unsaved.set(false);
                self.set_status(format!("Wrote {}", self.workspace.config.chart.file));
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// Quit, asking once more when there are unsaved changes.
    pub fn request_quit(&mut self) {
        if self.has_unsaved_changes() && !self.quit_armed {
            self.quit_armed = true;
            self.set_error("unsaved changes: press q again to quit, w to write");
            return;
        }
        self.should_quit = true;
    }

    pub fn disarm_quit(&mut self) {
        self.quit_armed = false;
    }

    // -----------------------------------------------------------------------
    // Assistant
    // -----------------------------------------------------------------------

    fn assist_service(&mut self) -> Option<CommandService> {
        let service = self.assist.clone();
        if service.is_none() {
            self.set_error(AssistError::NotConfigured.to_string());
        }
        service
    }

    fn spawn_worker(&mut self, job: impl FnOnce() -> WorkerResult + Send + 'static) {
        let tx = self.worker_tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let _ = tx.send(job());
        });
    }

    /// Ask for ideas to fill the empty cells of the current view.
    pub fn suggest(&mut self) {
        let Some(service) = self.assist_service() else {
            return;
        };
        let ticket = match self.session.begin_suggestion() {
            Ok(ticket) => ticket,
            Err(e) => {
                self.set_error(e.to_string());
                return;
            }
        };
        self.spawn_worker(move || {
            let result = service.suggest(&ticket.request);
            WorkerResult::Suggestion { ticket, result }
        });
    }

    pub fn send_chat(&mut self, message: String) {
        if message.is_empty() {
            return;
        }
        let Some(service) = self.assist_service() else {
            return;
        };
        let history = self.session.chat().to_vec();
        self.session.push_user(message.clone());
        self.spawn_worker(move || WorkerResult::ChatReply(service.reply(&history, &message)));
    }

    /// Generate an image for `cell_ref`, or edit the one it already has.
    /// An empty prompt falls back to the cell's text.
    pub fn generate_image(&mut self, cell_ref: CellRef, prompt: String) {
        let Some(service) = self.assist_service() else {
            return;
        };
        let cell = self.session.chart().cell(cell_ref);
        let prompt = assist::image_prompt(&prompt, cell.map_or("", |c| c.text.as_str()));
        let existing = cell.and_then(|c| c.image_ref.clone());
        self.spawn_worker(move || {
            let result = match existing {
                Some(reference) => service.edit_image(&reference, &prompt),
                None => service.generate_image(&prompt),
            };
            WorkerResult::Image { cell_ref, result }
        });
    }

    /// Describe the image attached to `cell_ref`.
    pub fn analyze_image(&mut self, cell_ref: CellRef, prompt: String) {
        let Some(reference) = self
            .session
            .chart()
            .cell(cell_ref)
            .and_then(|c| c.image_ref.clone())
        else {
            self.set_error(format!("{} has no image to describe", cell_ref));
            return;
        };
        let Some(service) = self.assist_service() else {
            return;
        };
        let prompt = assist::analyze_prompt(&prompt).to_string();
        self.spawn_worker(move || {
            let result = service.analyze_image(&reference, &prompt);
            WorkerResult::Analysis { cell_ref, result }
        });
    }

    /// Apply everything the worker threads finished since the last call.
    pub fn poll_worker(&mut self) {
        while let Ok(message) = self.worker_rx.try_recv() {
            self.apply_worker_result(message);
        }
    }

    fn apply_worker_result(&mut self, message: WorkerResult) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match message {
            WorkerResult::Suggestion { ticket, result } => {
                match self.session.complete_suggestion(ticket, result) {
                    SuggestionOutcome::Applied(0) => self.set_status("No ideas to add"),
                    SuggestionOutcome::Applied(n) => {
                        self.set_status(format!("Filled {} cell{}", n, if n == 1 { "" } else { "s" }))
                    }
                    SuggestionOutcome::Stale => {
                        self.set_status("Suggestion discarded: the view changed")
                    }
                    SuggestionOutcome::Failed(e) => self.set_error(e.to_string()),
                }
            }
            WorkerResult::ChatReply(Ok(reply)) => self.session.push_model(reply),
            WorkerResult::ChatReply(Err(e)) => {
                self.session
                    .push_model("Sorry, I could not answer that. Please try again.");
                self.set_error(e.to_string());
            }
            WorkerResult::Image {
                cell_ref,
                result: Ok(Some(reference)),
            } => {
                self.session
                    .update_ref(cell_ref, &CellPatch::image(Some(reference)));
                self.set_status(format!("Image attached to {}", cell_ref));
            }
            WorkerResult::Image { result: Ok(None), .. } => {
                self.set_error("the assistant returned no image")
            }
            WorkerResult::Image { result: Err(e), .. } => self.set_error(e.to_string()),
            WorkerResult::Analysis {
                cell_ref,
                result: Ok(text),
            } => {
                self.analysis = Some((cell_ref, text));
                self.set_status(format!("Described the image on {}", cell_ref));
            }
            WorkerResult::Analysis { result: Err(e), .. } => self.set_error(e.to_string()),
        }
    }

    /// Block until one worker result arrives and apply it.
    #[cfg(test)]
    pub(crate) fn wait_for_worker(&mut self) {
        if let Ok(message) = self.worker_rx.recv_timeout(Duration::from_secs(10)) {
            self.apply_worker_result(message);
        }
    }
}

pub fn run(dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    // Discover and load the workspace
    let start = match dir {
        Some(d) => PathBuf::from(d),
        None => std::env::current_dir()?,
    };
    let root = discover_workspace(&start)?;
    let workspace = load_workspace(&root)?;

    let mut app = App::new(workspace);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }
        app.poll_worker();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
