use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "mandala", about = concat!("mandala v", env!("CARGO_PKG_VERSION"), " - one goal, eight areas, sixty-four tasks"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "workspace-dir", global = true)]
    pub workspace_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a mandala workspace in the current directory
    Init(InitArgs),
    /// Show the main grid, or one sub-goal with its tasks
    Show(ShowArgs),
    /// Show one cell
    Get(CellIdArg),
    /// Set the text of a cell
    Set(SetArgs),
    /// Set or clear the notes of a cell
    Note(NoteArgs),
    /// Mark a task completed
    Done(CellIdArg),
    /// Mark a task not completed
    Undone(CellIdArg),
    /// Set how often a task recurs
    Freq(FreqArgs),
    /// Attach an image reference to a cell
    Media(MediaArgs),
    /// Ask the assistant to describe a cell's image
    Analyze(AnalyzeArgs),
    /// Show progress per sub-goal
    Progress,
    /// Ask the assistant to fill empty cells
    Suggest(SuggestArgs),
    /// Reset the whole chart or one sub-goal
    Clear(ClearArgs),
    /// Replace the chart with a chart JSON file
    Import(ImportArgs),
    /// Write the chart as JSON or text
    Export(ExportArgs),
    /// Check a chart JSON file without importing it
    Validate(ValidateArgs),
    /// Read or change config.toml
    Config(ConfigCmd),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

#[derive(Args)]
pub struct InitArgs {
    /// Text of the main goal
    #[arg(long)]
    pub goal: Option<String>,
    /// Overwrite an existing mandala/config.toml
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ShowArgs {
    /// Sub-goal to focus (0-7)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..8))]
    pub sub: Option<u8>,
}

#[derive(Args)]
pub struct CellIdArg {
    /// Cell id: main, sub-N or task-N-M
    pub id: String,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SetArgs {
    /// Cell id: main, sub-N or task-N-M
    pub id: String,
    /// New text (empty clears the cell text)
    pub text: String,
}

#[derive(Args)]
pub struct NoteArgs {
    /// Cell id: main, sub-N or task-N-M
    pub id: String,
    /// Note text (omit to clear)
    pub text: Option<String>,
}

#[derive(Args)]
pub struct FreqArgs {
    /// Task id: task-N-M
    pub id: String,
    /// one-time, daily or weekly
    pub frequency: String,
}

#[derive(Args)]
pub struct MediaArgs {
    /// Cell id: main, sub-N or task-N-M
    pub id: String,
    /// Image reference (URL, path or data URI); omit to remove
    pub image: Option<String>,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Cell id: main, sub-N or task-N-M
    pub id: String,
    /// Question about the image (default: "What is in this image?")
    pub prompt: Option<String>,
}

#[derive(Args)]
pub struct SuggestArgs {
    /// Suggest tasks for this sub-goal instead of sub-goals (0-7)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..8))]
    pub sub: Option<u8>,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Clear only this sub-goal and its tasks (0-7)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..8))]
    pub sub: Option<u8>,
    /// Confirm the reset
    #[arg(long)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Import / export
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ImportArgs {
    /// Chart JSON file
    pub file: String,
    /// Confirm replacing the current chart
    #[arg(long)]
    pub yes: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormatArg {
    Json,
    Text,
}

#[derive(Args)]
pub struct ExportArgs {
    #[arg(long, value_enum, default_value = "json")]
    pub format: ExportFormatArg,
    /// Output file; `-` for stdout. Default: a dated file name in the
    /// current directory
    #[arg(short = 'o', long)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Chart JSON file
    pub file: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a value, e.g. `ui.theme`
    Get { key: String },
    /// Set a value, e.g. `ui.theme light`
    Set { key: String, value: String },
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries
    Prune(RecoveryPruneArgs),
    /// Print the path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove entries older than this timestamp (default: 30 days ago)
    #[arg(long)]
    pub before: Option<String>,
    /// Remove all entries
    #[arg(long)]
    pub all: bool,
}
