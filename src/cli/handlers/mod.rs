mod init;
pub use init::cmd_init;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Global override for the workspace directory (set by -C flag)
static WORKSPACE_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::recovery::{self, RecoveryCategory};
use crate::io::workspace_io::{self, WorkspaceError};
use crate::io::config_io;
use crate::io::lock::{self, FileLock};
use crate::model::cell::{CellPatch, Frequency};
use crate::model::chart::CellRef;
use crate::model::grid::index_to_position;
use crate::model::view::ViewState;
use crate::model::workspace::Workspace;
use crate::ops::assist::{self, AssistError, CommandService, MediaGenerator, Suggester};
use crate::ops::chart_ops::{self, ChartError};
use crate::ops::export::{self, ExportFormat};
use crate::ops::navigate::ClearRequest;
use crate::ops::progress;
use crate::ops::session::{Session, SuggestionOutcome};
use crate::ops::validate;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;

    // Store -C override for load_workspace_cwd()
    if let Some(ref dir) = cli.workspace_dir {
        let abs = fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        if let Ok(mut slot) = WORKSPACE_DIR_OVERRIDE.lock() {
            slot.replace(abs);
        }
    }

    match cli.command {
        None => Err("no command given (try `mandala --help`)".into()),
        Some(cmd) => match cmd {
            // Init is handled in main.rs before workspace discovery
            Commands::Init(args) => cmd_init(args, cli.workspace_dir.as_deref()),

            // Read commands
            Commands::Show(args) => cmd_show(args, json),
            Commands::Get(args) => cmd_get(args, json),
            Commands::Progress => cmd_progress(json),
            Commands::Validate(args) => cmd_validate(args, json),

            // Write commands
            Commands::Set(args) => cmd_set(args),
            Commands::Note(args) => cmd_note(args),
            Commands::Done(args) => cmd_done(args, true),
            Commands::Undone(args) => cmd_done(args, false),
            Commands::Freq(args) => cmd_freq(args),
            Commands::Media(args) => cmd_media(args),
            Commands::Analyze(args) => cmd_analyze(args, json),
            Commands::Suggest(args) => cmd_suggest(args, json),

            // Destructive commands
            Commands::Clear(args) => cmd_clear(args),
            Commands::Import(args) => cmd_import(args),

            // Maintenance
            Commands::Export(args) => cmd_export(args),
            Commands::Config(args) => cmd_config(args),
            Commands::Recovery(args) => cmd_recovery(args, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start_dir() -> Result<PathBuf, WorkspaceError> {
    let overridden = WORKSPACE_DIR_OVERRIDE
        .lock()
        .ok()
        .and_then(|slot| slot.clone());
    match overridden {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().map_err(|source| WorkspaceError::Read {
            path: PathBuf::from("."),
            source,
        }),
    }
}

fn load_workspace_cwd() -> Result<Workspace, WorkspaceError> {
    let root = workspace_io::discover_workspace(&start_dir()?)?;
    workspace_io::load_workspace(&root)
}

fn parse_cell_id(id: &str) -> Result<CellRef, ChartError> {
    CellRef::parse(id).ok_or_else(|| ChartError::UnknownCell(id.to_string()))
}

/// Load the workspace, run `f` against a session over its chart and save the
/// chart if it changed. The workspace lock is held from load to save.
fn with_session<T>(
    f: impl FnOnce(&mut Session) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<(Workspace, T), Box<dyn std::error::Error>> {
    let root = workspace_io::discover_workspace(&start_dir()?)?;
    let _lock = FileLock::acquire(&root.join(workspace_io::MANDALA_DIR), lock::DEFAULT_TIMEOUT)?;
    let mut ws = workspace_io::load_workspace(&root)?;
    let mut session = Session::new(ws.chart.clone(), &ws.config);
    let result = f(&mut session)?;
    if *session.chart() != ws.chart {
        ws.chart = session.chart().clone();
        workspace_io::write_chart(&ws)?;
    }
    Ok((ws, result))
}

/// Move a session to the view where `sub` is focused.
fn focus_sub(session: &mut Session, sub: usize) -> Result<(), Box<dyn std::error::Error>> {
    let pos = index_to_position(sub).ok_or_else(|| format!("no sub-goal {}", sub))?;
    session.zoom_in(pos)?;
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

/// Column width of the text grid
const GRID_COL_WIDTH: usize = 18;

fn cmd_show(args: ShowArgs, json: bool) -> CmdResult {
    let ws = load_workspace_cwd()?;
    let view = match args.sub {
        Some(sub) => ViewState::sub(sub as usize),
        None => ViewState::main(),
    };
    if json {
        return print_json(&grid_to_json(&ws.chart, &view));
    }
    println!("{}", format_view_title(&ws.chart, &view));
    println!("{}", format_grid(&ws.chart, &view, GRID_COL_WIDTH));
    Ok(())
}

fn cmd_get(args: CellIdArg, json: bool) -> CmdResult {
    let ws = load_workspace_cwd()?;
    let (cell_ref, cell) = chart_ops::find_cell(&ws.chart, &args.id)?;
    if json {
        return print_json(cell);
    }
    println!("{}", format_cell_detail(cell_ref, cell));
    Ok(())
}

fn cmd_progress(json: bool) -> CmdResult {
    let ws = load_workspace_cwd()?;
    let summary = progress::summarize(&ws.chart);
    if json {
        return print_json(&summary);
    }
    println!("{}", format_progress(&summary));
    Ok(())
}

fn cmd_validate(args: ValidateArgs, json: bool) -> CmdResult {
    let text = fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file, e))?;
    match validate::validate(&text) {
        Ok(chart) => {
            if json {
                return print_json(&ValidationJson {
                    valid: true,
                    error: None,
                    main_goal: Some(chart.main_goal.text.clone()),
                    filled_cells: Some(filled_cells(&chart)),
                });
            }
            println!(
                "{}: valid chart, {} filled cells",
                args.file,
                filled_cells(&chart)
            );
            Ok(())
        }
        Err(e) => {
            if json {
                print_json(&ValidationJson {
                    valid: false,
                    error: Some(e.to_string()),
                    main_goal: None,
                    filled_cells: None,
                })?;
            }
            Err(format!("{}: {}", args.file, e).into())
        }
    }
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_set(args: SetArgs) -> CmdResult {
    let cell_ref = parse_cell_id(&args.id)?;
    with_session(|s| {
        s.update_ref(cell_ref, &CellPatch::text(args.text.trim()));
        Ok(())
    })?;
    println!("{} updated", cell_ref);
    Ok(())
}

fn cmd_note(args: NoteArgs) -> CmdResult {
    let cell_ref = parse_cell_id(&args.id)?;
    let notes = args.text.filter(|t| !t.trim().is_empty());
    let cleared = notes.is_none();
    with_session(|s| {
        s.update_ref(cell_ref, &CellPatch::notes(notes));
        Ok(())
    })?;
    if cleared {
        println!("{} notes cleared", cell_ref);
    } else {
        println!("{} notes updated", cell_ref);
    }
    Ok(())
}

fn cmd_done(args: CellIdArg, done: bool) -> CmdResult {
    let cell_ref = parse_cell_id(&args.id)?;
    let (ws, ()) = with_session(|s| Ok(s.set_completed(cell_ref, done)?))?;
    let sub = cell_ref.sub_index().unwrap_or_default();
    println!(
        "{} {} (sub-goal {} at {}%)",
        cell_ref,
        if done { "done" } else { "reopened" },
        sub,
        ws.chart.sub_goals[sub].progress_or_zero()
    );
    Ok(())
}

fn cmd_freq(args: FreqArgs) -> CmdResult {
    let cell_ref = parse_cell_id(&args.id)?;
    let frequency = Frequency::parse(args.frequency.trim()).ok_or_else(|| {
        format!(
            "unknown frequency \"{}\" (expected one-time, daily or weekly)",
            args.frequency
        )
    })?;
    with_session(|s| Ok(s.set_frequency(cell_ref, frequency)?))?;
    println!("{} repeats {}", cell_ref, frequency);
    Ok(())
}

fn cmd_media(args: MediaArgs) -> CmdResult {
    let cell_ref = parse_cell_id(&args.id)?;
    let image = args.image.filter(|i| !i.trim().is_empty());
    let removed = image.is_none();
    with_session(|s| {
        s.select_ref(cell_ref);
        s.set_selected_media(image);
        Ok(())
    })?;
    if removed {
        println!("{} image removed", cell_ref);
    } else {
        println!("{} image attached", cell_ref);
    }
    Ok(())
}

fn cmd_analyze(args: AnalyzeArgs, json: bool) -> CmdResult {
    let ws = load_workspace_cwd()?;
    let (cell_ref, cell) = chart_ops::find_cell(&ws.chart, &args.id)?;
    let reference = cell
        .image_ref
        .as_deref()
        .ok_or_else(|| format!("{} has no image to describe", cell_ref))?;
    let service =
        CommandService::from_config(&ws.config.assist).ok_or(AssistError::NotConfigured)?;
    let prompt = assist::analyze_prompt(args.prompt.as_deref().unwrap_or(""));
    let description = service.analyze_image(reference, prompt)?;
    if json {
        return print_json(&AnalysisJson {
            cell: cell_ref.id(),
            prompt: prompt.to_string(),
            description,
        });
    }
    println!("{}", description);
    Ok(())
}

fn cmd_suggest(args: SuggestArgs, json: bool) -> CmdResult {
    let config = load_workspace_cwd()?.config;
    let service =
        CommandService::from_config(&config.assist).ok_or(AssistError::NotConfigured)?;

    let (ws, (filled, ideas)) = with_session(|s| {
        if let Some(sub) = args.sub {
            focus_sub(s, sub as usize)?;
        }
        let ticket = s.begin_suggestion()?;
        let result = service.suggest(&ticket.request);
        let ideas = result.clone().unwrap_or_default();
        match s.complete_suggestion(ticket, result) {
            SuggestionOutcome::Applied(n) => Ok((n, ideas)),
            SuggestionOutcome::Stale => Err("suggestion no longer applies".into()),
            SuggestionOutcome::Failed(e) => Err(e.into()),
        }
    })?;

    let view = match args.sub {
        Some(sub) => ViewState::sub(sub as usize),
        None => ViewState::main(),
    };
    if json {
        return print_json(&SuggestJson {
            mode: mode_name(view.mode),
            filled,
            ideas,
        });
    }
    if filled == 0 {
        println!("No empty cells were filled");
        return Ok(());
    }
    println!("Filled {} cell{}", filled, if filled == 1 { "" } else { "s" });
    println!("{}", format_grid(&ws.chart, &view, GRID_COL_WIDTH));
    Ok(())
}

// ---------------------------------------------------------------------------
// Destructive commands
// ---------------------------------------------------------------------------

fn cmd_clear(args: ClearArgs) -> CmdResult {
    if !args.yes {
        let what = match args.sub {
            Some(sub) => format!("sub-goal {} and all of its tasks", sub),
            None => "the whole chart".to_string(),
        };
        return Err(format!("this clears {}; re-run with --yes to confirm", what).into());
    }
    let (ws, (request, previous)) = with_session(|s| {
        if let Some(sub) = args.sub {
            focus_sub(s, sub as usize)?;
        }
        let request = s.request_clear_current_view();
        let previous = s.confirm().ok_or("nothing to confirm")?;
        Ok((request, previous))
    })?;

    let description = match request {
        ClearRequest::WholeChart => "whole chart cleared".to_string(),
        ClearRequest::Subtree(sub) => format!("sub-goal {} cleared", sub),
    };
    recovery::log_discarded_chart(
        &ws.mandala_dir,
        RecoveryCategory::Clear,
        &description,
        Vec::new(),
        &previous,
    );
    println!("{}", capitalize(&description));
    Ok(())
}

fn cmd_import(args: ImportArgs) -> CmdResult {
    let incoming = workspace_io::read_chart(Path::new(&args.file))?;
    if !args.yes {
        return Err("importing replaces the current chart; re-run with --yes to confirm".into());
    }
    let (ws, previous) = with_session(|s| {
        s.request_import(incoming);
        Ok(s.confirm().ok_or("nothing to confirm")?)
    })?;
    recovery::log_discarded_chart(
        &ws.mandala_dir,
        RecoveryCategory::Import,
        "chart replaced by import",
        vec![("Source".to_string(), args.file.clone())],
        &previous,
    );
    println!(
        "Imported {} ({} filled cells)",
        args.file,
        filled_cells(&ws.chart)
    );
    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

fn cmd_export(args: ExportArgs) -> CmdResult {
    let ws = load_workspace_cwd()?;
    let today = Local::now().date_naive();
    let format = match args.format {
        ExportFormatArg::Json => ExportFormat::Json,
        ExportFormatArg::Text => ExportFormat::Text,
    };
    let content = match format {
        ExportFormat::Json => export::export_json(&ws.chart),
        ExportFormat::Text => export::export_text(&ws.chart, today),
    };

    match args.output.as_deref() {
        Some("-") => {
            print!("{}", content);
            Ok(())
        }
        target => {
            let path = match target {
                Some(path) => PathBuf::from(path),
                None => PathBuf::from(export::export_file_name(
                    &ws.chart,
                    format.extension(),
                    today,
                )),
            };
            recovery::atomic_write(&path, content.as_bytes())
                .map_err(|e| format!("could not write {}: {}", path.display(), e))?;
            println!("Exported to {}", path.display());
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config(args: ConfigCmd) -> CmdResult {
    let ws = load_workspace_cwd()?;
    match args.action {
        ConfigAction::Get { key } => {
            let (_, doc) = config_io::read_config(&ws.mandala_dir)?;
            let value = config_io::get_value(&doc, &key)
                .ok_or_else(|| format!("unknown config key \"{}\"", key))?;
            println!("{}", value);
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let _lock = FileLock::acquire(&ws.mandala_dir, lock::DEFAULT_TIMEOUT)?;
            let (_, mut doc) = config_io::read_config(&ws.mandala_dir)?;
            config_io::set_value(&mut doc, &key, &value)?;
            config_io::write_config(&ws.mandala_dir, &doc)?;
            println!("{} = {}", key, value);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

fn cmd_recovery(args: RecoveryCmd, json: bool) -> CmdResult {
    let ws = load_workspace_cwd()?;
    match args.action {
        None => {
            let limit = Some(args.limit.unwrap_or(10));
            let entries = recovery::read_recovery_entries(&ws.mandala_dir, limit);
            if json {
                let values: Vec<serde_json::Value> =
                    entries.iter().map(|e| e.to_json()).collect();
                return print_json(&values);
            }
            if entries.is_empty() {
                println!("No recovery entries");
            } else {
                println!("{}", format_recovery_entries(&entries));
            }
            Ok(())
        }
        Some(RecoveryAction::Path) => {
            println!("{}", recovery::recovery_log_path(&ws.mandala_dir).display());
            Ok(())
        }
        Some(RecoveryAction::Prune(prune)) => {
            let before = prune.before.as_deref().map(parse_before).transpose()?;
            let removed = recovery::prune_recovery(&ws.mandala_dir, before, prune.all)?;
            println!(
                "Removed {} recovery entr{}",
                removed,
                if removed == 1 { "y" } else { "ies" }
            );
            Ok(())
        }
    }
}

/// Accept an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
fn parse_before(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid --before value \"{}\" (use YYYY-MM-DD or RFC 3339)", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn before_accepts_dates_and_timestamps() {
        assert_eq!(
            parse_before("2026-03-01").unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_before("2026-03-01T12:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap()
        );
        assert!(parse_before("last week").is_err());
    }

    #[test]
    fn cell_ids_are_checked() {
        assert_eq!(parse_cell_id("task-3-4").unwrap(), CellRef::Task(3, 4));
        assert!(matches!(
            parse_cell_id("task-9-0"),
            Err(ChartError::UnknownCell(_))
        ));
    }

    #[test]
    fn capitalizes_first_letter() {
        assert_eq!(capitalize("whole chart cleared"), "Whole chart cleared");
        assert_eq!(capitalize(""), "");
    }
}
