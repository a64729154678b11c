use crate::model::cell::{Cell, CellPatch, Frequency};
use crate::model::chart::{CellRef, Chart, SUB_GOAL_COUNT, blank_tasks};
use crate::model::grid::{GridPosition, RING_LEN};
use crate::model::view::{ViewMode, ViewState};
use crate::ops::progress::recompute_sub_goal;

/// Error type for chart operations addressed by id
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("unknown cell id: {0} (expected main, sub-N or task-N-M with N, M in 0..7)")]
    UnknownCell(String),
    #[error("{0} is not a task; only tasks can be completed")]
    NotATask(String),
    #[error("{0} is not a task; only tasks have a frequency")]
    NoFrequency(String),
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// A fresh chart with canonical ids and no content.
pub fn create_empty() -> Chart {
    Chart::empty()
}

/// Reset everything. Same as [`create_empty`].
pub fn clear_chart() -> Chart {
    create_empty()
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// The cell shown at `pos` in `view`, or a blank cell if the position does
/// not resolve.
pub fn get_cell(chart: &Chart, view: &ViewState, pos: GridPosition) -> Cell {
    view.resolve(pos)
        .and_then(|r| chart.cell(r))
        .cloned()
        .unwrap_or_default()
}

/// Look up a cell by its canonical id.
pub fn find_cell<'a>(chart: &'a Chart, id: &str) -> Result<(CellRef, &'a Cell), ChartError> {
    let cell_ref = CellRef::parse(id).ok_or_else(|| ChartError::UnknownCell(id.to_string()))?;
    let cell = chart
        .cell(cell_ref)
        .ok_or_else(|| ChartError::UnknownCell(id.to_string()))?;
    Ok((cell_ref, cell))
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

/// Apply `patch` to the cell at `pos` in `view`.
///
/// Editing a task recomputes its sub-goal's progress in the same step.
/// Returns the chart unchanged when the position does not resolve.
pub fn update_cell(chart: &Chart, view: &ViewState, pos: GridPosition, patch: &CellPatch) -> Chart {
    match view.resolve(pos) {
        Some(cell_ref) => update_ref(chart, cell_ref, patch),
        None => chart.clone(),
    }
}

/// Apply `patch` to the cell at `cell_ref`.
pub fn update_ref(chart: &Chart, cell_ref: CellRef, patch: &CellPatch) -> Chart {
    let mut next = chart.clone();
    if let Some(cell) = next.cell_mut(cell_ref) {
        patch.apply(cell);
        if let CellRef::Task(sub, _) = cell_ref {
            recompute_sub_goal(&mut next, sub);
        }
    }
    next
}

/// Toggle completion of a task. Non-task cells are rejected.
pub fn toggle_task(chart: &Chart, cell_ref: CellRef) -> Result<Chart, ChartError> {
    if !cell_ref.is_task() {
        return Err(ChartError::NotATask(cell_ref.id()));
    }
    let done = chart.cell(cell_ref).is_some_and(Cell::completed);
    Ok(update_ref(chart, cell_ref, &CellPatch::completed(!done)))
}

/// Set how often a task recurs. Non-task cells are rejected.
pub fn set_frequency(
    chart: &Chart,
    cell_ref: CellRef,
    frequency: Frequency,
) -> Result<Chart, ChartError> {
    if !cell_ref.is_task() {
        return Err(ChartError::NoFrequency(cell_ref.id()));
    }
    Ok(update_ref(chart, cell_ref, &CellPatch::frequency(frequency)))
}

/// Reset sub-goal `sub` and its tasks to blank cells, keeping their ids.
pub fn clear_subtree(chart: &Chart, sub: usize) -> Chart {
    let mut next = chart.clone();
    if sub >= SUB_GOAL_COUNT {
        debug_assert!(false, "sub-goal index out of range: {}", sub);
        return next;
    }
    next.sub_goals[sub] = Cell::blank(CellRef::SubGoal(sub).id());
    next.tasks[sub] = blank_tasks(sub);
    next
}

/// Wholesale substitution, used by import.
pub fn replace_all(_chart: &Chart, incoming: Chart) -> Chart {
    incoming
}

/// Fill the empty cells of the current bucket with suggested ideas.
///
/// The bucket is the sub-goals in the main view and the focused sub-goal's
/// tasks in a sub view. Empty cells are filled in slot order, each taking the
/// next idea; at most the first eight ideas are considered and blank ideas are
/// skipped. Cells that already have text are never touched.
pub fn apply_suggestions(chart: &Chart, view: &ViewState, ideas: &[String]) -> Chart {
    let mut next = chart.clone();
    if view.mode.focus().is_some_and(|f| f >= SUB_GOAL_COUNT) {
        return next;
    }
    let mut ideas = ideas
        .iter()
        .take(RING_LEN)
        .map(|idea| idea.trim())
        .filter(|idea| !idea.is_empty());

    let bucket: &mut [Cell] = match view.mode {
        ViewMode::Main => &mut next.sub_goals,
        ViewMode::Sub(f) => &mut next.tasks[f],
    };

    let mut filled = 0;
    for cell in bucket.iter_mut().filter(|c| !c.has_text()) {
        match ideas.next() {
            Some(idea) => {
                cell.text = idea.to_string();
                filled += 1;
            }
            None => break,
        }
    }

    if let ViewMode::Sub(f) = view.mode
        && filled > 0
    {
        recompute_sub_goal(&mut next, f);
    }
    next
}

/// Text of the non-empty cells in the current bucket, passed to the
/// suggestion service so it does not repeat them.
pub fn existing_texts(chart: &Chart, view: &ViewState) -> Vec<String> {
    let bucket: &[Cell] = match view.mode {
        ViewMode::Main => &chart.sub_goals,
        ViewMode::Sub(f) => match chart.tasks.get(f) {
            Some(tasks) => tasks.as_slice(),
            None => return Vec::new(),
        },
    };
    bucket
        .iter()
        .filter(|c| c.has_text())
        .map(|c| c.text.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pos(p: u8) -> GridPosition {
        GridPosition::new(p).unwrap()
    }

    fn ideas(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("idea{}", i)).collect()
    }

    fn sample_chart() -> Chart {
        let mut chart = create_empty();
        chart.main_goal.text = "Become a pro pitcher".into();
        for (i, goal) in chart.sub_goals.iter_mut().enumerate() {
            goal.text = format!("goal {}", i);
        }
        chart.tasks[3][0].text = "Throw daily".into();
        chart.tasks[5][2].text = "Stretch".into();
        chart
    }

    #[test]
    fn get_cell_resolves_through_view() {
        let chart = sample_chart();
        assert_eq!(
            get_cell(&chart, &ViewState::main(), GridPosition::CENTER).text,
            "Become a pro pitcher"
        );
        // position 5 is outer index 3
        assert_eq!(get_cell(&chart, &ViewState::main(), pos(5)).text, "goal 3");
        assert_eq!(get_cell(&chart, &ViewState::sub(3), GridPosition::CENTER).text, "goal 3");
        assert_eq!(get_cell(&chart, &ViewState::sub(3), pos(0)).text, "Throw daily");
    }

    #[test]
    fn get_cell_returns_blank_sentinel_for_bad_view() {
        let chart = sample_chart();
        let cell = get_cell(&chart, &ViewState::sub(9), pos(0));
        assert_eq!(cell, Cell::default());
    }

    #[test]
    fn update_cell_in_main_view() {
        let chart = create_empty();
        let next = update_cell(&chart, &ViewState::main(), pos(2), &CellPatch::text("Health"));
        assert_eq!(next.sub_goals[2].text, "Health");
        // Input is untouched
        assert_eq!(chart.sub_goals[2].text, "");
    }

    #[test]
    fn update_task_recomputes_progress_in_same_step() {
        let view = ViewState::sub(1);
        let chart = create_empty();
        let chart = update_cell(&chart, &view, pos(0), &CellPatch::text("Run"));
        assert_eq!(chart.sub_goals[1].progress, Some(0));
        let chart = update_cell(&chart, &view, pos(1), &CellPatch::text("Swim"));
        let chart = update_cell(&chart, &view, pos(0), &CellPatch::completed(true));
        assert_eq!(chart.tasks[1][0].is_completed, Some(true));
        assert_eq!(chart.sub_goals[1].progress, Some(50));
    }

    #[test]
    fn update_center_in_sub_view_edits_sub_goal() {
        let chart = create_empty();
        let next = update_cell(&chart, &ViewState::sub(6), GridPosition::CENTER, &CellPatch::text("Mind"));
        assert_eq!(next.sub_goals[6].text, "Mind");
        assert_eq!(next.sub_goals[6].progress, None);
    }

    #[test]
    fn update_cell_unresolved_is_noop() {
        let chart = sample_chart();
        let next = update_cell(&chart, &ViewState::sub(12), pos(0), &CellPatch::text("x"));
        assert_eq!(next, chart);
    }

    #[test]
    fn toggle_task_flips_and_rejects_non_tasks() {
        let chart = sample_chart();
        let next = toggle_task(&chart, CellRef::Task(3, 0)).unwrap();
        assert!(next.tasks[3][0].completed());
        assert_eq!(next.sub_goals[3].progress, Some(100));
        let back = toggle_task(&next, CellRef::Task(3, 0)).unwrap();
        assert!(!back.tasks[3][0].completed());
        assert_eq!(back.sub_goals[3].progress, Some(0));

        assert!(matches!(
            toggle_task(&chart, CellRef::SubGoal(3)),
            Err(ChartError::NotATask(_))
        ));
    }

    #[test]
    fn frequency_only_on_tasks() {
        let chart = sample_chart();
        let next = set_frequency(&chart, CellRef::Task(5, 2), Frequency::Weekly).unwrap();
        assert_eq!(next.tasks[5][2].frequency, Some(Frequency::Weekly));
        assert!(matches!(
            set_frequency(&chart, CellRef::Main, Frequency::Daily),
            Err(ChartError::NoFrequency(_))
        ));
    }

    #[test]
    fn clear_subtree_only_touches_one_sub_goal() {
        let mut chart = sample_chart();
        chart.sub_goals[3].progress = Some(100);
        chart.tasks[3][0].is_completed = Some(true);
        chart.tasks[3][0].frequency = Some(Frequency::Daily);

        let next = clear_subtree(&chart, 3);
        for i in (0..SUB_GOAL_COUNT).filter(|&i| i != 3) {
            assert_eq!(next.sub_goals[i], chart.sub_goals[i]);
            assert_eq!(next.tasks[i], chart.tasks[i]);
        }
        assert_eq!(next.main_goal, chart.main_goal);
        assert_eq!(next.sub_goals[3], Cell::blank("sub-3"));
        assert_eq!(next.sub_goals[3].progress, None);
        for (j, task) in next.tasks[3].iter().enumerate() {
            assert_eq!(*task, Cell::blank(format!("task-3-{}", j)));
        }
    }

    #[test]
    fn clear_chart_is_empty() {
        assert_eq!(clear_chart(), create_empty());
    }

    #[test]
    fn replace_all_substitutes() {
        let chart = create_empty();
        let incoming = sample_chart();
        assert_eq!(replace_all(&chart, incoming.clone()), incoming);
    }

    #[test]
    fn suggestions_fill_only_empty_cells() {
        let mut chart = create_empty();
        chart.sub_goals[0].text = "x".into();

        let next = apply_suggestions(&chart, &ViewState::main(), &ideas(8));
        let texts: Vec<&str> = next.sub_goals.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["x", "idea1", "idea2", "idea3", "idea4", "idea5", "idea6", "idea7"]
        );
        assert_eq!(next.sub_goals[0].id, "sub-0");
    }

    #[test]
    fn suggestions_never_overwrite_gaps_between_filled() {
        let mut chart = create_empty();
        chart.sub_goals[1].text = "keep".into();
        chart.sub_goals[4].text = "also keep".into();

        let next = apply_suggestions(&chart, &ViewState::main(), &ideas(3));
        assert_eq!(next.sub_goals[0].text, "idea1");
        assert_eq!(next.sub_goals[1].text, "keep");
        assert_eq!(next.sub_goals[2].text, "idea2");
        assert_eq!(next.sub_goals[3].text, "idea3");
        assert_eq!(next.sub_goals[4].text, "also keep");
        assert_eq!(next.sub_goals[5].text, "");
    }

    #[test]
    fn suggestions_consider_only_first_eight_ideas() {
        let chart = create_empty();
        let mut many = ideas(12);
        many[0] = "   ".into();
        let next = apply_suggestions(&chart, &ViewState::main(), &many);
        // idea1 was blank; idea2..idea8 fill seven slots, idea9+ are ignored
        assert_eq!(next.sub_goals[0].text, "idea2");
        assert_eq!(next.sub_goals[6].text, "idea8");
        assert_eq!(next.sub_goals[7].text, "");
    }

    #[test]
    fn suggestions_in_sub_view_fill_tasks_and_update_progress() {
        let mut chart = sample_chart();
        chart.tasks[3][0].is_completed = Some(true);
        chart.sub_goals[3].progress = Some(100);

        let next = apply_suggestions(&chart, &ViewState::sub(3), &ideas(8));
        assert_eq!(next.tasks[3][0].text, "Throw daily");
        assert_eq!(next.tasks[3][1].text, "idea1");
        assert_eq!(next.tasks[3][7].text, "idea7");
        // 1 of 8 filled tasks done
        assert_eq!(next.sub_goals[3].progress, Some(13));
        // Other sub-goals untouched
        assert_eq!(next.tasks[5], chart.tasks[5]);
        assert_eq!(next.sub_goals, {
            let mut expected = chart.sub_goals.clone();
            expected[3].progress = Some(13);
            expected
        });
    }

    #[test]
    fn suggestions_with_no_ideas_change_nothing() {
        let chart = sample_chart();
        assert_eq!(apply_suggestions(&chart, &ViewState::main(), &[]), chart);
    }

    #[test]
    fn existing_texts_for_bucket() {
        let chart = sample_chart();
        assert_eq!(existing_texts(&chart, &ViewState::main()).len(), 8);
        assert_eq!(existing_texts(&chart, &ViewState::sub(5)), vec!["Stretch".to_string()]);
    }

    #[test]
    fn find_cell_by_id() {
        let chart = sample_chart();
        let (r, cell) = find_cell(&chart, "task-5-2").unwrap();
        assert_eq!(r, CellRef::Task(5, 2));
        assert_eq!(cell.text, "Stretch");
        assert!(matches!(find_cell(&chart, "task-9-9"), Err(ChartError::UnknownCell(_))));
    }
}
