use serde::Serialize;

use crate::model::cell::Cell;
use crate::model::chart::{Chart, SUB_GOAL_COUNT};

/// Completion percentage of a sub-goal derived from its tasks.
///
/// Only tasks with text count, in both the numerator and the denominator.
/// A sub-goal without any filled task is at 0.
pub fn sub_goal_progress(tasks: &[Cell]) -> u8 {
    let filled = tasks.iter().filter(|t| t.has_text()).count();
    let done = tasks
        .iter()
        .filter(|t| t.has_text() && t.completed())
        .count();
    percent(done, filled)
}

/// Mean progress over sub-goals that have text (0 if none do).
pub fn overall_progress(chart: &Chart) -> u8 {
    let filled: Vec<u8> = chart
        .sub_goals
        .iter()
        .filter(|g| g.has_text())
        .map(Cell::progress_or_zero)
        .collect();
    if filled.is_empty() {
        return 0;
    }
    let sum: usize = filled.iter().map(|&p| p as usize).sum();
    round_half_up(sum, filled.len())
}

/// Store the derived progress on sub-goal `sub`. Called after every task
/// mutation so the stored value never lags the tasks.
pub fn recompute_sub_goal(chart: &mut Chart, sub: usize) {
    if sub >= SUB_GOAL_COUNT {
        return;
    }
    let progress = sub_goal_progress(&chart.tasks[sub]);
    chart.sub_goals[sub].progress = Some(progress);
}

fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    round_half_up(part * 100, whole)
}

/// `num / den` rounded half up, for non-negative values
fn round_half_up(num: usize, den: usize) -> u8 {
    ((2 * num + den) / (2 * den)).min(100) as u8
}

/// Per-sub-goal progress figures
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubGoalProgress {
    pub index: usize,
    pub id: String,
    pub text: String,
    pub progress: u8,
    pub tasks_filled: usize,
    pub tasks_done: usize,
}

impl SubGoalProgress {
    pub fn is_complete(&self) -> bool {
        self.tasks_filled > 0 && self.progress == 100
    }
}

/// Progress overview of a whole chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub overall: u8,
    pub sub_goals: Vec<SubGoalProgress>,
}

pub fn summarize(chart: &Chart) -> ProgressSummary {
    let sub_goals = chart
        .sub_goals
        .iter()
        .zip(chart.tasks.iter())
        .enumerate()
        .map(|(index, (goal, tasks))| SubGoalProgress {
            index,
            id: goal.id.clone(),
            text: goal.text.clone(),
            progress: goal.progress_or_zero(),
            tasks_filled: tasks.iter().filter(|t| t.has_text()).count(),
            tasks_done: tasks
                .iter()
                .filter(|t| t.has_text() && t.completed())
                .count(),
        })
        .collect();
    ProgressSummary {
        overall: overall_progress(chart),
        sub_goals,
    }
}
