use serde_json::{Map, Value};

use crate::model::cell::Cell;
use crate::model::chart::{CellRef, Chart, SUB_GOAL_COUNT, TASKS_PER_SUB_GOAL};

/// Error type for chart import validation
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("not valid JSON: {0}")]
    NotJson(#[from] serde_json::Error),
    #[error("top level must be a JSON object")]
    NotAnObject,
    #[error("missing or invalid mainGoal (expected an object)")]
    MissingMainGoal,
    #[error("missing or invalid {0} (expected an array)")]
    NotArray(String),
    #[error("{path}: {reason}")]
    BadCell { path: String, reason: String },
}

/// Parse and validate chart JSON from an external source.
pub fn validate(raw: &str) -> Result<Chart, ValidationError> {
    let value: Value = serde_json::from_str(raw)?;
    validate_value(value)
}

/// Validate an already-parsed JSON value and normalize it into a full chart.
///
/// Missing ids get their canonical value, short arrays are padded with blank
/// cells and entries past the eighth are ignored.
pub fn validate_value(value: Value) -> Result<Chart, ValidationError> {
    let Value::Object(mut top) = value else {
        return Err(ValidationError::NotAnObject);
    };

    let main_goal = match top.shift_remove("mainGoal") {
        Some(Value::Object(obj)) => read_cell(obj, CellRef::Main, "mainGoal")?,
        _ => return Err(ValidationError::MissingMainGoal),
    };
    let sub_goals = match top.shift_remove("subGoals") {
        Some(Value::Array(items)) => items,
        _ => return Err(ValidationError::NotArray("subGoals".into())),
    };
    let tasks = match top.shift_remove("tasks") {
        Some(Value::Array(rows)) => rows,
        _ => return Err(ValidationError::NotArray("tasks".into())),
    };

    let mut chart = Chart::empty();
    chart.main_goal = main_goal;

    for (i, item) in sub_goals.into_iter().take(SUB_GOAL_COUNT).enumerate() {
        let path = format!("subGoals[{}]", i);
        chart.sub_goals[i] = read_entry(item, CellRef::SubGoal(i), &path)?;
    }

    for (i, row) in tasks.into_iter().take(SUB_GOAL_COUNT).enumerate() {
        let path = format!("tasks[{}]", i);
        let Value::Array(items) = row else {
            return Err(ValidationError::NotArray(path));
        };
        for (j, item) in items.into_iter().take(TASKS_PER_SUB_GOAL).enumerate() {
            let path = format!("tasks[{}][{}]", i, j);
            chart.tasks[i][j] = read_entry(item, CellRef::Task(i, j), &path)?;
        }
    }

    chart.extra = top.into_iter().collect();
    Ok(chart)
}

fn read_entry(item: Value, slot: CellRef, path: &str) -> Result<Cell, ValidationError> {
    match item {
        Value::Object(obj) => read_cell(obj, slot, path),
        other => Err(bad_cell(
            path,
            format!("expected an object, found {}", type_name(&other)),
        )),
    }
}

fn read_cell(mut obj: Map<String, Value>, slot: CellRef, path: &str) -> Result<Cell, ValidationError> {
    if !obj.contains_key("id") || obj.get("id").is_some_and(Value::is_null) {
        obj.insert("id".into(), Value::String(slot.id()));
    }
    if let Some(progress) = obj.get("progress")
        && let Some(n) = progress.as_u64()
        && n > 100
    {
        return Err(bad_cell(path, format!("progress {} is above 100", n)));
    }
    serde_json::from_value(Value::Object(obj)).map_err(|e| bad_cell(path, e.to_string()))
}

fn bad_cell(path: &str, reason: String) -> ValidationError {
    ValidationError::BadCell {
        path: path.to_string(),
        reason,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cell::CellPatch;
    use crate::model::view::ViewState;
    use crate::ops::chart_ops::{apply_suggestions, update_ref};
    use crate::ops::export::export_json;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn rejects_non_json() {
        assert!(matches!(validate("{not json"), Err(ValidationError::NotJson(_))));
    }

    #[test]
    fn rejects_wrong_shape() {
        assert!(matches!(validate("[]"), Err(ValidationError::NotAnObject)));
        assert!(matches!(
            validate(r#"{"subGoals": [], "tasks": []}"#),
            Err(ValidationError::MissingMainGoal)
        ));
        assert!(matches!(
            validate(r#"{"mainGoal": "text", "subGoals": [], "tasks": []}"#),
            Err(ValidationError::MissingMainGoal)
        ));
        let err = validate(r#"{"mainGoal": {}, "subGoals": {}, "tasks": []}"#).unwrap_err();
        assert_eq!(err.to_string(), "missing or invalid subGoals (expected an array)");
        let err = validate(r#"{"mainGoal": {}, "subGoals": []}"#).unwrap_err();
        assert_eq!(err.to_string(), "missing or invalid tasks (expected an array)");
    }

    #[test]
    fn minimal_shape_is_padded() {
        let chart = validate(r#"{"mainGoal": {"text": "Go"}, "subGoals": [], "tasks": []}"#).unwrap();
        assert_eq!(chart.main_goal.id, "main");
        assert_eq!(chart.main_goal.text, "Go");
        assert_eq!(chart.sub_goals[7].id, "sub-7");
        assert_eq!(chart.tasks[7][7].id, "task-7-7");
        assert!(chart.extra.is_empty());
    }

    #[test]
    fn extra_entries_are_ignored() {
        let subs: Vec<Value> = (0..10).map(|i| json!({"text": format!("s{}", i)})).collect();
        let chart = validate_value(json!({"mainGoal": {}, "subGoals": subs, "tasks": []})).unwrap();
        assert_eq!(chart.sub_goals[7].text, "s7");
        assert_eq!(chart.sub_goals[7].id, "sub-7");
    }

    #[test]
    fn keeps_given_ids_and_unknown_fields() {
        let chart = validate_value(json!({
            "mainGoal": {"id": "root", "text": "Go", "color": "red"},
            "subGoals": [],
            "tasks": [[{"text": "t", "isCompleted": true, "imageUrl": "data:x"}]],
            "version": 2
        }))
        .unwrap();
        assert_eq!(chart.main_goal.id, "root");
        assert_eq!(chart.main_goal.extra["color"], json!("red"));
        assert_eq!(chart.tasks[0][0].id, "task-0-0");
        assert_eq!(chart.tasks[0][0].image_ref.as_deref(), Some("data:x"));
        assert_eq!(chart.extra["version"], json!(2));
    }

    #[test]
    fn bad_cells_name_their_path() {
        let err = validate_value(json!({"mainGoal": {}, "subGoals": [{}, 5], "tasks": []})).unwrap_err();
        assert_eq!(err.to_string(), "subGoals[1]: expected an object, found a number");

        let err = validate_value(json!({
            "mainGoal": {},
            "subGoals": [],
            "tasks": [[], [{}, {"isCompleted": "yes"}]]
        }))
        .unwrap_err();
        assert!(err.to_string().starts_with("tasks[1][1]: "), "{}", err);

        let err = validate_value(json!({"mainGoal": {}, "subGoals": [], "tasks": [{}]})).unwrap_err();
        assert_eq!(err.to_string(), "missing or invalid tasks[0] (expected an array)");
    }

    #[test]
    fn progress_above_100_is_rejected() {
        let err = validate_value(json!({
            "mainGoal": {},
            "subGoals": [{"text": "a", "progress": 150}],
            "tasks": []
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "subGoals[0]: progress 150 is above 100");
    }

    #[test]
    fn export_round_trips() {
        let mut chart = Chart::empty();
        chart = update_ref(&chart, CellRef::Main, &CellPatch::text("Run a marathon"));
        chart = apply_suggestions(
            &chart,
            &ViewState::main(),
            &["Endurance".to_string(), "Diet".to_string()],
        );
        chart = apply_suggestions(
            &chart,
            &ViewState::sub(0),
            &["Long run".to_string(), "Intervals".to_string()],
        );
        chart = update_ref(&chart, CellRef::Task(0, 1), &CellPatch::completed(true));
        chart = update_ref(&chart, CellRef::Task(0, 0), &CellPatch::notes(Some("Sundays".into())));
        chart.extra.insert("theme".into(), json!("dark"));

        let restored = validate(&export_json(&chart)).unwrap();
        assert_eq!(restored, chart);
        assert_eq!(restored.sub_goals[0].progress, Some(50));
    }
}
