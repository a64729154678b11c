use mandala::model::{CellRef, Frequency};
use mandala::ops::export::export_json;
use mandala::ops::validate::{ValidationError, validate};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Could not read fixture {}: {}", name, e))
}

#[test]
fn partial_chart_is_normalized() {
    let chart = validate(&fixture("partial_chart.json")).unwrap();
    assert_eq!(chart.main_goal.text, "Learn Spanish");
    assert_eq!(chart.sub_goals[2].id, "sub-2");
    assert_eq!(chart.sub_goals[7].id, "sub-7");
    assert_eq!(chart.tasks[2][0].id, "task-2-0");
    assert_eq!(chart.tasks[2][0].frequency, Some(Frequency::Weekly));
    assert_eq!(chart.tasks[2][0].notes.as_deref(), Some("Thursdays"));
    assert_eq!(
        chart.cell(CellRef::SubGoal(1)).unwrap().image_ref.as_deref(),
        Some("https://img.example/ears.png")
    );
}

#[test]
fn export_then_validate_is_stable() {
    let first = validate(&fixture("partial_chart.json")).unwrap();
    let exported = export_json(&first);
    let second = validate(&exported).unwrap();
    assert_eq!(second, first);
    // A second pass writes identical bytes
    assert_eq!(export_json(&second), exported);
}

#[test]
fn unknown_fields_survive_export() {
    let chart = validate(&fixture("partial_chart.json")).unwrap();
    let exported = export_json(&chart);
    let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
    assert_eq!(value["version"], 2);
    assert_eq!(value["mainGoal"]["theme"], "sunrise");
    // Legacy media field names are written back under the current name
    assert_eq!(value["subGoals"][1]["imageRef"], "https://img.example/ears.png");
    assert!(value["subGoals"][1].get("imageUrl").is_none());
    assert_eq!(value["subGoals"].as_array().unwrap().len(), 8);
    assert_eq!(value["tasks"][7].as_array().unwrap().len(), 8);
}

#[test]
fn bad_task_names_its_path() {
    let err = validate(&fixture("bad_task.json")).unwrap_err();
    assert!(matches!(err, ValidationError::BadCell { ref path, .. } if path == "tasks[0][1]"));
}
