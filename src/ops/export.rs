use chrono::NaiveDate;

use crate::model::chart::Chart;

/// Export format for `mandala export`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Text,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Text => "txt",
        }
    }
}

/// Pretty JSON with a trailing newline. Importable with [`super::validate::validate`].
pub fn export_json(chart: &Chart) -> String {
    // Chart only holds strings, numbers, bools and JSON values, so this cannot fail
    let mut out = serde_json::to_string_pretty(chart).unwrap_or_else(|_| "{}".to_string());
    out.push('\n');
    out
}

/// Plain-text outline of the chart. Lossy: ids, notes, media, completion and
/// unknown fields are dropped, and the result cannot be imported.
pub fn export_text(chart: &Chart, date: NaiveDate) -> String {
    let main = if chart.main_goal.has_text() {
        chart.main_goal.text.as_str()
    } else {
        "(undefined)"
    };
    let mut out = String::new();
    out.push_str(&format!("Mandala Chart - Main goal: {}\n", main));
    out.push_str(&format!("Date: {}\n\n", date.format("%Y-%m-%d")));
    out.push_str("================================\n\n");

    for (i, (sub, tasks)) in chart.sub_goals.iter().zip(chart.tasks.iter()).enumerate() {
        if !sub.has_text() && tasks.iter().all(|t| !t.has_text()) {
            continue;
        }
        let sub_text = if sub.has_text() { sub.text.as_str() } else { "(empty)" };
        out.push_str(&format!("[Area {}] Sub-goal: {}\n", i + 1, sub_text));
        for task in tasks.iter().filter(|t| t.has_text()) {
            out.push_str(&format!("  - {}\n", task.text));
        }
        out.push('\n');
    }
    out
}

/// `mandala-<main goal or untitled>-<date>.<ext>`, safe to use as a file name.
pub fn export_file_name(chart: &Chart, ext: &str, date: NaiveDate) -> String {
    let goal = chart.main_goal.text.trim();
    let goal = if goal.is_empty() { "untitled" } else { goal };
    let goal: String = goal
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!("mandala-{}-{}.{}", goal, date.format("%Y-%m-%d"), ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cell::Cell;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn text(s: &str) -> Cell {
        Cell {
            text: s.into(),
            ..Default::default()
        }
    }

    #[test]
    fn json_is_pretty_with_trailing_newline() {
        let out = export_json(&Chart::empty());
        assert!(out.starts_with("{\n  \"mainGoal\": {\n    \"id\": \"main\",\n    \"text\": \"\"\n  },"));
        assert!(out.ends_with("}\n"));
        assert!(!out.ends_with("\n\n"));
    }

    #[test]
    fn text_skips_empty_areas() {
        let mut chart = Chart::empty();
        chart.main_goal = text("Get fit");
        chart.sub_goals[0] = text("Run");
        chart.tasks[0][0] = text("5k on Monday");
        chart.tasks[0][2] = text("Stretch");
        chart.tasks[2][3] = text("Meal prep");

        insta::assert_snapshot!(export_text(&chart, date()).trim_end(), @r"
        Mandala Chart - Main goal: Get fit
        Date: 2026-03-14

        ================================

        [Area 1] Sub-goal: Run
          - 5k on Monday
          - Stretch

        [Area 3] Sub-goal: (empty)
          - Meal prep
        ");
    }

    #[test]
    fn text_of_empty_chart() {
        assert_eq!(
            export_text(&Chart::empty(), date()),
            "Mandala Chart - Main goal: (undefined)\nDate: 2026-03-14\n\n================================\n\n"
        );
    }

    #[test]
    fn file_names() {
        let mut chart = Chart::empty();
        assert_eq!(
            export_file_name(&chart, "json", date()),
            "mandala-untitled-2026-03-14.json"
        );
        chart.main_goal = text("Work/Life\\Balance");
        assert_eq!(
            export_file_name(&chart, ExportFormat::Text.extension(), date()),
            "mandala-Work-Life-Balance-2026-03-14.txt"
        );
    }
}
