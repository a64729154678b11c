use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::grid::RING_LEN;

/// Number of sub-goals around the main goal
pub const SUB_GOAL_COUNT: usize = RING_LEN;
/// Number of tasks around each sub-goal
pub const TASKS_PER_SUB_GOAL: usize = RING_LEN;

/// The full mandala chart: one main goal, eight sub-goals, eight tasks each.
///
/// Slots are stable identities (`sub-i`, `task-i-j`); operations only ever
/// change cell content, never the shape or order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub main_goal: Cell,
    pub sub_goals: [Cell; SUB_GOAL_COUNT],
    pub tasks: [[Cell; TASKS_PER_SUB_GOAL]; SUB_GOAL_COUNT],
    /// Top-level fields this version does not know about
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Default for Chart {
    fn default() -> Self {
        Chart::empty()
    }
}

impl Chart {
    /// A chart with deterministic ids and no content.
    pub fn empty() -> Self {
        Chart {
            main_goal: Cell::blank(CellRef::Main.id()),
            sub_goals: std::array::from_fn(|i| Cell::blank(CellRef::SubGoal(i).id())),
            tasks: std::array::from_fn(blank_tasks),
            extra: IndexMap::new(),
        }
    }

    pub fn cell(&self, cell_ref: CellRef) -> Option<&Cell> {
        match cell_ref {
            CellRef::Main => Some(&self.main_goal),
            CellRef::SubGoal(i) => self.sub_goals.get(i),
            CellRef::Task(i, j) => self.tasks.get(i)?.get(j),
        }
    }

    pub fn cell_mut(&mut self, cell_ref: CellRef) -> Option<&mut Cell> {
        match cell_ref {
            CellRef::Main => Some(&mut self.main_goal),
            CellRef::SubGoal(i) => self.sub_goals.get_mut(i),
            CellRef::Task(i, j) => self.tasks.get_mut(i)?.get_mut(j),
        }
    }

    /// True when no cell carries text
    pub fn is_blank(&self) -> bool {
        !self.main_goal.has_text()
            && self.sub_goals.iter().all(|c| !c.has_text())
            && self.tasks.iter().flatten().all(|c| !c.has_text())
    }
}

/// Eight blank tasks for sub-goal `sub`
pub fn blank_tasks(sub: usize) -> [Cell; TASKS_PER_SUB_GOAL] {
    std::array::from_fn(|j| Cell::blank(CellRef::Task(sub, j).id()))
}

/// Typed address of one cell in a chart.
///
/// The string form is the canonical cell id: `main`, `sub-3`, `task-3-5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellRef {
    Main,
    SubGoal(usize),
    Task(usize, usize),
}

impl CellRef {
    pub fn id(self) -> String {
        match self {
            CellRef::Main => "main".to_string(),
            CellRef::SubGoal(i) => format!("sub-{}", i),
            CellRef::Task(i, j) => format!("task-{}-{}", i, j),
        }
    }

    /// Parse a canonical id. Indices must be in range.
    pub fn parse(id: &str) -> Option<CellRef> {
        let id = id.trim();
        if id == "main" {
            return Some(CellRef::Main);
        }
        if let Some(rest) = id.strip_prefix("sub-") {
            let i = parse_index(rest)?;
            return Some(CellRef::SubGoal(i));
        }
        if let Some(rest) = id.strip_prefix("task-") {
            let (a, b) = rest.split_once('-')?;
            return Some(CellRef::Task(parse_index(a)?, parse_index(b)?));
        }
        None
    }

    /// The sub-goal this cell belongs to, if any
    pub fn sub_index(self) -> Option<usize> {
        match self {
            CellRef::Main => None,
            CellRef::SubGoal(i) | CellRef::Task(i, _) => Some(i),
        }
    }

    pub fn is_task(self) -> bool {
        matches!(self, CellRef::Task(..))
    }
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id())
    }
}

fn parse_index(s: &str) -> Option<usize> {
    s.parse::<usize>().ok().filter(|&i| i < SUB_GOAL_COUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chart_has_canonical_ids() {
        let chart = Chart::empty();
        assert_eq!(chart.main_goal.id, "main");
        assert_eq!(chart.sub_goals[0].id, "sub-0");
        assert_eq!(chart.sub_goals[7].id, "sub-7");
        assert_eq!(chart.tasks[2][5].id, "task-2-5");
        assert!(chart.is_blank());
    }

    #[test]
    fn cell_ref_id_round_trip() {
        let refs = [CellRef::Main, CellRef::SubGoal(4), CellRef::Task(7, 0)];
        for r in refs {
            assert_eq!(CellRef::parse(&r.id()), Some(r));
        }
    }

    #[test]
    fn cell_ref_rejects_out_of_range() {
        assert_eq!(CellRef::parse("sub-8"), None);
        assert_eq!(CellRef::parse("task-1-9"), None);
        assert_eq!(CellRef::parse("task-1"), None);
        assert_eq!(CellRef::parse("sub-x"), None);
        assert_eq!(CellRef::parse("center"), None);
    }

    #[test]
    fn cell_lookup_matches_ids() {
        let chart = Chart::empty();
        for i in 0..SUB_GOAL_COUNT {
            assert_eq!(chart.cell(CellRef::SubGoal(i)).unwrap().id, format!("sub-{}", i));
            for j in 0..TASKS_PER_SUB_GOAL {
                let r = CellRef::Task(i, j);
                assert_eq!(chart.cell(r).unwrap().id, r.id());
            }
        }
        assert!(chart.cell(CellRef::SubGoal(8)).is_none());
        assert!(chart.cell(CellRef::Task(0, 8)).is_none());
    }

    #[test]
    fn chart_json_uses_camel_case_keys() {
        let json = serde_json::to_value(Chart::empty()).unwrap();
        let obj = json.as_object().unwrap();
        let keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["mainGoal", "subGoals", "tasks"]);
        assert_eq!(obj["tasks"].as_array().unwrap().len(), 8);
    }
}
