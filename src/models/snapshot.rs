use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The synchronized application state, stored as one JSON document per
/// account. The server only looks inside `todos`/`recurring_todos` far
/// enough to stamp timestamps; everything else is carried opaquely for the
/// UI layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub todos: Vec<Todo>,
    pub recurring_todos: Vec<RecurringTodo>,
    pub pause_logs: Vec<Value>,
    pub timer_state: Option<Value>,
    pub recurring_added_today: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// UI-owned fields (list assignment, focus-cycle counters, ...) pass
    /// through sync untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTodo {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Partial snapshot as sent by Push: every field optional, absent means
/// "keep the stored value". `timer_state` is double-optional because it is
/// itself nullable — an explicit JSON `null` clears it, absence keeps it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todos: Option<Vec<Todo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_todos: Option<Vec<RecurringTodo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_logs: Option<Vec<Value>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub timer_state: Option<Option<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_added_today: Option<Vec<String>>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

impl Snapshot {
    /// Fill any missing per-task `updated_at` with `now`. Run once at Setup
    /// so every task entering sync carries a timestamp.
    pub fn normalize(&mut self, now: i64) {
        for todo in &mut self.todos {
            todo.updated_at.get_or_insert(now);
        }
        for recurring in &mut self.recurring_todos {
            recurring.updated_at.get_or_insert(now);
        }
    }

    /// Apply a partial push: each present field replaces the stored value
    /// wholesale (last-write-wins, no per-entry merge), absent fields are
    /// preserved.
    pub fn apply(&mut self, patch: SnapshotPatch) {
        if let Some(todos) = patch.todos {
            self.todos = todos;
        }
        if let Some(recurring_todos) = patch.recurring_todos {
            self.recurring_todos = recurring_todos;
        }
        if let Some(pause_logs) = patch.pause_logs {
            self.pause_logs = pause_logs;
        }
        if let Some(timer_state) = patch.timer_state {
            self.timer_state = timer_state;
        }
        if let Some(markers) = patch.recurring_added_today {
            self.recurring_added_today = markers;
        }
    }

    pub fn task_count(&self) -> usize {
        self.todos.len() + self.recurring_todos.len()
    }
}

impl SnapshotPatch {
    pub fn task_count(&self) -> usize {
        self.todos.as_ref().map_or(0, Vec::len)
            + self.recurring_todos.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn todo(id: &str, updated_at: Option<i64>) -> Todo {
        Todo {
            id: id.to_string(),
            text: format!("task {id}"),
            completed: false,
            updated_at,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_normalize_stamps_missing_timestamps_only() {
        let mut snapshot = Snapshot {
            todos: vec![todo("t1", None), todo("t2", Some(500))],
            ..Default::default()
        };
        snapshot.normalize(1000);
        assert_eq!(snapshot.todos[0].updated_at, Some(1000));
        assert_eq!(snapshot.todos[1].updated_at, Some(500));
    }

    #[test]
    fn test_apply_absent_fields_preserved() {
        let mut snapshot = Snapshot {
            todos: vec![todo("t1", Some(1))],
            pause_logs: vec![json!({"at": 42})],
            timer_state: Some(json!({"mode": "focus"})),
            ..Default::default()
        };
        snapshot.apply(SnapshotPatch {
            todos: Some(vec![todo("t2", Some(2))]),
            ..Default::default()
        });
        assert_eq!(snapshot.todos[0].id, "t2");
        assert_eq!(snapshot.pause_logs.len(), 1);
        assert_eq!(snapshot.timer_state, Some(json!({"mode": "focus"})));
    }

    #[test]
    fn test_apply_replaces_wholesale_not_merge() {
        let mut snapshot = Snapshot {
            todos: vec![todo("t1", Some(1)), todo("t2", Some(2))],
            ..Default::default()
        };
        snapshot.apply(SnapshotPatch {
            todos: Some(vec![todo("t3", Some(3))]),
            ..Default::default()
        });
        assert_eq!(snapshot.todos.len(), 1);
        assert_eq!(snapshot.todos[0].id, "t3");
    }

    #[test]
    fn test_patch_null_timer_clears_absent_keeps() {
        let mut snapshot = Snapshot {
            timer_state: Some(json!({"mode": "focus"})),
            ..Default::default()
        };

        // Absent timerState keeps the stored value.
        let patch: SnapshotPatch = serde_json::from_value(json!({ "todos": [] })).unwrap();
        assert!(patch.timer_state.is_none());
        snapshot.apply(patch);
        assert!(snapshot.timer_state.is_some());

        // Explicit null clears it.
        let patch: SnapshotPatch =
            serde_json::from_value(json!({ "timerState": null })).unwrap();
        assert_eq!(patch.timer_state, Some(None));
        snapshot.apply(patch);
        assert!(snapshot.timer_state.is_none());
    }

    #[test]
    fn test_todo_extra_fields_roundtrip() {
        let raw = json!({
            "id": "t1",
            "text": "buy milk",
            "completed": false,
            "updatedAt": 99,
            "listId": "groceries",
            "cycles": 3
        });
        let todo: Todo = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(todo.extra["listId"], "groceries");
        assert_eq!(serde_json::to_value(&todo).unwrap(), raw);
    }
}
