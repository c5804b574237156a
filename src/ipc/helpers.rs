use crate::ipc::types::{AppState, Request};
use crate::store::{ClassRecord, Database};
use crate::visibility::normalize_id;

pub fn param_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

/// Identifier params arrive as strings or numbers depending on the client.
/// Hand back the raw value (Null when absent) and let normalization decide.
pub fn param_id(req: &Request, key: &str) -> serde_json::Value {
    req.params.get(key).cloned().unwrap_or(serde_json::Value::Null)
}

pub fn find_class_index(db: &Database, class_id: &serde_json::Value) -> Option<usize> {
    let wanted = normalize_id(class_id);
    if wanted.is_empty() {
        return None;
    }
    db.classes
        .iter()
        .position(|c| normalize_id(&c.id) == wanted)
}

pub fn roster_index(class: &ClassRecord, student_id: &serde_json::Value) -> Option<usize> {
    let wanted = normalize_id(student_id);
    if wanted.is_empty() {
        return None;
    }
    class
        .students
        .iter()
        .position(|s| normalize_id(&s.id) == wanted)
}

/// Write the in-memory store back to disk after a mutation.
pub fn persist(state: &AppState) -> anyhow::Result<()> {
    let (Some(workspace), Some(db)) = (state.workspace.as_ref(), state.db.as_ref()) else {
        return Ok(());
    };
    crate::store::save_store(workspace, db)
}
