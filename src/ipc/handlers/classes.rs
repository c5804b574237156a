use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{find_class_index, param_id, param_str, persist};
use crate::ipc::types::{AppState, Request};
use crate::store::ClassRecord;
use serde_json::json;
use uuid::Uuid;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(db) = state.db.as_ref() else {
        return ok(&req.id, json!({ "classes": [] }));
    };

    // Include basic counts so the teacher dashboard can render without a
    // follow-up request per class.
    let mut classes: Vec<serde_json::Value> = db
        .classes
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "name": c.name,
                "studentCount": c.students.len(),
                "assignmentCount": c.assignments.len()
            })
        })
        .collect();
    classes.sort_by(|a, b| {
        let an = a.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let bn = b.get("name").and_then(|v| v.as_str()).unwrap_or("");
        an.cmp(bn)
    });

    ok(&req.id, json!({ "classes": classes }))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(db) = state.db.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let name = match param_str(req, "name") {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing name", None),
    };
    if name.is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }

    let class_id = Uuid::new_v4().to_string();
    db.classes.push(ClassRecord {
        id: json!(class_id),
        name: name.clone(),
        students: Vec::new(),
        assignments: Vec::new(),
        behaviors: Vec::new(),
    });

    if let Err(e) = persist(state) {
        return err(&req.id, "store_save_failed", format!("{e:?}"), None);
    }
    ok(&req.id, json!({ "classId": class_id, "name": name }))
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(db) = state.db.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let class_id = param_id(req, "classId");
    let Some(idx) = find_class_index(db, &class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };

    // The class owns its roster, assignments, and behavior log; removing it
    // drops all of them. There is no separate assignment store to clean up.
    db.classes.remove(idx);

    if let Err(e) = persist(state) {
        return err(&req.id, "store_save_failed", format!("{e:?}"), None);
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        _ => None,
    }
}
