use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{find_class_index, param_id, param_str, persist};
use crate::ipc::types::{AppState, Request};
use crate::store::{AssignedTo, AssignmentRecord};
use crate::visibility::{find_class_for_student, normalize_id, resolve_student_assignments};
use serde_json::json;
use uuid::Uuid;

fn handle_assignments_publish(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(db) = state.db.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let class_id = param_id(req, "classId");
    let Some(idx) = find_class_index(db, &class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };

    let title = match param_str(req, "title") {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing title", None),
    };
    if title.is_empty() {
        return err(&req.id, "bad_params", "title must not be empty", None);
    }

    // Targeting is stored exactly as published: the "all" keyword, an id
    // list (entries may be strings or numbers), or nothing at all. Shapes
    // beyond those are rejected here rather than silently coerced.
    let assigned_to = match req.params.get("assignedTo") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(AssignedTo::Keyword(s.clone())),
        Some(serde_json::Value::Array(ids)) => Some(AssignedTo::Ids(ids.clone())),
        Some(_) => {
            return err(
                &req.id,
                "bad_params",
                "assignedTo must be \"all\" or an array of student ids",
                None,
            )
        }
    };
    let assigned_to_all = req.params.get("assignedToAll").and_then(|v| v.as_bool());

    let assignment_id = Uuid::new_v4().to_string();
    let published_at = chrono::Utc::now().to_rfc3339();
    db.classes[idx].assignments.push(AssignmentRecord {
        id: json!(assignment_id),
        title: title.clone(),
        instructions: param_str(req, "instructions").map(|s| s.to_string()),
        assigned_to_all,
        assigned_to,
        published_at: Some(published_at.clone()),
    });

    if let Err(e) = persist(state) {
        return err(&req.id, "store_save_failed", format!("{e:?}"), None);
    }
    ok(
        &req.id,
        json!({ "assignmentId": assignment_id, "title": title, "publishedAt": published_at }),
    )
}

fn handle_assignments_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(db) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let class_id = param_id(req, "classId");
    let Some(idx) = find_class_index(db, &class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };

    let assignments: Vec<serde_json::Value> = db.classes[idx]
        .assignments
        .iter()
        .map(|a| serde_json::to_value(a).unwrap_or(json!({})))
        .collect();
    ok(&req.id, json!({ "assignments": assignments }))
}

fn handle_assignments_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(db) = state.db.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let class_id = param_id(req, "classId");
    let Some(idx) = find_class_index(db, &class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };

    let assignment_id = normalize_id(&param_id(req, "assignmentId"));
    let before = db.classes[idx].assignments.len();
    db.classes[idx]
        .assignments
        .retain(|a| normalize_id(&a.id) != assignment_id);
    if db.classes[idx].assignments.len() == before {
        return err(&req.id, "not_found", "assignment not found", None);
    }

    if let Err(e) = persist(state) {
        return err(&req.id, "store_save_failed", format!("{e:?}"), None);
    }
    ok(&req.id, json!({ "ok": true }))
}

/// The student-facing query: which assignments may this student see right
/// now. An unknown student is not an error; the result carries a null
/// classId and an empty list so the caller can tell "not enrolled" from
/// "enrolled, nothing assigned".
fn handle_assignments_for_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(db) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let student_id = param_id(req, "studentId");
    let hint = req.params.get("classId");

    let class_id = match find_class_for_student(&student_id, &db.classes, hint) {
        Some(class) => class.id.clone(),
        None => serde_json::Value::Null,
    };
    let assignments: Vec<serde_json::Value> =
        resolve_student_assignments(&student_id, hint, &db.classes)
            .into_iter()
            .map(|a| serde_json::to_value(a).unwrap_or(json!({})))
            .collect();
    ok(
        &req.id,
        json!({ "classId": class_id, "assignments": assignments }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.publish" => Some(handle_assignments_publish(state, req)),
        "assignments.list" => Some(handle_assignments_list(state, req)),
        "assignments.delete" => Some(handle_assignments_delete(state, req)),
        "assignments.forStudent" => Some(handle_assignments_for_student(state, req)),
        _ => None,
    }
}
