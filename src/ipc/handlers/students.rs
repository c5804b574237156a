use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{find_class_index, param_id, param_str, persist, roster_index};
use crate::ipc::types::{AppState, Request};
use crate::store::StudentRecord;
use crate::visibility::find_class_for_student;
use serde_json::json;
use uuid::Uuid;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(db) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let class_id = param_id(req, "classId");
    let Some(idx) = find_class_index(db, &class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };

    let students: Vec<serde_json::Value> = db.classes[idx]
        .students
        .iter()
        .map(|s| serde_json::to_value(s).unwrap_or(json!({})))
        .collect();
    ok(&req.id, json!({ "students": students }))
}

fn handle_students_enroll(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(db) = state.db.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let class_id = param_id(req, "classId");
    let Some(idx) = find_class_index(db, &class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };

    let name = match param_str(req, "name") {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing name", None),
    };
    if name.is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }

    // Callers importing an existing roster pass their own ids; otherwise we
    // mint one. Either way the id must be new to this roster.
    let student_id = match req.params.get("id") {
        Some(v) if !v.is_null() => v.clone(),
        _ => json!(Uuid::new_v4().to_string()),
    };
    if roster_index(&db.classes[idx], &student_id).is_some() {
        return err(
            &req.id,
            "duplicate_student",
            "a student with this id is already enrolled",
            None,
        );
    }

    let access_code = match param_str(req, "accessCode") {
        Some(v) => v.trim().to_string(),
        None => Uuid::new_v4().simple().to_string()[..6].to_uppercase(),
    };

    db.classes[idx].students.push(StudentRecord {
        id: student_id.clone(),
        name: name.clone(),
        access_code: Some(access_code.clone()),
    });

    if let Err(e) = persist(state) {
        return err(&req.id, "store_save_failed", format!("{e:?}"), None);
    }
    ok(
        &req.id,
        json!({ "studentId": student_id, "name": name, "accessCode": access_code }),
    )
}

fn handle_students_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(db) = state.db.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let class_id = param_id(req, "classId");
    let Some(idx) = find_class_index(db, &class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };

    let student_id = param_id(req, "studentId");
    let Some(sidx) = roster_index(&db.classes[idx], &student_id) else {
        return err(&req.id, "not_found", "student not found in class", None);
    };

    // Behavior events for the student stay in the log; removing a student
    // does not rewrite history.
    db.classes[idx].students.remove(sidx);

    if let Err(e) = persist(state) {
        return err(&req.id, "store_save_failed", format!("{e:?}"), None);
    }
    ok(&req.id, json!({ "ok": true }))
}

fn handle_students_resolve_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(db) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let student_id = param_id(req, "studentId");
    let hint = req.params.get("classId");
    match find_class_for_student(&student_id, &db.classes, hint) {
        Some(class) => ok(
            &req.id,
            json!({ "classId": class.id, "className": class.name }),
        ),
        None => err(&req.id, "not_found", "no class contains this student", None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.enroll" => Some(handle_students_enroll(state, req)),
        "students.remove" => Some(handle_students_remove(state, req)),
        "students.resolveClass" => Some(handle_students_resolve_class(state, req)),
        _ => None,
    }
}
