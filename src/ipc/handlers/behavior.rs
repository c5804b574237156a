use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{find_class_index, param_id, param_str, persist, roster_index};
use crate::ipc::types::{AppState, Request};
use crate::store::{BehaviorEvent, ClassRecord};
use crate::visibility::normalize_id;
use serde_json::json;
use uuid::Uuid;

fn handle_behavior_award(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(db) = state.db.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let class_id = param_id(req, "classId");
    let Some(idx) = find_class_index(db, &class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };

    let student_id = param_id(req, "studentId");
    if roster_index(&db.classes[idx], &student_id).is_none() {
        return err(&req.id, "not_found", "student not found in class", None);
    }

    let Some(points) = req.params.get("points").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "points must be an integer", None);
    };
    if points == 0 {
        return err(
            &req.id,
            "bad_params",
            "points must be positive or negative, not zero",
            None,
        );
    }

    let event = BehaviorEvent {
        id: Uuid::new_v4().to_string(),
        student_id,
        points,
        category: param_str(req, "category").map(|s| s.to_string()),
        note: param_str(req, "note").map(|s| s.to_string()),
        recorded_at: chrono::Utc::now().to_rfc3339(),
    };
    let event_id = event.id.clone();
    let recorded_at = event.recorded_at.clone();
    db.classes[idx].behaviors.push(event);

    if let Err(e) = persist(state) {
        return err(&req.id, "store_save_failed", format!("{e:?}"), None);
    }
    ok(
        &req.id,
        json!({ "eventId": event_id, "points": points, "recordedAt": recorded_at }),
    )
}

fn student_summary(class: &ClassRecord, student_id: &serde_json::Value) -> serde_json::Value {
    let wanted = normalize_id(student_id);
    let mut positive: i64 = 0;
    let mut negative: i64 = 0;
    for ev in &class.behaviors {
        if normalize_id(&ev.student_id) != wanted {
            continue;
        }
        if ev.points > 0 {
            positive += ev.points;
        } else {
            negative += ev.points;
        }
    }
    json!({
        "studentId": student_id,
        "positive": positive,
        "negative": negative,
        "total": positive + negative
    })
}

fn handle_behavior_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(db) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let class_id = param_id(req, "classId");
    let Some(idx) = find_class_index(db, &class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };
    let class = &db.classes[idx];

    if let Some(student_id) = req.params.get("studentId") {
        if !student_id.is_null() {
            if roster_index(class, student_id).is_none() {
                return err(&req.id, "not_found", "student not found in class", None);
            }
            return ok(
                &req.id,
                json!({ "students": [student_summary(class, student_id)] }),
            );
        }
    }

    // Whole-class report in roster order; students with no events still get
    // a zeroed row so the report covers everyone.
    let students: Vec<serde_json::Value> = class
        .students
        .iter()
        .map(|s| student_summary(class, &s.id))
        .collect();
    ok(&req.id, json!({ "students": students }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "behavior.award" => Some(handle_behavior_award(state, req)),
        "behavior.summary" => Some(handle_behavior_summary(state, req)),
        _ => None,
    }
}
