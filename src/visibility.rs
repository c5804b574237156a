use crate::store::{AssignedTo, AssignmentRecord, ClassRecord};

/// Canonical comparable form of a student/class identifier. The app's
/// clients have historically serialized the same id as a JSON number, a
/// string, or not at all, so equality checks must go through here.
///
/// Null (and absent params upstream) normalize to "". Strings are trimmed.
/// Anything else falls back to its JSON text rendering, trimmed, so a
/// numeric 123 and the string "123" compare equal.
pub fn normalize_id(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn roster_contains(class: &ClassRecord, student: &str) -> bool {
    class.students.iter().any(|s| normalize_id(&s.id) == student)
}

/// Locate the class a student belongs to. When a class-id hint is available
/// (e.g. remembered from a previous login), an exact class-id match is tried
/// first; a stale roster read can briefly omit the student, and the hint
/// keeps resolution stable across that. Otherwise the first class whose
/// roster contains the student wins, in stored order.
pub fn find_class_for_student<'a>(
    student_id: &serde_json::Value,
    classes: &'a [ClassRecord],
    class_hint: Option<&serde_json::Value>,
) -> Option<&'a ClassRecord> {
    if let Some(hint) = class_hint {
        let hint = normalize_id(hint);
        if !hint.is_empty() {
            if let Some(class) = classes.iter().find(|c| normalize_id(&c.id) == hint) {
                return Some(class);
            }
        }
    }
    let student = normalize_id(student_id);
    classes.iter().find(|c| roster_contains(c, &student))
}

/// Whether a single assignment is visible to a (normalized) student id.
/// First rule wins:
///   1. assignedToAll == true or assignedTo == "all": broadcast, visible to
///      everyone. The keyword overrides an explicit assignedToAll: false.
///   2. assignedTo is a non-empty id list: visible only on an id match.
///   3. no recognizable targeting at all: visible. Records published before
///      targeting existed carry no metadata and have always been shown to
///      the whole class; callers must not tighten this without a product
///      decision.
fn assignment_visible(assignment: &AssignmentRecord, student: &str) -> bool {
    if assignment.assigned_to_all == Some(true) {
        return true;
    }
    match &assignment.assigned_to {
        Some(AssignedTo::Keyword(k)) if k == "all" => true,
        Some(AssignedTo::Ids(ids)) if !ids.is_empty() => {
            ids.iter().any(|v| normalize_id(v) == student)
        }
        _ => true,
    }
}

/// Filter a class's assignment list down to what one student may see,
/// preserving stored order. Never mutates, never fails; malformed targeting
/// degrades to rule 3 above.
pub fn visible_assignments<'a>(
    assignments: &'a [AssignmentRecord],
    student_id: &serde_json::Value,
) -> Vec<&'a AssignmentRecord> {
    let student = normalize_id(student_id);
    assignments
        .iter()
        .filter(|a| assignment_visible(a, &student))
        .collect()
}

/// The one entry point callers use: "what can this student currently see".
/// Empty is a normal answer (not enrolled anywhere, or nothing targets
/// them); callers that need to tell those apart check
/// `find_class_for_student` themselves.
pub fn resolve_student_assignments<'a>(
    student_id: &serde_json::Value,
    class_hint: Option<&serde_json::Value>,
    classes: &'a [ClassRecord],
) -> Vec<&'a AssignmentRecord> {
    match find_class_for_student(student_id, classes, class_hint) {
        Some(class) => visible_assignments(&class.assignments, student_id),
        None => Vec::new(),
    }
}
