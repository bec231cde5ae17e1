use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let syllabus_nodes: usize = state.syllabi.values().map(|t| t.len()).sum();
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "limits": {
                "topLimit": state.limits.top_limit,
                "searchLimit": state.limits.search_limit,
            },
            "counts": {
                "attendanceStudents": state.attendance.student_count(),
                "materials": state.materials.len(),
                "vocabulary": state.materials.vocabulary(),
                "syllabi": state.syllabi.len(),
                "syllabusNodes": syllabus_nodes,
                "feedback": state.feedback.len(),
            }
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        _ => None,
    }
}
