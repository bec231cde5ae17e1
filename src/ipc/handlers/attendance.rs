use chrono::Utc;
use serde_json::json;

use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{
    date_of, day_end, day_start, optional_str, parse_date, required_str, timestamp_param,
};
use crate::ipc::types::{AppState, Request};
use crate::record::{AttendanceRecord, AttendanceStatus, Record};

fn record_json(r: &AttendanceRecord) -> serde_json::Value {
    json!({
        "id": r.id,
        "timestamp": r.timestamp,
        "date": date_of(r.timestamp),
        "status": r.category,
    })
}

fn handle_mark(state: &mut AppState, req: &Request) -> HandlerResult {
    let student_id = required_str(req, "studentId")?;
    let course_id = required_str(req, "courseId")?;
    let record_id = required_str(req, "recordId")?;
    let raw_status = required_str(req, "status")?;
    let Some(status) = AttendanceStatus::parse(&raw_status) else {
        return Err(HandlerErr::bad_params(
            "status must be one of present, absent, late, excused",
        )
        .with_details(json!({ "status": raw_status })));
    };
    let timestamp = timestamp_param(req, Utc::now().timestamp())?;

    let record = Record {
        id: record_id,
        timestamp,
        value: if status.is_attended() { 1.0 } else { 0.0 },
        max_value: 1.0,
        weight: 1.0,
        category: status,
    };
    let out = record_json(&record);
    state.attendance.mark(&student_id, &course_id, record);
    Ok(json!({
        "record": out,
        "percentage": state.attendance.percentage(&student_id, &course_id),
    }))
}

fn handle_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let student_id = required_str(req, "studentId")?;
    let course_id = required_str(req, "courseId")?;
    let records: Vec<serde_json::Value> = state
        .attendance
        .records(&student_id, &course_id)
        .iter()
        .map(record_json)
        .collect();
    Ok(json!({ "records": records }))
}

fn handle_range(state: &mut AppState, req: &Request) -> HandlerResult {
    let student_id = required_str(req, "studentId")?;
    let course_id = required_str(req, "courseId")?;
    let start = match optional_str(req, "from")? {
        Some(d) => day_start(parse_date(&d)?),
        None => i64::MIN,
    };
    let end = match optional_str(req, "to")? {
        Some(d) => day_end(parse_date(&d)?),
        None => i64::MAX,
    };
    if start > end {
        return Err(HandlerErr::bad_params("from must not be after to"));
    }
    let records: Vec<serde_json::Value> = state
        .attendance
        .records_in_range(&student_id, &course_id, start, end)
        .into_iter()
        .map(record_json)
        .collect();
    Ok(json!({ "records": records }))
}

fn handle_percentage(state: &mut AppState, req: &Request) -> HandlerResult {
    let student_id = required_str(req, "studentId")?;
    let course_id = required_str(req, "courseId")?;
    let records = state.attendance.records(&student_id, &course_id);
    Ok(json!({
        "sessions": records.len(),
        "attended": records.iter().filter(|r| r.category.is_attended()).count(),
        "percentage": state.attendance.percentage(&student_id, &course_id),
    }))
}

fn handle_courses(state: &mut AppState, req: &Request) -> HandlerResult {
    let student_id = required_str(req, "studentId")?;
    Ok(json!({ "courses": state.attendance.courses_for(&student_id) }))
}

fn handle_clear(state: &mut AppState, req: &Request) -> HandlerResult {
    let student_id = required_str(req, "studentId")?;
    let course_id = required_str(req, "courseId")?;
    Ok(json!({ "removed": state.attendance.clear(&student_id, &course_id) }))
}

fn handle_course_summary(state: &mut AppState, req: &Request) -> HandlerResult {
    let course_id = required_str(req, "courseId")?;
    Ok(json!({ "students": state.attendance.course_summary(&course_id) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.mark" => handle_mark(state, req),
        "attendance.list" => handle_list(state, req),
        "attendance.range" => handle_range(state, req),
        "attendance.percentage" => handle_percentage(state, req),
        "attendance.courseSummary" => handle_course_summary(state, req),
        "attendance.courses" => handle_courses(state, req),
        "attendance.clear" => handle_clear(state, req),
        _ => return None,
    };
    Some(respond(&req.id, &req.method, result))
}
