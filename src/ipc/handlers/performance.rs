use chrono::Utc;
use serde_json::json;

use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{
    date_of, optional_f64, optional_limit, required_f64, required_str, timestamp_param,
};
use crate::ipc::types::{AppState, Request};
use crate::record::{AssessmentKind, Record};
use crate::stats::round_off_1_decimal;

fn handle_add(state: &mut AppState, req: &Request) -> HandlerResult {
    let student_id = required_str(req, "studentId")?;
    let course_id = required_str(req, "courseId")?;
    let record_id = required_str(req, "recordId")?;
    let raw_kind = required_str(req, "kind")?;
    let Some(kind) = AssessmentKind::parse(&raw_kind) else {
        return Err(HandlerErr::bad_params(
            "kind must be one of assignment, quiz, midterm, final, project, lab",
        )
        .with_details(json!({ "kind": raw_kind })));
    };
    let value = required_f64(req, "value")?;
    let max_value = required_f64(req, "maxValue")?;
    if max_value <= 0.0 {
        return Err(HandlerErr::bad_params("maxValue must be positive"));
    }
    let weight = optional_f64(req, "weight", 1.0)?;
    if weight < 0.0 {
        return Err(HandlerErr::bad_params("weight must not be negative"));
    }
    let timestamp = timestamp_param(req, Utc::now().timestamp())?;

    state.performance.add(
        &student_id,
        &course_id,
        Record {
            id: record_id,
            timestamp,
            value,
            max_value,
            weight,
            category: kind,
        },
    );
    let running = state.performance.running(&student_id, &course_id);
    Ok(json!({
        "count": running.count,
        "weightedAverage": round_off_1_decimal(running.mean),
    }))
}

fn handle_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let student_id = required_str(req, "studentId")?;
    let course_id = required_str(req, "courseId")?;
    let records: Vec<serde_json::Value> = state
        .performance
        .records(&student_id, &course_id)
        .iter()
        .map(|r| {
            json!({
                "record": r,
                "date": date_of(r.timestamp),
                "percent": round_off_1_decimal(r.percent()),
            })
        })
        .collect();
    Ok(json!({ "records": records }))
}

fn handle_summary(state: &mut AppState, req: &Request) -> HandlerResult {
    let student_id = required_str(req, "studentId")?;
    let course_id = required_str(req, "courseId")?;
    Ok(json!(state.performance.summary(&student_id, &course_id)))
}

fn handle_trend(state: &mut AppState, req: &Request) -> HandlerResult {
    let student_id = required_str(req, "studentId")?;
    let course_id = required_str(req, "courseId")?;
    let prediction = state.performance.trend(&student_id, &course_id);
    Ok(json!({
        "available": prediction.is_some(),
        "prediction": prediction,
    }))
}

fn handle_top(state: &mut AppState, req: &Request) -> HandlerResult {
    let course_id = required_str(req, "courseId")?;
    let limit = optional_limit(req, state.limits.top_limit)?;
    let rows: Vec<serde_json::Value> = state
        .performance
        .top_performers(&course_id, limit)
        .into_iter()
        .enumerate()
        .map(|(i, a)| {
            json!({
                "rank": i + 1,
                "studentId": a.student_id,
                "average": round_off_1_decimal(a.average),
                "count": a.count,
            })
        })
        .collect();
    Ok(json!({ "students": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "performance.add" => handle_add(state, req),
        "performance.list" => handle_list(state, req),
        "performance.summary" => handle_summary(state, req),
        "performance.trend" => handle_trend(state, req),
        "performance.top" => handle_top(state, req),
        _ => return None,
    };
    Some(respond(&req.id, &req.method, result))
}
