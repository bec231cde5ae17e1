use serde_json::json;

use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{required_f64, required_str, required_u32};
use crate::ipc::types::{AppState, Request};
use crate::matrix::grade_for;
use crate::stats::round_off_1_decimal;

fn handle_set_score(state: &mut AppState, req: &Request) -> HandlerResult {
    let course_id = required_str(req, "courseId")?;
    let student_id = required_str(req, "studentId")?;
    let assessment = required_u32(req, "assessment")?;
    let score = required_f64(req, "score")?;
    if score < 0.0 {
        return Err(HandlerErr::bad_params("score must not be negative"));
    }
    let previous = state.assessments.get_score(&course_id, &student_id, assessment);
    state
        .assessments
        .set_score(&course_id, &student_id, assessment, score);
    Ok(json!({ "previous": previous, "score": score }))
}

fn handle_get_score(state: &mut AppState, req: &Request) -> HandlerResult {
    let course_id = required_str(req, "courseId")?;
    let student_id = required_str(req, "studentId")?;
    let assessment = required_u32(req, "assessment")?;
    Ok(json!({
        "score": state.assessments.get_score(&course_id, &student_id, assessment)
    }))
}

fn handle_remove_score(state: &mut AppState, req: &Request) -> HandlerResult {
    let course_id = required_str(req, "courseId")?;
    let student_id = required_str(req, "studentId")?;
    let assessment = required_u32(req, "assessment")?;
    Ok(json!({
        "removed": state.assessments.remove_score(&course_id, &student_id, assessment)
    }))
}

fn handle_total(state: &mut AppState, req: &Request) -> HandlerResult {
    let course_id = required_str(req, "courseId")?;
    let student_id = required_str(req, "studentId")?;
    let scores: Vec<serde_json::Value> = state
        .assessments
        .student_scores(&course_id, &student_id)
        .into_iter()
        .map(|(assessment, score)| json!({ "assessment": assessment, "score": score }))
        .collect();
    Ok(json!({
        "total": state.assessments.total(&course_id, &student_id),
        "scores": scores,
    }))
}

fn handle_average(state: &mut AppState, req: &Request) -> HandlerResult {
    let course_id = required_str(req, "courseId")?;
    let assessment = required_u32(req, "assessment")?;
    Ok(json!({
        "average": round_off_1_decimal(state.assessments.average(&course_id, assessment))
    }))
}

fn handle_ranking(state: &mut AppState, req: &Request) -> HandlerResult {
    let course_id = required_str(req, "courseId")?;
    Ok(json!({ "students": state.assessments.ranking(&course_id) }))
}

fn handle_grade(_state: &mut AppState, req: &Request) -> HandlerResult {
    let score = required_f64(req, "score")?;
    let max_score = required_f64(req, "maxScore")?;
    let percent = if max_score > 0.0 {
        round_off_1_decimal(100.0 * score / max_score)
    } else {
        0.0
    };
    Ok(json!({ "grade": grade_for(score, max_score), "percent": percent }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "assessments.setScore" => handle_set_score(state, req),
        "assessments.getScore" => handle_get_score(state, req),
        "assessments.removeScore" => handle_remove_score(state, req),
        "assessments.total" => handle_total(state, req),
        "assessments.average" => handle_average(state, req),
        "assessments.ranking" => handle_ranking(state, req),
        "assessments.grade" => handle_grade(state, req),
        _ => return None,
    };
    Some(respond(&req.id, &req.method, result))
}
