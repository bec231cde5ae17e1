use chrono::Utc;
use serde_json::json;

use crate::ipc::error::{respond, HandlerResult};
use crate::ipc::helpers::{optional_limit, params_as, required_str};
use crate::ipc::types::{AppState, Request};
use crate::threads::{FeedbackNode, NewFeedback, NewReply};

fn has_timestamp(req: &Request) -> bool {
    req.params.get("timestamp").is_some_and(|v| !v.is_null())
}

fn nodes_json(nodes: Vec<&FeedbackNode>) -> serde_json::Value {
    json!({ "feedback": nodes })
}

fn handle_add(state: &mut AppState, req: &Request) -> HandlerResult {
    let mut input: NewFeedback = params_as(req)?;
    if !has_timestamp(req) {
        input.timestamp = Utc::now().timestamp();
    }
    let node = state.feedback.add_feedback(input)?;
    Ok(json!({ "feedback": node }))
}

fn handle_reply(state: &mut AppState, req: &Request) -> HandlerResult {
    let mut input: NewReply = params_as(req)?;
    if !has_timestamp(req) {
        input.timestamp = Utc::now().timestamp();
    }
    let node = state.feedback.add_reply(input)?;
    Ok(json!({ "reply": node }))
}

fn handle_get(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = required_str(req, "id")?;
    let node = state.feedback.get(&id);
    Ok(json!({
        "isRoot": node.map(|n| n.is_root()),
        "parentId": node.and_then(|n| n.parent_id.clone()),
        "thread": state.feedback.thread(&id),
    }))
}

fn handle_by_student(state: &mut AppState, req: &Request) -> HandlerResult {
    let student_id = required_str(req, "studentId")?;
    Ok(nodes_json(state.feedback.by_student(&student_id)))
}

fn handle_by_course(state: &mut AppState, req: &Request) -> HandlerResult {
    let course_id = required_str(req, "courseId")?;
    Ok(nodes_json(state.feedback.by_course(&course_id)))
}

fn handle_by_faculty(state: &mut AppState, req: &Request) -> HandlerResult {
    let faculty_id = required_str(req, "facultyId")?;
    Ok(nodes_json(state.feedback.by_faculty(&faculty_id)))
}

fn handle_search(state: &mut AppState, req: &Request) -> HandlerResult {
    let keyword = required_str(req, "keyword")?;
    let limit = optional_limit(req, state.limits.search_limit)?;
    let mut hits = state.feedback.search(&keyword);
    hits.truncate(limit);
    Ok(nodes_json(hits))
}

fn handle_remove(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = required_str(req, "id")?;
    let removed = state.feedback.remove(&id)?;
    Ok(json!({ "removed": removed }))
}

fn handle_sentiment(state: &mut AppState, req: &Request) -> HandlerResult {
    let course_id = required_str(req, "courseId")?;
    Ok(json!(state.feedback.sentiment_summary(&course_id)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "feedback.add" => handle_add(state, req),
        "feedback.reply" => handle_reply(state, req),
        "feedback.get" => handle_get(state, req),
        "feedback.byStudent" => handle_by_student(state, req),
        "feedback.byCourse" => handle_by_course(state, req),
        "feedback.byFaculty" => handle_by_faculty(state, req),
        "feedback.search" => handle_search(state, req),
        "feedback.remove" => handle_remove(state, req),
        "feedback.sentiment" => handle_sentiment(state, req),
        _ => return None,
    };
    Some(respond(&req.id, &req.method, result))
}
