use serde_json::json;

use crate::catalog::{MatchMode, Material};
use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{optional_limit, optional_str, params_as, required_str};
use crate::ipc::types::{AppState, Request};

fn handle_index(state: &mut AppState, req: &Request) -> HandlerResult {
    let material: Material = params_as(req)?;
    if material.id.trim().is_empty() {
        return Err(HandlerErr::bad_params("id must not be empty"));
    }
    let id = material.id.clone();
    let replaced = state.materials.upsert(material);
    Ok(json!({ "id": id, "replaced": replaced }))
}

fn handle_get(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = required_str(req, "id")?;
    Ok(json!({ "material": state.materials.get(&id) }))
}

fn handle_remove(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = required_str(req, "id")?;
    let removed = state.materials.remove(&id);
    Ok(json!({ "removed": removed.is_some() }))
}

fn handle_search(state: &mut AppState, req: &Request) -> HandlerResult {
    let query = required_str(req, "query")?;
    let mode = match optional_str(req, "mode")?.as_deref() {
        None | Some("prefix") => MatchMode::Prefix,
        Some("exact") => MatchMode::Exact,
        Some(other) => {
            return Err(HandlerErr::bad_params("mode must be exact or prefix")
                .with_details(json!({ "mode": other })))
        }
    };
    let limit = optional_limit(req, state.limits.search_limit)?;
    let found = state.materials.search(&query, mode, limit);
    Ok(json!({ "materials": found }))
}

fn handle_suggest(state: &mut AppState, req: &Request) -> HandlerResult {
    let prefix = required_str(req, "prefix")?;
    let limit = optional_limit(req, state.limits.search_limit)?;
    Ok(json!({ "words": state.materials.suggest(&prefix, limit) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "materials.index" => handle_index(state, req),
        "materials.get" => handle_get(state, req),
        "materials.remove" => handle_remove(state, req),
        "materials.search" => handle_search(state, req),
        "materials.suggest" => handle_suggest(state, req),
        _ => return None,
    };
    Some(respond(&req.id, &req.method, result))
}
