use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::hierarchy::{HierarchyNode, HierarchyTree};
use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{optional_limit, optional_str, params_as, required_str};
use crate::ipc::types::{AppState, Request};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddNodeParams {
    syllabus_id: String,
    parent_id: String,
    node: HierarchyNode,
}

fn lookup<'a>(state: &'a AppState, req: &Request) -> Result<Option<&'a HierarchyTree>, HandlerErr> {
    let syllabus_id = required_str(req, "syllabusId")?;
    Ok(state.syllabi.get(&syllabus_id))
}

fn handle_create(state: &mut AppState, req: &Request) -> HandlerResult {
    let root: HierarchyNode = match req.params.get("root") {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| HandlerErr::bad_params(format!("invalid root: {}", e)))?,
        None => return Err(HandlerErr::bad_params("missing root")),
    };
    if state.syllabi.contains_key(&root.id) {
        return Err(HandlerErr {
            code: "duplicate_id",
            message: format!("syllabus already exists: {}", root.id),
            details: None,
        });
    }
    info!(syllabus_id = %root.id, "syllabus created");
    let id = root.id.clone();
    state.syllabi.insert(id.clone(), HierarchyTree::new(root));
    Ok(json!({ "syllabusId": id }))
}

fn handle_add_node(state: &mut AppState, req: &Request) -> HandlerResult {
    let params: AddNodeParams = params_as(req)?;
    let Some(tree) = state.syllabi.get_mut(&params.syllabus_id) else {
        return Err(HandlerErr::not_found(format!(
            "syllabus not found: {}",
            params.syllabus_id
        )));
    };
    let id = params.node.id.clone();
    tree.add_node(&params.parent_id, params.node)?;
    Ok(json!({ "id": id, "path": tree.path_to(&id) }))
}

fn handle_get(state: &mut AppState, req: &Request) -> HandlerResult {
    let node_id = required_str(req, "nodeId")?;
    let Some(tree) = lookup(state, req)? else {
        return Ok(json!({ "node": null, "children": [] }));
    };
    let children: Vec<&str> = tree
        .children(&node_id)
        .into_iter()
        .map(|n| n.id.as_str())
        .collect();
    Ok(json!({
        "node": tree.get_node(&node_id),
        "children": children,
    }))
}

fn handle_tree(state: &mut AppState, req: &Request) -> HandlerResult {
    let Some(tree) = lookup(state, req)? else {
        return Ok(json!({ "tree": null }));
    };
    let node_id = optional_str(req, "nodeId")?.unwrap_or_else(|| tree.root().id.clone());
    Ok(json!({ "tree": tree.subtree(&node_id) }))
}

fn handle_traverse(state: &mut AppState, req: &Request) -> HandlerResult {
    let order = optional_str(req, "order")?.unwrap_or_else(|| "dfs".to_string());
    if order != "dfs" && order != "bfs" {
        return Err(HandlerErr::bad_params("order must be dfs or bfs"));
    }
    let Some(tree) = lookup(state, req)? else {
        return Ok(json!({ "order": order, "nodes": [] }));
    };
    let mut nodes = Vec::with_capacity(tree.len());
    let visit = |n: &HierarchyNode, depth: usize| {
        nodes.push(json!({ "id": n.id, "title": n.title, "depth": depth }));
    };
    if order == "bfs" {
        tree.bfs(visit);
    } else {
        tree.dfs(visit);
    }
    Ok(json!({ "order": order, "nodes": nodes }))
}

/// Searches one syllabus, or every syllabus when `syllabusId` is omitted.
fn handle_search(state: &mut AppState, req: &Request) -> HandlerResult {
    let keyword = required_str(req, "keyword")?;
    let limit = optional_limit(req, state.limits.search_limit)?;
    let scope = optional_str(req, "syllabusId")?;
    let mut hits = Vec::new();
    for (syllabus_id, tree) in &state.syllabi {
        if scope.as_deref().is_some_and(|s| s != syllabus_id) {
            continue;
        }
        for node in tree.search(&keyword) {
            hits.push(json!({ "syllabusId": syllabus_id, "node": node }));
        }
    }
    hits.truncate(limit);
    Ok(json!({ "matches": hits }))
}

fn handle_path(state: &mut AppState, req: &Request) -> HandlerResult {
    let node_id = required_str(req, "nodeId")?;
    let path = lookup(state, req)?
        .map(|t| t.path_to(&node_id))
        .unwrap_or_default();
    Ok(json!({ "path": path }))
}

/// Drops one subtree, or the whole syllabus when `nodeId` is omitted.
fn handle_remove(state: &mut AppState, req: &Request) -> HandlerResult {
    let syllabus_id = required_str(req, "syllabusId")?;
    let node_id = optional_str(req, "nodeId")?;
    let Some(node_id) = node_id else {
        let Some(tree) = state.syllabi.shift_remove(&syllabus_id) else {
            return Err(HandlerErr::not_found(format!("syllabus not found: {}", syllabus_id)));
        };
        info!(syllabus_id = %syllabus_id, nodes = tree.len(), "syllabus removed");
        return Ok(json!({ "removed": tree.len() }));
    };
    let Some(tree) = state.syllabi.get_mut(&syllabus_id) else {
        return Err(HandlerErr::not_found(format!("syllabus not found: {}", syllabus_id)));
    };
    let removed = tree.remove_subtree(&node_id)?;
    Ok(json!({ "removed": removed.len(), "ids": removed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "syllabus.create" => handle_create(state, req),
        "syllabus.addNode" => handle_add_node(state, req),
        "syllabus.get" => handle_get(state, req),
        "syllabus.tree" => handle_tree(state, req),
        "syllabus.traverse" => handle_traverse(state, req),
        "syllabus.search" => handle_search(state, req),
        "syllabus.path" => handle_path(state, req),
        "syllabus.remove" => handle_remove(state, req),
        _ => return None,
    };
    Some(respond(&req.id, &req.method, result))
}
