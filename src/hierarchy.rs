//! Course -> module -> topic -> material tree.
//!
//! Nodes live in an arena addressed by [`NodeHandle`]; the id index maps
//! each node id to its handle. Children are handle lists, so unlinking a
//! subtree and dropping its index entries happen in one call.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("parent node not found: {0}")]
    UnknownParent(String),
    #[error("node id already exists: {0}")]
    DuplicateId(String),
    #[error("node not found: {0}")]
    NotFound(String),
    #[error("the root node cannot be removed")]
    RootRemoval,
}

impl HierarchyError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownParent(_) | Self::NotFound(_) => "not_found",
            Self::DuplicateId(_) => "duplicate_id",
            Self::RootRemoval => "bad_params",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

impl HierarchyNode {
    fn matches(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self.description.to_lowercase().contains(needle_lower)
            || self
                .content
                .as_deref()
                .map(|c| c.to_lowercase().contains(needle_lower))
                .unwrap_or(false)
    }
}

/// Owned nested rendering of a subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTree {
    #[serde(flatten)]
    pub node: HierarchyNode,
    pub children: Vec<NodeTree>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

#[derive(Debug, Clone)]
struct Slot {
    node: HierarchyNode,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
}

#[derive(Debug, Clone)]
pub struct HierarchyTree {
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    index: HashMap<String, NodeHandle>,
    root: NodeHandle,
}

impl HierarchyTree {
    pub fn new(root: HierarchyNode) -> Self {
        let handle = NodeHandle(0);
        let mut index = HashMap::new();
        index.insert(root.id.clone(), handle);
        Self {
            slots: vec![Some(Slot {
                node: root,
                parent: None,
                children: Vec::new(),
            })],
            free: Vec::new(),
            index,
            root: handle,
        }
    }

    fn slot(&self, h: NodeHandle) -> &Slot {
        self.slots[h.0]
            .as_ref()
            .unwrap_or_else(|| unreachable!("index points at a vacant slot"))
    }

    fn slot_mut(&mut self, h: NodeHandle) -> &mut Slot {
        self.slots[h.0]
            .as_mut()
            .unwrap_or_else(|| unreachable!("index points at a vacant slot"))
    }

    pub fn root(&self) -> &HierarchyNode {
        &self.slot(self.root).node
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Links `node` as the last child of `parent_id`.
    ///
    /// Rejects unknown parents and ids already present in the tree; on
    /// error the tree is unchanged.
    pub fn add_node(&mut self, parent_id: &str, node: HierarchyNode) -> Result<(), HierarchyError> {
        let Some(&parent) = self.index.get(parent_id) else {
            return Err(HierarchyError::UnknownParent(parent_id.to_string()));
        };
        if self.index.contains_key(&node.id) {
            return Err(HierarchyError::DuplicateId(node.id));
        }

        let id = node.id.clone();
        let slot = Slot {
            node,
            parent: Some(parent),
            children: Vec::new(),
        };
        let handle = match self.free.pop() {
            Some(i) => {
                self.slots[i] = Some(slot);
                NodeHandle(i)
            }
            None => {
                self.slots.push(Some(slot));
                NodeHandle(self.slots.len() - 1)
            }
        };
        self.slot_mut(parent).children.push(handle);
        self.index.insert(id, handle);
        Ok(())
    }

    pub fn get_node(&self, id: &str) -> Option<&HierarchyNode> {
        self.index.get(id).map(|h| &self.slot(*h).node)
    }

    pub fn children(&self, id: &str) -> Vec<&HierarchyNode> {
        let Some(h) = self.index.get(id) else {
            return Vec::new();
        };
        self.slot(*h)
            .children
            .iter()
            .map(|c| &self.slot(*c).node)
            .collect()
    }

    /// Ids from the root down to `id`, inclusive. Empty for unknown ids.
    pub fn path_to(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut cur = self.index.get(id).copied();
        while let Some(h) = cur {
            let slot = self.slot(h);
            out.push(slot.node.id.clone());
            cur = slot.parent;
        }
        out.reverse();
        out
    }

    /// Pre-order, children left to right. `visit` receives the depth (root = 0).
    pub fn dfs<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(&'a HierarchyNode, usize),
    {
        let mut stack = vec![(self.root, 0usize)];
        while let Some((h, depth)) = stack.pop() {
            let slot = self.slot(h);
            visit(&slot.node, depth);
            for child in slot.children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
    }

    /// Level order, siblings in insertion order.
    pub fn bfs<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(&'a HierarchyNode, usize),
    {
        let mut queue = VecDeque::from([(self.root, 0usize)]);
        while let Some((h, depth)) = queue.pop_front() {
            let slot = self.slot(h);
            visit(&slot.node, depth);
            for child in &slot.children {
                queue.push_back((*child, depth + 1));
            }
        }
    }

    /// Case-insensitive substring match on title, description and content, in DFS order.
    pub fn search(&self, keyword: &str) -> Vec<&HierarchyNode> {
        let needle = keyword.to_lowercase();
        let mut out = Vec::new();
        self.dfs(|node, _| {
            if node.matches(&needle) {
                out.push(node);
            }
        });
        out
    }

    pub fn subtree(&self, id: &str) -> Option<NodeTree> {
        self.index.get(id).map(|h| self.build_tree(*h))
    }

    fn build_tree(&self, h: NodeHandle) -> NodeTree {
        let slot = self.slot(h);
        NodeTree {
            node: slot.node.clone(),
            children: slot.children.iter().map(|c| self.build_tree(*c)).collect(),
        }
    }

    /// Unlinks `id` and every descendant, returning the removed ids in DFS order.
    pub fn remove_subtree(&mut self, id: &str) -> Result<Vec<String>, HierarchyError> {
        let Some(&handle) = self.index.get(id) else {
            return Err(HierarchyError::NotFound(id.to_string()));
        };
        if handle == self.root {
            return Err(HierarchyError::RootRemoval);
        }

        if let Some(parent) = self.slot(handle).parent {
            self.slot_mut(parent).children.retain(|c| *c != handle);
        }

        let mut removed = Vec::new();
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            let Some(slot) = self.slots[h.0].take() else {
                continue;
            };
            self.index.remove(&slot.node.id);
            self.free.push(h.0);
            stack.extend(slot.children.iter().rev());
            removed.push(slot.node.id);
        }
        Ok(removed)
    }
}
