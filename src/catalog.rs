use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::trie::{tokenize, PrefixIndex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
}

impl Material {
    fn tokens(&self) -> Vec<String> {
        let mut text = format!("{} {}", self.title, self.description);
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        tokenize(&text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    Prefix,
}

/// Course materials plus a token index over title, description and tags.
#[derive(Debug, Clone)]
pub struct MaterialCatalog {
    materials: IndexMap<String, Material>,
    index: PrefixIndex,
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self {
            materials: IndexMap::new(),
            index: PrefixIndex::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn vocabulary(&self) -> usize {
        self.index.len()
    }

    pub fn get(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Indexes `material`, replacing any earlier version with the same id.
    /// Returns true when an earlier version was replaced.
    pub fn upsert(&mut self, material: Material) -> bool {
        let replaced = self.unindex(&material.id);
        let tokens = material.tokens();
        for token in &tokens {
            self.index.insert(token, &material.id);
        }
        debug!(material_id = %material.id, tokens = tokens.len(), replaced, "material indexed");
        self.materials.insert(material.id.clone(), material);
        replaced
    }

    pub fn remove(&mut self, id: &str) -> Option<Material> {
        self.unindex(id);
        self.materials.shift_remove(id)
    }

    fn unindex(&mut self, id: &str) -> bool {
        let Some(old) = self.materials.get(id) else {
            return false;
        };
        for token in old.tokens() {
            self.index.remove(&token, id);
        }
        true
    }

    /// Materials matching every token of `query`, in catalog order.
    ///
    /// In prefix mode each token matches any indexed word it starts; an
    /// empty query matches nothing.
    pub fn search(&self, query: &str, mode: MatchMode, limit: usize) -> Vec<&Material> {
        let tokens = tokenize(query);
        let mut hits: Option<BTreeSet<String>> = None;
        for token in &tokens {
            let ids = match mode {
                MatchMode::Exact => self.index.exact_match(token),
                MatchMode::Prefix => self.index.prefix_match(token),
            };
            hits = Some(match hits {
                None => ids,
                Some(acc) => acc.intersection(&ids).cloned().collect(),
            });
        }
        let Some(hits) = hits else {
            return Vec::new();
        };
        self.materials
            .values()
            .filter(|m| hits.contains(&m.id))
            .take(limit)
            .collect()
    }

    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        self.index.words_with_prefix(&prefix.to_lowercase(), limit)
    }
}
