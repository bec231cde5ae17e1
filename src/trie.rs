use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    is_end_of_word: bool,
    ids: BTreeSet<String>,
}

/// Token -> content id index supporting exact and prefix lookups.
///
/// Tokens are matched byte-for-byte; callers lower-case before inserting and
/// querying (see [`tokenize`]).
#[derive(Debug, Clone, Default)]
pub struct PrefixIndex {
    root: TrieNode,
    words: usize,
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: &str, id: &str) {
        let mut node = &mut self.root;
        for ch in word.chars() {
            node = node.children.entry(ch).or_default();
        }
        if !node.is_end_of_word {
            node.is_end_of_word = true;
            self.words += 1;
        }
        node.ids.insert(id.to_string());
    }

    fn find(&self, prefix: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for ch in prefix.chars() {
            node = node.children.get(&ch)?;
        }
        Some(node)
    }

    pub fn exact_match(&self, word: &str) -> BTreeSet<String> {
        match self.find(word) {
            Some(node) if node.is_end_of_word => node.ids.clone(),
            _ => BTreeSet::new(),
        }
    }

    pub fn prefix_match(&self, prefix: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let Some(start) = self.find(prefix) else {
            return out;
        };
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if node.is_end_of_word {
                out.extend(node.ids.iter().cloned());
            }
            stack.extend(node.children.values());
        }
        out
    }

    /// Complete words under `prefix`, sorted.
    pub fn words_with_prefix(&self, prefix: &str, limit: usize) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(start) = self.find(prefix) {
            let mut buf = prefix.to_string();
            collect_words(start, &mut buf, &mut out, limit);
        }
        out
    }

    /// Unlinks `id` from `word`. Returns false when the pair was not indexed.
    pub fn remove(&mut self, word: &str, id: &str) -> bool {
        let chars: Vec<char> = word.chars().collect();
        let mut word_gone = false;
        let removed = remove_at(&mut self.root, &chars, id, &mut word_gone);
        if word_gone {
            self.words -= 1;
        }
        removed
    }

    /// Number of distinct complete words.
    pub fn len(&self) -> usize {
        self.words
    }
}

fn collect_words(node: &TrieNode, buf: &mut String, out: &mut Vec<String>, limit: usize) {
    if out.len() >= limit {
        return;
    }
    if node.is_end_of_word {
        out.push(buf.clone());
    }
    for (ch, child) in &node.children {
        buf.push(*ch);
        collect_words(child, buf, out, limit);
        buf.pop();
    }
}

fn remove_at(node: &mut TrieNode, rest: &[char], id: &str, word_gone: &mut bool) -> bool {
    let Some((first, tail)) = rest.split_first() else {
        if !node.is_end_of_word || !node.ids.remove(id) {
            return false;
        }
        if node.ids.is_empty() {
            node.is_end_of_word = false;
            *word_gone = true;
        }
        return true;
    };
    let Some(child) = node.children.get_mut(first) else {
        return false;
    };
    let removed = remove_at(child, tail, id, word_gone);
    if removed && !child.is_end_of_word && child.children.is_empty() {
        node.children.remove(first);
    }
    removed
}

/// Lower-cased alphanumeric tokens of `text`, deduplicated in first-seen order.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
