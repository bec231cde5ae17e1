use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ThreadError {
    #[error("feedback not found: {0}")]
    NotFound(String),
    #[error("feedback id already exists: {0}")]
    DuplicateId(String),
}

impl ThreadError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::DuplicateId(_) => "duplicate_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorRole {
    Student,
    Faculty,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Who a root feedback is about. Replies carry none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackTarget {
    pub student_id: String,
    pub course_id: String,
    pub faculty_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackNode {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub author_role: AuthorRole,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<FeedbackTarget>,
    pub parent_id: Option<String>,
    /// Reply ids in arrival order.
    pub replies: Vec<String>,
}

impl FeedbackNode {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub id: String,
    pub content: String,
    pub student_id: String,
    pub course_id: String,
    pub faculty_id: String,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReply {
    pub feedback_id: String,
    pub reply_id: String,
    pub content: String,
    pub author_id: String,
    pub author_role: AuthorRole,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    #[serde(default)]
    pub timestamp: i64,
}

/// Owned nested rendering of a node and all of its replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackThread {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub author_role: AuthorRole,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<FeedbackTarget>,
    pub replies: Vec<FeedbackThread>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSummary {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub unrated: usize,
}

/// Feedback roots, their reply trees and the student/course/faculty indexes.
///
/// The indexes only ever hold root ids; replies are reached through their
/// parent.
#[derive(Debug, Clone, Default)]
pub struct ThreadGraph {
    feedbacks: IndexMap<String, FeedbackNode>,
    by_student: HashMap<String, IndexSet<String>>,
    by_course: HashMap<String, IndexSet<String>>,
    by_faculty: HashMap<String, IndexSet<String>>,
}

impl ThreadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.feedbacks.len()
    }

    pub fn add_feedback(&mut self, input: NewFeedback) -> Result<&FeedbackNode, ThreadError> {
        if self.feedbacks.contains_key(&input.id) {
            return Err(ThreadError::DuplicateId(input.id));
        }
        let id = input.id;
        for (index, key) in [
            (&mut self.by_student, &input.student_id),
            (&mut self.by_course, &input.course_id),
            (&mut self.by_faculty, &input.faculty_id),
        ] {
            index.entry(key.clone()).or_default().insert(id.clone());
        }
        let node = FeedbackNode {
            id: id.clone(),
            content: input.content,
            author_id: input.student_id.clone(),
            author_role: AuthorRole::Student,
            timestamp: input.timestamp,
            sentiment: input.sentiment,
            target: Some(FeedbackTarget {
                student_id: input.student_id,
                course_id: input.course_id,
                faculty_id: input.faculty_id,
            }),
            parent_id: None,
            replies: Vec::new(),
        };
        let entry = self.feedbacks.entry(id).or_insert(node);
        Ok(&*entry)
    }

    /// Appends a reply under any existing node, root or reply.
    pub fn add_reply(&mut self, input: NewReply) -> Result<&FeedbackNode, ThreadError> {
        if self.feedbacks.contains_key(&input.reply_id) {
            return Err(ThreadError::DuplicateId(input.reply_id));
        }
        let Some(parent) = self.feedbacks.get_mut(&input.feedback_id) else {
            return Err(ThreadError::NotFound(input.feedback_id));
        };
        parent.replies.push(input.reply_id.clone());

        let node = FeedbackNode {
            id: input.reply_id.clone(),
            content: input.content,
            author_id: input.author_id,
            author_role: input.author_role,
            timestamp: input.timestamp,
            sentiment: input.sentiment,
            target: None,
            parent_id: Some(input.feedback_id),
            replies: Vec::new(),
        };
        let entry = self.feedbacks.entry(input.reply_id).or_insert(node);
        Ok(&*entry)
    }

    pub fn get(&self, id: &str) -> Option<&FeedbackNode> {
        self.feedbacks.get(id)
    }

    fn resolve<'a>(&'a self, ids: Option<&'a IndexSet<String>>) -> Vec<&'a FeedbackNode> {
        ids.map(|set| set.iter().filter_map(|id| self.feedbacks.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn by_student(&self, student_id: &str) -> Vec<&FeedbackNode> {
        self.resolve(self.by_student.get(student_id))
    }

    pub fn by_course(&self, course_id: &str) -> Vec<&FeedbackNode> {
        self.resolve(self.by_course.get(course_id))
    }

    pub fn by_faculty(&self, faculty_id: &str) -> Vec<&FeedbackNode> {
        self.resolve(self.by_faculty.get(faculty_id))
    }

    /// Case-insensitive substring scan over every root and reply.
    pub fn search(&self, keyword: &str) -> Vec<&FeedbackNode> {
        let needle = keyword.to_lowercase();
        self.feedbacks
            .values()
            .filter(|n| n.content.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn thread(&self, id: &str) -> Option<FeedbackThread> {
        let node = self.feedbacks.get(id)?;
        Some(FeedbackThread {
            id: node.id.clone(),
            content: node.content.clone(),
            author_id: node.author_id.clone(),
            author_role: node.author_role,
            timestamp: node.timestamp,
            sentiment: node.sentiment,
            target: node.target.clone(),
            replies: node.replies.iter().filter_map(|r| self.thread(r)).collect(),
        })
    }

    pub fn sentiment_summary(&self, course_id: &str) -> SentimentSummary {
        let mut out = SentimentSummary::default();
        for node in self.by_course(course_id) {
            match node.sentiment {
                Some(Sentiment::Positive) => out.positive += 1,
                Some(Sentiment::Neutral) => out.neutral += 1,
                Some(Sentiment::Negative) => out.negative += 1,
                None => out.unrated += 1,
            }
        }
        out
    }

    /// Removes `id` with all of its replies. Returns the removed ids.
    pub fn remove(&mut self, id: &str) -> Result<Vec<String>, ThreadError> {
        let Some(node) = self.feedbacks.get(id) else {
            return Err(ThreadError::NotFound(id.to_string()));
        };
        if let Some(parent_id) = node.parent_id.clone() {
            if let Some(parent) = self.feedbacks.get_mut(&parent_id) {
                parent.replies.retain(|r| r != id);
            }
        }

        let mut removed = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(cur) = stack.pop() {
            let Some(node) = self.feedbacks.shift_remove(&cur) else {
                continue;
            };
            if let Some(target) = &node.target {
                unindex(&mut self.by_student, &target.student_id, &cur);
                unindex(&mut self.by_course, &target.course_id, &cur);
                unindex(&mut self.by_faculty, &target.faculty_id, &cur);
            }
            stack.extend(node.replies.into_iter().rev());
            removed.push(cur);
        }
        Ok(removed)
    }
}

fn unindex(index: &mut HashMap<String, IndexSet<String>>, key: &str, id: &str) {
    if let Some(set) = index.get_mut(key) {
        set.shift_remove(id);
        if set.is_empty() {
            index.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feedback(id: &str, student: &str, course: &str, faculty: &str, text: &str) -> NewFeedback {
        NewFeedback {
            id: id.to_string(),
            content: text.to_string(),
            student_id: student.to_string(),
            course_id: course.to_string(),
            faculty_id: faculty.to_string(),
            sentiment: None,
            timestamp: 1_700_000_000,
        }
    }

    fn reply(parent: &str, id: &str, text: &str, role: AuthorRole) -> NewReply {
        NewReply {
            feedback_id: parent.to_string(),
            reply_id: id.to_string(),
            content: text.to_string(),
            author_id: "F1".to_string(),
            author_role: role,
            sentiment: None,
            timestamp: 1_700_000_100,
        }
    }

    fn assert_indexes_resolve(g: &ThreadGraph) {
        for index in [&g.by_student, &g.by_course, &g.by_faculty] {
            for ids in index.values() {
                for id in ids {
                    let node = g.get(id).expect("index entry resolves");
                    assert!(node.is_root());
                }
            }
        }
    }

    #[test]
    fn replies_are_not_indexed() {
        let mut g = ThreadGraph::new();
        g.add_feedback(feedback("f1", "S1", "CS101", "F1", "Lectures are too fast"))
            .expect("add");
        g.add_reply(reply("f1", "r1", "We will slow down", AuthorRole::Faculty))
            .expect("reply");

        let by_student: Vec<&str> = g.by_student("S1").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(by_student, vec!["f1"]);
        assert_eq!(g.by_course("CS101").len(), 1);
        assert_eq!(g.get("r1").and_then(|n| n.parent_id.as_deref()), Some("f1"));
        assert_eq!(g.get("f1").map(|n| n.replies.clone()), Some(vec!["r1".to_string()]));
        assert_indexes_resolve(&g);
    }

    #[test]
    fn reply_to_unknown_feedback_fails() {
        let mut g = ThreadGraph::new();
        let res = g.add_reply(reply("missing", "r1", "hello", AuthorRole::Admin));
        assert_eq!(res.err(), Some(ThreadError::NotFound("missing".to_string())));
        assert_eq!(g.len(), 0);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut g = ThreadGraph::new();
        g.add_feedback(feedback("f1", "S1", "CS101", "F1", "a")).expect("add");
        assert_eq!(
            g.add_feedback(feedback("f1", "S2", "CS102", "F2", "b")).err(),
            Some(ThreadError::DuplicateId("f1".to_string()))
        );
        assert_eq!(
            g.add_reply(reply("f1", "f1", "c", AuthorRole::Faculty)).err(),
            Some(ThreadError::DuplicateId("f1".to_string()))
        );
        assert!(g.by_student("S2").is_empty());
        assert!(g.get("f1").map(|n| n.replies.is_empty()).unwrap_or(false));
    }

    #[test]
    fn search_covers_roots_and_replies() {
        let mut g = ThreadGraph::new();
        g.add_feedback(feedback("f1", "S1", "CS101", "F1", "Need more LAB time"))
            .expect("add");
        g.add_feedback(feedback("f2", "S2", "CS101", "F1", "Great course"))
            .expect("add");
        g.add_reply(reply("f2", "r1", "Lab hours extended", AuthorRole::Faculty))
            .expect("reply");

        let hits: Vec<&str> = g.search("lab").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(hits, vec!["f1", "r1"]);
    }

    #[test]
    fn remove_root_drops_replies_and_index_entries() {
        let mut g = ThreadGraph::new();
        g.add_feedback(feedback("f1", "S1", "CS101", "F1", "x")).expect("add");
        g.add_feedback(feedback("f2", "S1", "CS101", "F1", "y")).expect("add");
        g.add_reply(reply("f1", "r1", "a", AuthorRole::Faculty)).expect("reply");
        g.add_reply(reply("r1", "r2", "b", AuthorRole::Student)).expect("nested");

        let removed = g.remove("f1").expect("remove");
        assert_eq!(removed, vec!["f1", "r1", "r2"]);
        assert_eq!(g.len(), 1);
        let left: Vec<&str> = g.by_student("S1").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(left, vec!["f2"]);
        assert_indexes_resolve(&g);
    }

    #[test]
    fn remove_reply_detaches_from_parent() {
        let mut g = ThreadGraph::new();
        g.add_feedback(feedback("f1", "S1", "CS101", "F1", "x")).expect("add");
        g.add_reply(reply("f1", "r1", "a", AuthorRole::Faculty)).expect("reply");
        g.remove("r1").expect("remove");
        assert!(g.get("f1").map(|n| n.replies.is_empty()).unwrap_or(false));
        assert_eq!(g.by_course("CS101").len(), 1);
    }

    #[test]
    fn thread_nests_replies_and_sentiment_counts_roots() {
        let mut g = ThreadGraph::new();
        let mut f = feedback("f1", "S1", "CS101", "F1", "x");
        f.sentiment = Some(Sentiment::Negative);
        g.add_feedback(f).expect("add");
        g.add_feedback(feedback("f2", "S2", "CS101", "F1", "y")).expect("add");
        let mut r = reply("f1", "r1", "a", AuthorRole::Faculty);
        r.sentiment = Some(Sentiment::Positive);
        g.add_reply(r).expect("reply");

        let t = g.thread("f1").expect("thread");
        assert_eq!(t.replies.len(), 1);
        assert_eq!(t.replies[0].id, "r1");

        let summary = g.sentiment_summary("CS101");
        assert_eq!(
            summary,
            SentimentSummary {
                positive: 0,
                neutral: 0,
                negative: 1,
                unrated: 1
            }
        );
    }
}
