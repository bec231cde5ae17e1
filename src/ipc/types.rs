use indexmap::IndexMap;
use serde::Deserialize;

use crate::catalog::MaterialCatalog;
use crate::config::Limits;
use crate::hierarchy::HierarchyTree;
use crate::matrix::AssessmentMatrix;
use crate::threads::ThreadGraph;
use crate::tracking::{AttendanceTracker, PerformanceTracker};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Every store the daemon serves, built once at startup and handed to
/// handlers by `&mut` reference.
#[derive(Debug)]
pub struct AppState {
    pub limits: Limits,
    pub attendance: AttendanceTracker,
    pub performance: PerformanceTracker,
    pub materials: MaterialCatalog,
    /// Syllabus trees keyed by their root (course) id.
    pub syllabi: IndexMap<String, HierarchyTree>,
    pub feedback: ThreadGraph,
    pub assessments: AssessmentMatrix,
}

impl AppState {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            attendance: AttendanceTracker::new(),
            performance: PerformanceTracker::new(),
            materials: MaterialCatalog::new(),
            syllabi: IndexMap::new(),
            feedback: ThreadGraph::new(),
            assessments: AssessmentMatrix::new(),
        }
    }
}
