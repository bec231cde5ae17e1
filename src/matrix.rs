use std::cmp::Ordering;
use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

/// course -> student -> assessment number -> score.
///
/// A missing cell means "no score recorded" and is left out of totals and
/// averages rather than counted as zero.
#[derive(Debug, Clone, Default)]
pub struct AssessmentMatrix {
    cells: IndexMap<String, IndexMap<String, BTreeMap<u32, f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedStudent {
    pub rank: usize,
    pub student_id: String,
    pub total: f64,
    pub assessments: usize,
}

impl AssessmentMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins.
    pub fn set_score(&mut self, course_id: &str, student_id: &str, assessment: u32, score: f64) {
        self.cells
            .entry(course_id.to_string())
            .or_default()
            .entry(student_id.to_string())
            .or_default()
            .insert(assessment, score);
    }

    pub fn get_score(&self, course_id: &str, student_id: &str, assessment: u32) -> Option<f64> {
        self.cells
            .get(course_id)?
            .get(student_id)?
            .get(&assessment)
            .copied()
    }

    pub fn remove_score(
        &mut self,
        course_id: &str,
        student_id: &str,
        assessment: u32,
    ) -> Option<f64> {
        let students = self.cells.get_mut(course_id)?;
        let scores = students.get_mut(student_id)?;
        let removed = scores.remove(&assessment);
        if scores.is_empty() {
            students.shift_remove(student_id);
        }
        if students.is_empty() {
            self.cells.shift_remove(course_id);
        }
        removed
    }

    /// Recorded scores for one student, by assessment number.
    pub fn student_scores(&self, course_id: &str, student_id: &str) -> Vec<(u32, f64)> {
        self.cells
            .get(course_id)
            .and_then(|students| students.get(student_id))
            .map(|scores| scores.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default()
    }

    pub fn total(&self, course_id: &str, student_id: &str) -> f64 {
        self.student_scores(course_id, student_id)
            .iter()
            .map(|(_, v)| v)
            .sum()
    }

    /// Mean of one assessment over the students that have a score for it; 0 when none do.
    pub fn average(&self, course_id: &str, assessment: u32) -> f64 {
        let Some(students) = self.cells.get(course_id) else {
            return 0.0;
        };
        let recorded: Vec<f64> = students
            .values()
            .filter_map(|scores| scores.get(&assessment).copied())
            .collect();
        crate::stats::mean(&recorded)
    }

    /// Students of a course by total, highest first. Equal totals share a
    /// rank and keep first-recorded order.
    pub fn ranking(&self, course_id: &str) -> Vec<RankedStudent> {
        let Some(students) = self.cells.get(course_id) else {
            return Vec::new();
        };
        let mut rows: Vec<RankedStudent> = students
            .iter()
            .map(|(student_id, scores)| RankedStudent {
                rank: 0,
                student_id: student_id.clone(),
                total: scores.values().sum(),
                assessments: scores.len(),
            })
            .collect();
        rows.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));

        let mut prev: Option<f64> = None;
        for i in 0..rows.len() {
            rows[i].rank = match prev {
                Some(p) if p == rows[i].total => rows[i - 1].rank,
                _ => i + 1,
            };
            prev = Some(rows[i].total);
        }
        rows
    }
}

/// Letter grade for `score` out of `max_score`. Each band includes its lower bound.
pub fn grade_for(score: f64, max_score: f64) -> &'static str {
    if !(max_score > 0.0) {
        return "F";
    }
    let pct = 100.0 * score / max_score;
    match pct {
        p if p >= 90.0 => "A+",
        p if p >= 80.0 => "A",
        p if p >= 70.0 => "B+",
        p if p >= 60.0 => "B",
        p if p >= 50.0 => "C",
        p if p >= 40.0 => "D",
        _ => "F",
    }
}
