//! Attendance and performance trackers keyed student -> course.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::record::{AssessmentKind, AttendanceRecord, AttendanceStatus, PerformanceRecord};
use crate::series::KeyedTimeSeriesStore;
use crate::stats::{self, RunningStats, StudentAverage, TrendPrediction};

#[derive(Debug, Clone)]
pub struct AttendanceTracker {
    store: KeyedTimeSeriesStore<AttendanceStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummaryRow {
    pub student_id: String,
    pub sessions: usize,
    pub attended: usize,
    pub percentage: f64,
}

impl AttendanceTracker {
    pub fn new() -> Self {
        Self {
            store: KeyedTimeSeriesStore::new(),
        }
    }

    pub fn mark(&mut self, student_id: &str, course_id: &str, record: AttendanceRecord) {
        debug!(
            student_id,
            course_id,
            record_id = %record.id,
            status = ?record.category,
            "attendance recorded"
        );
        self.store.add_record(student_id, course_id, record);
    }

    pub fn records(&self, student_id: &str, course_id: &str) -> &[AttendanceRecord] {
        self.store.records(student_id, course_id)
    }

    pub fn records_in_range(
        &self,
        student_id: &str,
        course_id: &str,
        start: i64,
        end: i64,
    ) -> Vec<&AttendanceRecord> {
        self.store.records_in_range(student_id, course_id, start, end)
    }

    /// Share of sessions attended (present or late), 0-100.
    pub fn percentage(&self, student_id: &str, course_id: &str) -> f64 {
        self.store
            .percentage(student_id, course_id, |r| r.category.is_attended())
    }

    /// Number of students with any attendance history.
    pub fn student_count(&self) -> usize {
        self.store.primaries().count()
    }

    pub fn courses_for(&self, student_id: &str) -> Vec<&str> {
        self.store.secondaries(student_id)
    }

    /// Forgets one student's attendance for one course.
    pub fn clear(&mut self, student_id: &str, course_id: &str) -> usize {
        let removed = self.store.remove_series(student_id, course_id);
        debug!(student_id, course_id, removed, "attendance cleared");
        removed
    }

    pub fn course_summary(&self, course_id: &str) -> Vec<AttendanceSummaryRow> {
        self.store
            .series_for_secondary(course_id)
            .map(|(student_id, records)| AttendanceSummaryRow {
                student_id: student_id.to_string(),
                sessions: records.len(),
                attended: records.iter().filter(|r| r.category.is_attended()).count(),
                percentage: self.percentage(student_id, course_id),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub mode: Vec<f64>,
    pub standard_deviation: f64,
    pub weighted: RunningStats,
    pub weighted_standard_deviation: f64,
    pub by_kind: Vec<KindAverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindAverage {
    pub kind: AssessmentKind,
    pub count: usize,
    pub average: f64,
}

/// Score series per (student, course) plus a weighted running average that
/// is folded in on every insert.
#[derive(Debug, Clone)]
pub struct PerformanceTracker {
    store: KeyedTimeSeriesStore<AssessmentKind>,
    running: HashMap<(String, String), RunningStats>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self {
            store: KeyedTimeSeriesStore::new(),
            running: HashMap::new(),
        }
    }

    pub fn add(&mut self, student_id: &str, course_id: &str, record: PerformanceRecord) {
        let stats = self
            .running
            .entry((student_id.to_string(), course_id.to_string()))
            .or_insert_with(RunningStats::new);
        stats.push(record.percent(), record.weight);
        debug!(
            student_id,
            course_id,
            record_id = %record.id,
            running_mean = stats.mean,
            "performance recorded"
        );
        self.store.add_record(student_id, course_id, record);
    }

    pub fn records(&self, student_id: &str, course_id: &str) -> &[PerformanceRecord] {
        self.store.records(student_id, course_id)
    }

    pub fn running(&self, student_id: &str, course_id: &str) -> RunningStats {
        self.running
            .get(&(student_id.to_string(), course_id.to_string()))
            .copied()
            .unwrap_or_default()
    }

    pub fn summary(&self, student_id: &str, course_id: &str) -> PerformanceSummary {
        let records = self.records(student_id, course_id);
        let percents: Vec<f64> = records.iter().map(|r| r.percent()).collect();
        let running = self.running(student_id, course_id);

        let mut by_kind: Vec<(AssessmentKind, Vec<f64>)> = Vec::new();
        for r in records {
            match by_kind.iter_mut().find(|(k, _)| *k == r.category) {
                Some((_, v)) => v.push(r.percent()),
                None => by_kind.push((r.category, vec![r.percent()])),
            }
        }

        PerformanceSummary {
            count: percents.len(),
            mean: stats::mean(&percents),
            median: stats::median(&percents),
            mode: stats::mode(&percents),
            standard_deviation: stats::standard_deviation(&percents),
            weighted: running,
            weighted_standard_deviation: running.standard_deviation(),
            by_kind: by_kind
                .into_iter()
                .map(|(kind, v)| KindAverage {
                    kind,
                    count: v.len(),
                    average: stats::mean(&v),
                })
                .collect(),
        }
    }

    pub fn trend(&self, student_id: &str, course_id: &str) -> Option<TrendPrediction> {
        stats::predict_trend(self.records(student_id, course_id))
    }

    /// Students of `course_id` by weighted average percentage, best first.
    ///
    /// A series whose records all carry zero weight falls back to its plain
    /// mean percentage. `count` is always the number of records.
    pub fn top_performers(&self, course_id: &str, limit: usize) -> Vec<StudentAverage> {
        let averages = self
            .store
            .series_for_secondary(course_id)
            .map(|(student_id, records)| {
                let running = self.running(student_id, course_id);
                let average = if running.total_weight > 0.0 {
                    running.mean
                } else {
                    let percents: Vec<f64> = records.iter().map(|r| r.percent()).collect();
                    stats::mean(&percents)
                };
                StudentAverage {
                    student_id: student_id.to_string(),
                    average,
                    count: records.len(),
                }
            })
            .collect();
        stats::top_performers(averages, limit)
    }
}
