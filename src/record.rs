use serde::{Deserialize, Serialize};

/// One immutable attendance or performance observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<C> {
    pub id: String,
    pub timestamp: i64,
    pub value: f64,
    pub max_value: f64,
    pub weight: f64,
    pub category: C,
}

impl<C> Record<C> {
    /// `value / max_value` as a percentage; records without a positive
    /// maximum count as zero.
    pub fn percent(&self) -> f64 {
        if self.max_value > 0.0 {
            100.0 * self.value / self.max_value
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "present" | "p" => Some(Self::Present),
            "absent" | "a" => Some(Self::Absent),
            "late" | "l" => Some(Self::Late),
            "excused" | "e" => Some(Self::Excused),
            _ => None,
        }
    }

    /// Late arrivals still count as attended.
    pub fn is_attended(self) -> bool {
        matches!(self, Self::Present | Self::Late)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentKind {
    Assignment,
    Quiz,
    Midterm,
    Final,
    Project,
    Lab,
}

impl AssessmentKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "assignment" => Some(Self::Assignment),
            "quiz" => Some(Self::Quiz),
            "midterm" => Some(Self::Midterm),
            "final" => Some(Self::Final),
            "project" => Some(Self::Project),
            "lab" => Some(Self::Lab),
            _ => None,
        }
    }
}

pub type AttendanceRecord = Record<AttendanceStatus>;
pub type PerformanceRecord = Record<AssessmentKind>;
