pub mod assessments;
pub mod attendance;
pub mod core;
pub mod feedback;
pub mod materials;
pub mod performance;
pub mod syllabus;
