pub mod aggregate;
pub mod analysis;

pub use aggregate::{ResultAnalytics, GRADE_SCALE};
pub use analysis::{analyze_student, rank_students, StudentAnalysis, SubjectComparison};
