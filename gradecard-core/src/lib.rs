// Gradecard Core Library
//
// Turns the page text of an exported result sheet into structured student
// records and corpus statistics, with a pluggable text provider and result
// cache around the extraction pipeline.

pub mod types;
pub mod error;
pub mod config;
pub mod provider;
pub mod extract;
pub mod stats;
pub mod export;
pub mod processor;
pub mod cache;
pub mod storage;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::{GradecardError, GradecardResult};
pub use config::ParsingConfig;
pub use provider::{JsonTextProvider, TextProvider};
pub use processor::{parse_document, GradecardProcessor, StepProfiler};
pub use stats::{analyze_student, rank_students, StudentAnalysis, SubjectComparison};
pub use export::{filter_by_institution, tag_branch, write_students_csv};
pub use cache::CacheIndexEntry;
