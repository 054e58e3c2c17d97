// Extraction pipeline - one sub-module per stage:
// - metadata.rs: course catalog and exam header from page 1
// - segmenter.rs: record-start detection and noise filtering
// - rows.rs: token grammars for the tagged component and totals rows
// - student.rs: header recovery and row-to-subject mapping

pub mod metadata;
pub mod rows;
pub mod segmenter;
pub mod student;

pub use metadata::{extract_catalog, ExamInfoExtractor};
pub use rows::{RowGrammar, SubjectTotal, TotalsTail};
pub use segmenter::{Block, BlockSegmenter, NoiseFilter};
pub use student::{StudentHeader, StudentParser};
