use super::aggregate::round_to;
use crate::error::{GradecardError, GradecardResult};
use crate::types::{ParseResult, Student};
use serde::{Deserialize, Serialize};

/// How one subject of one student compares with the rest of the class
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectComparison {
    pub code: String,
    pub name: String,
    pub marks: u32,
    pub grade: Option<String>,
    pub passed: bool,
    pub class_avg: f64,
    pub class_max: u32,
    pub class_min: u32,
    pub rank: usize,
    /// Students with a recorded total for this subject
    pub total_students: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentAnalysis {
    pub student: Student,
    pub overall_rank: usize,
    pub total_students: usize,
    pub percentile: f64,
    pub subject_comparison: Vec<SubjectComparison>,
}

/// Rank a single student against everyone else in the same result.
///
/// Rank is 1 + the number of students strictly ahead, so equal totals share
/// a rank. Percentile counts students strictly behind.
pub fn analyze_student(result: &ParseResult, seat_no: &str) -> GradecardResult<StudentAnalysis> {
    let target = result
        .student(seat_no)
        .ok_or_else(|| GradecardError::UnknownSeat(seat_no.to_string()))?;

    let students = &result.students;
    let ahead = students.iter().filter(|s| s.total_marks > target.total_marks).count();
    let behind = students.iter().filter(|s| s.total_marks < target.total_marks).count();

    let subject_comparison = target
        .subjects
        .iter()
        .filter_map(|subject| {
            let marks = subject.total?;
            let class: Vec<u32> = students
                .iter()
                .filter_map(|s| s.subject(&subject.code).and_then(|m| m.total))
                .collect();
            let class_max = class.iter().copied().max()?;
            let class_min = class.iter().copied().min()?;
            let sum: u32 = class.iter().sum();

            Some(SubjectComparison {
                code: subject.code.clone(),
                name: subject.name.clone(),
                marks,
                grade: subject.grade.clone(),
                passed: subject.passed,
                class_avg: round_to(sum as f64 / class.len() as f64, 1),
                class_max,
                class_min,
                rank: 1 + class.iter().filter(|&&m| m > marks).count(),
                total_students: class.len(),
            })
        })
        .collect();

    Ok(StudentAnalysis {
        student: target.clone(),
        overall_rank: ahead + 1,
        total_students: students.len(),
        percentile: round_to(behind as f64 / students.len() as f64 * 100.0, 1),
        subject_comparison,
    })
}

/// Students by total marks, best first. Equal totals keep document order.
pub fn rank_students(result: &ParseResult) -> Vec<&Student> {
    let mut ranked: Vec<&Student> = result.students.iter().collect();
    ranked.sort_by(|a, b| b.total_marks.cmp(&a.total_marks));
    ranked
}
