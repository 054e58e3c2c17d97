//! Flat per-student rows for spreadsheet use.

use crate::types::{Student, SubjectMark};
use std::collections::BTreeSet;
use std::io::{self, Write};

const SEP: char = ',';

const LEADING_COLUMNS: [&str; 10] = [
    "Seat No",
    "Name",
    "Branch",
    "Gender",
    "Status",
    "ERN",
    "College",
    "Total Marks",
    "CGPA",
    "Result",
];

/// Per-subject column suffixes, in output order
const SUBJECT_COLUMNS: [&str; 7] = ["TermWork", "Theory", "Internal", "Oral", "Total", "Grade", "GradePts"];

/// Attach a category tag (usually the branch a document belongs to)
pub fn tag_branch(students: &mut [Student], branch: &str) {
    for student in students {
        student.branch = Some(branch.to_string());
    }
}

/// Students whose institution contains `keyword`, ignoring case
pub fn filter_by_institution<'a>(students: &'a [Student], keyword: &str) -> Vec<&'a Student> {
    let keyword = keyword.to_lowercase();
    students
        .iter()
        .filter(|s| s.college.to_lowercase().contains(&keyword))
        .collect()
}

/// Write a header row plus one row per student. Subject columns cover every
/// code seen across the set, sorted, so students from different documents
/// line up; a student without a subject gets empty cells there.
pub fn write_students_csv<W: Write>(mut w: W, students: &[&Student]) -> io::Result<()> {
    let codes: BTreeSet<&str> = students
        .iter()
        .flat_map(|s| s.subjects.iter().map(|m| m.code.as_str()))
        .collect();

    let mut header: Vec<String> = LEADING_COLUMNS.iter().map(|c| c.to_string()).collect();
    for code in &codes {
        header.extend(SUBJECT_COLUMNS.iter().map(|suffix| format!("{code}_{suffix}")));
    }
    write_row(&mut w, &header)?;

    for student in students {
        let mut row = vec![
            student.seat_no.clone(),
            student.name.clone(),
            student.branch.clone().unwrap_or_else(|| "Unknown".to_string()),
            student.gender.to_string(),
            student.status.to_string(),
            student.ern.clone(),
            student.college.clone(),
            student.total_marks.to_string(),
            student.cgpa.to_string(),
            student.result.to_string(),
        ];
        for code in &codes {
            match student.subject(code) {
                Some(mark) => row.extend(subject_cells(mark)),
                None => row.extend(std::iter::repeat(String::new()).take(SUBJECT_COLUMNS.len())),
            }
        }
        write_row(&mut w, &row)?;
    }

    Ok(())
}

fn subject_cells(mark: &SubjectMark) -> [String; 7] {
    let opt = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
    [
        opt(mark.term_work),
        opt(mark.external),
        opt(mark.internal),
        opt(mark.oral),
        opt(mark.total),
        mark.grade.clone().unwrap_or_default(),
        opt(mark.grade_points),
    ]
}

fn needs_quotes(field: &str) -> bool {
    field.contains(SEP) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(w: &mut W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, "{}", SEP)?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}
