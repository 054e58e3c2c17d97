//! Recovers one `Student` from one block.
//!
//! Only an unrecognisable header line rejects a block. Every other gap
//! (missing rows, unreadable tokens, short totals rows) leaves the affected
//! fields at their defaults.

use super::rows::{RowGrammar, SubjectTotal};
use super::segmenter::Block;
use crate::config::GradeAverageRange;
use crate::error::GradecardResult;
use crate::types::*;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// How many lines after the header are searched for a detached ERN
const ERN_LOOKAHEAD: usize = 4;

/// Identity fields from a block's first line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentHeader {
    pub seat_no: String,
    pub name: String,
    pub status: EnrollmentStatus,
    pub gender: Gender,
    pub ern: String,
    pub college: String,
}

/// Classification of a non-header block line
#[derive(Debug, Clone, Copy, PartialEq)]
enum BodyLine<'a> {
    Component(Component, &'a str),
    Outcome(Outcome),
    Totals(&'a str),
    Decimal(f64),
    Other,
}

pub struct StudentParser<'a> {
    catalog: &'a Catalog,
    grade_average: GradeAverageRange,
    grammar: RowGrammar,
    header_with_ern: Regex,
    header_without_ern: Regex,
    detached_ern: Regex,
}

impl<'a> StudentParser<'a> {
    pub fn new(catalog: &'a Catalog, grade_average: GradeAverageRange) -> GradecardResult<Self> {
        Ok(Self {
            catalog,
            grade_average,
            grammar: RowGrammar::new()?,
            header_with_ern: Regex::new(
                r"^(\d{7})\s+(.+?)\s+(Regular|Repeater)\s+(MALE|FEMALE)\s+\(([^)]+)\)\s+(.+)$",
            )?,
            header_without_ern: Regex::new(r"^(\d{7})\s+(.+?)\s+(Regular|Repeater)\s+(MALE|FEMALE)\s+(.+)$")?,
            detached_ern: Regex::new(r"\(?(MU\d+)\)?")?,
        })
    }

    pub fn parse(&self, block: &Block) -> Result<Student, StructuralMismatch> {
        let header = self.parse_header(&block.lines).ok_or_else(|| StructuralMismatch {
            page: block.page,
            header_line: block.header().to_string(),
        })?;

        let mut rows: HashMap<Component, Vec<ComponentValue>> = HashMap::new();
        let mut totals: Vec<SubjectTotal> = Vec::new();
        let mut total_marks = 0;
        let mut result = Outcome::Failed;
        let mut cgpa = 0.0;

        for line in block.lines.iter().skip(1) {
            match self.classify(line.trim()) {
                BodyLine::Component(component, text) => {
                    rows.insert(component, self.grammar.component_values(text));
                    if component == Component::Internal {
                        if let Some(annotation) = self.grammar.result_annotation(text) {
                            total_marks = annotation.total;
                            if let Some(outcome) = annotation.outcome {
                                result = outcome;
                            }
                        }
                    }
                }
                // A stray result word before any marks is not trusted
                BodyLine::Outcome(outcome) => {
                    if total_marks > 0 {
                        result = outcome;
                    }
                }
                BodyLine::Totals(text) => {
                    totals.extend(self.grammar.subject_totals(text));
                    if let Some(avg) = self.grammar.totals_tail(text).and_then(|t| t.grade_average) {
                        self.accept_grade_average(avg, &header.seat_no, &mut cgpa);
                    }
                }
                BodyLine::Decimal(value) => self.accept_grade_average(value, &header.seat_no, &mut cgpa),
                BodyLine::Other => {}
            }
        }

        let subjects = self.assign_subjects(&rows, &totals);
        log::debug!(
            "🎓 {} {}: {} subjects, total {}, {}",
            header.seat_no,
            header.name,
            subjects.len(),
            total_marks,
            result
        );

        Ok(Student {
            seat_no: header.seat_no,
            name: header.name,
            status: header.status,
            gender: header.gender,
            ern: header.ern,
            college: header.college,
            subjects,
            total_marks,
            max_marks: self.catalog.total_max_marks(),
            cgpa,
            result,
            branch: None,
        })
    }

    /// Try the header shape with an inline `(ERN)` first, then the shape
    /// without one, searching the next few lines for the ERN instead.
    pub fn parse_header(&self, lines: &[String]) -> Option<StudentHeader> {
        let first = lines.first()?;

        if let Some(caps) = self.header_with_ern.captures(first) {
            return Some(header_from(&caps, caps[5].to_string(), &caps[6]));
        }

        let caps = self.header_without_ern.captures(first)?;
        let ern = lines
            .iter()
            .skip(1)
            .take(ERN_LOOKAHEAD)
            .find_map(|line| self.detached_ern.captures(line).map(|c| c[1].to_string()))
            .unwrap_or_default();
        Some(header_from(&caps, ern, &caps[5]))
    }

    fn classify<'l>(&self, line: &'l str) -> BodyLine<'l> {
        if let Some(component) = component_tag(line) {
            return BodyLine::Component(component, line);
        }
        if line.contains("FAILE") {
            return BodyLine::Outcome(Outcome::Failed);
        }
        if line == "PASS" || line == "PASSED" {
            return BodyLine::Outcome(Outcome::Pass);
        }
        if line.starts_with("TOT ") {
            return BodyLine::Totals(line);
        }
        match self.grammar.bare_decimal(line) {
            Some(value) => BodyLine::Decimal(value),
            None => BodyLine::Other,
        }
    }

    fn accept_grade_average(&self, value: f64, seat_no: &str, cgpa: &mut f64) {
        if self.grade_average.contains(value) {
            *cgpa = value;
        } else {
            // Usually the credit-sum column pulled in by a wrapped line
            log::debug!("⚠️  {}: grade average {} out of range, ignored", seat_no, value);
        }
    }

    /// Map positional row values onto catalog subjects. Each component row
    /// lists only the subjects that grade that component, in catalog order,
    /// so every component advances its own cursor.
    fn assign_subjects(
        &self,
        rows: &HashMap<Component, Vec<ComponentValue>>,
        totals: &[SubjectTotal],
    ) -> Vec<SubjectMark> {
        let mut cursors: HashMap<Component, usize> = HashMap::new();

        self.catalog
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let mut mark = SubjectMark::for_course(spec);

                for component in Component::ALL {
                    if !spec.has(component) {
                        continue;
                    }
                    let cursor = cursors.entry(component).or_insert(0);
                    if let Some(value) = rows.get(&component).and_then(|r| r.get(*cursor)) {
                        mark.set_component(component, *value);
                        *cursor += 1;
                    }
                }

                if let Some(subject_total) = totals.get(i) {
                    mark.total = subject_total.total;
                    mark.grade = Some(subject_total.grade.clone());
                    mark.grade_points = Some(subject_total.grade_points);
                    mark.passed = subject_total.passed();
                }

                mark
            })
            .collect()
    }
}

fn component_tag(line: &str) -> Option<Component> {
    let (tag, _) = line.split_once(' ')?;
    Component::from_tag(tag)
}

fn header_from(caps: &Captures, ern: String, college: &str) -> StudentHeader {
    StudentHeader {
        seat_no: caps[1].to_string(),
        name: caps[2].trim().to_string(),
        status: match &caps[3] {
            "Repeater" => EnrollmentStatus::Repeater,
            _ => EnrollmentStatus::Regular,
        },
        gender: match &caps[4] {
            "FEMALE" => Gender::Female,
            _ => Gender::Male,
        },
        ern,
        college: college.trim().to_string(),
    }
}
