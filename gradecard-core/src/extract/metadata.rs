//! Course catalog and exam header recovery from the first page.

use crate::config::CatalogLayout;
use crate::error::{GradecardError, GradecardResult};
use crate::types::{Catalog, CourseComponentSpec, ExamInfo, Table, TableRow};
use regex::Regex;

/// Number of leading words of page 1 searched for the exam header sentence
const HEADER_WORD_LIMIT: usize = 200;

/// Build the subject catalog from the first page's tables.
///
/// A row is a subject row only when its first cell is a non-empty digit
/// string. Credits and max marks default to 0 when missing or printed as the
/// placeholder; anything else that fails to parse is a `CatalogField` error.
pub fn extract_catalog(tables: &[Table], layout: &CatalogLayout) -> GradecardResult<Catalog> {
    let mut catalog = Catalog::new();

    for table in tables {
        for row in table.iter().skip(layout.skip_rows) {
            let Some(code) = subject_code(row) else {
                continue;
            };

            let name = cell(row, 1).unwrap_or_default().to_string();
            let credits = numeric_field(&code, "credits", cell(row, layout.credits_column), layout)?;
            let max_marks = numeric_field(&code, "max_marks", row.last().and_then(|c| c.as_deref()), layout)?;

            catalog.insert(CourseComponentSpec {
                has_internal: has_component(row, layout.internal_max_column, layout),
                has_external: has_component(row, layout.external_max_column, layout),
                has_term_work: has_component(row, layout.term_work_max_column, layout),
                has_oral: has_component(row, layout.oral_max_column, layout),
                code,
                name,
                credits,
                max_marks,
            });
        }
    }

    if catalog.is_empty() {
        return Err(GradecardError::EmptyCatalog);
    }

    log::debug!("📚 Course catalog: {} subjects", catalog.len());
    Ok(catalog)
}

fn cell(row: &TableRow, index: usize) -> Option<&str> {
    row.get(index).and_then(|c| c.as_deref()).map(str::trim)
}

fn subject_code(row: &TableRow) -> Option<String> {
    let first = cell(row, 0)?;
    if !first.is_empty() && first.chars().all(|c| c.is_ascii_digit()) {
        Some(first.to_string())
    } else {
        None
    }
}

fn numeric_field(
    code: &str,
    field: &'static str,
    value: Option<&str>,
    layout: &CatalogLayout,
) -> GradecardResult<f64> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() || value == layout.placeholder {
        return Ok(0.0);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GradecardError::CatalogField {
            code: code.to_string(),
            field,
            value: value.to_string(),
        })
}

fn has_component(row: &TableRow, column: usize, layout: &CatalogLayout) -> bool {
    match cell(row, column) {
        Some(value) => value != layout.placeholder && is_plain_number(value),
        None => false,
    }
}

/// Digits with at most one decimal point, e.g. "20" or "12.5"
fn is_plain_number(value: &str) -> bool {
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    let dots = value.chars().filter(|&c| c == '.').count();
    digits > 0 && dots <= 1 && digits + dots == value.chars().count()
}

/// Recovers the exam header fields from page 1 text. Each field is matched
/// independently and keeps its "Unknown" default when its pattern misses.
pub struct ExamInfoExtractor {
    program: Regex,
    semester: Regex,
    scheme: Regex,
    examination: Regex,
}

impl ExamInfoExtractor {
    pub fn new() -> GradecardResult<Self> {
        Ok(Self {
            program: Regex::new(r"(?i)OFFICE REGISTER FOR THE\s+(.+?)\s*\(\s*Semester")?,
            semester: Regex::new(r"(?i)\(\s*Semester\s*-\s*([IVX]+)\s*\)")?,
            scheme: Regex::new(r"(?i)\(\s*(NEP[^)]*)\s*\)")?,
            examination: Regex::new(r"(?i)EXAMINATION HELD IN\s+([A-Z]+\s+\d{4})")?,
        })
    }

    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> ExamInfo {
        let text = lines
            .iter()
            .flat_map(|l| l.as_ref().split_whitespace())
            .take(HEADER_WORD_LIMIT)
            .collect::<Vec<_>>()
            .join(" ");

        let mut info = ExamInfo::default();
        if let Some(c) = self.program.captures(&text) {
            info.program = c[1].trim().to_string();
        }
        if let Some(c) = self.semester.captures(&text) {
            info.semester = format!("Sem {}", &c[1]);
        }
        if let Some(c) = self.scheme.captures(&text) {
            info.scheme = c[1].trim().to_string();
        }
        if let Some(c) = self.examination.captures(&text) {
            info.examination = c[1].trim().to_string();
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> TableRow {
        cells
            .iter()
            .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
            .collect()
    }

    fn course_table() -> Table {
        vec![
            row(&["Course Code", "Course Title", "Credits", "I1", "", "E1", "", "T1", "", "O1", "", "Total", ""]),
            row(&["", "", "", "Min", "Max", "Min", "Max", "Min", "Max", "Min", "Max", "Min", "Max"]),
            row(&["10411", "Applied Mathematics-I", "3", "8", "20", "32", "80", "...", "...", "...", "...", "40", "100"]),
            row(&["10412", "Applied Physics", "2", "...", "...", "...", "...", "10", "25", "10", "25", "20", "50"]),
            row(&["", "continued title", "", "", "", "", "", "", "", "", "", "", ""]),
            row(&["10413", " Engineering Mechanics ", "4", "8", "20", "32", "80", "10", "25", "...", "...", "50", "125"]),
        ]
    }

    #[test]
    fn catalog_reads_components_from_max_columns() {
        let catalog = extract_catalog(&[course_table()], &CatalogLayout::default()).unwrap();

        assert_eq!(catalog.len(), 3);
        let maths = catalog.get("10411").unwrap();
        assert_eq!(maths.credits, 3.0);
        assert_eq!(maths.max_marks, 100.0);
        assert!(maths.has_internal && maths.has_external);
        assert!(!maths.has_term_work && !maths.has_oral);

        let physics = catalog.get("10412").unwrap();
        assert!(!physics.has_internal && !physics.has_external);
        assert!(physics.has_term_work && physics.has_oral);

        let mechanics = catalog.get("10413").unwrap();
        assert_eq!(mechanics.name, "Engineering Mechanics");
        assert_eq!(catalog.total_max_marks(), 275);
    }

    #[test]
    fn placeholder_and_missing_numbers_default_to_zero() {
        let table = vec![
            row(&["h"]),
            row(&["h"]),
            row(&["501", "Seminar", "...", "", "", "", "", "", "", "", "", "", "..."]),
        ];
        let catalog = extract_catalog(&[table], &CatalogLayout::default()).unwrap();

        let seminar = catalog.get("501").unwrap();
        assert_eq!(seminar.credits, 0.0);
        assert_eq!(seminar.max_marks, 0.0);
        assert!(!seminar.has_internal);
    }

    #[test]
    fn short_rows_take_max_marks_from_last_cell() {
        let table = vec![row(&["h"]), row(&["h"]), row(&["503", "Project", "2"])];
        let catalog = extract_catalog(&[table], &CatalogLayout::default()).unwrap();

        let project = catalog.get("503").unwrap();
        assert_eq!(project.credits, 2.0);
        assert_eq!(project.max_marks, 2.0);
        assert!(!project.has_external);
    }

    #[test]
    fn non_numeric_credits_is_reported() {
        let table = vec![
            row(&["h"]),
            row(&["h"]),
            row(&["601", "Drawing", "two", "...", "...", "...", "...", "...", "...", "...", "...", "...", "50"]),
        ];
        let err = extract_catalog(&[table], &CatalogLayout::default()).unwrap_err();
        match err {
            GradecardError::CatalogField { code, field, value } => {
                assert_eq!(code, "601");
                assert_eq!(field, "credits");
                assert_eq!(value, "two");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_finite_numbers_are_reported() {
        for bad in ["NaN", "inf", "-infinity"] {
            let table = vec![
                row(&["h"]),
                row(&["h"]),
                row(&["602", "Workshop", bad, "...", "...", "...", "...", "...", "...", "...", "...", "...", "50"]),
            ];
            match extract_catalog(&[table], &CatalogLayout::default()) {
                Err(GradecardError::CatalogField { code, field, value }) => {
                    assert_eq!(code, "602");
                    assert_eq!(field, "credits");
                    assert_eq!(value, bad);
                }
                other => panic!("{bad} was not rejected: {other:?}"),
            }
        }
    }

    #[test]
    fn header_rows_only_is_an_empty_catalog() {
        let table = vec![row(&["Course Code", "Title"]), row(&["", "Min"])];
        let err = extract_catalog(&[table], &CatalogLayout::default()).unwrap_err();
        assert!(matches!(err, GradecardError::EmptyCatalog));
        assert!(matches!(
            extract_catalog(&[], &CatalogLayout::default()),
            Err(GradecardError::EmptyCatalog)
        ));
    }

    #[test]
    fn exam_info_fields_match_independently() {
        let extractor = ExamInfoExtractor::new().unwrap();
        let info = extractor.extract(&[
            "University Of Mumbai",
            "OFFICE REGISTER FOR THE Bachelor of Engineering( Electronics Engineering) ( Semester - I )",
            "( NEP 2020 ) EXAMINATION HELD IN DECEMBER 2024",
        ]);
        assert_eq!(info.program, "Bachelor of Engineering( Electronics Engineering)");
        assert_eq!(info.semester, "Sem I");
        assert_eq!(info.scheme, "NEP 2020");
        assert_eq!(info.examination, "DECEMBER 2024");

        let partial = extractor.extract(&["EXAMINATION HELD IN MAY 2025"]);
        assert_eq!(partial.program, "Unknown Program");
        assert_eq!(partial.semester, "Unknown Semester");
        assert_eq!(partial.scheme, "Unknown Scheme");
        assert_eq!(partial.examination, "MAY 2025");
    }
}
