//! Token grammars for the tagged rows of a student block.
//!
//! Component rows (`T1`, `O1`, `E1`, `I1`) carry one entry per applicable
//! subject: a mark with its pass/fail suffix, or `ABS`.
//!
//! ```text
//! T1 18 P 21 @3 P ABS          -> 18, 21 (+3 grace), absent
//! E1 28 0 F 3.0 65+ P          -> 28 (failed, 0 credits), 65 (carried forward)
//! ```
//!
//! The `TOT` row carries a 5-tuple per subject followed by the credit sum,
//! the weighted grade-point sum and the grade average.

use crate::error::GradecardResult;
use crate::types::{ComponentValue, Outcome};
use regex::Regex;

/// One subject's entry in the `TOT` row
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectTotal {
    /// `None` when the sheet prints the ellipsis placeholder
    pub total: Option<u32>,
    pub grade_points: u32,
    pub grade: String,
    pub credits: f64,
    pub credit_points: f64,
}

impl SubjectTotal {
    pub fn passed(&self) -> bool {
        self.grade != "F"
    }
}

/// The trailing numbers of a `TOT` row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalsTail {
    pub credits: Option<f64>,
    pub credit_points: Option<f64>,
    pub grade_average: Option<f64>,
}

/// `(total) RESULT` annotation of the internal-marks row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultAnnotation {
    pub total: u32,
    pub outcome: Option<Outcome>,
}

pub struct RowGrammar {
    component_entry: Regex,
    subject_total: Regex,
    totals_tail: Regex,
    result_annotation: Regex,
    bare_decimal: Regex,
}

impl RowGrammar {
    pub fn new() -> GradecardResult<Self> {
        Ok(Self {
            component_entry: Regex::new(
                r"(?P<mark>\d+)\+?(?:\s+\+)?(?:\s+@(?P<grace>\d+))?(?:\s+\+)?\s+(?:P\b|0\s+F\s+[\d.]+)|\b(?P<absent>ABS)\b",
            )?,
            subject_total: Regex::new(
                r"(?:(?P<total>\d+)\+?|\.{2,3})\s+(?P<gp>\d+)\s+(?P<grade>[A-Z+]+)\s+(?P<credits>[\d.]+)\s+(?P<cp>[\d.]+)",
            )?,
            totals_tail: Regex::new(r"(?P<credits>\d+)\s+(?P<cp>[\d.]+)\s+(?P<avg>[\d.]+)\s*$")?,
            result_annotation: Regex::new(r"\((?P<total>\d+)\)\s*(?P<outcome>FAILED|PASSED|PASS)?")?,
            bare_decimal: Regex::new(r"^[\d.]+$")?,
        })
    }

    /// Entries of a component row, left to right. Tokens that fit neither
    /// shape are skipped; an unreadable mark degrades to `Absent`.
    pub fn component_values(&self, line: &str) -> Vec<ComponentValue> {
        self.component_entry
            .captures_iter(line)
            .map(|caps| {
                if caps.name("absent").is_some() {
                    return ComponentValue::Absent;
                }
                let mark = caps.name("mark").and_then(|m| m.as_str().parse::<u32>().ok());
                let grace = caps
                    .name("grace")
                    .and_then(|g| g.as_str().parse::<u32>().ok())
                    .unwrap_or(0);
                match mark {
                    Some(mark) => ComponentValue::Value { mark, grace },
                    None => ComponentValue::Absent,
                }
            })
            .collect()
    }

    /// Per-subject 5-tuples of a `TOT` row, in catalog order
    pub fn subject_totals(&self, line: &str) -> Vec<SubjectTotal> {
        self.subject_total
            .captures_iter(line)
            .filter_map(|caps| {
                Some(SubjectTotal {
                    total: caps.name("total").and_then(|t| t.as_str().parse().ok()),
                    grade_points: caps["gp"].parse().ok()?,
                    grade: caps["grade"].to_string(),
                    credits: caps["credits"].parse().ok()?,
                    credit_points: caps["cp"].parse().ok()?,
                })
            })
            .collect()
    }

    /// Credit sum, weighted sum and grade average at the end of a `TOT` row.
    /// Range checking of the average is left to the caller.
    pub fn totals_tail(&self, line: &str) -> Option<TotalsTail> {
        let caps = self.totals_tail.captures(line.trim_end())?;
        Some(TotalsTail {
            credits: caps["credits"].parse().ok(),
            credit_points: caps["cp"].parse().ok(),
            grade_average: caps["avg"].parse().ok(),
        })
    }

    pub fn result_annotation(&self, line: &str) -> Option<ResultAnnotation> {
        let caps = self.result_annotation.captures(line)?;
        let total = caps["total"].parse().ok()?;
        let outcome = caps.name("outcome").map(|o| match o.as_str() {
            "FAILED" => Outcome::Failed,
            _ => Outcome::Pass,
        });
        Some(ResultAnnotation { total, outcome })
    }

    /// A line holding nothing but a decimal number
    pub fn bare_decimal(&self, line: &str) -> Option<f64> {
        if self.bare_decimal.is_match(line) {
            line.parse().ok()
        } else {
            None
        }
    }
}
