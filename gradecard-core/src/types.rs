use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

// ===== INPUT TYPES =====
// What the document text provider hands us: one entry per page, lines in
// reading order. Only page 1 is expected to carry tables.

/// A single table cell. Extractors emit `null` for merged/empty cells.
pub type TableCell = Option<String>;
pub type TableRow = Vec<TableCell>;
pub type Table = Vec<TableRow>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentText {
    pub pages: Vec<PageText>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageText {
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl PageText {
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.as_ref().to_string()).collect(),
            tables: Vec::new(),
        }
    }
}

// ===== COURSE CATALOG =====

/// The four separately graded assessment components of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Internal,
    External,
    TermWork,
    Oral,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::TermWork,
        Component::Oral,
        Component::External,
        Component::Internal,
    ];

    /// Row tag used by the result sheet for this component
    pub fn tag(&self) -> &'static str {
        match self {
            Component::Internal => "I1",
            Component::External => "E1",
            Component::TermWork => "T1",
            Component::Oral => "O1",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.tag() == tag)
    }
}

/// One row of the first-page course table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseComponentSpec {
    pub code: String,
    pub name: String,
    pub credits: f64,
    pub max_marks: f64,
    pub has_internal: bool,
    pub has_external: bool,
    pub has_term_work: bool,
    pub has_oral: bool,
}

impl CourseComponentSpec {
    pub fn has(&self, component: Component) -> bool {
        match component {
            Component::Internal => self.has_internal,
            Component::External => self.has_external,
            Component::TermWork => self.has_term_work,
            Component::Oral => self.has_oral,
        }
    }
}

/// Subject catalog keyed by code, in the order the course table lists them.
/// Serializes as a JSON object from code to subject, keeping that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    subjects: Vec<CourseComponentSpec>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a subject. A repeated code replaces the earlier entry in place.
    pub fn insert(&mut self, spec: CourseComponentSpec) {
        match self.subjects.iter_mut().find(|s| s.code == spec.code) {
            Some(existing) => *existing = spec,
            None => self.subjects.push(spec),
        }
    }

    pub fn get(&self, code: &str) -> Option<&CourseComponentSpec> {
        self.subjects.iter().find(|s| s.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CourseComponentSpec> {
        self.subjects.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.subjects.iter().map(|s| s.code.as_str())
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Ordered subsequence of codes whose subject grades `component`.
    /// Component rows list values for exactly these subjects, left to right.
    pub fn codes_with(&self, component: Component) -> Vec<&str> {
        self.subjects
            .iter()
            .filter(|s| s.has(component))
            .map(|s| s.code.as_str())
            .collect()
    }

    /// Sum of per-subject maximum marks, truncated to whole marks
    pub fn total_max_marks(&self) -> u32 {
        self.subjects.iter().map(|s| s.max_marks).sum::<f64>() as u32
    }
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.subjects.len()))?;
        for spec in &self.subjects {
            map.serialize_entry(&spec.code, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = Catalog;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from subject code to course spec")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Catalog, A::Error> {
                let mut catalog = Catalog::new();
                while let Some((code, mut spec)) = access.next_entry::<String, CourseComponentSpec>()? {
                    spec.code = code;
                    catalog.insert(spec);
                }
                Ok(catalog)
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExamInfo {
    pub program: String,
    pub semester: String,
    pub scheme: String,
    pub examination: String,
}

impl Default for ExamInfo {
    fn default() -> Self {
        Self {
            program: "Unknown Program".to_string(),
            semester: "Unknown Semester".to_string(),
            scheme: "Unknown Scheme".to_string(),
            examination: "Unknown Examination".to_string(),
        }
    }
}

// ===== STUDENT RECORDS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    Regular,
    Repeater,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Pass,
    #[default]
    Failed,
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentStatus::Regular => write!(f, "Regular"),
            EnrollmentStatus::Repeater => write!(f, "Repeater"),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "MALE"),
            Gender::Female => write!(f, "FEMALE"),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => write!(f, "PASS"),
            Outcome::Failed => write!(f, "FAILED"),
        }
    }
}

/// A single value read from a component row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentValue {
    /// Raw recorded mark plus grace marks added on top of it
    Value { mark: u32, grace: u32 },
    Absent,
}

impl ComponentValue {
    pub fn mark(&self) -> Option<u32> {
        match self {
            ComponentValue::Value { mark, .. } => Some(*mark),
            ComponentValue::Absent => None,
        }
    }

    pub fn grace(&self) -> u32 {
        match self {
            ComponentValue::Value { grace, .. } => *grace,
            ComponentValue::Absent => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectMark {
    pub code: String,
    pub name: String,
    pub credits: f64,
    pub internal: Option<u32>,
    pub external: Option<u32>,
    pub term_work: Option<u32>,
    pub oral: Option<u32>,
    pub internal_grace: u32,
    pub external_grace: u32,
    pub term_work_grace: u32,
    pub oral_grace: u32,
    pub total: Option<u32>,
    pub grade: Option<String>,
    pub grade_points: Option<u32>,
    pub passed: bool,
}

impl SubjectMark {
    /// Empty slot for a catalog subject
    pub fn for_course(spec: &CourseComponentSpec) -> Self {
        Self {
            code: spec.code.clone(),
            name: spec.name.clone(),
            credits: spec.credits,
            internal: None,
            external: None,
            term_work: None,
            oral: None,
            internal_grace: 0,
            external_grace: 0,
            term_work_grace: 0,
            oral_grace: 0,
            total: None,
            grade: None,
            grade_points: None,
            passed: true,
        }
    }

    pub fn component(&self, component: Component) -> ComponentValue {
        let (mark, grace) = match component {
            Component::Internal => (self.internal, self.internal_grace),
            Component::External => (self.external, self.external_grace),
            Component::TermWork => (self.term_work, self.term_work_grace),
            Component::Oral => (self.oral, self.oral_grace),
        };
        match mark {
            Some(mark) => ComponentValue::Value { mark, grace },
            None => ComponentValue::Absent,
        }
    }

    pub fn set_component(&mut self, component: Component, value: ComponentValue) {
        let (mark, grace) = match component {
            Component::Internal => (&mut self.internal, &mut self.internal_grace),
            Component::External => (&mut self.external, &mut self.external_grace),
            Component::TermWork => (&mut self.term_work, &mut self.term_work_grace),
            Component::Oral => (&mut self.oral, &mut self.oral_grace),
        };
        *mark = value.mark();
        *grace = value.grace();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub seat_no: String,
    pub name: String,
    pub status: EnrollmentStatus,
    pub gender: Gender,
    pub ern: String,
    pub college: String,
    pub subjects: Vec<SubjectMark>,
    pub total_marks: u32,
    pub max_marks: u32,
    pub cgpa: f64,
    pub result: Outcome,
    /// Category tag attached by the caller after parsing (e.g. a branch name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl Student {
    pub fn subject(&self, code: &str) -> Option<&SubjectMark> {
        self.subjects.iter().find(|s| s.code == code)
    }

    pub fn passed(&self) -> bool {
        self.result == Outcome::Pass
    }
}

// ===== PARSE OUTPUT =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectTopper {
    pub seat_no: String,
    pub name: String,
    pub marks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectPassStats {
    pub name: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstitutionStats {
    pub total_students: usize,
    pub passed_students: usize,
    pub failed_students: usize,
    pub pass_percentage: f64,
    pub subject_stats: BTreeMap<String, SubjectPassStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeCount {
    pub grade: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Statistics {
    pub total_students: usize,
    pub passed_students: usize,
    pub pass_percentage: f64,
    pub median_cgpa: f64,
    pub subject_toppers: BTreeMap<String, SubjectTopper>,
    pub college_statistics: BTreeMap<String, InstitutionStats>,
    pub grade_distribution: Vec<GradeCount>,
}

/// Everything recovered from one document. Contains no timestamps, so the
/// same input always serializes to the same bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseResult {
    pub exam_info: ExamInfo,
    pub course_metadata: Catalog,
    pub students: Vec<Student>,
    pub statistics: Statistics,
    pub max_marks: u32,
    /// Blocks whose header line matched no accepted shape
    pub unparsed_blocks: usize,
}

impl ParseResult {
    pub fn student(&self, seat_no: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.seat_no == seat_no)
    }
}

/// A block dropped because its first line is not a recognisable student header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralMismatch {
    pub page: usize,
    pub header_line: String,
}

#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub result: ParseResult,
    pub rejected: Vec<StructuralMismatch>,
}
