use crate::types::*;
use std::collections::BTreeMap;

/// Letter grades in scale order, best first
pub const GRADE_SCALE: [&str; 8] = ["O", "A+", "A", "B+", "B", "C", "D", "F"];

/// Corpus-level statistics over a parsed student set
pub struct ResultAnalytics;

impl ResultAnalytics {
    pub fn compute_statistics(students: &[Student], catalog: &Catalog) -> Statistics {
        let total_students = students.len();
        let passed_students = students.iter().filter(|s| s.passed()).count();

        Statistics {
            total_students,
            passed_students,
            pass_percentage: percentage(passed_students, total_students),
            median_cgpa: round_to(Self::median_cgpa(students), 2),
            subject_toppers: Self::subject_toppers(students, catalog),
            college_statistics: Self::college_statistics(students, catalog),
            grade_distribution: Self::grade_distribution(students),
        }
    }

    /// Upper median over recovered averages only; a 0 average means "not found"
    fn median_cgpa(students: &[Student]) -> f64 {
        let mut cgpas: Vec<f64> = students.iter().map(|s| s.cgpa).filter(|&c| c > 0.0).collect();
        if cgpas.is_empty() {
            return 0.0;
        }
        cgpas.sort_by(|a, b| a.total_cmp(b));
        cgpas[cgpas.len() / 2]
    }

    /// Highest subject total per catalog code. Ties keep the first student seen.
    fn subject_toppers(students: &[Student], catalog: &Catalog) -> BTreeMap<String, SubjectTopper> {
        let mut toppers = BTreeMap::new();

        for code in catalog.codes() {
            let mut best: Option<SubjectTopper> = None;
            for student in students {
                let Some(total) = student.subject(code).and_then(|s| s.total) else {
                    continue;
                };
                let current = best.as_ref().map(|t| t.marks).unwrap_or(0);
                if total > current {
                    best = Some(SubjectTopper {
                        seat_no: student.seat_no.clone(),
                        name: student.name.clone(),
                        marks: total,
                    });
                }
            }
            if let Some(topper) = best {
                toppers.insert(code.to_string(), topper);
            }
        }

        toppers
    }

    /// Breakdown keyed by the institution string exactly as printed
    fn college_statistics(students: &[Student], catalog: &Catalog) -> BTreeMap<String, InstitutionStats> {
        let mut groups: BTreeMap<&str, Vec<&Student>> = BTreeMap::new();
        for student in students {
            groups.entry(student.college.as_str()).or_default().push(student);
        }

        groups
            .into_iter()
            .map(|(college, members)| {
                let total = members.len();
                let passed = members.iter().filter(|s| s.passed()).count();

                let mut subject_stats = BTreeMap::new();
                for spec in catalog.iter() {
                    let marks: Vec<&SubjectMark> =
                        members.iter().filter_map(|s| s.subject(&spec.code)).collect();
                    if marks.is_empty() {
                        continue;
                    }
                    let subject_passed = marks.iter().filter(|m| m.passed).count();
                    subject_stats.insert(
                        spec.code.clone(),
                        SubjectPassStats {
                            name: spec.name.clone(),
                            total: marks.len(),
                            passed: subject_passed,
                            failed: marks.len() - subject_passed,
                            pass_percentage: percentage(subject_passed, marks.len()),
                        },
                    );
                }

                let stats = InstitutionStats {
                    total_students: total,
                    passed_students: passed,
                    failed_students: total - passed,
                    pass_percentage: percentage(passed, total),
                    subject_stats,
                };
                (college.to_string(), stats)
            })
            .collect()
    }

    /// Letter-grade counts across every subject slot, in scale order
    pub fn grade_distribution(students: &[Student]) -> Vec<GradeCount> {
        let mut counts = [0usize; GRADE_SCALE.len()];

        for grade in students.iter().flat_map(|s| &s.subjects).filter_map(|m| m.grade.as_deref()) {
            if let Some(i) = GRADE_SCALE.iter().position(|g| *g == grade) {
                counts[i] += 1;
            }
        }

        GRADE_SCALE
            .iter()
            .zip(counts)
            .map(|(grade, count)| GradeCount {
                grade: grade.to_string(),
                count,
            })
            .collect()
    }
}

/// `part / whole` as a percentage rounded to two places, 0 for an empty whole
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part as f64 / whole as f64 * 100.0, 2)
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        for (code, name) in [("101", "Maths"), ("102", "Physics")] {
            catalog.insert(CourseComponentSpec {
                code: code.to_string(),
                name: name.to_string(),
                credits: 3.0,
                max_marks: 100.0,
                has_internal: true,
                has_external: true,
                has_term_work: false,
                has_oral: false,
            });
        }
        catalog
    }

    fn student(seat: &str, college: &str, totals: [Option<(u32, &str)>; 2], cgpa: f64, result: Outcome) -> Student {
        let catalog = catalog();
        let subjects = catalog
            .iter()
            .zip(totals)
            .map(|(spec, total)| {
                let mut mark = SubjectMark::for_course(spec);
                if let Some((total, grade)) = total {
                    mark.total = Some(total);
                    mark.grade = Some(grade.to_string());
                    mark.grade_points = Some(0);
                    mark.passed = grade != "F";
                }
                mark
            })
            .collect();

        Student {
            seat_no: seat.to_string(),
            name: format!("STUDENT {seat}"),
            status: EnrollmentStatus::Regular,
            gender: Gender::Male,
            ern: String::new(),
            college: college.to_string(),
            subjects,
            total_marks: totals.iter().flatten().map(|(t, _)| t).sum(),
            max_marks: 200,
            cgpa,
            result,
            branch: None,
        }
    }

    #[test]
    fn empty_student_set() {
        let stats = ResultAnalytics::compute_statistics(&[], &catalog());
        assert_eq!(stats.total_students, 0);
        assert_eq!(stats.pass_percentage, 0.0);
        assert_eq!(stats.median_cgpa, 0.0);
        assert!(stats.subject_toppers.is_empty());
        assert!(stats.college_statistics.is_empty());
        assert!(stats.grade_distribution.iter().all(|g| g.count == 0));
    }

    #[test]
    fn pass_rate_and_median_skip_unrecovered_averages() {
        let students = vec![
            student("1000001", "A", [Some((80, "O")), Some((70, "A"))], 9.5, Outcome::Pass),
            student("1000002", "A", [Some((30, "F")), None], 0.0, Outcome::Failed),
            student("1000003", "B", [Some((60, "B")), Some((65, "B+"))], 7.25, Outcome::Pass),
        ];
        let stats = ResultAnalytics::compute_statistics(&students, &catalog());

        assert_eq!(stats.total_students, 3);
        assert_eq!(stats.passed_students, 2);
        assert_eq!(stats.pass_percentage, 66.67);
        // [7.25, 9.5] -> upper median
        assert_eq!(stats.median_cgpa, 9.5);
    }

    #[test]
    fn toppers_keep_first_on_tie() {
        let students = vec![
            student("1000001", "A", [Some((80, "O")), Some((70, "A"))], 9.0, Outcome::Pass),
            student("1000002", "A", [Some((80, "O")), Some((71, "A"))], 9.0, Outcome::Pass),
            student("1000003", "A", [Some((0, "F")), None], 0.0, Outcome::Failed),
        ];
        let stats = ResultAnalytics::compute_statistics(&students, &catalog());

        assert_eq!(stats.subject_toppers["101"].seat_no, "1000001");
        assert_eq!(stats.subject_toppers["101"].marks, 80);
        assert_eq!(stats.subject_toppers["102"].seat_no, "1000002");
    }

    #[test]
    fn zero_totals_produce_no_topper() {
        let students = vec![student("1000001", "A", [Some((0, "F")), None], 0.0, Outcome::Failed)];
        let stats = ResultAnalytics::compute_statistics(&students, &catalog());
        assert!(stats.subject_toppers.is_empty());
    }

    #[test]
    fn colleges_group_by_exact_name() {
        let students = vec![
            student("1000001", "MIT College", [Some((80, "O")), Some((30, "F"))], 5.0, Outcome::Failed),
            student("1000002", "MIT College", [Some((60, "B")), Some((50, "C"))], 6.0, Outcome::Pass),
            student("1000003", "MIT  College", [Some((60, "B")), Some((50, "C"))], 6.0, Outcome::Pass),
        ];
        let stats = ResultAnalytics::compute_statistics(&students, &catalog());

        assert_eq!(stats.college_statistics.len(), 2);
        let mit = &stats.college_statistics["MIT College"];
        assert_eq!(mit.total_students, 2);
        assert_eq!(mit.passed_students, 1);
        assert_eq!(mit.failed_students, 1);
        assert_eq!(mit.pass_percentage, 50.0);

        let physics = &mit.subject_stats["102"];
        assert_eq!(physics.name, "Physics");
        assert_eq!((physics.total, physics.passed, physics.failed), (2, 1, 1));
        assert_eq!(mit.subject_stats["101"].pass_percentage, 100.0);
    }

    #[test]
    fn grade_distribution_follows_scale_order() {
        let students = vec![
            student("1000001", "A", [Some((80, "O")), Some((70, "A"))], 9.0, Outcome::Pass),
            student("1000002", "A", [Some((30, "F")), Some((10, "X"))], 0.0, Outcome::Failed),
        ];
        let distribution = ResultAnalytics::grade_distribution(&students);

        let grades: Vec<&str> = distribution.iter().map(|g| g.grade.as_str()).collect();
        assert_eq!(grades, GRADE_SCALE);
        let count = |g: &str| distribution.iter().find(|c| c.grade == g).map(|c| c.count);
        assert_eq!(count("O"), Some(1));
        assert_eq!(count("A"), Some(1));
        assert_eq!(count("F"), Some(1));
        assert_eq!(distribution.iter().map(|g| g.count).sum::<usize>(), 3);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(66.666666, 2), 66.67);
        assert_eq!(round_to(7.44444, 1), 7.4);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(0, 0), 0.0);
    }
}
