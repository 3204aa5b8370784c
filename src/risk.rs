use std::collections::HashMap;

use crate::models::{EnrollmentRecord, FailedComponent, FailedComponentEntry, StudentRecord};
use crate::rows::parse_score;

/// "true" or "eligible", any case, surrounding whitespace ignored.
pub fn is_affirmative(flag: &str) -> bool {
    let flag = flag.trim();
    flag.eq_ignore_ascii_case("true") || flag.eq_ignore_ascii_case("eligible")
}

pub fn eligibility_flags(students: &[StudentRecord]) -> HashMap<String, String> {
    students
        .iter()
        .map(|s| (s.student_id.clone(), s.recovery_eligibility.clone()))
        .collect()
}

/// Components of one enrollment scoring under the pass mark, exam first.
pub fn failed_components(enrollment: &EnrollmentRecord, pass_mark: f64) -> Vec<FailedComponent> {
    let mut failed = Vec::with_capacity(2);
    if parse_score(&enrollment.exam_score) < pass_mark {
        failed.push(FailedComponent::Exam);
    }
    if parse_score(&enrollment.assignment_score) < pass_mark {
        failed.push(FailedComponent::Assignment);
    }
    failed
}

/// Flag every failing component of every enrollment whose student is marked
/// eligible for recovery. Output follows enrollment order.
pub fn scan_at_risk(
    enrollments: &[EnrollmentRecord],
    flags: &HashMap<String, String>,
    pass_mark: f64,
) -> Vec<FailedComponentEntry> {
    let mut entries = Vec::new();
    let mut withheld = 0usize;

    for enrollment in enrollments {
        let failed = failed_components(enrollment, pass_mark);
        if failed.is_empty() {
            continue;
        }

        let eligible = flags
            .get(&enrollment.student_id)
            .is_some_and(|flag| is_affirmative(flag));
        if !eligible {
            withheld += 1;
            continue;
        }

        entries.extend(failed.into_iter().map(|component| FailedComponentEntry {
            student_id: enrollment.student_id.clone(),
            course_id: enrollment.course_id.clone(),
            failed_component: component,
        }));
    }

    tracing::debug!(
        flagged = entries.len(),
        withheld,
        "at-risk scan complete"
    );
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enrollment(student: &str, course: &str, exam: &str, assignment: &str) -> EnrollmentRecord {
        EnrollmentRecord {
            enrollment_id: format!("{student}-{course}"),
            student_id: student.to_string(),
            course_id: course.to_string(),
            year: "1".to_string(),
            semester: "1".to_string(),
            exam_score: exam.to_string(),
            assignment_score: assignment.to_string(),
        }
    }

    fn flags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(id, flag)| (id.to_string(), flag.to_string()))
            .collect()
    }

    #[test]
    fn affirmative_flags_ignore_case() {
        assert!(is_affirmative("True"));
        assert!(is_affirmative(" ELIGIBLE "));
        assert!(is_affirmative("eligible"));
        assert!(!is_affirmative("False"));
        assert!(!is_affirmative("1"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn failed_exam_for_eligible_student_yields_one_entry() {
        let enrollments = vec![enrollment("S001", "C101", "35", "90")];
        let entries = scan_at_risk(&enrollments, &flags(&[("S001", "Eligible")]), 40.0);
        assert_eq!(
            entries,
            vec![FailedComponentEntry {
                student_id: "S001".to_string(),
                course_id: "C101".to_string(),
                failed_component: FailedComponent::Exam,
            }]
        );
    }

    #[test]
    fn failing_student_not_flagged_yields_nothing() {
        let enrollments = vec![enrollment("S001", "C101", "35", "90")];
        assert!(scan_at_risk(&enrollments, &flags(&[("S001", "False")]), 40.0).is_empty());
        assert!(scan_at_risk(&enrollments, &flags(&[]), 40.0).is_empty());
    }

    #[test]
    fn both_components_fail_in_exam_then_assignment_order() {
        let enrollments = vec![
            enrollment("S001", "C101", "10", "20"),
            enrollment("S002", "C102", "80", "39"),
            enrollment("S001", "C103", "40", "40"),
        ];
        let entries = scan_at_risk(
            &enrollments,
            &flags(&[("S001", "true"), ("S002", "True")]),
            40.0,
        );
        let got: Vec<(&str, &str, FailedComponent)> = entries
            .iter()
            .map(|e| (e.student_id.as_str(), e.course_id.as_str(), e.failed_component))
            .collect();
        assert_eq!(
            got,
            vec![
                ("S001", "C101", FailedComponent::Exam),
                ("S001", "C101", FailedComponent::Assignment),
                ("S002", "C102", FailedComponent::Assignment),
            ]
        );
    }

    #[test]
    fn unparseable_scores_fail() {
        let enrollments = vec![enrollment("S001", "C101", "n/a", "75")];
        let entries = scan_at_risk(&enrollments, &flags(&[("S001", "Eligible")]), 40.0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].failed_component.to_string(), "Exam");
    }

    #[test]
    fn pass_mark_is_configurable() {
        let enrollments = vec![enrollment("S001", "C101", "45", "55")];
        let entries = scan_at_risk(&enrollments, &flags(&[("S001", "Eligible")]), 50.0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].failed_component, FailedComponent::Exam);
    }

    #[test]
    fn flag_map_is_built_from_students() {
        let students = vec![StudentRecord {
            student_id: "S001".to_string(),
            first_name: "Avery".to_string(),
            last_name: "Lee".to_string(),
            program_id: "P01".to_string(),
            email: "avery@example.com".to_string(),
            recovery_eligibility: "Eligible".to_string(),
        }];
        let map = eligibility_flags(&students);
        assert_eq!(map.get("S001").map(String::as_str), Some("Eligible"));
    }
}
