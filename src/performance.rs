//! Per-course grades and the credit-weighted CGPA for one student.
//!
//! Everything here is a pure function of its inputs: each call starts from
//! zeroed accumulators and returns a fresh summary.

use crate::config::{EngineConfig, GradeBand};
use crate::models::{CourseRecord, CourseResult, EnrollmentRecord, PerformanceSummary, TermResult};
use crate::rows::parse_score;

/// Ordered grade bands, highest `min_score` first.
#[derive(Debug, Clone)]
pub struct GradeScale {
    bands: Vec<GradeBand>,
    floor: GradeBand,
}

impl GradeScale {
    pub fn new(mut bands: Vec<GradeBand>, floor_grade: &str, floor_grade_point: f64) -> Self {
        bands.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
        Self {
            bands,
            floor: GradeBand::new(f64::NEG_INFINITY, floor_grade, floor_grade_point),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.grade_scale.clone(),
            &config.floor_grade,
            config.floor_grade_point,
        )
    }

    /// First band whose lower bound the score reaches; the floor otherwise.
    pub fn grade_for(&self, score: f64) -> &GradeBand {
        self.bands
            .iter()
            .find(|band| score >= band.min_score)
            .unwrap_or(&self.floor)
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub summary: PerformanceSummary,
    pub courses: Vec<CourseResult>,
}

pub fn final_score(exam_score: f64, assignment_score: f64, course: &CourseRecord) -> f64 {
    exam_score * (course.exam_weight / 100.0)
        + assignment_score * (course.assignment_weight / 100.0)
}

fn weighted_average(points: f64, credits: u32) -> Option<f64> {
    (credits > 0).then(|| points / credits as f64)
}

pub fn compute_performance(
    student_id: &str,
    enrollments: &[EnrollmentRecord],
    courses: &[CourseRecord],
    scale: &GradeScale,
    failing_grade_point: f64,
) -> PerformanceReport {
    let mut points = 0.0;
    let mut total_credits = 0u32;
    let mut failed_course_count = 0u32;
    let mut results = Vec::new();

    for enrollment in enrollments.iter().filter(|e| e.student_id == student_id) {
        let Some(course) = courses.iter().find(|c| c.course_id == enrollment.course_id) else {
            tracing::debug!(
                student_id,
                course_id = %enrollment.course_id,
                "no course record for enrollment, skipping"
            );
            continue;
        };

        let score = final_score(
            parse_score(&enrollment.exam_score),
            parse_score(&enrollment.assignment_score),
            course,
        );
        let band = scale.grade_for(score);

        points += band.grade_point * course.credit_hours as f64;
        total_credits += course.credit_hours;
        if band.grade_point < failing_grade_point {
            failed_course_count += 1;
        }

        results.push(CourseResult {
            course_id: course.course_id.clone(),
            name: course.name.clone(),
            credit_hours: course.credit_hours,
            year: enrollment.year.clone(),
            semester: enrollment.semester.clone(),
            final_score: score,
            grade: band.grade.clone(),
            grade_point: band.grade_point,
        });
    }

    PerformanceReport {
        summary: PerformanceSummary {
            student_id: student_id.to_string(),
            cgpa: weighted_average(points, total_credits),
            total_credits,
            failed_course_count,
        },
        courses: results,
    }
}

/// Group course results by (year, semester) in the order terms first appear.
pub fn term_breakdown(results: &[CourseResult]) -> Vec<TermResult> {
    let mut terms: Vec<TermResult> = Vec::new();

    for result in results {
        let position = terms
            .iter()
            .position(|t| t.year == result.year && t.semester == result.semester);
        let term = match position {
            Some(index) => &mut terms[index],
            None => {
                terms.push(TermResult {
                    year: result.year.clone(),
                    semester: result.semester.clone(),
                    credit_hours: 0,
                    gpa: None,
                    courses: Vec::new(),
                });
                let last = terms.len() - 1;
                &mut terms[last]
            }
        };
        term.credit_hours += result.credit_hours;
        term.courses.push(result.clone());
    }

    for term in &mut terms {
        let points: f64 = term
            .courses
            .iter()
            .map(|c| c.grade_point * c.credit_hours as f64)
            .sum();
        term.gpa = weighted_average(points, term.credit_hours);
    }
    terms
}
