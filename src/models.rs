use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub program_id: String,
    pub email: String,
    pub recovery_eligibility: String,
}

impl StudentRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRecord {
    pub course_id: String,
    pub name: String,
    pub credit_hours: u32,
    pub instructor: String,
    pub exam_weight: f64,
    pub assignment_weight: f64,
}

/// Scores and term stay as text; they are parsed where they are used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentRecord {
    pub enrollment_id: String,
    pub student_id: String,
    pub course_id: String,
    pub year: String,
    pub semester: String,
    pub exam_score: String,
    pub assignment_score: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramRecord {
    pub program_id: String,
    pub name: String,
    pub level: String,
}

impl ProgramRecord {
    /// "Bachelor in Computer Science" style label.
    pub fn label(&self) -> String {
        format!("{} in {}", self.level, self.name)
    }
}

/// Who a report is about: name and enrolled program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentProfile {
    pub student_id: String,
    pub name: String,
    pub program: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub student_id: String,
    /// `None` until at least one credit hour has been folded in.
    pub cgpa: Option<f64>,
    pub total_credits: u32,
    pub failed_course_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseResult {
    pub course_id: String,
    pub name: String,
    pub credit_hours: u32,
    pub year: String,
    pub semester: String,
    pub final_score: f64,
    pub grade: String,
    pub grade_point: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermResult {
    pub year: String,
    pub semester: String,
    pub credit_hours: u32,
    pub gpa: Option<f64>,
    pub courses: Vec<CourseResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EligibilityDecision {
    pub eligible: bool,
    pub failed_threshold_exceeded: bool,
    pub cgpa_below_minimum: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailedComponent {
    Exam,
    Assignment,
}

impl FailedComponent {
    pub fn as_str(self) -> &'static str {
        match self {
            FailedComponent::Exam => "Exam",
            FailedComponent::Assignment => "Assignment",
        }
    }
}

impl fmt::Display for FailedComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedComponentEntry {
    pub student_id: String,
    pub course_id: String,
    pub failed_component: FailedComponent,
}

pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_IN_PROGRESS: &str = "In Progress";
pub const STATUS_COMPLETED: &str = "Completed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub week: String,
    pub task: String,
    pub status: String,
}

impl Milestone {
    pub fn new(week: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            week: week.into(),
            task: task.into(),
            status: STATUS_PENDING.to_string(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryPlan {
    pub student_id: String,
    pub course_id: String,
    pub recommendation: String,
    pub status: String,
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlanProgress {
    pub completed: usize,
    pub total: usize,
}

impl PlanProgress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

impl fmt::Display for PlanProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            return f.write_str("No milestones found");
        }
        write!(
            f,
            "{:.2}% Complete ({}/{} Milestones)",
            self.percent(),
            self.completed,
            self.total
        )
    }
}

impl RecoveryPlan {
    pub fn new(
        student_id: impl Into<String>,
        course_id: impl Into<String>,
        recommendation: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            course_id: course_id.into(),
            recommendation: recommendation.into(),
            status: status.into(),
            milestones: Vec::new(),
        }
    }

    pub fn add_milestone(&mut self, milestone: Milestone) {
        self.milestones.push(milestone);
    }

    pub fn progress(&self) -> PlanProgress {
        PlanProgress {
            completed: self.milestones.iter().filter(|m| m.is_completed()).count(),
            total: self.milestones.len(),
        }
    }

    /// The plan is closed out and every milestone is done.
    pub fn is_complete(&self) -> bool {
        self.status == STATUS_COMPLETED && self.milestones.iter().all(Milestone::is_completed)
    }
}
