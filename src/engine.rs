use crate::config::EngineConfig;
use crate::eligibility::{self, EligibilityRules};
use crate::error::StoreResult;
use crate::models::{EligibilityDecision, FailedComponentEntry, StudentProfile};
use crate::performance::{self, GradeScale, PerformanceReport};
use crate::repository::{AcademicRepository, ELIGIBLE_FLAG};
use crate::risk;

/// Wires the directory to the calculators using one set of thresholds.
pub struct RecoveryEngine<R> {
    repo: R,
    config: EngineConfig,
    scale: GradeScale,
    rules: EligibilityRules,
}

impl<R: AcademicRepository> RecoveryEngine<R> {
    pub fn new(repo: R, config: EngineConfig) -> Self {
        let scale = GradeScale::from_config(&config);
        let rules = EligibilityRules::from_config(&config);
        Self {
            repo,
            config,
            scale,
            rules,
        }
    }

    /// Name and program label for report headers.
    pub fn profile(&self, student_id: &str) -> Option<StudentProfile> {
        let student = self.repo.student(student_id)?;
        let program = self.repo.program_for(&student).map(|p| p.label());
        Some(StudentProfile {
            student_id: student.student_id.clone(),
            name: student.full_name(),
            program,
        })
    }

    pub fn rules(&self) -> &EligibilityRules {
        &self.rules
    }

    pub fn performance(&self, student_id: &str) -> PerformanceReport {
        let enrollments = self.repo.enrollments_for(student_id);
        let courses = self.repo.courses();
        performance::compute_performance(
            student_id,
            &enrollments,
            &courses,
            &self.scale,
            self.config.failing_grade_point,
        )
    }

    pub fn eligibility(&self, student_id: &str) -> (PerformanceReport, EligibilityDecision) {
        let report = self.performance(student_id);
        let decision = eligibility::evaluate(&report.summary, &self.rules);
        (report, decision)
    }

    pub fn at_risk(&self) -> Vec<FailedComponentEntry> {
        let flags = risk::eligibility_flags(&self.repo.students());
        risk::scan_at_risk(&self.repo.enrollments(), &flags, self.config.pass_mark)
    }

    /// Mark the student as allowed into the recovery program.
    pub fn approve_recovery(&mut self, student_id: &str) -> StoreResult<bool> {
        self.repo.set_recovery_eligibility(student_id, ELIGIBLE_FLAG)
    }
}
