use crate::config::EngineConfig;
use crate::models::{EligibilityDecision, PerformanceSummary};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EligibilityRules {
    pub max_failed_courses: u32,
    pub min_cgpa: f64,
}

impl EligibilityRules {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_failed_courses: config.max_failed_courses,
            min_cgpa: config.min_cgpa,
        }
    }
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// A student qualifies for recovery when either rule trips. A summary with
/// no credits has no CGPA and cannot trip the CGPA rule.
pub fn evaluate(summary: &PerformanceSummary, rules: &EligibilityRules) -> EligibilityDecision {
    let failed_threshold_exceeded = summary.failed_course_count > rules.max_failed_courses;
    let cgpa_below_minimum = summary.cgpa.is_some_and(|cgpa| cgpa < rules.min_cgpa);

    EligibilityDecision {
        eligible: failed_threshold_exceeded || cgpa_below_minimum,
        failed_threshold_exceeded,
        cgpa_below_minimum,
    }
}

impl EligibilityDecision {
    /// One line per rule that tripped.
    pub fn reasons(&self, summary: &PerformanceSummary, rules: &EligibilityRules) -> Vec<String> {
        let mut reasons = Vec::new();
        if self.failed_threshold_exceeded {
            reasons.push(format!(
                "No. of failed courses > {} ({})",
                rules.max_failed_courses, summary.failed_course_count
            ));
        }
        if let (true, Some(cgpa)) = (self.cgpa_below_minimum, summary.cgpa) {
            reasons.push(format!("CGPA < {:.2} ({:.2})", rules.min_cgpa, cgpa));
        }
        reasons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(failed: u32, cgpa: Option<f64>) -> PerformanceSummary {
        PerformanceSummary {
            student_id: "S001".to_string(),
            cgpa,
            total_credits: if cgpa.is_some() { 12 } else { 0 },
            failed_course_count: failed,
        }
    }

    #[test]
    fn boundaries_on_failed_count_and_cgpa() {
        let rules = EligibilityRules::default();
        for failed in [0, 3, 4, 7] {
            for cgpa in [0.0, 1.99, 2.0, 2.01, 4.0] {
                let decision = evaluate(&summary(failed, Some(cgpa)), &rules);
                assert_eq!(decision.failed_threshold_exceeded, failed > 3);
                assert_eq!(decision.cgpa_below_minimum, cgpa < 2.0);
                assert_eq!(
                    decision.eligible,
                    failed > 3 || cgpa < 2.0,
                    "failed={failed} cgpa={cgpa}"
                );
            }
        }
    }

    #[test]
    fn exactly_three_failures_and_two_point_oh_is_not_eligible() {
        let decision = evaluate(&summary(3, Some(2.0)), &EligibilityRules::default());
        assert!(!decision.eligible);
    }

    #[test]
    fn missing_cgpa_never_trips_cgpa_rule() {
        let decision = evaluate(&summary(0, None), &EligibilityRules::default());
        assert!(!decision.cgpa_below_minimum);
        assert!(!decision.eligible);
    }

    #[test]
    fn custom_rules_are_respected() {
        let rules = EligibilityRules {
            max_failed_courses: 1,
            min_cgpa: 3.0,
        };
        let decision = evaluate(&summary(2, Some(2.5)), &rules);
        assert!(decision.failed_threshold_exceeded);
        assert!(decision.cgpa_below_minimum);
    }

    #[test]
    fn reasons_name_each_tripped_rule() {
        let rules = EligibilityRules::default();
        let s = summary(4, Some(1.75));
        let decision = evaluate(&s, &rules);
        assert_eq!(
            decision.reasons(&s, &rules),
            vec![
                "No. of failed courses > 3 (4)".to_string(),
                "CGPA < 2.00 (1.75)".to_string(),
            ]
        );

        let ok = summary(1, Some(3.2));
        assert!(evaluate(&ok, &rules).reasons(&ok, &rules).is_empty());
    }
}
