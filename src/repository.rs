use std::path::{Path, PathBuf};

use crate::error::StoreResult;
use crate::models::{CourseRecord, EnrollmentRecord, ProgramRecord, StudentRecord};
use crate::rows::{self, require_width};

pub const STUDENT_FILE: &str = "student_information.csv";
pub const COURSE_FILE: &str = "course_assessment_information.csv";
pub const ENROLLMENT_FILE: &str = "student_enrollment_information.csv";
pub const PROGRAM_FILE: &str = "program_information.csv";

pub const STUDENT_HEADER: [&str; 6] = [
    "StudentID",
    "FirstName",
    "LastName",
    "ProgramID",
    "Email",
    "RecoveryEligibility",
];

/// Flag written when a student is approved for the recovery program.
pub const ELIGIBLE_FLAG: &str = "Eligible";

/// Read access to the student directory, plus the one write the engine needs.
pub trait AcademicRepository {
    fn students(&self) -> Vec<StudentRecord>;
    fn courses(&self) -> Vec<CourseRecord>;
    fn enrollments(&self) -> Vec<EnrollmentRecord>;
    fn programs(&self) -> Vec<ProgramRecord>;

    /// Rewrite one student's eligibility flag. `Ok(false)` when the student
    /// does not exist.
    fn set_recovery_eligibility(&mut self, student_id: &str, flag: &str) -> StoreResult<bool>;

    fn student(&self, student_id: &str) -> Option<StudentRecord> {
        self.students()
            .into_iter()
            .find(|s| s.student_id == student_id)
    }

    fn enrollments_for(&self, student_id: &str) -> Vec<EnrollmentRecord> {
        self.enrollments()
            .into_iter()
            .filter(|e| e.student_id == student_id)
            .collect()
    }

    fn program_for(&self, student: &StudentRecord) -> Option<ProgramRecord> {
        self.programs()
            .into_iter()
            .find(|p| p.program_id == student.program_id)
    }
}

pub fn student_from_row(row: &[String]) -> Option<StudentRecord> {
    let row = require_width(row, 6)?;
    Some(StudentRecord {
        student_id: row[0].clone(),
        first_name: row[1].clone(),
        last_name: row[2].clone(),
        program_id: row[3].clone(),
        email: row[4].clone(),
        recovery_eligibility: row[5].clone(),
    })
}

pub fn course_from_row(row: &[String]) -> Option<CourseRecord> {
    let row = require_width(row, 6)?;
    let credit_hours = match row[2].parse::<u32>() {
        Ok(hours) if hours > 0 => hours,
        _ => {
            tracing::debug!(
                course_id = %row[0],
                credits = %row[2],
                "skipping course with invalid credit hours"
            );
            return None;
        }
    };
    Some(CourseRecord {
        course_id: row[0].clone(),
        name: row[1].clone(),
        credit_hours,
        instructor: row[3].clone(),
        exam_weight: rows::parse_score(&row[4]),
        assignment_weight: rows::parse_score(&row[5]),
    })
}

pub fn enrollment_from_row(row: &[String]) -> Option<EnrollmentRecord> {
    let row = require_width(row, 7)?;
    Some(EnrollmentRecord {
        enrollment_id: row[0].clone(),
        student_id: row[1].clone(),
        course_id: row[2].clone(),
        year: row[3].clone(),
        semester: row[4].clone(),
        exam_score: row[5].clone(),
        assignment_score: row[6].clone(),
    })
}

pub fn program_from_row(row: &[String]) -> Option<ProgramRecord> {
    let row = require_width(row, 3)?;
    Some(ProgramRecord {
        program_id: row[0].clone(),
        name: row[1].clone(),
        level: row[2].clone(),
    })
}

fn map_rows<T>(path: &Path, parse: fn(&[String]) -> Option<T>) -> Vec<T> {
    let rows = rows::read_rows(path);
    let total = rows.len();
    let records: Vec<T> = rows.iter().filter_map(|row| parse(row)).collect();
    if records.len() < total {
        tracing::debug!(
            path = %path.display(),
            skipped = total - records.len(),
            "dropped malformed rows"
        );
    }
    records
}

/// The four table files under one data root. Every call re-reads the file.
#[derive(Debug, Clone)]
pub struct CsvRepository {
    data_dir: PathBuf,
}

impl CsvRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }
}

impl AcademicRepository for CsvRepository {
    fn students(&self) -> Vec<StudentRecord> {
        map_rows(&self.path(STUDENT_FILE), student_from_row)
    }

    fn courses(&self) -> Vec<CourseRecord> {
        map_rows(&self.path(COURSE_FILE), course_from_row)
    }

    fn enrollments(&self) -> Vec<EnrollmentRecord> {
        map_rows(&self.path(ENROLLMENT_FILE), enrollment_from_row)
    }

    fn programs(&self) -> Vec<ProgramRecord> {
        map_rows(&self.path(PROGRAM_FILE), program_from_row)
    }

    fn set_recovery_eligibility(&mut self, student_id: &str, flag: &str) -> StoreResult<bool> {
        let path = self.path(STUDENT_FILE);
        let mut table = rows::try_read_table(&path)?;

        let Some(row) = table
            .rows
            .iter_mut()
            .find(|row| {
                student_from_row(row.as_slice()).is_some_and(|s| s.student_id == student_id)
            })
        else {
            return Ok(false);
        };
        row[5] = flag.to_string();

        let malformed = table
            .rows
            .iter()
            .filter(|row| student_from_row(row.as_slice()).is_none())
            .count();
        if malformed > 0 {
            tracing::warn!(malformed, "students file has malformed rows, keeping them as-is");
        }
        if table.header.is_empty() {
            table.header = STUDENT_HEADER.iter().map(|h| h.to_string()).collect();
        }

        rows::write_table(&path, &table)?;
        tracing::info!(student_id, flag, "updated recovery eligibility");
        Ok(true)
    }
}

/// Repository held entirely in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    pub students: Vec<StudentRecord>,
    pub courses: Vec<CourseRecord>,
    pub enrollments: Vec<EnrollmentRecord>,
    pub programs: Vec<ProgramRecord>,
}

impl AcademicRepository for InMemoryRepository {
    fn students(&self) -> Vec<StudentRecord> {
        self.students.clone()
    }

    fn courses(&self) -> Vec<CourseRecord> {
        self.courses.clone()
    }

    fn enrollments(&self) -> Vec<EnrollmentRecord> {
        self.enrollments.clone()
    }

    fn programs(&self) -> Vec<ProgramRecord> {
        self.programs.clone()
    }

    fn set_recovery_eligibility(&mut self, student_id: &str, flag: &str) -> StoreResult<bool> {
        match self.students.iter_mut().find(|s| s.student_id == student_id) {
            Some(student) => {
                student.recovery_eligibility = flag.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
