//! Append-only, line-per-plan store for recovery plans.
//!
//! Line shape: `studentId|courseId|recommendation|status|week:task,week:task`
//!
//! Delimiters inside a value are backslash-escaped on write (`\|`, `\,`,
//! `\:`, `\\`, plus `\n` and `\r` for line breaks), and so is whitespace at
//! either end of a value, so free text survives a reload byte for byte.
//! Unescaped padding around fields is trimmed on read, which keeps lines
//! written before escaping existed parsing the same as before.
//!
//! Milestone status is only written when the store is built with
//! `with_milestone_status(true)`, as a tagged suffix `week:task:@status`.
//! Untagged milestones read back as "Pending". Readers accept both forms
//! whatever the flag.
//!
//! There is no locking. Each plan is appended with a single write, but two
//! processes appending to the same file at once are not supported.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::models::{Milestone, RecoveryPlan, STATUS_PENDING};

pub const PLAN_FILE: &str = "recovery_plans.txt";

const FIELD_SEP: char = '|';
const MILESTONE_SEP: char = ',';
const PART_SEP: char = ':';
const STATUS_TAG: char = '@';
const ESCAPE: char = '\\';

pub fn escape(value: &str) -> String {
    let core_start = value.len() - value.trim_start().len();
    let core_end = value.trim_end().len();
    let mut out = String::with_capacity(value.len());

    for (index, ch) in value.char_indices() {
        let padding = index < core_start || index >= core_end;
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ESCAPE | FIELD_SEP | MILESTONE_SEP | PART_SEP => {
                out.push(ESCAPE);
                out.push(ch);
            }
            _ if padding && ch.is_whitespace() => {
                out.push(ESCAPE);
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != ESCAPE {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push(ESCAPE),
        }
    }
    out
}

/// Trim unescaped whitespace from both ends of a still-escaped value.
fn trim_field(raw: &str) -> &str {
    let raw = raw.trim_start();
    let trimmed = raw.trim_end();
    let trailing_escapes = trimmed.chars().rev().take_while(|&c| c == ESCAPE).count();
    if trailing_escapes % 2 == 0 {
        return trimmed;
    }
    // an odd run of escapes protects the whitespace right after it
    let protected = raw[trimmed.len()..].chars().next().map_or(0, char::len_utf8);
    &raw[..trimmed.len() + protected]
}

/// Split on every `sep` not preceded by an escape. Segments stay escaped.
fn split_unescaped(raw: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (index, ch) in raw.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == ESCAPE {
            escaped = true;
        } else if ch == sep {
            parts.push(&raw[start..index]);
            start = index + ch.len_utf8();
        }
    }
    parts.push(&raw[start..]);
    parts
}

fn split_once_unescaped(raw: &str, sep: char) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (index, ch) in raw.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == ESCAPE {
            escaped = true;
        } else if ch == sep {
            return Some((&raw[..index], &raw[index + ch.len_utf8()..]));
        }
    }
    None
}

/// Split `task:@status` at the first unescaped status tag.
fn split_status(rest: &str) -> (&str, Option<&str>) {
    let mut escaped = false;
    for (index, ch) in rest.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == ESCAPE {
            escaped = true;
        } else if ch == PART_SEP && rest[index + 1..].starts_with(STATUS_TAG) {
            let status_start = index + 1 + STATUS_TAG.len_utf8();
            return (&rest[..index], Some(&rest[status_start..]));
        }
    }
    (rest, None)
}

pub fn encode_plan(plan: &RecoveryPlan, with_status: bool) -> String {
    let milestones = plan
        .milestones
        .iter()
        .map(|m| {
            let mut segment = format!("{}{PART_SEP}{}", escape(&m.week), escape(&m.task));
            if with_status {
                segment.push(PART_SEP);
                segment.push(STATUS_TAG);
                segment.push_str(&escape(&m.status));
            }
            segment
        })
        .collect::<Vec<_>>()
        .join(",");

    [
        escape(&plan.student_id),
        escape(&plan.course_id),
        escape(&plan.recommendation),
        escape(&plan.status),
        milestones,
    ]
    .join("|")
}

fn decode_milestone(segment: &str) -> Option<Milestone> {
    let (week, rest) = split_once_unescaped(trim_field(segment), PART_SEP)?;
    if week.is_empty() {
        return None;
    }

    let (task, status) = match split_status(rest) {
        (task, Some(status)) if !trim_field(status).is_empty() => {
            (task, unescape(trim_field(status)))
        }
        (task, _) => (task, STATUS_PENDING.to_string()),
    };

    Some(Milestone {
        week: unescape(week),
        task: unescape(task),
        status,
    })
}

/// Parse one stored line. Lines with fewer than four fields are rejected.
pub fn decode_plan(line: &str) -> Option<RecoveryPlan> {
    let fields = split_unescaped(line, FIELD_SEP);
    if fields.len() < 4 {
        return None;
    }

    let mut plan = RecoveryPlan::new(
        unescape(trim_field(fields[0])),
        unescape(trim_field(fields[1])),
        unescape(trim_field(fields[2])),
        unescape(trim_field(fields[3])),
    );

    if let Some(raw) = fields.get(4).map(|f| trim_field(f)).filter(|f| !f.is_empty()) {
        for segment in split_unescaped(raw, MILESTONE_SEP) {
            match decode_milestone(segment) {
                Some(milestone) => plan.add_milestone(milestone),
                None => tracing::debug!(segment, "dropping milestone without week"),
            }
        }
    }
    Some(plan)
}

/// Reject plans that could not be read back as written.
fn validate_plan(plan: &RecoveryPlan) -> StoreResult<()> {
    if plan.student_id.trim().is_empty() || plan.course_id.trim().is_empty() {
        return Err(StoreError::InvalidPlan(
            "student and course ids must not be blank".to_string(),
        ));
    }
    if let Some(position) = plan.milestones.iter().position(|m| m.week.is_empty()) {
        return Err(StoreError::InvalidPlan(format!(
            "milestone {} has no week",
            position + 1
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RecoveryPlanStore {
    path: PathBuf,
    persist_milestone_status: bool,
}

impl RecoveryPlanStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            persist_milestone_status: false,
        }
    }

    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(PLAN_FILE))
    }

    pub fn with_milestone_status(mut self, persist: bool) -> Self {
        self.persist_milestone_status = persist;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one plan. Returns `false` if the plan is invalid or the line
    /// could not be written.
    pub fn save_plan(&self, plan: &RecoveryPlan) -> bool {
        match self.try_save_plan(plan) {
            Ok(()) => {
                tracing::info!(
                    student_id = %plan.student_id,
                    course_id = %plan.course_id,
                    milestones = plan.milestones.len(),
                    "saved recovery plan"
                );
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to save recovery plan");
                false
            }
        }
    }

    pub fn try_save_plan(&self, plan: &RecoveryPlan) -> StoreResult<()> {
        validate_plan(plan)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let mut line = encode_plan(plan, self.persist_milestone_status);
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }

    /// Every plan in file order. A missing or unreadable file reads as empty.
    pub fn load_plans(&self) -> Vec<RecoveryPlan> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no recovery plans stored yet");
            return Vec::new();
        }
        match self.try_load_plans() {
            Ok(plans) => {
                tracing::debug!(count = plans.len(), "loaded recovery plans");
                plans
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load recovery plans");
                Vec::new()
            }
        }
    }

    pub fn try_load_plans(&self) -> StoreResult<Vec<RecoveryPlan>> {
        let file = fs::File::open(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let mut plans = Vec::new();

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StoreError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match decode_plan(&line) {
                Some(plan) => plans.push(plan),
                None => tracing::debug!(line = index + 1, "dropping malformed plan line"),
            }
        }
        Ok(plans)
    }
}

pub fn plans_for_student<'a>(
    plans: &'a [RecoveryPlan],
    student_id: &'a str,
) -> impl Iterator<Item = &'a RecoveryPlan> + 'a {
    plans.iter().filter(move |p| p.student_id == student_id)
}

/// Earliest stored plan for the student.
pub fn first_plan_for<'a>(
    plans: &'a [RecoveryPlan],
    student_id: &str,
) -> Option<&'a RecoveryPlan> {
    plans.iter().find(|p| p.student_id == student_id)
}

/// Most recently appended plan for the student, optionally for one course.
pub fn latest_plan_for<'a>(
    plans: &'a [RecoveryPlan],
    student_id: &str,
    course_id: Option<&str>,
) -> Option<&'a RecoveryPlan> {
    plans
        .iter()
        .rev()
        .find(|p| {
            p.student_id == student_id && course_id.map_or(true, |c| p.course_id == c)
        })
}
