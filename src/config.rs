//! Engine thresholds and the grade scale.
//!
//! Every field has a default, so an empty or missing TOML file yields the
//! standard rules: pass mark 40, more than 3 failed courses or a CGPA under
//! 2.0 makes a student eligible for recovery.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

pub const CONFIG_FILE: &str = "recovery-engine.toml";

/// One row of the grade scale: scores at or above `min_score` earn `grade`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBand {
    pub min_score: f64,
    pub grade: String,
    pub grade_point: f64,
}

impl GradeBand {
    pub fn new(min_score: f64, grade: &str, grade_point: f64) -> Self {
        Self {
            min_score,
            grade: grade.to_string(),
            grade_point,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Component scores below this are failing.
    #[serde(default = "default_pass_mark")]
    pub pass_mark: f64,
    /// More failed courses than this triggers eligibility.
    #[serde(default = "default_max_failed_courses")]
    pub max_failed_courses: u32,
    #[serde(default = "default_min_cgpa")]
    pub min_cgpa: f64,
    /// A course whose grade point is below this counts as failed.
    #[serde(default = "default_failing_grade_point")]
    pub failing_grade_point: f64,
    #[serde(default = "default_grade_scale")]
    pub grade_scale: Vec<GradeBand>,
    #[serde(default = "default_floor_grade")]
    pub floor_grade: String,
    #[serde(default)]
    pub floor_grade_point: f64,
    /// Write milestone status into the plan store. Off keeps the legacy
    /// behavior where every reloaded milestone is "Pending".
    #[serde(default)]
    pub persist_milestone_status: bool,
}

fn default_pass_mark() -> f64 {
    40.0
}
fn default_max_failed_courses() -> u32 {
    3
}
fn default_min_cgpa() -> f64 {
    2.0
}
fn default_failing_grade_point() -> f64 {
    2.0
}
fn default_floor_grade() -> String {
    "F".to_string()
}

pub fn default_grade_scale() -> Vec<GradeBand> {
    vec![
        GradeBand::new(80.0, "A", 4.0),
        GradeBand::new(65.0, "B", 3.0),
        GradeBand::new(50.0, "C", 2.0),
        GradeBand::new(40.0, "D", 1.0),
    ]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pass_mark: default_pass_mark(),
            max_failed_courses: default_max_failed_courses(),
            min_cgpa: default_min_cgpa(),
            failing_grade_point: default_failing_grade_point(),
            grade_scale: default_grade_scale(),
            floor_grade: default_floor_grade(),
            floor_grade_point: 0.0,
            persist_milestone_status: false,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str, origin: &Path) -> StoreResult<Self> {
        let mut config: EngineConfig = toml::from_str(raw).map_err(|source| StoreError::Config {
            path: origin.to_path_buf(),
            source,
        })?;
        config
            .grade_scale
            .sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
        Ok(config)
    }
}

/// Load config from an explicit path, or from `recovery-engine.toml` under
/// the data root, or fall back to defaults.
pub fn load_config_from(path: Option<&Path>, data_dir: &Path) -> anyhow::Result<EngineConfig> {
    let config_path: Option<PathBuf> = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = data_dir.join(CONFIG_FILE);
            local.exists().then_some(local)
        }
    };

    let Some(config_path) = config_path else {
        tracing::debug!("no config file found, using defaults");
        return Ok(EngineConfig::default());
    };

    let raw = std::fs::read_to_string(&config_path)
        .map_err(|e| StoreError::io(&config_path, e))?;
    let config = EngineConfig::from_toml_str(&raw, &config_path)?;
    tracing::info!(path = %config_path.display(), "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = EngineConfig::from_toml_str("", Path::new("inline")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let raw = r#"
            pass_mark = 50.0
            persist_milestone_status = true
        "#;
        let config = EngineConfig::from_toml_str(raw, Path::new("inline")).unwrap();
        assert_eq!(config.pass_mark, 50.0);
        assert!(config.persist_milestone_status);
        assert_eq!(config.max_failed_courses, 3);
        assert_eq!(config.grade_scale, default_grade_scale());
    }

    #[test]
    fn grade_scale_is_sorted_highest_first() {
        let raw = r#"
            [[grade_scale]]
            min_score = 50.0
            grade = "P"
            grade_point = 2.0

            [[grade_scale]]
            min_score = 75.0
            grade = "H"
            grade_point = 4.0
        "#;
        let config = EngineConfig::from_toml_str(raw, Path::new("inline")).unwrap();
        let grades: Vec<&str> = config.grade_scale.iter().map(|b| b.grade.as_str()).collect();
        assert_eq!(grades, vec!["H", "P"]);
    }

    #[test]
    fn bad_toml_reports_config_error() {
        let err = EngineConfig::from_toml_str("pass_mark = \"forty\"", Path::new("x.toml"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Config { .. }));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config_from(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn data_dir_config_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "min_cgpa = 2.5\n").unwrap();
        let config = load_config_from(None, dir.path()).unwrap();
        assert_eq!(config.min_cgpa, 2.5);
    }
}
