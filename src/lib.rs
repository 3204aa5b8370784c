//! Academic performance and recovery planning engine.
//!
//! Computes grades and CGPA from raw enrollment scores, decides recovery
//! eligibility, scans for failing components, and keeps recovery plans in a
//! flat text file. All I/O is local, blocking and single-threaded.

pub mod config;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod models;
pub mod performance;
pub mod plans;
pub mod repository;
pub mod risk;
pub mod rows;

pub use config::EngineConfig;
pub use engine::RecoveryEngine;
pub use error::{StoreError, StoreResult};
pub use plans::RecoveryPlanStore;
pub use repository::{AcademicRepository, CsvRepository, InMemoryRepository};
