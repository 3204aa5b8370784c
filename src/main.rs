use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use recovery_engine::config::load_config_from;
use recovery_engine::models::{Milestone, RecoveryPlan, StudentProfile};
use recovery_engine::performance::term_breakdown;
use recovery_engine::plans::{first_plan_for, latest_plan_for};
use recovery_engine::{CsvRepository, RecoveryEngine, RecoveryPlanStore};

#[derive(Parser)]
#[command(name = "recovery-engine")]
#[command(about = "Academic performance and course recovery tracker", long_about = None)]
struct Cli {
    /// Directory holding the student, course, enrollment and program tables
    #[arg(long, env = "RECOVERY_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,
    /// Engine config (TOML); defaults to recovery-engine.toml in the data dir
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grades, term GPA and CGPA for one student
    Performance {
        #[arg(long)]
        student: String,
    },
    /// Check whether a student qualifies for the recovery program
    Eligibility {
        #[arg(long)]
        student: String,
    },
    /// Allow a student to register for the recovery program
    Approve {
        #[arg(long)]
        student: String,
    },
    /// List failing components for students flagged eligible
    AtRisk,
    /// Append a recovery plan
    AddPlan {
        #[arg(long)]
        student: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        recommendation: String,
        #[arg(long, default_value = "Active")]
        status: String,
        /// Milestone as "week=task"; repeat for more
        #[arg(long = "milestone")]
        milestones: Vec<String>,
    },
    /// Show the stored recovery plan for a student
    ShowPlan {
        #[arg(long)]
        student: String,
        /// Show the most recently added plan instead of the first
        #[arg(long)]
        latest: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_milestone(raw: &str) -> anyhow::Result<Milestone> {
    let (week, task) = raw
        .split_once('=')
        .with_context(|| format!("milestone {raw:?} must look like \"week=task\""))?;
    let (week, task) = (week.trim(), task.trim());
    if week.is_empty() || task.is_empty() {
        anyhow::bail!("milestone {raw:?} needs both a week and a task");
    }
    Ok(Milestone::new(week, task))
}

fn format_cgpa(cgpa: Option<f64>) -> String {
    cgpa.map_or_else(|| "n/a".to_string(), |value| format!("{value:.2}"))
}

fn print_profile(profile: Option<&StudentProfile>) {
    let Some(profile) = profile else {
        return;
    };
    println!("{} ({})", profile.name, profile.student_id);
    if let Some(program) = &profile.program {
        println!("Program: {program}");
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("recovery_engine=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config_from(cli.config.as_deref(), &cli.data_dir)
        .context("failed to load engine config")?;
    let store = RecoveryPlanStore::in_data_dir(&cli.data_dir)
        .with_milestone_status(config.persist_milestone_status);
    let mut engine = RecoveryEngine::new(CsvRepository::new(&cli.data_dir), config);

    match cli.command {
        Commands::Performance { student } => {
            let report = engine.performance(&student);
            let profile = engine.profile(&student);
            if cli.json {
                return print_json(&serde_json::json!({
                    "student": profile,
                    "summary": report.summary,
                    "terms": term_breakdown(&report.courses),
                }));
            }

            print_profile(profile.as_ref());
            if report.courses.is_empty() {
                println!("No graded enrollments found for {student}.");
                return Ok(());
            }

            for term in term_breakdown(&report.courses) {
                println!("Year {} Semester {}", term.year, term.semester);
                for course in &term.courses {
                    println!(
                        "- {} {} ({} credits) grade {} ({:.1})",
                        course.course_id,
                        course.name,
                        course.credit_hours,
                        course.grade,
                        course.grade_point
                    );
                }
                println!(
                    "  {} credits, GPA {}",
                    term.credit_hours,
                    format_cgpa(term.gpa)
                );
            }
            println!(
                "Total credits {}, CGPA {}, failed courses {}",
                report.summary.total_credits,
                format_cgpa(report.summary.cgpa),
                report.summary.failed_course_count
            );
        }
        Commands::Eligibility { student } => {
            let (report, decision) = engine.eligibility(&student);
            let profile = engine.profile(&student);
            if cli.json {
                return print_json(&serde_json::json!({
                    "student": profile,
                    "summary": report.summary,
                    "decision": decision,
                }));
            }

            print_profile(profile.as_ref());
            if decision.eligible {
                println!("{student} is eligible for course recovery:");
                for reason in decision.reasons(&report.summary, engine.rules()) {
                    println!("- {reason}");
                }
            } else {
                println!(
                    "{student} is not eligible (CGPA {}, {} failed courses).",
                    format_cgpa(report.summary.cgpa),
                    report.summary.failed_course_count
                );
            }
        }
        Commands::Approve { student } => {
            let updated = engine
                .approve_recovery(&student)
                .context("failed to update student records")?;
            if updated {
                println!("{student} can now register for the recovery program.");
            } else {
                anyhow::bail!("no student with id {student}");
            }
        }
        Commands::AtRisk => {
            let entries = engine.at_risk();
            if cli.json {
                return print_json(&entries);
            }

            if entries.is_empty() {
                println!("No eligible students with failing components.");
                return Ok(());
            }

            println!("Students needing recovery:");
            for entry in &entries {
                println!(
                    "- {} in {} failed {}",
                    entry.student_id, entry.course_id, entry.failed_component
                );
            }
        }
        Commands::AddPlan {
            student,
            course,
            recommendation,
            status,
            milestones,
        } => {
            if [&student, &course, &recommendation]
                .iter()
                .any(|field| field.trim().is_empty())
            {
                anyhow::bail!("student, course and recommendation must not be empty");
            }
            let mut plan = RecoveryPlan::new(student, course, recommendation, status);
            for raw in &milestones {
                plan.add_milestone(parse_milestone(raw)?);
            }

            if !store.save_plan(&plan) {
                anyhow::bail!("could not write to {}", store.path().display());
            }
            println!(
                "Saved recovery plan for {} ({}) with {} milestones.",
                plan.student_id,
                plan.course_id,
                plan.milestones.len()
            );
        }
        Commands::ShowPlan { student, latest } => {
            let plans = store.load_plans();
            let plan = if latest {
                latest_plan_for(&plans, &student, None)
            } else {
                first_plan_for(&plans, &student)
            };

            if cli.json {
                return print_json(&plan);
            }

            let Some(plan) = plan else {
                println!("No recovery plan found for {student}.");
                return Ok(());
            };

            println!("Course: {}", plan.course_id);
            println!("Recommendation: {}", plan.recommendation);
            println!("Status: {}", plan.status);
            println!("Progress: {}", plan.progress());
            for milestone in &plan.milestones {
                println!("- {}: {} [{}]", milestone.week, milestone.task, milestone.status);
            }
        }
    }

    Ok(())
}
