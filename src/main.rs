// ==========================================
// Marking Maestro - CLI entry point
// ==========================================
// Subcommands map one-to-one onto the API layer; results are printed
// as pretty JSON on stdout, logs go to stderr.
// ==========================================

use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use marking_maestro::app::{get_default_db_path, AppState};
use marking_maestro::config::{config_keys, ReportConfigReader};
use marking_maestro::domain::{AllocationPatch, ProgressUpdate, TaskId, TaskStatus, TeacherId};
use marking_maestro::engine::GanttFilter;
use marking_maestro::repository::ProgressFilter;
use marking_maestro::{logging, Teacher, APP_NAME, VERSION};

#[derive(Parser)]
#[command(
    name = "marking-maestro",
    about = "Marking allocation and progress tracking for assessment tasks",
    version,
    propagate_version = true
)]
struct Cli {
    /// SQLite database file (default: user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Reference time for reports (default: now, UTC), e.g. 2024-03-01T00:00:00
    #[arg(long, global = true)]
    now: Option<NaiveDateTime>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a roster file (.csv / .xlsx / .xls), replacing the current set
    Import {
        #[arg(value_enum)]
        kind: ImportTarget,
        file: PathBuf,
    },
    /// Regenerate all allocations and create missing progress rows
    Allocate,
    /// List allocations
    Allocations {
        #[arg(long)]
        task: Option<TaskId>,
        #[arg(long)]
        teacher: Option<TeacherId>,
    },
    /// Reassign or reschedule one allocation
    Reassign {
        id: i64,
        #[arg(long)]
        teacher: Option<TeacherId>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        start: Option<NaiveDateTime>,
        #[arg(long)]
        end: Option<NaiveDateTime>,
    },
    /// Staffing changes
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
    /// Set a task's status
    #[command(name = "task-status")]
    SetTaskStatus { task: TaskId, status: TaskStatus },
    /// Dashboard statistics
    Stats,
    /// Allocation report for one teacher
    TeacherReport { teacher: TeacherId },
    /// Marking progress
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },
    /// Read or write a config_kv setting
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ImportTarget {
    Staff,
    Tasks,
    Classes,
}

#[derive(Subcommand)]
enum StaffAction {
    /// Add or replace a teacher
    Upsert {
        id: TeacherId,
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        leave: String,
    },
    /// Replace a teacher's leave text, e.g. "2024-02-20 to 2024-03-10"
    Leave { id: TeacherId, dates: String },
}

#[derive(Subcommand)]
enum ProgressAction {
    /// List progress rows
    List {
        #[arg(long)]
        teacher: Option<TeacherId>,
        #[arg(long)]
        task: Option<TaskId>,
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Update one or more progress rows
    Update {
        #[arg(required = true)]
        ids: Vec<i64>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        percent: Option<f64>,
        #[arg(long)]
        comments: Option<String>,
        #[arg(long)]
        eta: Option<NaiveDateTime>,
    },
    /// Progress summary for a teacher
    Teacher { id: TeacherId },
    /// Progress summary for a task
    Task { id: TaskId },
    /// Timeline rows
    Gantt {
        #[arg(long)]
        teacher: Option<TeacherId>,
        #[arg(long)]
        course: Option<String>,
        #[arg(long)]
        year_group: Option<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print effective report settings and stored overrides
    Show,
    /// Store a setting
    Set { key: String, value: String },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }
    tracing::info!(version = VERSION, "{}", APP_NAME);

    let db_path = cli
        .db
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(get_default_db_path);
    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;
    let now = cli.now.unwrap_or_else(|| Utc::now().naive_utc());

    match cli.command {
        Commands::Import { kind, file } => {
            let summary = match kind {
                ImportTarget::Staff => state.import_api.import_staff(&file),
                ImportTarget::Tasks => state.import_api.import_tasks(&file),
                ImportTarget::Classes => state.import_api.import_classes(&file),
            }
            .with_context(|| format!("importing {}", file.display()))?;
            print_json(&summary)
        }
        Commands::Allocate => {
            let report = state.allocation_api.run_allocation()?;
            state.progress_api.sync_progress(now)?;
            print_json(&report)
        }
        Commands::Allocations { task, teacher } => {
            let allocations = match (task, teacher) {
                (Some(task), _) => state.allocation_api.list_allocations_by_task(&task)?,
                (None, Some(teacher)) => {
                    state.allocation_api.list_allocations_by_teacher(&teacher)?
                }
                (None, None) => state.allocation_api.list_allocations()?,
            };
            print_json(&allocations)
        }
        Commands::Reassign {
            id,
            teacher,
            status,
            start,
            end,
        } => {
            let patch = AllocationPatch {
                teacher_id: teacher,
                status,
                start_date: start,
                end_date: end,
            };
            let allocation = state.allocation_api.update_allocation(id, &patch)?;
            state.progress_api.sync_progress(now)?;
            print_json(&allocation)
        }
        Commands::Staff { action } => match action {
            StaffAction::Upsert {
                id,
                name,
                email,
                leave,
            } => {
                let mut teacher = Teacher::new(id, name).with_leave(leave);
                teacher.email = email;
                state.import_api.upsert_teacher(&teacher)?;
                print_json(&teacher)
            }
            StaffAction::Leave { id, dates } => {
                state.import_api.update_leave_dates(&id, &dates)?;
                println!("leave dates updated for {}", id);
                Ok(())
            }
        },
        Commands::SetTaskStatus { task, status } => {
            state.import_api.update_task_status(&task, status)?;
            println!("{} -> {}", task, status);
            Ok(())
        }
        Commands::Stats => print_json(&state.dashboard_api.get_statistics(now).await?),
        Commands::TeacherReport { teacher } => {
            print_json(&state.dashboard_api.teacher_report(&teacher)?)
        }
        Commands::Progress { action } => match action {
            ProgressAction::List {
                teacher,
                task,
                status,
            } => {
                let filter = ProgressFilter {
                    teacher_id: teacher,
                    task_id: task,
                    status,
                };
                print_json(&state.progress_api.list_entries(&filter, now)?)
            }
            ProgressAction::Update {
                ids,
                status,
                percent,
                comments,
                eta,
            } => {
                let update = ProgressUpdate {
                    status,
                    completion_percentage: percent,
                    comments,
                    estimated_completion_date: eta,
                };
                print_json(&state.progress_api.bulk_update(&ids, &update, now)?)
            }
            ProgressAction::Teacher { id } => {
                print_json(&state.progress_api.teacher_summary(&id, now)?)
            }
            ProgressAction::Task { id } => print_json(&state.progress_api.task_summary(&id, now)?),
            ProgressAction::Gantt {
                teacher,
                course,
                year_group,
                from,
                to,
            } => {
                let filter = GanttFilter {
                    teacher_id: teacher,
                    course,
                    year_group,
                    start_date: from,
                    end_date: to,
                };
                print_json(&state.progress_api.gantt_rows(&filter)?)
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let window_days = state
                    .config
                    .get_upcoming_window_days()
                    .await
                    .map_err(anyhow::Error::msg)?;
                let task_limit = state
                    .config
                    .get_upcoming_task_limit()
                    .await
                    .map_err(anyhow::Error::msg)?;
                let mut effective = serde_json::Map::new();
                effective.insert(config_keys::UPCOMING_WINDOW_DAYS.to_string(), window_days.into());
                effective.insert(config_keys::UPCOMING_TASK_LIMIT.to_string(), task_limit.into());
                let effective = serde_json::json!({
                    "effective": effective,
                    "stored": state.config.get_config_snapshot()?,
                });
                print_json(&effective)
            }
            ConfigAction::Set { key, value } => {
                state.config.set_global_config_value(&key, &value)?;
                println!("{} = {}", key, value);
                Ok(())
            }
        },
    }
}
