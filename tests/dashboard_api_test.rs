// ==========================================
// DashboardApi integration tests
// ==========================================
// Statistics roll-up and teacher reports, config-driven windows
// ==========================================


use async_trait::async_trait;
use marking_maestro::api::{ApiError, DashboardApi};
use marking_maestro::config::{config_keys, ConfigReadResult, ReportConfigReader};
use marking_maestro::db::open_sqlite_connection;
use marking_maestro::domain::{ProgressUpdate, TaskId, TaskStatus, TeacherId};
use marking_maestro::logging;
use marking_maestro::repository::{
    AllocationRepository, ClassRepository, ProgressFilter, ProgressRepository, TaskRepository,
    TeacherRepository,
};
use std::sync::{Arc, Mutex};
use test_helpers::{create_test_db, create_test_state, dt, import_sample_roster};

/// Reader that hands out a window no calendar can hold
struct UnboundedWindow;

#[async_trait]
impl ReportConfigReader for UnboundedWindow {
    async fn get_upcoming_window_days(&self) -> ConfigReadResult<i64> {
        Ok(i64::MAX)
    }

    async fn get_upcoming_task_limit(&self) -> ConfigReadResult<usize> {
        Ok(5)
    }
}

#[tokio::test]
async fn test_statistics_on_empty_database() {
    logging::init_test();
    let (_temp, state) = create_test_state();

    let stats = state
        .dashboard_api
        .get_statistics(dt(2024, 2, 20))
        .await
        .unwrap();

    assert_eq!(stats.total_teachers, 0);
    assert_eq!(stats.total_allocations, 0);
    assert!(stats.upcoming_tasks.is_empty());
    assert!(stats.teacher_loads.is_empty());
    // every status present, zero-filled
    assert_eq!(stats.tasks_by_status.len(), 3);
    assert!(stats.tasks_by_status.values().all(|n| *n == 0));
}

#[tokio::test]
async fn test_statistics_after_allocation() {
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);
    state.allocation_api.run_allocation().unwrap();
    state
        .import_api
        .update_task_status(&TaskId::from("K2"), TaskStatus::Completed)
        .unwrap();

    let stats = state
        .dashboard_api
        .get_statistics(dt(2024, 2, 20))
        .await
        .unwrap();

    assert_eq!(stats.total_teachers, 4);
    assert_eq!(stats.total_tasks, 2);
    assert_eq!(stats.total_classes, 3);
    assert_eq!(stats.total_allocations, 2);
    assert_eq!(stats.tasks_by_status["Not Started"], 1);
    assert_eq!(stats.tasks_by_status["Completed"], 1);
    assert_eq!(stats.tasks_by_status["In Progress"], 0);

    let upcoming: Vec<&str> = stats
        .upcoming_tasks
        .iter()
        .map(|t| t.task_id.as_str())
        .collect();
    assert_eq!(upcoming, vec!["K1", "K2"]);

    // most students first: T1 marks B2 (28), T4 marks L1 (12)
    let loads: Vec<(&str, usize, u64)> = stats
        .teacher_loads
        .iter()
        .map(|l| (l.teacher.teacher_id.as_str(), l.task_count, l.student_count))
        .collect();
    assert_eq!(loads[0], ("T1", 1, 28));
    assert_eq!(loads[1], ("T4", 1, 12));
    assert_eq!(loads.len(), 4);
    assert!(loads[2..].iter().all(|(_, tasks, students)| *tasks == 0 && *students == 0));
}

#[tokio::test]
async fn test_upcoming_window_excludes_past_and_far_tasks() {
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);

    // K1 due 03-01 is in the past at 03-02; K2 due 03-04 is within 14 days
    let stats = state
        .dashboard_api
        .get_statistics(dt(2024, 3, 2))
        .await
        .unwrap();
    assert_eq!(stats.upcoming_tasks.len(), 1);
    assert_eq!(stats.upcoming_tasks[0].task_id.as_str(), "K2");

    let early = state
        .dashboard_api
        .get_statistics(dt(2024, 1, 1))
        .await
        .unwrap();
    assert!(early.upcoming_tasks.is_empty());
}

#[tokio::test]
async fn test_upcoming_settings_come_from_config() {
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);

    state
        .config
        .set_global_config_value(config_keys::UPCOMING_TASK_LIMIT, "1")
        .unwrap();
    let stats = state
        .dashboard_api
        .get_statistics(dt(2024, 2, 20))
        .await
        .unwrap();
    assert_eq!(stats.upcoming_tasks.len(), 1);
    assert_eq!(stats.upcoming_tasks[0].task_id.as_str(), "K1");

    state
        .config
        .set_global_config_value(config_keys::UPCOMING_WINDOW_DAYS, "2")
        .unwrap();
    let narrow = state
        .dashboard_api
        .get_statistics(dt(2024, 2, 20))
        .await
        .unwrap();
    assert!(narrow.upcoming_tasks.is_empty());
}

#[tokio::test]
async fn test_oversized_window_setting_is_clamped() {
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);

    state
        .config
        .set_global_config_value(config_keys::UPCOMING_WINDOW_DAYS, "200000000")
        .unwrap();
    let stats = state
        .dashboard_api
        .get_statistics(dt(2024, 2, 20))
        .await
        .unwrap();

    assert_eq!(stats.upcoming_tasks.len(), 2);
}

#[tokio::test]
async fn test_unrepresentable_window_is_a_config_error() {
    let (_temp, db_path) = create_test_db().unwrap();
    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path).unwrap()));
    let api = DashboardApi::new(
        Arc::new(TeacherRepository::new(conn.clone())),
        Arc::new(TaskRepository::new(conn.clone())),
        Arc::new(ClassRepository::new(conn.clone())),
        Arc::new(AllocationRepository::new(conn.clone())),
        Arc::new(ProgressRepository::new(conn)),
        Arc::new(UnboundedWindow),
    );

    let result = api.get_statistics(dt(2024, 2, 20)).await;

    assert!(matches!(result, Err(ApiError::ConfigError(_))));
}

#[tokio::test]
async fn test_statistics_serialize_camel_case() {
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);
    state.allocation_api.run_allocation().unwrap();

    let stats = state
        .dashboard_api
        .get_statistics(dt(2024, 2, 20))
        .await
        .unwrap();
    let json = serde_json::to_value(&stats).unwrap();

    assert!(json.get("tasksByStatus").is_some());
    assert!(json.get("upcomingTasks").is_some());
    assert_eq!(json["teacherLoads"][0]["studentCount"], 28);
}

#[test]
fn test_teacher_report() {
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);
    state.allocation_api.run_allocation().unwrap();
    state.progress_api.sync_progress(dt(2024, 3, 2)).unwrap();

    let entries = state
        .progress_api
        .list_entries(
            &ProgressFilter {
                teacher_id: Some(TeacherId::from("T1")),
                ..Default::default()
            },
            dt(2024, 3, 2),
        )
        .unwrap();
    state
        .progress_api
        .update_entry(
            entries[0].progress_id,
            &ProgressUpdate {
                completion_percentage: Some(40.0),
                ..Default::default()
            },
            dt(2024, 3, 5),
        )
        .unwrap();

    let report = state
        .dashboard_api
        .teacher_report(&TeacherId::from("T1"))
        .unwrap();

    assert_eq!(report.teacher.name, "Alice Marsh");
    assert_eq!(report.total_tasks, 1);
    assert_eq!(report.pending_tasks, 1);
    assert_eq!(report.completed_tasks, 0);
    assert_eq!(report.total_students, 28);
    assert_eq!(report.average_progress, 40.0);
    assert_eq!(report.rows[0].class_name, "Biology 10B");
    assert_eq!(report.rows[0].marking_deadline, dt(2024, 3, 15));
}

#[test]
fn test_teacher_report_without_allocations() {
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);

    let report = state
        .dashboard_api
        .teacher_report(&TeacherId::from("T3"))
        .unwrap();
    assert_eq!(report.total_tasks, 0);
    assert_eq!(report.average_progress, 0.0);

    let unknown = state.dashboard_api.teacher_report(&TeacherId::from("T404"));
    assert!(matches!(unknown, Err(ApiError::NotFound(_))));
}
