// ==========================================
// Repository integration tests
// ==========================================
// Direct repository access over a temporary SQLite file
// ==========================================


use marking_maestro::db::open_sqlite_connection;
use marking_maestro::domain::{Allocation, AllocationRunLog, ProgressUpdate, TaskId, TaskStatus, TeacherId};
use marking_maestro::repository::{
    AllocationRepository, ClassRepository, ProgressFilter, ProgressRepository, RepositoryError,
    TaskRepository, TeacherRepository,
};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use test_helpers::{class, create_test_db, dt, task, teacher, teacher_on_leave};

fn shared(db_path: &str) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(open_sqlite_connection(db_path).unwrap()))
}

fn allocation(task: &str, teacher: &str, class: &str) -> Allocation {
    Allocation {
        allocation_id: None,
        task_id: task.into(),
        teacher_id: teacher.into(),
        class_id: class.into(),
        start_date: dt(2024, 3, 1),
        end_date: dt(2024, 3, 15),
        status: TaskStatus::NotStarted,
    }
}

fn run_log(run_id: &str, count: usize) -> AllocationRunLog {
    AllocationRunLog {
        run_id: run_id.to_string(),
        started_at: dt(2024, 2, 28),
        finished_at: dt(2024, 2, 28),
        tasks_total: 1,
        tasks_skipped: 0,
        tasks_under_allocated: 0,
        allocations_count: count,
    }
}

#[test]
fn test_roster_survives_reopen() {
    let (_temp, db_path) = create_test_db().unwrap();
    {
        let conn = shared(&db_path);
        TeacherRepository::new(conn.clone())
            .replace_all(&[
                teacher("T1", "Alice"),
                teacher_on_leave("T2", "Ben", "2024-02-20 to 2024-03-10"),
            ])
            .unwrap();
        TaskRepository::new(conn.clone())
            .replace_all(&[task("K1", "Biology", dt(2024, 3, 1), 2)])
            .unwrap();
        ClassRepository::new(conn)
            .replace_all(&[class("C1", "Biology", "T1", 25)])
            .unwrap();
    }

    let conn = shared(&db_path);
    let teachers = TeacherRepository::new(conn.clone()).find_all().unwrap();
    let tasks = TaskRepository::new(conn.clone()).find_all().unwrap();
    let classes = ClassRepository::new(conn).find_all().unwrap();

    assert_eq!(teachers.len(), 2);
    assert_eq!(teachers[1].leave_dates, "2024-02-20 to 2024-03-10");
    assert_eq!(tasks[0].due_date, dt(2024, 3, 1));
    assert_eq!(tasks[0].markers_required, 2);
    assert_eq!(classes[0].student_count, 25);
}

#[test]
fn test_teacher_upsert_replaces_record() {
    let (_temp, db_path) = create_test_db().unwrap();
    let repo = TeacherRepository::new(shared(&db_path));

    repo.upsert(&teacher("T1", "Alice")).unwrap();
    repo.upsert(&teacher("T1", "Alice Marsh")).unwrap();

    assert_eq!(repo.count().unwrap(), 1);
    let stored = repo.find_by_id(&TeacherId::from("T1")).unwrap().unwrap();
    assert_eq!(stored.name, "Alice Marsh");
    assert!(repo.find_by_id(&TeacherId::from("T2")).unwrap().is_none());
}

#[test]
fn test_unknown_stored_status_reads_as_not_started() {
    let (_temp, db_path) = create_test_db().unwrap();
    let conn = shared(&db_path);
    let repo = TaskRepository::new(conn.clone());
    repo.replace_all(&[task("K1", "Biology", dt(2024, 3, 1), 1)])
        .unwrap();

    conn.lock()
        .unwrap()
        .execute(
            "UPDATE task SET status = ?1 WHERE task_id = ?2",
            params!["Paused", "K1"],
        )
        .unwrap();

    let stored = repo.find_by_id(&TaskId::from("K1")).unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::NotStarted);
}

#[test]
fn test_allocation_replace_assigns_ids_and_logs_run() {
    let (_temp, db_path) = create_test_db().unwrap();
    let repo = AllocationRepository::new(shared(&db_path));

    let saved = repo
        .replace_all(
            &[allocation("K1", "T2", "C1"), allocation("K1", "T1", "C2")],
            &run_log("run-1", 2),
        )
        .unwrap();

    assert_eq!(saved.len(), 2);
    assert!(saved.iter().all(|a| a.allocation_id.is_some()));
    assert_eq!(repo.find_all().unwrap(), saved);

    let logs = repo.find_run_logs(5).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].run_id, "run-1");
    assert_eq!(logs[0].allocations_count, 2);
}

#[test]
fn test_failed_allocation_replace_rolls_back() {
    let (_temp, db_path) = create_test_db().unwrap();
    let repo = AllocationRepository::new(shared(&db_path));
    repo.replace_all(&[allocation("K1", "T2", "C1")], &run_log("run-1", 1))
        .unwrap();

    // reusing the run id violates the run log key after the allocations were rewritten
    let result = repo.replace_all(
        &[allocation("K9", "T9", "C9"), allocation("K9", "T8", "C8")],
        &run_log("run-1", 2),
    );

    assert!(result.is_err());
    let kept = repo.find_all().unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].task_id.as_str(), "K1");
}

#[test]
fn test_allocation_update_and_delete() {
    let (_temp, db_path) = create_test_db().unwrap();
    let repo = AllocationRepository::new(shared(&db_path));
    let saved = repo
        .replace_all(&[allocation("K1", "T2", "C1")], &run_log("run-1", 1))
        .unwrap();

    let mut changed = saved[0].clone();
    changed.teacher_id = TeacherId::from("T3");
    repo.update(&changed).unwrap();
    assert_eq!(
        repo.find_by_teacher(&TeacherId::from("T3")).unwrap(),
        vec![changed.clone()]
    );

    let mut ghost = changed.clone();
    ghost.allocation_id = Some(4242);
    assert!(matches!(
        repo.update(&ghost),
        Err(RepositoryError::NotFound { .. })
    ));

    let unsaved = allocation("K1", "T1", "C1");
    assert!(repo.update(&unsaved).is_err());

    let id = changed.allocation_id.unwrap();
    assert!(repo.delete(id).unwrap());
    assert!(!repo.delete(id).unwrap());
}

#[test]
fn test_status_mirrors_across_task_allocations() {
    let (_temp, db_path) = create_test_db().unwrap();
    let repo = AllocationRepository::new(shared(&db_path));
    repo.replace_all(
        &[
            allocation("K1", "T2", "C1"),
            allocation("K1", "T1", "C2"),
            allocation("K2", "T3", "L1"),
        ],
        &run_log("run-1", 3),
    )
    .unwrap();

    let updated = repo
        .update_status_by_task(&TaskId::from("K1"), TaskStatus::Completed)
        .unwrap();

    assert_eq!(updated, 2);
    let k2 = repo.find_by_task(&TaskId::from("K2")).unwrap();
    assert_eq!(k2[0].status, TaskStatus::NotStarted);
}

#[test]
fn test_progress_rows_unique_per_allocation() {
    let (_temp, db_path) = create_test_db().unwrap();
    let repo = ProgressRepository::new(shared(&db_path));
    let allocations = vec![allocation("K1", "T2", "C1"), allocation("K1", "T1", "C2")];

    assert_eq!(repo.ensure_for_allocations(&allocations, dt(2024, 3, 1)).unwrap(), 2);
    assert_eq!(repo.ensure_for_allocations(&allocations, dt(2024, 3, 2)).unwrap(), 0);

    let rows = repo.find_all().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.last_updated == dt(2024, 3, 1)));
    assert!(rows.iter().all(|r| r.completion_percentage == 0.0));
}

#[test]
fn test_progress_bulk_update_and_filter() {
    let (_temp, db_path) = create_test_db().unwrap();
    let repo = ProgressRepository::new(shared(&db_path));
    repo.ensure_for_allocations(
        &[allocation("K1", "T2", "C1"), allocation("K1", "T1", "C2")],
        dt(2024, 3, 1),
    )
    .unwrap();
    let ids: Vec<i64> = repo.find_all().unwrap().iter().map(|r| r.progress_id).collect();

    let update = ProgressUpdate {
        status: Some(TaskStatus::InProgress),
        completion_percentage: Some(-5.0),
        ..Default::default()
    };
    let records = repo.bulk_update(&ids, &update, dt(2024, 3, 4)).unwrap();
    assert!(records.iter().all(|r| r.completion_percentage == 0.0));

    let t2 = repo
        .find_filtered(&ProgressFilter {
            teacher_id: Some(TeacherId::from("T2")),
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(t2.len(), 1);
    assert_eq!(t2[0].class_id.as_str(), "C1");
    assert_eq!(t2[0].last_updated, dt(2024, 3, 4));

    let missing = repo.bulk_update(&[ids[0], 777], &update, dt(2024, 3, 5));
    assert!(missing.is_err());
    let first = repo.find_by_id(ids[0]).unwrap().unwrap();
    assert_eq!(first.last_updated, dt(2024, 3, 4));
}
