// ==========================================
// AllocationApi integration tests
// ==========================================
// Allocation runs persisted to a temp database, manual reassignment
// ==========================================


use marking_maestro::api::ApiError;
use marking_maestro::domain::{AllocationPatch, TaskId, TaskStatus, TeacherId};
use marking_maestro::logging;
use test_helpers::{create_test_state, dt, import_sample_roster};

fn summary(state: &marking_maestro::app::AppState) -> Vec<(String, String, String)> {
    state
        .allocation_api
        .list_allocations()
        .unwrap()
        .into_iter()
        .map(|a| {
            (
                a.task_id.into_inner(),
                a.class_id.into_inner(),
                a.teacher_id.into_inner(),
            )
        })
        .collect()
}

fn triple(task: &str, class: &str, teacher: &str) -> (String, String, String) {
    (task.to_string(), class.to_string(), teacher.to_string())
}

#[test]
fn test_run_allocation_on_sample_roster() {
    logging::init_test();
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);

    let report = state.allocation_api.run_allocation().unwrap();

    assert_eq!(report.tasks_total, 2);
    assert_eq!(report.tasks_skipped, 0);
    // Ben is on leave over the Biology window, so K1 is short of markers
    assert_eq!(report.tasks_under_allocated, 1);
    assert_eq!(report.allocations.len(), 2);
    assert!(report.allocations.iter().all(|a| a.allocation_id.is_some()));

    assert_eq!(
        summary(&state),
        vec![triple("K1", "B2", "T1"), triple("K2", "L1", "T4")]
    );

    let k2 = state
        .allocation_api
        .list_allocations_by_task(&TaskId::from("K2"))
        .unwrap();
    assert_eq!(k2[0].start_date, dt(2024, 3, 4));
    assert_eq!(k2[0].end_date, dt(2024, 3, 18));
    assert_eq!(k2[0].status, TaskStatus::NotStarted);
}

#[test]
fn test_run_allocation_replaces_previous_run() {
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);

    state.allocation_api.run_allocation().unwrap();
    state.allocation_api.run_allocation().unwrap();

    assert_eq!(state.allocation_api.list_allocations().unwrap().len(), 2);

    let runs = state.allocation_api.recent_runs(10).unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.allocations_count == 2));
    assert_ne!(runs[0].run_id, runs[1].run_id);
}

#[test]
fn test_leave_change_takes_effect_on_next_run() {
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);
    state.allocation_api.run_allocation().unwrap();

    state
        .import_api
        .update_leave_dates(&TeacherId::from("T2"), "")
        .unwrap();
    state.allocation_api.run_allocation().unwrap();

    assert_eq!(
        summary(&state),
        vec![
            triple("K1", "B1", "T2"),
            triple("K1", "B2", "T1"),
            triple("K2", "L1", "T4"),
        ]
    );
}

#[test]
fn test_run_on_empty_roster() {
    let (_temp, state) = create_test_state();

    let report = state.allocation_api.run_allocation().unwrap();

    assert_eq!(report.tasks_total, 0);
    assert!(report.allocations.is_empty());
    assert_eq!(state.allocation_api.recent_runs(5).unwrap().len(), 1);
}

#[test]
fn test_list_by_teacher() {
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);
    state.allocation_api.run_allocation().unwrap();

    let t1 = state
        .allocation_api
        .list_allocations_by_teacher(&TeacherId::from("T1"))
        .unwrap();
    assert_eq!(t1.len(), 1);
    assert_eq!(t1[0].class_id.as_str(), "B2");

    let t3 = state
        .allocation_api
        .list_allocations_by_teacher(&TeacherId::from("T3"))
        .unwrap();
    assert!(t3.is_empty());
}

#[test]
fn test_reassign_allocation() {
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);
    let report = state.allocation_api.run_allocation().unwrap();
    let id = report.allocations[0].allocation_id.unwrap();

    let patch = AllocationPatch {
        teacher_id: Some(TeacherId::from("T3")),
        status: Some(TaskStatus::InProgress),
        ..Default::default()
    };
    let updated = state.allocation_api.update_allocation(id, &patch).unwrap();

    assert_eq!(updated.teacher_id.as_str(), "T3");
    assert_eq!(updated.status, TaskStatus::InProgress);

    let t3 = state
        .allocation_api
        .list_allocations_by_teacher(&TeacherId::from("T3"))
        .unwrap();
    assert_eq!(t3.len(), 1);
    assert_eq!(t3[0].allocation_id, Some(id));
}

#[test]
fn test_reassign_rejects_bad_input() {
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);
    let report = state.allocation_api.run_allocation().unwrap();
    let id = report.allocations[0].allocation_id.unwrap();

    let empty = state
        .allocation_api
        .update_allocation(id, &AllocationPatch::default());
    assert!(matches!(empty, Err(ApiError::InvalidInput(_))));

    let unknown_teacher = state.allocation_api.update_allocation(
        id,
        &AllocationPatch {
            teacher_id: Some(TeacherId::from("T404")),
            ..Default::default()
        },
    );
    assert!(matches!(unknown_teacher, Err(ApiError::InvalidInput(_))));

    let backwards = state.allocation_api.update_allocation(
        id,
        &AllocationPatch {
            end_date: Some(dt(2024, 2, 1)),
            ..Default::default()
        },
    );
    assert!(matches!(backwards, Err(ApiError::InvalidInput(_))));

    let missing = state.allocation_api.update_allocation(
        99_999,
        &AllocationPatch {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        },
    );
    assert!(matches!(missing, Err(ApiError::NotFound(_))));

    // nothing was written
    let stored = state
        .allocation_api
        .list_allocations_by_task(&TaskId::from("K1"))
        .unwrap();
    assert_eq!(stored[0].teacher_id.as_str(), "T1");
    assert_eq!(stored[0].end_date, dt(2024, 3, 15));
}

#[test]
fn test_delete_allocation() {
    let (_temp, state) = create_test_state();
    import_sample_roster(&state);
    let report = state.allocation_api.run_allocation().unwrap();
    let id = report.allocations[1].allocation_id.unwrap();

    state.allocation_api.delete_allocation(id).unwrap();
    assert_eq!(state.allocation_api.list_allocations().unwrap().len(), 1);

    let again = state.allocation_api.delete_allocation(id);
    assert!(matches!(again, Err(ApiError::NotFound(_))));
}
