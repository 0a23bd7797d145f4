use entity::InvitationRole;
use platform_authn::AuthenticatedPrincipal;
use products_taskboard::{
    TaskboardError,
    deletion::{EmployeeDeletion, ManagerDeletion},
};
use taskboard_tests::{Fixture, text, with_file};

async fn with_files(
    fixture: &Fixture,
    manager: &AuthenticatedPrincipal,
    employee: &AuthenticatedPrincipal,
) {
    fixture
        .update(manager, with_file(text(&[]), "planning_file", "plan.pdf"))
        .await
        .unwrap();
    fixture
        .update(employee, with_file(text(&[]), "project_file", "build.pdf"))
        .await
        .unwrap();
}

#[tokio::test]
async fn removing_the_last_manager_sweeps_employees_and_files() {
    let (fixture, manager, employee) = Fixture::staffed().await;
    with_files(&fixture, &manager, &employee).await;
    let taskboard = &fixture.harness.taskboard;
    let manager_row = taskboard.get_task(fixture.task_id).await.unwrap().managers[0].id;

    let report = taskboard
        .delete_manager(&fixture.owner, fixture.task_id, manager_row)
        .await
        .unwrap();
    assert_eq!(
        report,
        ManagerDeletion {
            employees_removed: 1,
            planning_files_removed: 1,
            project_files_removed: 1,
        }
    );
    let task = taskboard.get_task(fixture.task_id).await.unwrap();
    assert!(task.managers.is_empty());
    assert!(task.employees.is_empty());
    assert!(task.planning_files.is_empty());
    assert!(task.project_files.is_empty());
    let mut deleted = fixture.harness.storage.deleted();
    deleted.sort();
    assert_eq!(deleted, vec!["build.pdf".to_string(), "plan.pdf".to_string()]);
}

#[tokio::test]
async fn removing_one_of_several_managers_keeps_the_team() {
    let (fixture, manager, employee) = Fixture::staffed().await;
    with_files(&fixture, &manager, &employee).await;
    fixture
        .member(&fixture.owner, "second@example.com", InvitationRole::Manager)
        .await;
    let taskboard = &fixture.harness.taskboard;
    let manager_row = taskboard.get_task(fixture.task_id).await.unwrap().managers[0].id;

    let report = taskboard
        .delete_manager(&fixture.owner, fixture.task_id, manager_row)
        .await
        .unwrap();
    assert_eq!(report, ManagerDeletion::default());
    let task = taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.managers.len(), 1);
    assert_eq!(task.employees.len(), 1);
    assert_eq!(task.planning_files.len(), 1);
    assert!(fixture.harness.storage.deleted().is_empty());
}

#[tokio::test]
async fn removing_a_pending_manager_drops_the_invitation() {
    let fixture = Fixture::new().await;
    fixture.harness.user("manager@example.com").await;
    fixture
        .invite(&fixture.owner, "manager@example.com", InvitationRole::Manager)
        .await;
    let taskboard = &fixture.harness.taskboard;
    let manager_row = taskboard.get_task(fixture.task_id).await.unwrap().managers[0].id;

    let report = taskboard
        .delete_manager(&fixture.owner, fixture.task_id, manager_row)
        .await
        .unwrap();
    assert_eq!(report, ManagerDeletion::default());
    assert!(taskboard.list_invitations().await.unwrap().is_empty());
}

#[tokio::test]
async fn removing_the_last_employee_sweeps_project_files() {
    let (fixture, manager, employee) = Fixture::staffed().await;
    with_files(&fixture, &manager, &employee).await;
    let taskboard = &fixture.harness.taskboard;
    let employee_row = taskboard.get_task(fixture.task_id).await.unwrap().employees[0].id;

    let err = taskboard
        .delete_employee(&employee, fixture.task_id, employee_row)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Forbidden(_)));

    let report = taskboard
        .delete_employee(&manager, fixture.task_id, employee_row)
        .await
        .unwrap();
    assert_eq!(report, EmployeeDeletion { project_files_removed: 1 });
    let task = taskboard.get_task(fixture.task_id).await.unwrap();
    assert!(task.project_files.is_empty());
    assert_eq!(task.planning_files.len(), 1);
    assert_eq!(fixture.harness.storage.deleted(), vec!["build.pdf".to_string()]);
}

#[tokio::test]
async fn file_deletion_passes_the_stored_name_to_storage() {
    let (fixture, manager, employee) = Fixture::staffed().await;
    with_files(&fixture, &manager, &employee).await;
    let taskboard = &fixture.harness.taskboard;
    let task = taskboard.get_task(fixture.task_id).await.unwrap();
    let planning_id = task.planning_files[0].id;
    let project_id = task.project_files[0].id;

    let err = taskboard
        .delete_planning_file(&employee, fixture.task_id, planning_id)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Forbidden(_)));

    let deleted = taskboard
        .delete_planning_file(&manager, fixture.task_id, planning_id)
        .await
        .unwrap();
    assert_eq!(deleted.file_name, "plan.pdf");
    assert_eq!(fixture.harness.storage.deleted(), vec!["plan.pdf".to_string()]);

    let err = taskboard
        .delete_planning_file(&manager, fixture.task_id, planning_id)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::NotFound(_)));

    let deleted = taskboard
        .delete_project_file(&employee, fixture.task_id, project_id)
        .await
        .unwrap();
    assert_eq!(deleted.file_name, "build.pdf");
}

#[tokio::test]
async fn task_deletion_only_touches_its_own_objects() {
    let (fixture, manager, employee) = Fixture::staffed().await;
    with_files(&fixture, &manager, &employee).await;
    let taskboard = &fixture.harness.taskboard;

    let other = taskboard
        .create_task(&fixture.owner, fixture.board_id, "Other")
        .await
        .unwrap();
    let other_manager = fixture.harness.user("other-manager@example.com").await;
    let outcome = taskboard
        .update_task(
            &fixture.owner,
            fixture.board_id,
            other.task_id,
            text(&[("manager", "other-manager@example.com")]),
        )
        .await
        .unwrap();
    taskboard
        .respond_to_invitation(&other_manager, outcome.invitations[0].id, "accept", "manager")
        .await
        .unwrap();
    taskboard
        .update_task(
            &other_manager,
            fixture.board_id,
            other.task_id,
            with_file(text(&[]), "planning_file", "other.pdf"),
        )
        .await
        .unwrap();

    let err = taskboard.delete_task(&manager, fixture.task_id).await.unwrap_err();
    assert!(matches!(err, TaskboardError::Forbidden(ref msg) if msg == "Only for owner"));

    let purge = taskboard.delete_task(&fixture.owner, fixture.task_id).await.unwrap();
    assert_eq!(purge.managers, 1);
    assert_eq!(purge.employees, 1);
    assert_eq!(purge.invitations, 2);
    assert_eq!(purge.planning_files, 1);
    assert_eq!(purge.project_files, 1);

    let mut deleted = fixture.harness.storage.deleted();
    deleted.sort();
    assert_eq!(deleted, vec!["build.pdf".to_string(), "plan.pdf".to_string()]);
    assert_eq!(fixture.harness.storage.objects(), vec!["other.pdf".to_string()]);
    assert!(matches!(
        taskboard.get_task(fixture.task_id).await.unwrap_err(),
        TaskboardError::NotFound(_)
    ));
    assert_eq!(taskboard.get_task(other.task_id).await.unwrap().planning_files.len(), 1);
}

#[tokio::test]
async fn board_deletion_is_creator_only_and_cascades() {
    let (fixture, manager, employee) = Fixture::staffed().await;
    with_files(&fixture, &manager, &employee).await;
    let taskboard = &fixture.harness.taskboard;

    let err = taskboard.delete_board(&manager, fixture.board_id).await.unwrap_err();
    assert!(matches!(err, TaskboardError::Forbidden(_)));

    let report = taskboard.delete_board(&fixture.owner, fixture.board_id).await.unwrap();
    assert_eq!(report.tasks, 1);
    assert_eq!(report.managers, 1);
    assert_eq!(report.employees, 1);
    assert_eq!(report.invitations, 2);
    assert_eq!(report.planning_files + report.project_files, 2);
    assert!(taskboard.list_boards().await.unwrap().is_empty());
    assert!(taskboard.list_tasks().await.unwrap().is_empty());
    assert!(fixture.harness.storage.objects().is_empty());

    // owner row is gone, so the user can now be deleted
    taskboard.delete_user(&fixture.owner, fixture.owner.user_id).await.unwrap();
}
