use entity::InvitationRole;
use platform_authz::TaskRole;
use products_taskboard::{TaskboardError, update::PLANNING_STATUS_LOG};
use taskboard_tests::{Fixture, text};

#[tokio::test]
async fn owner_role_belongs_to_the_owner_only() {
    let (fixture, manager, employee) = Fixture::staffed().await;
    let taskboard = &fixture.harness.taskboard;
    let validator = taskboard.validator();
    let db = taskboard.db();

    validator
        .require_role(db, fixture.task_id, fixture.owner.user_id, TaskRole::Owner)
        .await
        .unwrap();
    for member in [&manager, &employee] {
        let err = validator
            .require_role(db, fixture.task_id, member.user_id, TaskRole::Owner)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Only for owner");
    }
    validator
        .require_role(db, fixture.task_id, manager.user_id, TaskRole::Manager)
        .await
        .unwrap();
    validator
        .require_role(db, fixture.task_id, employee.user_id, TaskRole::Employee)
        .await
        .unwrap();
    let err = validator
        .require_role(db, fixture.task_id, employee.user_id, TaskRole::Manager)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Only for manager");
}

#[tokio::test]
async fn owner_is_not_implicitly_a_manager() {
    let fixture = Fixture::new().await;
    let taskboard = &fixture.harness.taskboard;
    let err = taskboard
        .validator()
        .require_role(taskboard.db(), fixture.task_id, fixture.owner.user_id, TaskRole::Manager)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Only for manager");
}

#[tokio::test]
async fn planning_status_is_owner_only_and_notifies_once() {
    let fixture = Fixture::new().await;
    fixture
        .member(&fixture.owner, "manager@example.com", InvitationRole::Manager)
        .await;

    let outcome = fixture
        .update(&fixture.owner, text(&[("planning_status", "Approved")]))
        .await
        .unwrap();
    assert_eq!(outcome.emails_sent, vec![PLANNING_STATUS_LOG.to_string()]);
    let sent = fixture.harness.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Task Planning Approved");
    assert_eq!(sent[0].recipients, vec!["manager@example.com".to_string()]);

    let outsider = fixture.harness.user("outsider@example.com").await;
    let err = fixture
        .update(&outsider, text(&[("planning_status", "Not Approved")]))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Forbidden(ref msg) if msg == "Only for owner"));
    let task = fixture.harness.taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.planning_status, Some("Approved"));
}

#[tokio::test]
async fn first_failing_field_stops_the_whole_changeset() {
    let (fixture, manager, _) = Fixture::staffed().await;
    let err = fixture
        .update(
            &manager,
            text(&[("priority", "High"), ("name_task", "Renamed by manager")]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Forbidden(ref msg) if msg == "Only for owner"));

    let task = fixture.harness.taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.priority, None);
    assert_eq!(task.name_task, "Design");
}

#[tokio::test]
async fn a_user_cannot_hold_both_member_roles() {
    let (fixture, manager, employee) = Fixture::staffed().await;

    let err = fixture
        .update(&manager, text(&[("employee", "manager@example.com")]))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Conflict(ref msg)
        if msg == "User is already assigned as manager to a task"));

    let err = fixture
        .update(&fixture.owner, text(&[("manager", employee.email.as_str())]))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Conflict(ref msg)
        if msg == "User is already assigned as employee to a task"));
}
