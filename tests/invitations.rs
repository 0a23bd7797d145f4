use entity::{InvitationRole, InvitationStatus};
use platform_authz::TaskRole;
use products_taskboard::{TaskboardError, invitations::ALREADY_INVITED};
use taskboard_tests::{Fixture, text};

#[tokio::test]
async fn membership_starts_on_acceptance() {
    let fixture = Fixture::new().await;
    let taskboard = &fixture.harness.taskboard;
    let manager = fixture.harness.user("manager@example.com").await;

    let invitation_id = fixture
        .invite(&fixture.owner, "manager@example.com", InvitationRole::Manager)
        .await;

    let task = taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.managers.len(), 1);
    assert_eq!(task.managers[0].invitation_status, InvitationStatus::Pending);
    assert!(
        taskboard
            .validator()
            .require_role(taskboard.db(), fixture.task_id, manager.user_id, TaskRole::Manager)
            .await
            .is_err()
    );

    let answered = taskboard
        .respond_to_invitation(&manager, invitation_id, "accept", "manager")
        .await
        .unwrap();
    assert_eq!(answered.status, InvitationStatus::Accepted);
    assert_eq!(answered.user_email.as_deref(), Some("manager@example.com"));
    taskboard
        .validator()
        .require_role(taskboard.db(), fixture.task_id, manager.user_id, TaskRole::Manager)
        .await
        .unwrap();

    let task = taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.managers[0].invitation_status, InvitationStatus::Accepted);
}

#[tokio::test]
async fn duplicate_pending_invitations_conflict() {
    let fixture = Fixture::new().await;
    fixture.harness.user("manager@example.com").await;
    fixture
        .invite(&fixture.owner, "manager@example.com", InvitationRole::Manager)
        .await;

    let err = fixture
        .update(&fixture.owner, text(&[("manager", "manager@example.com")]))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Conflict(ref msg) if msg == ALREADY_INVITED));
}

#[tokio::test]
async fn rejection_removes_the_member_and_allows_a_new_invitation() {
    let fixture = Fixture::new().await;
    let taskboard = &fixture.harness.taskboard;
    let manager = fixture.harness.user("manager@example.com").await;
    let first = fixture
        .invite(&fixture.owner, "manager@example.com", InvitationRole::Manager)
        .await;

    let answered = taskboard
        .respond_to_invitation(&manager, first, "reject", "manager")
        .await
        .unwrap();
    assert_eq!(answered.status, InvitationStatus::Rejected);
    assert!(taskboard.get_task(fixture.task_id).await.unwrap().managers.is_empty());

    let err = taskboard
        .respond_to_invitation(&manager, first, "accept", "manager")
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Conflict(ref msg) if msg == "Invitation already rejected"));

    let second = fixture
        .invite(&fixture.owner, "manager@example.com", InvitationRole::Manager)
        .await;
    assert_ne!(first, second);
    taskboard
        .respond_to_invitation(&manager, second, "accept", "manager")
        .await
        .unwrap();

    let statuses: Vec<_> = taskboard
        .list_invitations()
        .await
        .unwrap()
        .into_iter()
        .map(|invitation| invitation.status)
        .collect();
    assert_eq!(statuses, vec![InvitationStatus::Rejected, InvitationStatus::Accepted]);
}

#[tokio::test]
async fn only_the_invitee_answers_with_the_matching_role() {
    let fixture = Fixture::new().await;
    let taskboard = &fixture.harness.taskboard;
    let manager = fixture.harness.user("manager@example.com").await;
    let invitation_id = fixture
        .invite(&fixture.owner, "manager@example.com", InvitationRole::Manager)
        .await;

    let err = taskboard
        .respond_to_invitation(&fixture.owner, invitation_id, "accept", "manager")
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Forbidden(_)));

    let err = taskboard
        .respond_to_invitation(&manager, invitation_id, "accept", "employee")
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Validation(_)));

    let err = taskboard
        .respond_to_invitation(&manager, invitation_id, "maybe", "manager")
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Validation(_)));

    let err = taskboard
        .respond_to_invitation(&manager, 9_999, "accept", "manager")
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::NotFound(_)));
}

#[tokio::test]
async fn inviting_an_unknown_email_is_not_found() {
    let fixture = Fixture::new().await;
    let err = fixture
        .update(&fixture.owner, text(&[("manager", "ghost@example.com")]))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::NotFound(ref msg)
        if msg == "User with email ghost@example.com not found"));
    assert!(fixture.harness.taskboard.list_invitations().await.unwrap().is_empty());
}

#[tokio::test]
async fn corrected_pending_invitation_moves_to_the_new_user() {
    let (fixture, manager, _) = Fixture::staffed().await;
    let taskboard = &fixture.harness.taskboard;
    let first = fixture.harness.user("first@example.com").await;
    let second = fixture.harness.user("second@example.com").await;
    let invitation_id = fixture
        .invite(&fixture.owner, "first@example.com", InvitationRole::Manager)
        .await;

    fixture
        .update(
            &fixture.owner,
            text(&[
                ("old_manager_email", "first@example.com"),
                ("new_manager_email", "second@example.com"),
            ]),
        )
        .await
        .unwrap();

    let err = taskboard
        .respond_to_invitation(&first, invitation_id, "accept", "manager")
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Forbidden(_)));

    // Holding the employee role now blocks the moved manager invitation.
    let employee_invitation = fixture
        .invite(&manager, "second@example.com", InvitationRole::Employee)
        .await;
    taskboard
        .respond_to_invitation(&second, employee_invitation, "accept", "employee")
        .await
        .unwrap();

    let err = taskboard
        .respond_to_invitation(&second, invitation_id, "accept", "manager")
        .await
        .unwrap_err();
    assert!(
        matches!(err, TaskboardError::Conflict(ref msg) if msg == "User is already assigned as employee to a task")
    );
    assert!(
        taskboard
            .validator()
            .require_role(taskboard.db(), fixture.task_id, second.user_id, TaskRole::Manager)
            .await
            .is_err()
    );
    assert!(
        taskboard
            .validator()
            .require_role(taskboard.db(), fixture.task_id, first.user_id, TaskRole::Manager)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn new_user_accepts_a_corrected_invitation() {
    let fixture = Fixture::new().await;
    let taskboard = &fixture.harness.taskboard;
    fixture.harness.user("first@example.com").await;
    let second = fixture.harness.user("second@example.com").await;
    let invitation_id = fixture
        .invite(&fixture.owner, "first@example.com", InvitationRole::Manager)
        .await;

    fixture
        .update(
            &fixture.owner,
            text(&[
                ("old_manager_email", "first@example.com"),
                ("new_manager_email", "second@example.com"),
            ]),
        )
        .await
        .unwrap();

    let answered = taskboard
        .respond_to_invitation(&second, invitation_id, "accept", "manager")
        .await
        .unwrap();
    assert_eq!(answered.user_email.as_deref(), Some("second@example.com"));
    let task = taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.managers[0].email, "second@example.com");
    assert_eq!(task.managers[0].invitation_status, InvitationStatus::Accepted);
}
