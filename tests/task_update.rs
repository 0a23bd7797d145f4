use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use chrono_tz::Asia::Jakarta;
use products_taskboard::{
    TaskboardError,
    update::{
        FILE_EXISTS, NAME_LOG, PLANNING_DUE_DATE_LOG, PLANNING_STATUS_LOG, PROJECT_COMMENT_LOG,
        PROJECT_DUE_DATE_LOG, PROJECT_FILE_LOG, PROJECT_STATUS_LOG,
    },
};
use taskboard_tests::{Fixture, text, with_file};

#[tokio::test]
async fn planning_due_date_books_an_event_ending_at_jakarta_midnight() {
    let (fixture, _, _) = Fixture::staffed().await;
    let outcome = fixture
        .update(
            &fixture.owner,
            text(&[
                ("planning_description", "Wireframes and flows"),
                ("planning_due_date", "31-12-2099"),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(outcome.emails_sent, vec![PLANNING_DUE_DATE_LOG.to_string()]);
    assert_eq!(outcome.calendar_events.len(), 1);

    let events = fixture.harness.calendar.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.summary, "Task: Design");
    assert_eq!(event.description, "Wireframes and flows");
    assert_eq!(event.time_zone, "Asia/Jakarta");
    assert_eq!(event.sender, "calendar@taskboard.test");
    assert_eq!(event.attendees, vec!["manager@example.com".to_string()]);

    let end = DateTime::<FixedOffset>::parse_from_rfc3339(&event.end)
        .unwrap()
        .with_timezone(&Jakarta);
    assert_eq!((end.year(), end.month(), end.day()), (2099, 12, 31));
    assert_eq!((end.hour(), end.minute()), (0, 0));

    let sent = fixture.harness.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Calendar Invite: Task: Design");

    let task = fixture.harness.taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.planning_due_date.as_deref(), Some("31-12-2099"));
}

#[tokio::test]
async fn project_due_date_invites_employees() {
    let (fixture, _, _) = Fixture::staffed().await;
    let outcome = fixture
        .update(&fixture.owner, text(&[("project_due_date", "01-06-2099")]))
        .await
        .unwrap();
    assert_eq!(outcome.emails_sent, vec![PROJECT_DUE_DATE_LOG.to_string()]);
    let events = fixture.harness.calendar.events();
    assert_eq!(events[0].attendees, vec!["employee@example.com".to_string()]);
}

#[tokio::test]
async fn malformed_due_date_fails_before_any_side_effect() {
    let (fixture, _, _) = Fixture::staffed().await;
    let err = fixture
        .update(
            &fixture.owner,
            text(&[("name_task", "Renamed"), ("planning_due_date", "not-a-date")]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Validation(_)));
    assert!(fixture.harness.calendar.events().is_empty());
    assert!(fixture.harness.mailer.sent().is_empty());
    let task = fixture.harness.taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.name_task, "Design");
}

#[tokio::test]
async fn past_due_dates_are_rejected() {
    let fixture = Fixture::new().await;
    let err = fixture
        .update(&fixture.owner, text(&[("planning_due_date", "01-01-2000")]))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Validation(ref msg)
        if msg == "planning_due_date must be in the future"));
}

#[tokio::test]
async fn calendar_failure_surfaces_after_the_rows_commit() {
    let (fixture, _, _) = Fixture::staffed().await;
    fixture.harness.calendar.set_failing(true);
    let err = fixture
        .update(&fixture.owner, text(&[("planning_due_date", "31-12-2099")]))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Upstream(_)));
    let task = fixture.harness.taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.planning_due_date.as_deref(), Some("31-12-2099"));
}

#[tokio::test]
async fn status_mail_failure_surfaces_after_the_rows_commit() {
    let (fixture, _, _) = Fixture::staffed().await;
    fixture.harness.mailer.set_failing(true);
    let err = fixture
        .update(&fixture.owner, text(&[("planning_status", "not_approved")]))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Upstream(_)));
    let task = fixture.harness.taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.planning_status, Some("Not Approved"));

    fixture.harness.mailer.set_failing(false);
    let outcome = fixture
        .update(&fixture.owner, text(&[("planning_status", "approved")]))
        .await
        .unwrap();
    assert_eq!(outcome.emails_sent, vec![PLANNING_STATUS_LOG.to_string()]);
    assert_eq!(fixture.harness.mailer.subjects(), vec!["Task Planning Approved".to_string()]);
}

#[tokio::test]
async fn project_status_is_announced_to_everyone_but_the_sender() {
    let (fixture, _, _) = Fixture::staffed().await;
    let outcome = fixture
        .update(&fixture.owner, text(&[("project_status", "done")]))
        .await
        .unwrap();
    assert_eq!(outcome.updated_fields, vec!["project_status"]);
    assert_eq!(outcome.emails_sent, vec![PROJECT_STATUS_LOG.to_string()]);

    let sent = fixture.harness.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Task Project Done");
    assert_eq!(
        sent[0].recipients,
        vec!["manager@example.com".to_string(), "employee@example.com".to_string()]
    );
    let task = fixture.harness.taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.project_status, Some("Done"));

    fixture.harness.mailer.set_failing(true);
    let err = fixture
        .update(&fixture.owner, text(&[("project_status", "undone")]))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Upstream(_)));
    let task = fixture.harness.taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.project_status, Some("Undone"));
}

#[tokio::test]
async fn owner_is_not_mailed_after_changing_their_email() {
    let (fixture, manager, _) = Fixture::staffed().await;
    let taskboard = &fixture.harness.taskboard;
    taskboard
        .update_user_email(&fixture.owner, fixture.owner.user_id, "owner@new.example.com")
        .await
        .unwrap();
    let owner = taskboard
        .resolve_principal(&fixture.owner)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owner.email, "owner@new.example.com");

    fixture
        .update(&owner, text(&[("planning_status", "approved")]))
        .await
        .unwrap();
    let sent = fixture.harness.mailer.sent();
    assert_eq!(
        sent[0].recipients,
        vec!["manager@example.com".to_string(), "employee@example.com".to_string()]
    );

    fixture
        .update(&manager, text(&[("priority", "high")]))
        .await
        .unwrap();
    let task = taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.owner.unwrap().email, "owner@new.example.com");
}

#[tokio::test]
async fn rename_mail_failure_is_swallowed() {
    let (fixture, _, _) = Fixture::staffed().await;
    fixture.harness.mailer.set_failing(true);
    let outcome = fixture
        .update(&fixture.owner, text(&[("name_task", "Design v2")]))
        .await
        .unwrap();
    assert_eq!(outcome.updated_fields, vec!["name_task"]);
    assert!(outcome.emails_sent.is_empty());

    fixture.harness.mailer.set_failing(false);
    let outcome = fixture
        .update(&fixture.owner, text(&[("name_task", "Design v3")]))
        .await
        .unwrap();
    assert_eq!(outcome.emails_sent, vec![NAME_LOG.to_string()]);
    let recipients = &fixture.harness.mailer.sent()[0].recipients;
    assert_eq!(
        recipients,
        &vec!["manager@example.com".to_string(), "employee@example.com".to_string()]
    );
}

#[tokio::test]
async fn employee_comment_reaches_the_owner() {
    let (fixture, _, employee) = Fixture::staffed().await;
    let outcome = fixture
        .update(&employee, text(&[("project_comment", "Mockups attached")]))
        .await
        .unwrap();
    assert_eq!(outcome.emails_sent, vec![PROJECT_COMMENT_LOG.to_string()]);
    let sent = fixture.harness.mailer.sent();
    assert_eq!(sent[0].recipients, vec!["owner@example.com".to_string()]);
    assert_eq!(sent[0].subject, "New Project Comment Added");
}

#[tokio::test]
async fn project_file_upload_is_stored_and_announced() {
    let (fixture, _, employee) = Fixture::staffed().await;
    let outcome = fixture
        .update(&employee, with_file(text(&[]), "project_file", "report.pdf"))
        .await
        .unwrap();
    assert_eq!(outcome.files.len(), 1);
    assert_eq!(outcome.files[0].file_name, "report.pdf");
    assert_eq!(outcome.emails_sent, vec![PROJECT_FILE_LOG.to_string()]);
    assert_eq!(fixture.harness.storage.objects(), vec!["report.pdf".to_string()]);

    let task = fixture.harness.taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.project_files.len(), 1);
    assert_eq!(task.project_files[0].file_url, "https://storage.test/report.pdf");
}

#[tokio::test]
async fn duplicate_file_names_conflict_without_uploading() {
    let (fixture, manager, employee) = Fixture::staffed().await;
    fixture
        .update(&employee, with_file(text(&[]), "project_file", "report.pdf"))
        .await
        .unwrap();

    let err = fixture
        .update(&manager, with_file(text(&[]), "planning_file", "report.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Conflict(ref msg) if msg == FILE_EXISTS));
    assert_eq!(fixture.harness.storage.objects(), vec!["report.pdf".to_string()]);
}

#[tokio::test]
async fn failed_upload_leaves_no_rows() {
    let (fixture, _, employee) = Fixture::staffed().await;
    fixture.harness.storage.set_failing_uploads(true);
    let err = fixture
        .update(
            &employee,
            with_file(text(&[("project_comment", "see file")]), "project_file", "a.pdf"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::Upstream(_)));
    let task = fixture.harness.taskboard.get_task(fixture.task_id).await.unwrap();
    assert!(task.project_files.is_empty());
    assert_eq!(task.project_comment, None);
}

#[tokio::test]
async fn member_email_and_custom_roles_are_corrected_in_place() {
    let (fixture, manager, _) = Fixture::staffed().await;
    fixture.harness.user("lead@example.com").await;

    fixture
        .update(
            &manager,
            text(&[
                ("employee_custom_role", "QA"),
                ("employee_email", "employee@example.com"),
            ]),
        )
        .await
        .unwrap();
    fixture
        .update(
            &fixture.owner,
            text(&[
                ("owner_custom_role", "Product owner"),
                ("old_manager_email", "manager@example.com"),
                ("new_manager_email", "lead@example.com"),
            ]),
        )
        .await
        .unwrap();

    let task = fixture.harness.taskboard.get_task(fixture.task_id).await.unwrap();
    assert_eq!(task.owner.unwrap().custom_role.as_deref(), Some("Product owner"));
    assert_eq!(task.employees[0].custom_role.as_deref(), Some("QA"));
    assert_eq!(task.managers[0].email, "lead@example.com");

    let err = fixture
        .update(
            &fixture.owner,
            text(&[
                ("manager_custom_role", "Lead"),
                ("manager_email", "nobody@example.com"),
            ]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::NotFound(_)));
}

#[tokio::test]
async fn task_must_belong_to_the_board() {
    let fixture = Fixture::new().await;
    let other = fixture
        .harness
        .taskboard
        .create_board(&fixture.owner, "Sprint 2")
        .await
        .unwrap();
    let err = fixture
        .harness
        .taskboard
        .update_task(&fixture.owner, other.id, fixture.task_id, text(&[("priority", "High")]))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskboardError::NotFound(_)));
}

#[tokio::test]
async fn empty_changeset_is_rejected() {
    let fixture = Fixture::new().await;
    let err = fixture.update(&fixture.owner, text(&[])).await.unwrap_err();
    assert!(matches!(err, TaskboardError::Validation(ref msg) if msg == "No fields to update"));
}
