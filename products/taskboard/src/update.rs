//! The task update workflow.
//!
//! A changeset goes through four phases: every value is parsed, every present
//! field is authorized against its role, uploads land in object storage, and
//! all row changes are applied in one transaction. Notifications fire only
//! after the commit, in field order.

use std::collections::HashSet;

use chrono::Utc;
use entity::{InvitationRole, InvitationStatus, PlanningStatus, ProjectStatus, tasks};
use platform_authn::AuthenticatedPrincipal;
use platform_authz::TaskRole;
use platform_notify::{CalendarEvent, templates};
use platform_storage::StoredObject;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, TransactionTrait};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    Taskboard,
    changeset::{EmailChange, ParsedChangeset, ScheduledDue, TaskChangeset},
    due_date::CALENDAR_TIME_ZONE,
    error::{TaskboardError, TaskboardResult},
    gateway::{self, FileKind, FileRow},
    invitations::{ALREADY_INVITED, ensure_not_assigned, invite, resolve_user},
    notifications::{Audience, recipients},
    views::InvitationView,
};

pub const FILE_EXISTS: &str = "File already exist";

pub const NAME_LOG: &str = "Name task Update, Email sent successfully";
pub const PLANNING_DESCRIPTION_FILE_LOG: &str =
    "Task Planning description file Update Email sent successfully";
pub const PLANNING_STATUS_LOG: &str = "Task Planning status Update Email sent successfully";
pub const PROJECT_STATUS_LOG: &str = "Task Project status update, Email sent successfully";
pub const PLANNING_DUE_DATE_LOG: &str = "Task Planning due date Update, Email sent successfully";
pub const PROJECT_DUE_DATE_LOG: &str = "Task Project due date Update, Email sent successfully";
pub const PROJECT_COMMENT_LOG: &str = "Task Project comment Update Email sent successfully";
pub const PLANNING_FILE_LOG: &str = "Task Planning file Update Email sent successfully";
pub const PROJECT_FILE_LOG: &str = "Task Project file Update Email sent successfully";

#[derive(Clone, Debug, Default, Serialize)]
pub struct TaskUpdateOutcome {
    pub task_id: i32,
    pub board_id: i32,
    pub updated_fields: Vec<&'static str>,
    pub invitations: Vec<InvitationView>,
    pub files: Vec<FileRow>,
    pub calendar_events: Vec<String>,
    pub emails_sent: Vec<String>,
}

/// Role required for each present field, in the order checks run.
pub fn required_roles(parsed: &ParsedChangeset) -> Vec<(&'static str, TaskRole)> {
    let file = |kind| parsed.file(kind).is_some();
    [
        ("owner_custom_role", parsed.owner_custom_role.is_some(), TaskRole::Owner),
        ("manager", !parsed.managers.is_empty(), TaskRole::Owner),
        ("employee", !parsed.employees.is_empty(), TaskRole::Manager),
        ("new_manager_email", parsed.manager_email_change.is_some(), TaskRole::Owner),
        ("new_employee_email", parsed.employee_email_change.is_some(), TaskRole::Manager),
        ("manager_custom_role", parsed.manager_custom_role.is_some(), TaskRole::Owner),
        ("employee_custom_role", parsed.employee_custom_role.is_some(), TaskRole::Manager),
        ("planning_file", file(FileKind::Planning), TaskRole::Manager),
        ("project_file", file(FileKind::Project), TaskRole::Employee),
        ("name_task", parsed.name_task.is_some(), TaskRole::Owner),
        ("planning_description", parsed.planning_description.is_some(), TaskRole::Owner),
        (
            "planning_description_percent",
            parsed.planning_description_percent.is_some(),
            TaskRole::Owner,
        ),
        (
            "planning_description_file",
            file(FileKind::PlanningDescription),
            TaskRole::Owner,
        ),
        ("planning_status", parsed.planning_status.is_some(), TaskRole::Owner),
        ("project_status", parsed.project_status.is_some(), TaskRole::Owner),
        ("planning_due_date", parsed.planning_due_date.is_some(), TaskRole::Owner),
        ("project_due_date", parsed.project_due_date.is_some(), TaskRole::Owner),
        ("priority", parsed.priority.is_some(), TaskRole::Manager),
        ("project_comment", parsed.project_comment.is_some(), TaskRole::Employee),
    ]
    .into_iter()
    .filter(|(_, present, _)| *present)
    .map(|(field, _, role)| (field, role))
    .collect()
}

fn planning_status_mail(status: PlanningStatus) -> (&'static str, &'static str) {
    match status {
        PlanningStatus::Approved => (
            "Task Planning Approved",
            "The planning for this task has been approved.",
        ),
        PlanningStatus::NotApproved => (
            "Task Planning Not Approved",
            "The planning for this task has not been approved. Please review and make necessary adjustments.",
        ),
    }
}

fn project_status_mail(status: ProjectStatus) -> (&'static str, &'static str) {
    match status {
        ProjectStatus::Done => (
            "Task Project Done",
            "The project for this task has been completed.",
        ),
        ProjectStatus::Undone => (
            "Task Project Undone",
            "The project for this task has not been completed. Please review and make necessary adjustments.",
        ),
        ProjectStatus::Working => (
            "Task Project in Progress",
            "Work has started on the project for this task.",
        ),
    }
}

struct Mail<'a> {
    audience: Audience,
    subject: &'a str,
    body: String,
    log_line: &'static str,
}

impl Taskboard {
    pub async fn update_task(
        &self,
        principal: &AuthenticatedPrincipal,
        board_id: i32,
        task_id: i32,
        changeset: TaskChangeset,
    ) -> TaskboardResult<TaskUpdateOutcome> {
        let parsed = changeset.parse(Utc::now())?;
        let task = gateway::tasks::find_task(&self.db, task_id)
            .await?
            .filter(|task| task.board_id == board_id)
            .ok_or_else(|| TaskboardError::not_found("Task not found"))?;

        for (field, role) in required_roles(&parsed) {
            debug!(task_id, field, role = role.as_str(), "authorizing field");
            self.validator
                .require_role(&self.db, task.id, principal.user_id, role)
                .await?;
        }

        let uploaded = self.upload_files(&parsed).await?;
        let mut outcome = match self.apply(&task, &parsed, &uploaded).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.discard_uploads(&uploaded).await;
                return Err(err);
            }
        };
        info!(task_id, fields = ?outcome.updated_fields, "task updated");

        let task = gateway::tasks::find_task(&self.db, task_id)
            .await?
            .ok_or_else(|| TaskboardError::not_found("Task not found"))?;
        self.fire_side_effects(principal, &task, &parsed, &uploaded, &mut outcome)
            .await?;
        Ok(outcome)
    }

    async fn upload_files(
        &self,
        parsed: &ParsedChangeset,
    ) -> TaskboardResult<Vec<(FileKind, StoredObject)>> {
        let mut names = HashSet::new();
        for (_, file) in &parsed.files {
            if !names.insert(file.file_name.as_str())
                || gateway::files::name_exists(&self.db, &file.file_name).await?
            {
                return Err(TaskboardError::conflict(FILE_EXISTS));
            }
        }
        let mut uploaded = Vec::with_capacity(parsed.files.len());
        for (kind, file) in &parsed.files {
            match self.storage.upload(file.clone()).await {
                Ok(stored) => uploaded.push((*kind, stored)),
                Err(err) => {
                    self.discard_uploads(&uploaded).await;
                    return Err(err.into());
                }
            }
        }
        Ok(uploaded)
    }

    async fn discard_uploads(&self, uploaded: &[(FileKind, StoredObject)]) {
        for (_, stored) in uploaded {
            if let Err(err) = self.storage.delete(&stored.name).await {
                warn!(error = %err, name = %stored.name, "failed to discard upload");
            }
        }
    }

    async fn apply(
        &self,
        task: &tasks::Model,
        parsed: &ParsedChangeset,
        uploaded: &[(FileKind, StoredObject)],
    ) -> TaskboardResult<TaskUpdateOutcome> {
        let mut outcome = TaskUpdateOutcome {
            task_id: task.id,
            board_id: task.board_id,
            ..Default::default()
        };
        let txn = self.db.begin().await?;

        if let Some(custom_role) = &parsed.owner_custom_role {
            let owner = gateway::tasks::find_owner(&txn, task)
                .await?
                .ok_or_else(|| TaskboardError::not_found("Owner not found"))?;
            gateway::tasks::set_owner_custom_role(&txn, owner, custom_role).await?;
            outcome.updated_fields.push("owner_custom_role");
        }
        for email in &parsed.managers {
            outcome
                .invitations
                .push(invite(&txn, task.id, email, InvitationRole::Manager).await?);
        }
        for email in &parsed.employees {
            outcome
                .invitations
                .push(invite(&txn, task.id, email, InvitationRole::Employee).await?);
        }
        if let Some(change) = &parsed.manager_email_change {
            correct_member_email(&txn, task.id, change, InvitationRole::Manager).await?;
            outcome.updated_fields.push("manager_email");
        }
        if let Some(change) = &parsed.employee_email_change {
            correct_member_email(&txn, task.id, change, InvitationRole::Employee).await?;
            outcome.updated_fields.push("employee_email");
        }
        for (custom, role, field) in [
            (&parsed.manager_custom_role, InvitationRole::Manager, "manager_custom_role"),
            (&parsed.employee_custom_role, InvitationRole::Employee, "employee_custom_role"),
        ] {
            let Some(custom) = custom else { continue };
            let updated =
                gateway::members::set_custom_role(&txn, task.id, &custom.email, role, &custom.role)
                    .await?;
            if updated == 0 {
                return Err(TaskboardError::not_found(format!(
                    "No {} with email {} on this task",
                    role.as_str(),
                    custom.email
                )));
            }
            outcome.updated_fields.push(field);
        }
        for (kind, stored) in uploaded {
            let row = gateway::files::attach(&txn, task.id, *kind, &stored.url, &stored.name).await?;
            outcome.files.push(row);
        }

        let mut active: tasks::ActiveModel = task.clone().into();
        let mut touched = false;
        let mut set = |field: &'static str| {
            touched = true;
            outcome.updated_fields.push(field);
        };
        if let Some(name) = &parsed.name_task {
            active.name_task = Set(name.clone());
            set("name_task");
        }
        if let Some(description) = &parsed.planning_description {
            active.planning_description = Set(Some(description.clone()));
            set("planning_description");
        }
        if let Some(percent) = &parsed.planning_description_percent {
            active.planning_description_percent = Set(Some(percent.clone()));
            set("planning_description_percent");
        }
        if let Some(status) = parsed.planning_status {
            active.planning_status = Set(Some(status));
            set("planning_status");
        }
        if let Some(status) = parsed.project_status {
            active.project_status = Set(Some(status));
            set("project_status");
        }
        if let Some(scheduled) = &parsed.planning_due_date {
            active.planning_due_date = Set(Some(scheduled.due.raw.clone()));
            set("planning_due_date");
        }
        if let Some(scheduled) = &parsed.project_due_date {
            active.project_due_date = Set(Some(scheduled.due.raw.clone()));
            set("project_due_date");
        }
        if let Some(priority) = parsed.priority {
            active.priority = Set(Some(priority));
            set("priority");
        }
        if let Some(comment) = &parsed.project_comment {
            active.project_comment = Set(Some(comment.clone()));
            set("project_comment");
        }
        if touched || !uploaded.is_empty() {
            active.updated_at = Set(gateway::now());
            active.update(&txn).await?;
        }

        txn.commit().await?;
        Ok(outcome)
    }

    async fn fire_side_effects(
        &self,
        principal: &AuthenticatedPrincipal,
        task: &tasks::Model,
        parsed: &ParsedChangeset,
        uploaded: &[(FileKind, StoredObject)],
        outcome: &mut TaskUpdateOutcome,
    ) -> TaskboardResult<()> {
        let name = task.name_task.as_str();
        let sender = principal.email.as_str();

        if let Some(new_name) = &parsed.name_task {
            let mail = Mail {
                audience: Audience::Everyone,
                subject: "Task Name Updated",
                body: templates::task_update(
                    "Name task Update",
                    new_name,
                    "Name Updated",
                    &format!("The name of the task has been updated to '{new_name}'."),
                ),
                log_line: NAME_LOG,
            };
            if let Err(err) = self.send(task, sender, mail, outcome).await {
                warn!(error = %err, task_id = task.id, "name change notification failed");
            }
        }

        if let Some((_, stored)) = find_upload(uploaded, FileKind::PlanningDescription) {
            let mail = Mail {
                audience: Audience::Everyone,
                subject: "Planning Description File Updated",
                body: file_body("Planning Description File Update", "planning description", name, stored),
                log_line: PLANNING_DESCRIPTION_FILE_LOG,
            };
            self.send(task, sender, mail, outcome).await?;
        }

        if let Some(status) = parsed.planning_status {
            let (subject, message) = planning_status_mail(status);
            let mail = Mail {
                audience: Audience::Everyone,
                subject,
                body: templates::task_update("Planning Status Update", name, status.label(), message),
                log_line: PLANNING_STATUS_LOG,
            };
            self.send(task, sender, mail, outcome).await?;
        }

        if let Some(status) = parsed.project_status {
            let (subject, message) = project_status_mail(status);
            let mail = Mail {
                audience: Audience::Everyone,
                subject,
                body: templates::task_update("Project Status Update", name, status.label(), message),
                log_line: PROJECT_STATUS_LOG,
            };
            self.send(task, sender, mail, outcome).await?;
        }

        if let Some(scheduled) = &parsed.planning_due_date {
            self.schedule(task, sender, scheduled, Audience::Managers, PLANNING_DUE_DATE_LOG, outcome)
                .await?;
        }
        if let Some(scheduled) = &parsed.project_due_date {
            self.schedule(task, sender, scheduled, Audience::Employees, PROJECT_DUE_DATE_LOG, outcome)
                .await?;
        }

        if let Some(comment) = &parsed.project_comment {
            let mail = Mail {
                audience: Audience::Owner,
                subject: "New Project Comment Added",
                body: templates::task_update(
                    "Project Comment Update",
                    name,
                    "New Comment",
                    &format!("A new comment has been added to the project:\n\n'{comment}'"),
                ),
                log_line: PROJECT_COMMENT_LOG,
            };
            self.send(task, sender, mail, outcome).await?;
        }

        if let Some((_, stored)) = find_upload(uploaded, FileKind::Planning) {
            let mail = Mail {
                audience: Audience::Everyone,
                subject: "Planning File Updated",
                body: file_body("Planning File Update", "planning", name, stored),
                log_line: PLANNING_FILE_LOG,
            };
            self.send(task, sender, mail, outcome).await?;
        }

        if let Some((_, stored)) = find_upload(uploaded, FileKind::Project) {
            let mail = Mail {
                audience: Audience::Everyone,
                subject: "Project File Updated",
                body: file_body("Project File Update", "project", name, stored),
                log_line: PROJECT_FILE_LOG,
            };
            self.send(task, sender, mail, outcome).await?;
        }
        Ok(())
    }

    /// Mails the audience; an empty audience sends nothing and logs nothing.
    async fn send(
        &self,
        task: &tasks::Model,
        sender: &str,
        mail: Mail<'_>,
        outcome: &mut TaskUpdateOutcome,
    ) -> TaskboardResult<()> {
        let to = recipients(&self.db, task, mail.audience, sender).await?;
        if to.is_empty() {
            debug!(task_id = task.id, subject = mail.subject, "no recipients, email skipped");
            return Ok(());
        }
        self.mailer.send(&to, mail.subject, &mail.body).await?;
        info!(task_id = task.id, recipients = to.len(), "{}", mail.log_line);
        outcome.emails_sent.push(mail.log_line.to_string());
        Ok(())
    }

    /// Creates the calendar event, then mails the invite to the attendees.
    async fn schedule(
        &self,
        task: &tasks::Model,
        sender: &str,
        scheduled: &ScheduledDue,
        audience: Audience,
        log_line: &'static str,
        outcome: &mut TaskUpdateOutcome,
    ) -> TaskboardResult<()> {
        let attendees = recipients(&self.db, task, audience, sender).await?;
        let calendar_sender = if self.settings.calendar_sender.is_empty() {
            sender.to_string()
        } else {
            self.settings.calendar_sender.clone()
        };
        let event = CalendarEvent {
            sender: calendar_sender,
            summary: format!("Task: {}", task.name_task),
            description: task.planning_description.clone().unwrap_or_default(),
            start: scheduled.start.clone(),
            end: scheduled.end.clone(),
            time_zone: CALENDAR_TIME_ZONE.name().to_string(),
            attendees,
        };
        let link = self.calendar.create_event(&event).await?;
        outcome.calendar_events.push(link);

        let subject = format!("Calendar Invite: {}", event.summary);
        let mail = Mail {
            audience,
            subject: &subject,
            body: templates::calendar_invite(&event.summary, &event.description),
            log_line,
        };
        self.send(task, sender, mail, outcome).await
    }
}

fn find_upload(
    uploaded: &[(FileKind, StoredObject)],
    kind: FileKind,
) -> Option<&(FileKind, StoredObject)> {
    uploaded.iter().find(|(candidate, _)| *candidate == kind)
}

fn file_body(title: &str, noun: &str, task_name: &str, stored: &StoredObject) -> String {
    templates::task_update(
        title,
        task_name,
        "File Updated",
        &format!(
            "A {noun} file has been updated:\nFile Name: {}\nFile URL: {}",
            stored.name, stored.url
        ),
    )
}

/// Re-points a member found by its old email at the user owning the new one.
async fn correct_member_email<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    change: &EmailChange,
    role: InvitationRole,
) -> TaskboardResult<()> {
    let member = gateway::members::find_by_email(conn, task_id, &change.old, role)
        .await?
        .ok_or_else(|| {
            TaskboardError::not_found(format!(
                "No {} with email {} on this task",
                role.as_str(),
                change.old
            ))
        })?;
    let user = resolve_user(conn, &change.new).await?;
    if user.id != member.user_id {
        ensure_not_assigned(conn, task_id, user.id).await?;
    }
    if let Some(invitation_id) = member.invitation_id {
        // A pending invitation follows the member row to its new user.
        let invitation = gateway::invitations::find(conn, invitation_id).await?;
        if let Some(invitation) = invitation.filter(|inv| inv.status == InvitationStatus::Pending) {
            if invitation.user_id != user.id {
                if gateway::invitations::pending_exists(conn, task_id, user.id, role).await? {
                    return Err(TaskboardError::conflict(ALREADY_INVITED));
                }
                gateway::invitations::reassign(conn, invitation, user.id).await?;
            }
        }
    }
    gateway::members::repoint(conn, member.id, role, &user).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use platform_storage::UploadFile;

    use super::*;
    use crate::changeset::CustomRole;

    #[test]
    fn roles_are_checked_in_a_fixed_order() {
        let parsed = ParsedChangeset {
            project_comment: Some("looks good".into()),
            name_task: Some("Design".into()),
            owner_custom_role: Some("Lead".into()),
            employees: vec!["e@example.com".into()],
            files: vec![(FileKind::Project, UploadFile::new("p.pdf", vec![]))],
            employee_custom_role: Some(CustomRole {
                email: "e@example.com".into(),
                role: "QA".into(),
            }),
            ..Default::default()
        };
        let order: Vec<_> = required_roles(&parsed);
        assert_eq!(
            order,
            vec![
                ("owner_custom_role", TaskRole::Owner),
                ("employee", TaskRole::Manager),
                ("employee_custom_role", TaskRole::Manager),
                ("project_file", TaskRole::Employee),
                ("name_task", TaskRole::Owner),
                ("project_comment", TaskRole::Employee),
            ]
        );
    }

    #[test]
    fn status_mails_use_distinct_subjects() {
        assert_eq!(planning_status_mail(PlanningStatus::NotApproved).0, "Task Planning Not Approved");
        assert_eq!(project_status_mail(ProjectStatus::Working).0, "Task Project in Progress");
        assert_eq!(project_status_mail(ProjectStatus::Undone).0, "Task Project Undone");
    }
}
