//! Sparse task changeset as received from the form, and its parsed form.

use chrono::{DateTime, Utc};
use entity::{PlanningStatus, Priority, ProjectStatus};
use platform_authn::{is_valid_email, normalize_email};
use platform_storage::UploadFile;

use crate::{
    due_date::DueDate,
    error::{TaskboardError, TaskboardResult},
    gateway::FileKind,
};

/// Raw field values. Blank strings count as absent.
#[derive(Clone, Debug, Default)]
pub struct TaskChangeset {
    pub name_task: Option<String>,
    pub planning_description: Option<String>,
    pub planning_description_percent: Option<String>,
    pub planning_status: Option<String>,
    pub project_status: Option<String>,
    pub planning_due_date: Option<String>,
    pub project_due_date: Option<String>,
    pub priority: Option<String>,
    pub project_comment: Option<String>,
    pub planning_description_file: Option<UploadFile>,
    pub planning_file: Option<UploadFile>,
    pub project_file: Option<UploadFile>,
    /// Comma-separated emails to invite as managers.
    pub manager: Option<String>,
    /// Comma-separated emails to invite as employees.
    pub employee: Option<String>,
    pub old_manager_email: Option<String>,
    pub new_manager_email: Option<String>,
    pub old_employee_email: Option<String>,
    pub new_employee_email: Option<String>,
    pub manager_custom_role: Option<String>,
    pub manager_email: Option<String>,
    pub employee_custom_role: Option<String>,
    pub employee_email: Option<String>,
    pub owner_custom_role: Option<String>,
}

impl TaskChangeset {
    /// Assigns a text field by its form name. Returns `false` for unknown names.
    pub fn set_text(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "name_task" => &mut self.name_task,
            "planning_description" => &mut self.planning_description,
            "planning_description_percent" => &mut self.planning_description_percent,
            "planning_status" => &mut self.planning_status,
            "project_status" => &mut self.project_status,
            "planning_due_date" => &mut self.planning_due_date,
            "project_due_date" => &mut self.project_due_date,
            "priority" => &mut self.priority,
            "project_comment" => &mut self.project_comment,
            "manager" => &mut self.manager,
            "employee" => &mut self.employee,
            "old_manager_email" => &mut self.old_manager_email,
            "new_manager_email" => &mut self.new_manager_email,
            "old_employee_email" => &mut self.old_employee_email,
            "new_employee_email" => &mut self.new_employee_email,
            "manager_custom_role" => &mut self.manager_custom_role,
            "manager_email" => &mut self.manager_email,
            "employee_custom_role" => &mut self.employee_custom_role,
            "employee_email" => &mut self.employee_email,
            "owner_custom_role" => &mut self.owner_custom_role,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Assigns a file field by its form name. Returns `false` for unknown names.
    pub fn set_file(&mut self, name: &str, file: UploadFile) -> bool {
        let slot = match name {
            "planning_description_file" => &mut self.planning_description_file,
            "planning_file" => &mut self.planning_file,
            "project_file" => &mut self.project_file,
            _ => return false,
        };
        *slot = Some(file);
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailChange {
    pub old: String,
    pub new: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomRole {
    pub email: String,
    pub role: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledDue {
    pub due: DueDate,
    pub start: String,
    pub end: String,
}

/// A changeset whose values have all been checked; nothing here can fail to
/// apply for syntactic reasons.
#[derive(Clone, Debug, Default)]
pub struct ParsedChangeset {
    pub name_task: Option<String>,
    pub planning_description: Option<String>,
    pub planning_description_percent: Option<String>,
    pub planning_status: Option<PlanningStatus>,
    pub project_status: Option<ProjectStatus>,
    pub planning_due_date: Option<ScheduledDue>,
    pub project_due_date: Option<ScheduledDue>,
    pub priority: Option<Priority>,
    pub project_comment: Option<String>,
    pub files: Vec<(FileKind, UploadFile)>,
    pub managers: Vec<String>,
    pub employees: Vec<String>,
    pub manager_email_change: Option<EmailChange>,
    pub employee_email_change: Option<EmailChange>,
    pub manager_custom_role: Option<CustomRole>,
    pub employee_custom_role: Option<CustomRole>,
    pub owner_custom_role: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn email(field: &str, value: &str) -> TaskboardResult<String> {
    let email = normalize_email(value);
    if !is_valid_email(&email) {
        return Err(TaskboardError::validation(format!("{field} has an invalid email: {value}")));
    }
    Ok(email)
}

fn email_list(field: &str, value: Option<String>) -> TaskboardResult<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    let Some(value) = present(value) else {
        return Ok(out);
    };
    for part in value.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let parsed = email(field, part)?;
        if !out.contains(&parsed) {
            out.push(parsed);
        }
    }
    Ok(out)
}

fn email_change(
    old_field: &str,
    new_field: &str,
    old: Option<String>,
    new: Option<String>,
) -> TaskboardResult<Option<EmailChange>> {
    match (present(old), present(new)) {
        (None, None) => Ok(None),
        (Some(old), Some(new)) => Ok(Some(EmailChange {
            old: email(old_field, &old)?,
            new: email(new_field, &new)?,
        })),
        (Some(_), None) => Err(TaskboardError::validation(format!(
            "{new_field} is required with {old_field}"
        ))),
        (None, Some(_)) => Err(TaskboardError::validation(format!(
            "{old_field} is required with {new_field}"
        ))),
    }
}

fn custom_role(
    role_field: &str,
    email_field: &str,
    role: Option<String>,
    target: Option<String>,
) -> TaskboardResult<Option<CustomRole>> {
    match (present(role), present(target)) {
        (None, None) => Ok(None),
        (Some(role), Some(target)) => Ok(Some(CustomRole {
            email: email(email_field, &target)?,
            role,
        })),
        (Some(_), None) => Err(TaskboardError::validation(format!(
            "{email_field} is required with {role_field}"
        ))),
        (None, Some(_)) => Err(TaskboardError::validation(format!(
            "{role_field} is required with {email_field}"
        ))),
    }
}

fn scheduled(field: &str, value: Option<String>, now: DateTime<Utc>) -> TaskboardResult<Option<ScheduledDue>> {
    let Some(value) = present(value) else {
        return Ok(None);
    };
    let due = DueDate::parse(field, &value)?;
    let (start, end) = due.event_window(field, now)?;
    Ok(Some(ScheduledDue { due, start, end }))
}

fn enumerated<T>(field: &str, value: Option<String>, parse: fn(&str) -> Option<T>) -> TaskboardResult<Option<T>> {
    match present(value) {
        None => Ok(None),
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| TaskboardError::validation(format!("Invalid {field}: {raw}"))),
    }
}

impl TaskChangeset {
    /// Checks every value up front. `now` anchors the due-date windows.
    pub fn parse(self, now: DateTime<Utc>) -> TaskboardResult<ParsedChangeset> {
        let mut files = Vec::new();
        for (kind, file) in [
            (FileKind::PlanningDescription, self.planning_description_file),
            (FileKind::Planning, self.planning_file),
            (FileKind::Project, self.project_file),
        ] {
            if let Some(file) = file {
                if file.file_name.trim().is_empty() {
                    return Err(TaskboardError::validation(format!(
                        "{} must have a file name",
                        kind.label()
                    )));
                }
                files.push((kind, file));
            }
        }

        let parsed = ParsedChangeset {
            name_task: present(self.name_task),
            planning_description: present(self.planning_description),
            planning_description_percent: present(self.planning_description_percent),
            planning_status: enumerated("planning_status", self.planning_status, PlanningStatus::parse)?,
            project_status: enumerated("project_status", self.project_status, ProjectStatus::parse)?,
            planning_due_date: scheduled("planning_due_date", self.planning_due_date, now)?,
            project_due_date: scheduled("project_due_date", self.project_due_date, now)?,
            priority: enumerated("priority", self.priority, Priority::parse)?,
            project_comment: present(self.project_comment),
            files,
            managers: email_list("manager", self.manager)?,
            employees: email_list("employee", self.employee)?,
            manager_email_change: email_change(
                "old_manager_email",
                "new_manager_email",
                self.old_manager_email,
                self.new_manager_email,
            )?,
            employee_email_change: email_change(
                "old_employee_email",
                "new_employee_email",
                self.old_employee_email,
                self.new_employee_email,
            )?,
            manager_custom_role: custom_role(
                "manager_custom_role",
                "manager_email",
                self.manager_custom_role,
                self.manager_email,
            )?,
            employee_custom_role: custom_role(
                "employee_custom_role",
                "employee_email",
                self.employee_custom_role,
                self.employee_email,
            )?,
            owner_custom_role: present(self.owner_custom_role),
        };
        if parsed.is_empty() {
            return Err(TaskboardError::validation("No fields to update"));
        }
        Ok(parsed)
    }
}

impl ParsedChangeset {
    pub fn is_empty(&self) -> bool {
        self.name_task.is_none()
            && self.planning_description.is_none()
            && self.planning_description_percent.is_none()
            && self.planning_status.is_none()
            && self.project_status.is_none()
            && self.planning_due_date.is_none()
            && self.project_due_date.is_none()
            && self.priority.is_none()
            && self.project_comment.is_none()
            && self.files.is_empty()
            && self.managers.is_empty()
            && self.employees.is_empty()
            && self.manager_email_change.is_none()
            && self.employee_email_change.is_none()
            && self.manager_custom_role.is_none()
            && self.employee_custom_role.is_none()
            && self.owner_custom_role.is_none()
    }

    pub fn file(&self, kind: FileKind) -> Option<&UploadFile> {
        self.files
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map(|(_, file)| file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(changeset: TaskChangeset) -> TaskboardResult<ParsedChangeset> {
        changeset.parse(Utc::now())
    }

    #[test]
    fn blank_changeset_is_rejected() {
        let changeset = TaskChangeset {
            name_task: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(parse(changeset), Err(TaskboardError::Validation(_))));
    }

    #[test]
    fn statuses_accept_display_forms() {
        let parsed = parse(TaskChangeset {
            planning_status: Some("Not Approved".into()),
            project_status: Some("working".into()),
            priority: Some("HIGH".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(parsed.planning_status, Some(PlanningStatus::NotApproved));
        assert_eq!(parsed.project_status, Some(ProjectStatus::Working));
        assert_eq!(parsed.priority, Some(Priority::High));
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = parse(TaskChangeset {
            planning_status: Some("maybe".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, TaskboardError::Validation(msg) if msg.contains("planning_status")));
    }

    #[test]
    fn email_corrections_need_both_sides() {
        let err = parse(TaskChangeset {
            new_manager_email: Some("b@example.com".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, TaskboardError::Validation(msg) if msg.contains("old_manager_email")));

        let err = parse(TaskChangeset {
            employee_custom_role: Some("QA".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, TaskboardError::Validation(msg) if msg.contains("employee_email")));
    }

    #[test]
    fn member_lists_are_split_normalised_and_deduplicated() {
        let parsed = parse(TaskChangeset {
            manager: Some("A@example.com, b@example.com,,a@example.com".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(parsed.managers, vec!["a@example.com", "b@example.com"]);

        assert!(parse(TaskChangeset {
            employee: Some("not-an-email".into()),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn due_dates_are_scheduled_in_jakarta() {
        let parsed = parse(TaskChangeset {
            project_due_date: Some("31-12-2099".into()),
            ..Default::default()
        })
        .unwrap();
        let scheduled = parsed.project_due_date.unwrap();
        assert_eq!(scheduled.due.raw, "31-12-2099");
        assert_eq!(scheduled.end, "2099-12-31T00:00:00+07:00");
    }

    #[test]
    fn form_fields_map_by_name() {
        let mut changeset = TaskChangeset::default();
        assert!(changeset.set_text("owner_custom_role", "Lead".into()));
        assert!(!changeset.set_text("unknown", "x".into()));
        assert!(changeset.set_file("planning_file", UploadFile::new("plan.pdf", vec![1])));
        let parsed = parse(changeset).unwrap();
        assert_eq!(parsed.owner_custom_role.as_deref(), Some("Lead"));
        assert!(parsed.file(FileKind::Planning).is_some());
    }
}
