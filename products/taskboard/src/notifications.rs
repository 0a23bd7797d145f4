use entity::{InvitationRole, tasks};
use sea_orm::{ConnectionTrait, DbErr};

use crate::gateway;

/// Who hears about a change on a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Audience {
    Everyone,
    Owner,
    Managers,
    Employees,
}

/// Resolves an audience to addresses, deduplicated and without the sender.
pub(crate) async fn recipients<C: ConnectionTrait>(
    conn: &C,
    task: &tasks::Model,
    audience: Audience,
    sender: &str,
) -> Result<Vec<String>, DbErr> {
    let mut emails = Vec::new();
    if matches!(audience, Audience::Everyone | Audience::Owner) {
        if let Some(owner) = gateway::tasks::find_owner(conn, task).await? {
            emails.push(owner.email);
        }
    }
    if matches!(audience, Audience::Everyone | Audience::Managers) {
        emails.extend(gateway::members::active_emails(conn, task.id, InvitationRole::Manager).await?);
    }
    if matches!(audience, Audience::Everyone | Audience::Employees) {
        emails.extend(gateway::members::active_emails(conn, task.id, InvitationRole::Employee).await?);
    }
    let mut out: Vec<String> = Vec::with_capacity(emails.len());
    for email in emails {
        if !email.eq_ignore_ascii_case(sender) && !out.contains(&email) {
            out.push(email);
        }
    }
    Ok(out)
}
