//! Invitation lifecycle. Adding a member only creates a pending invitation
//! and an inactive member row; accepting it inserts the link row that grants
//! the role.

use entity::{InvitationRole, InvitationStatus, users};
use platform_authn::AuthenticatedPrincipal;
use platform_authz::{is_active_employee, is_active_manager};
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::Deserialize;
use tracing::info;

use crate::{
    Taskboard,
    error::{TaskboardError, TaskboardResult},
    gateway,
    views::InvitationView,
};

pub const ALREADY_INVITED: &str = "Invitation already sent to this user";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationResponse {
    Accept,
    Reject,
}

impl InvitationResponse {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "accept" => Some(Self::Accept),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

fn assigned_message(role: InvitationRole) -> String {
    format!("User is already assigned as {} to a task", role.as_str())
}

/// Fails with a conflict when the user already holds either active role on
/// the task.
pub(crate) async fn ensure_not_assigned<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    user_id: i32,
) -> TaskboardResult<()> {
    if is_active_manager(conn, task_id, user_id).await? {
        return Err(TaskboardError::Conflict(assigned_message(InvitationRole::Manager)));
    }
    if is_active_employee(conn, task_id, user_id).await? {
        return Err(TaskboardError::Conflict(assigned_message(InvitationRole::Employee)));
    }
    Ok(())
}

pub(crate) async fn resolve_user<C: ConnectionTrait>(conn: &C, email: &str) -> TaskboardResult<users::Model> {
    gateway::users::find_user_by_email(conn, email)
        .await?
        .ok_or_else(|| TaskboardError::not_found(format!("User with email {email} not found")))
}

/// Creates the pending invitation plus its inactive member row.
pub(crate) async fn invite<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    email: &str,
    role: InvitationRole,
) -> TaskboardResult<InvitationView> {
    let user = resolve_user(conn, email).await?;
    ensure_not_assigned(conn, task_id, user.id).await?;
    if gateway::invitations::pending_exists(conn, task_id, user.id, role).await? {
        return Err(TaskboardError::conflict(ALREADY_INVITED));
    }
    let invitation = gateway::invitations::insert_pending(conn, task_id, user.id, role).await?;
    gateway::members::insert(conn, task_id, &user, role, Some(invitation.id)).await?;
    info!(task_id, invitation_id = invitation.id, role = role.as_str(), "invitation created");
    Ok(InvitationView::new(invitation, Some(user.email)))
}

impl Taskboard {
    pub async fn respond_to_invitation(
        &self,
        principal: &AuthenticatedPrincipal,
        invitation_id: i32,
        response: &str,
        role: &str,
    ) -> TaskboardResult<InvitationView> {
        let response = InvitationResponse::parse(response)
            .ok_or_else(|| TaskboardError::validation("response must be accept or reject"))?;
        let role = InvitationRole::parse(role)
            .ok_or_else(|| TaskboardError::validation("role must be manager or employee"))?;

        let txn = self.db.begin().await?;
        let invitation = gateway::invitations::find(&txn, invitation_id)
            .await?
            .ok_or_else(|| TaskboardError::not_found("Invitation not found"))?;
        if invitation.user_id != principal.user_id {
            return Err(TaskboardError::forbidden(
                "Only the invited user can respond to this invitation",
            ));
        }
        if invitation.role != role {
            return Err(TaskboardError::validation(format!(
                "Invitation is for the {} role",
                invitation.role.as_str()
            )));
        }
        if invitation.status.is_terminal() {
            return Err(TaskboardError::Conflict(format!(
                "Invitation already {}",
                invitation.status.as_str()
            )));
        }
        let member = gateway::members::find_by_invitation(&txn, invitation.id, role)
            .await?
            .ok_or_else(|| TaskboardError::not_found("Invited member no longer exists"))?;

        let task_id = invitation.task_id;
        let updated = match response {
            InvitationResponse::Accept => {
                if member.user_id != invitation.user_id {
                    return Err(TaskboardError::conflict(
                        "Invitation no longer matches its member",
                    ));
                }
                ensure_not_assigned(&txn, task_id, member.user_id).await?;
                let updated =
                    gateway::invitations::set_status(&txn, invitation, InvitationStatus::Accepted)
                        .await?;
                gateway::members::activate(&txn, task_id, member.id, role).await?;
                updated
            }
            InvitationResponse::Reject => {
                let updated =
                    gateway::invitations::set_status(&txn, invitation, InvitationStatus::Rejected)
                        .await?;
                gateway::members::remove(&txn, member.id, role).await?;
                updated
            }
        };
        let user_email = gateway::users::find_user(&txn, updated.user_id)
            .await?
            .map(|user| user.email);
        txn.commit().await?;
        info!(
            invitation_id,
            task_id,
            status = updated.status.as_str(),
            "invitation answered"
        );
        Ok(InvitationView::new(updated, user_email))
    }

    pub async fn list_invitations(&self) -> TaskboardResult<Vec<InvitationView>> {
        Ok(gateway::invitations::list_with_email(&self.db)
            .await?
            .into_iter()
            .map(|(invitation, user)| InvitationView::new(invitation, user.map(|user| user.email)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responses_parse_case_insensitively() {
        assert_eq!(InvitationResponse::parse("Accept"), Some(InvitationResponse::Accept));
        assert_eq!(InvitationResponse::parse(" reject "), Some(InvitationResponse::Reject));
        assert_eq!(InvitationResponse::parse("maybe"), None);
    }
}
