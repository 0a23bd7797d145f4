//! Deletion workflows. Rows go in one transaction; stored objects are removed
//! only after it commits.

use entity::InvitationRole;
use platform_authn::AuthenticatedPrincipal;
use platform_authz::TaskRole;
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::Serialize;
use tracing::info;

use crate::{
    Taskboard,
    error::{TaskboardError, TaskboardResult},
    gateway::{self, FileKind, TaskPurge},
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BoardDeletion {
    pub tasks: u64,
    pub invitations: u64,
    pub managers: u64,
    pub employees: u64,
    pub planning_files: u64,
    pub project_files: u64,
    pub planning_description_files: u64,
}

impl BoardDeletion {
    fn absorb(&mut self, purge: &TaskPurge) {
        self.tasks += 1;
        self.invitations += purge.invitations;
        self.managers += purge.managers;
        self.employees += purge.employees;
        self.planning_files += purge.planning_files;
        self.project_files += purge.project_files;
        self.planning_description_files += purge.planning_description_files;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ManagerDeletion {
    pub employees_removed: u64,
    pub planning_files_removed: u64,
    pub project_files_removed: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EmployeeDeletion {
    pub project_files_removed: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileDeletion {
    pub file_id: i32,
    pub file_name: String,
}

/// Drops a member row. A member that never accepted takes its pending
/// invitation with it. Returns whether the member was active.
async fn drop_member<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    member_id: i32,
    role: InvitationRole,
) -> TaskboardResult<bool> {
    let member = gateway::members::find(conn, task_id, member_id, role)
        .await?
        .ok_or_else(|| {
            TaskboardError::not_found(format!("{} not found on this task", capitalized(role)))
        })?;
    gateway::members::remove(conn, member.id, role).await?;
    if !member.active {
        if let Some(invitation_id) = member.invitation_id {
            gateway::invitations::delete_one(conn, invitation_id).await?;
        }
    }
    Ok(member.active)
}

fn capitalized(role: InvitationRole) -> &'static str {
    match role {
        InvitationRole::Manager => "Manager",
        InvitationRole::Employee => "Employee",
    }
}

impl Taskboard {
    /// Removes a board with every task on it. Creator only.
    pub async fn delete_board(
        &self,
        principal: &AuthenticatedPrincipal,
        board_id: i32,
    ) -> TaskboardResult<BoardDeletion> {
        let board = gateway::boards::find_board(&self.db, board_id)
            .await?
            .ok_or_else(|| TaskboardError::not_found("Board not found"))?;
        if board.user_id != principal.user_id {
            return Err(TaskboardError::forbidden(
                "Only the board creator can delete this board",
            ));
        }

        let txn = self.db.begin().await?;
        let mut report = BoardDeletion::default();
        let mut object_names = Vec::new();
        for task in gateway::boards::tasks_of_board(&txn, board.id).await? {
            let purge = gateway::tasks::purge(&txn, &task).await?;
            report.absorb(&purge);
            object_names.extend(purge.object_names);
        }
        gateway::boards::delete_board(&txn, board.id).await?;
        txn.commit().await?;

        self.delete_objects(&object_names).await?;
        info!(board_id, tasks = report.tasks, "board deleted");
        Ok(report)
    }

    /// Removes a task and only the objects its own files reference.
    pub async fn delete_task(
        &self,
        principal: &AuthenticatedPrincipal,
        task_id: i32,
    ) -> TaskboardResult<TaskPurge> {
        self.validator
            .require_role(&self.db, task_id, principal.user_id, TaskRole::Owner)
            .await?;
        let txn = self.db.begin().await?;
        let task = gateway::tasks::find_task(&txn, task_id)
            .await?
            .ok_or_else(|| TaskboardError::not_found("Task not found"))?;
        let purge = gateway::tasks::purge(&txn, &task).await?;
        txn.commit().await?;

        self.delete_objects(&purge.object_names).await?;
        info!(task_id, objects = purge.object_names.len(), "task deleted");
        Ok(purge)
    }

    /// Removing the last active manager also clears the employees and the
    /// planning and project files, since nobody is left to direct them.
    pub async fn delete_manager(
        &self,
        principal: &AuthenticatedPrincipal,
        task_id: i32,
        manager_id: i32,
    ) -> TaskboardResult<ManagerDeletion> {
        self.validator
            .require_role(&self.db, task_id, principal.user_id, TaskRole::Owner)
            .await?;
        let txn = self.db.begin().await?;
        let was_active = drop_member(&txn, task_id, manager_id, InvitationRole::Manager).await?;
        let mut report = ManagerDeletion::default();
        let mut object_names = Vec::new();
        if was_active
            && gateway::members::count_active(&txn, task_id, InvitationRole::Manager).await? == 0
        {
            report.employees_removed =
                gateway::members::purge_for_task(&txn, task_id, InvitationRole::Employee).await?;
            gateway::invitations::delete_pending_for_role(&txn, task_id, InvitationRole::Employee)
                .await?;
            let planning = gateway::files::purge_for_task(&txn, task_id, FileKind::Planning).await?;
            let project = gateway::files::purge_for_task(&txn, task_id, FileKind::Project).await?;
            report.planning_files_removed = planning.len() as u64;
            report.project_files_removed = project.len() as u64;
            object_names.extend(planning);
            object_names.extend(project);
        }
        txn.commit().await?;

        self.delete_objects(&object_names).await?;
        info!(task_id, manager_id, ?report, "manager removed");
        Ok(report)
    }

    pub async fn delete_employee(
        &self,
        principal: &AuthenticatedPrincipal,
        task_id: i32,
        employee_id: i32,
    ) -> TaskboardResult<EmployeeDeletion> {
        self.validator
            .require_role(&self.db, task_id, principal.user_id, TaskRole::Manager)
            .await?;
        let txn = self.db.begin().await?;
        let was_active = drop_member(&txn, task_id, employee_id, InvitationRole::Employee).await?;
        let mut report = EmployeeDeletion::default();
        let mut object_names = Vec::new();
        if was_active
            && gateway::members::count_active(&txn, task_id, InvitationRole::Employee).await? == 0
        {
            object_names = gateway::files::purge_for_task(&txn, task_id, FileKind::Project).await?;
            report.project_files_removed = object_names.len() as u64;
        }
        txn.commit().await?;

        self.delete_objects(&object_names).await?;
        info!(task_id, employee_id, ?report, "employee removed");
        Ok(report)
    }

    pub async fn delete_planning_file(
        &self,
        principal: &AuthenticatedPrincipal,
        task_id: i32,
        file_id: i32,
    ) -> TaskboardResult<FileDeletion> {
        self.validator
            .require_role(&self.db, task_id, principal.user_id, TaskRole::Manager)
            .await?;
        self.delete_file(task_id, file_id, FileKind::Planning).await
    }

    pub async fn delete_project_file(
        &self,
        principal: &AuthenticatedPrincipal,
        task_id: i32,
        file_id: i32,
    ) -> TaskboardResult<FileDeletion> {
        self.validator
            .require_role(&self.db, task_id, principal.user_id, TaskRole::Employee)
            .await?;
        self.delete_file(task_id, file_id, FileKind::Project).await
    }

    async fn delete_file(
        &self,
        task_id: i32,
        file_id: i32,
        kind: FileKind,
    ) -> TaskboardResult<FileDeletion> {
        let txn = self.db.begin().await?;
        let file_name = gateway::files::detach(&txn, task_id, file_id, kind)
            .await?
            .ok_or_else(|| TaskboardError::not_found(format!("{} {file_id} not found on this task", kind.label())))?;
        txn.commit().await?;

        self.storage.delete(&file_name).await?;
        info!(task_id, file_id, file_name = %file_name, "{} deleted", kind.label());
        Ok(FileDeletion { file_id, file_name })
    }

    async fn delete_objects(&self, names: &[String]) -> TaskboardResult<()> {
        for name in names {
            self.storage.delete(name).await?;
        }
        Ok(())
    }
}
