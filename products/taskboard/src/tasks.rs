use entity::InvitationRole;
use platform_authn::AuthenticatedPrincipal;
use sea_orm::TransactionTrait;
use tracing::info;

use crate::{
    Taskboard,
    error::{TaskboardError, TaskboardResult},
    gateway::{self, FileKind},
    views::{self, MemberView, TaskCreated, TaskFileView, TaskOwnerView, TaskView},
};

impl Taskboard {
    /// Creates the task and its owner row in one transaction.
    pub async fn create_task(
        &self,
        principal: &AuthenticatedPrincipal,
        board_id: i32,
        name_task: &str,
    ) -> TaskboardResult<TaskCreated> {
        let name = name_task.trim();
        if name.is_empty() {
            return Err(TaskboardError::validation("name_task is required"));
        }
        let txn = self.db.begin().await?;
        gateway::boards::find_board(&txn, board_id)
            .await?
            .ok_or_else(|| TaskboardError::not_found("Board not found"))?;
        let creator = gateway::users::find_user(&txn, principal.user_id)
            .await?
            .ok_or_else(|| TaskboardError::Unauthorized("Unknown user".into()))?;
        let (task, owner) = gateway::tasks::insert_with_owner(&txn, board_id, name, &creator).await?;
        txn.commit().await?;
        info!(task_id = task.id, board_id, "task created");
        Ok(TaskCreated {
            board_id,
            task_id: task.id,
            name_task: task.name_task,
            owner_id: owner.id,
            user_email: creator.email,
            user_id: creator.id,
        })
    }

    pub async fn get_task(&self, id: i32) -> TaskboardResult<TaskView> {
        let task = gateway::tasks::find_task(&self.db, id)
            .await?
            .ok_or_else(|| TaskboardError::not_found("Task not found"))?;
        Ok(views::task_view(&self.db, task).await?)
    }

    pub async fn list_tasks(&self) -> TaskboardResult<Vec<TaskView>> {
        let mut out = Vec::new();
        for task in gateway::tasks::list_tasks(&self.db).await? {
            out.push(views::task_view(&self.db, task).await?);
        }
        Ok(out)
    }

    pub async fn list_task_owners(&self) -> TaskboardResult<Vec<TaskOwnerView>> {
        Ok(gateway::tasks::list_owners(&self.db)
            .await?
            .into_iter()
            .map(|(task, owner)| TaskOwnerView {
                task_id: task.id,
                name_task: task.name_task,
                owner: owner.map(Into::into),
            })
            .collect())
    }

    pub async fn list_task_members(&self, role: InvitationRole) -> TaskboardResult<Vec<MemberView>> {
        let statuses = gateway::invitations::all_statuses(&self.db).await?;
        let rows = gateway::members::list_all(&self.db, role).await?;
        Ok(views::member_views(rows, &statuses))
    }

    pub async fn list_task_files(&self, kind: FileKind) -> TaskboardResult<Vec<TaskFileView>> {
        Ok(gateway::files::list_all(&self.db, kind)
            .await?
            .into_iter()
            .map(|(task_id, file)| TaskFileView { task_id, file })
            .collect())
    }
}
