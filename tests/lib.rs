//! Fixtures shared by the integration tests.

use entity::InvitationRole;
use platform_authn::AuthenticatedPrincipal;
use platform_storage::UploadFile;
use products_taskboard::{TaskChangeset, TaskUpdateOutcome, testing::Harness};

pub use products_taskboard::testing;

/// A board with one task, created by `owner`.
pub struct Fixture {
    pub harness: Harness,
    pub owner: AuthenticatedPrincipal,
    pub board_id: i32,
    pub task_id: i32,
}

impl Fixture {
    pub async fn new() -> Self {
        let harness = Harness::new().await.expect("migrated sqlite");
        let owner = harness.user("owner@example.com").await;
        let board = harness
            .taskboard
            .create_board(&owner, "Sprint 1")
            .await
            .expect("board");
        let task = harness
            .taskboard
            .create_task(&owner, board.id, "Design")
            .await
            .expect("task");
        Self {
            harness,
            owner,
            board_id: board.id,
            task_id: task.task_id,
        }
    }

    pub async fn update(
        &self,
        principal: &AuthenticatedPrincipal,
        changeset: TaskChangeset,
    ) -> products_taskboard::TaskboardResult<TaskUpdateOutcome> {
        self.harness
            .taskboard
            .update_task(principal, self.board_id, self.task_id, changeset)
            .await
    }

    /// Invites `email` through `inviter` and returns the invitation id.
    pub async fn invite(
        &self,
        inviter: &AuthenticatedPrincipal,
        email: &str,
        role: InvitationRole,
    ) -> i32 {
        let field = match role {
            InvitationRole::Manager => "manager",
            InvitationRole::Employee => "employee",
        };
        let outcome = self
            .update(inviter, text(&[(field, email)]))
            .await
            .expect("invitation created");
        outcome.invitations[0].id
    }

    /// Registers `email`, invites it and accepts on its behalf.
    pub async fn member(
        &self,
        inviter: &AuthenticatedPrincipal,
        email: &str,
        role: InvitationRole,
    ) -> AuthenticatedPrincipal {
        let member = self.harness.user(email).await;
        let invitation_id = self.invite(inviter, email, role).await;
        self.harness
            .taskboard
            .respond_to_invitation(&member, invitation_id, "accept", role.as_str())
            .await
            .expect("invitation accepted");
        member
    }

    /// Owner plus one active manager and one active employee.
    pub async fn staffed() -> (Self, AuthenticatedPrincipal, AuthenticatedPrincipal) {
        let fixture = Self::new().await;
        let owner = fixture.owner.clone();
        let manager = fixture
            .member(&owner, "manager@example.com", InvitationRole::Manager)
            .await;
        let employee = fixture
            .member(&manager, "employee@example.com", InvitationRole::Employee)
            .await;
        (fixture, manager, employee)
    }
}

pub fn text(fields: &[(&str, &str)]) -> TaskChangeset {
    let mut changeset = TaskChangeset::default();
    for (name, value) in fields {
        assert!(changeset.set_text(name, value.to_string()), "unknown field {name}");
    }
    changeset
}

pub fn with_file(mut changeset: TaskChangeset, field: &str, name: &str) -> TaskChangeset {
    let file = UploadFile::new(name, b"%PDF-1.4".to_vec()).with_content_type("application/pdf");
    assert!(changeset.set_file(field, file), "unknown file field {field}");
    changeset
}
