use platform_authn::AuthenticatedPrincipal;
use tracing::info;

use crate::{
    Taskboard,
    error::{TaskboardError, TaskboardResult},
    gateway,
    views::{self, BoardView},
};

fn board_name(value: &str) -> TaskboardResult<&str> {
    let name = value.trim();
    if name.is_empty() {
        return Err(TaskboardError::validation("name_board is required"));
    }
    Ok(name)
}

impl Taskboard {
    pub async fn create_board(
        &self,
        principal: &AuthenticatedPrincipal,
        name_board: &str,
    ) -> TaskboardResult<BoardView> {
        let name = board_name(name_board)?;
        let board = gateway::boards::insert_board(&self.db, principal.user_id, name).await?;
        info!(board_id = board.id, user_id = principal.user_id, "board created");
        Ok(views::board_view(&self.db, board).await?)
    }

    pub async fn get_board(&self, id: i32) -> TaskboardResult<BoardView> {
        let board = gateway::boards::find_board(&self.db, id)
            .await?
            .ok_or_else(|| TaskboardError::not_found("Board not found"))?;
        Ok(views::board_view(&self.db, board).await?)
    }

    pub async fn list_boards(&self) -> TaskboardResult<Vec<BoardView>> {
        let mut out = Vec::new();
        for board in gateway::boards::list_boards(&self.db).await? {
            out.push(views::board_view(&self.db, board).await?);
        }
        Ok(out)
    }

    /// Only the creator may rename a board.
    pub async fn rename_board(
        &self,
        principal: &AuthenticatedPrincipal,
        id: i32,
        name_board: &str,
    ) -> TaskboardResult<BoardView> {
        let name = board_name(name_board)?;
        let board = gateway::boards::find_board(&self.db, id)
            .await?
            .ok_or_else(|| TaskboardError::not_found("Board not found"))?;
        if board.user_id != principal.user_id {
            return Err(TaskboardError::forbidden("Only the board creator can edit this board"));
        }
        let board = gateway::boards::rename_board(&self.db, board, name).await?;
        Ok(views::board_view(&self.db, board).await?)
    }
}
