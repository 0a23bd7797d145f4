use entity::{boards, tasks};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use super::now;

pub async fn insert_board<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    name_board: &str,
) -> Result<boards::Model, DbErr> {
    let now = now();
    boards::ActiveModel {
        name_board: Set(name_board.to_string()),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
}

pub async fn find_board<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Option<boards::Model>, DbErr> {
    boards::Entity::find_by_id(id).one(conn).await
}

pub async fn list_boards<C: ConnectionTrait>(conn: &C) -> Result<Vec<boards::Model>, DbErr> {
    boards::Entity::find()
        .order_by_asc(boards::Column::Id)
        .all(conn)
        .await
}

pub async fn rename_board<C: ConnectionTrait>(
    conn: &C,
    board: boards::Model,
    name_board: &str,
) -> Result<boards::Model, DbErr> {
    let mut active: boards::ActiveModel = board.into();
    active.name_board = Set(name_board.to_string());
    active.updated_at = Set(now());
    active.update(conn).await
}

pub async fn tasks_of_board<C: ConnectionTrait>(
    conn: &C,
    board_id: i32,
) -> Result<Vec<tasks::Model>, DbErr> {
    tasks::Entity::find()
        .filter(tasks::Column::BoardId.eq(board_id))
        .order_by_asc(tasks::Column::Id)
        .all(conn)
        .await
}

pub async fn delete_board<C: ConnectionTrait>(conn: &C, board_id: i32) -> Result<(), DbErr> {
    boards::Entity::delete_by_id(board_id).exec(conn).await?;
    Ok(())
}
