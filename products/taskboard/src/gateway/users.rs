use entity::{boards, employees, invitations, managers, owners, users};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, sea_query::Expr,
};

use super::now;

pub async fn find_user<C: ConnectionTrait>(conn: &C, id: i32) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find_by_id(id).one(conn).await
}

pub async fn find_user_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(conn)
        .await
}

pub async fn list_users<C: ConnectionTrait>(conn: &C) -> Result<Vec<users::Model>, DbErr> {
    users::Entity::find()
        .order_by_asc(users::Column::Id)
        .all(conn)
        .await
}

pub async fn insert_user<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    password_hash: String,
) -> Result<users::Model, DbErr> {
    let now = now();
    users::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
}

pub async fn update_password<C: ConnectionTrait>(
    conn: &C,
    user: users::Model,
    password_hash: String,
) -> Result<users::Model, DbErr> {
    let mut active: users::ActiveModel = user.into();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(now());
    active.update(conn).await
}

/// Changes the login email and the copies of it held on owner and member rows.
pub async fn update_email<C: ConnectionTrait>(
    conn: &C,
    user: users::Model,
    email: &str,
) -> Result<users::Model, DbErr> {
    let user_id = user.id;
    let mut active: users::ActiveModel = user.into();
    active.email = Set(email.to_string());
    active.updated_at = Set(now());
    let updated = active.update(conn).await?;
    owners::Entity::update_many()
        .col_expr(owners::Column::Email, Expr::value(email))
        .filter(owners::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    managers::Entity::update_many()
        .col_expr(managers::Column::Email, Expr::value(email))
        .filter(managers::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    employees::Entity::update_many()
        .col_expr(employees::Column::Email, Expr::value(email))
        .filter(employees::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(updated)
}

/// Rows in other tables that point at this user.
pub async fn reference_count<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<u64, DbErr> {
    let boards = boards::Entity::find()
        .filter(boards::Column::UserId.eq(user_id))
        .count(conn)
        .await?;
    let owners = owners::Entity::find()
        .filter(owners::Column::UserId.eq(user_id))
        .count(conn)
        .await?;
    let managers = managers::Entity::find()
        .filter(managers::Column::UserId.eq(user_id))
        .count(conn)
        .await?;
    let employees = employees::Entity::find()
        .filter(employees::Column::UserId.eq(user_id))
        .count(conn)
        .await?;
    let invitations = invitations::Entity::find()
        .filter(invitations::Column::UserId.eq(user_id))
        .count(conn)
        .await?;
    Ok(boards + owners + managers + employees + invitations)
}

pub async fn delete_user<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<u64, DbErr> {
    let result = users::Entity::delete_by_id(user_id).exec(conn).await?;
    Ok(result.rows_affected)
}
