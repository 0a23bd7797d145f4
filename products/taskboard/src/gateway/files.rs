//! The three attachment tables share one shape: a metadata table plus a
//! `(task_id, file_id)` link table. `for_kind!` binds the pair for a kind.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, prelude::DateTimeWithTimeZone,
};
use serde::Serialize;

use super::now;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Planning,
    Project,
    PlanningDescription,
}

impl FileKind {
    pub const ALL: [FileKind; 3] = [Self::Planning, Self::Project, Self::PlanningDescription];

    pub fn label(self) -> &'static str {
        match self {
            Self::Planning => "planning file",
            Self::Project => "project file",
            Self::PlanningDescription => "planning description file",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileRow {
    pub id: i32,
    pub file_url: String,
    pub file_name: String,
    pub created_at: DateTimeWithTimeZone,
}

macro_rules! for_kind {
    ($kind:expr, $file:ident, $link:ident, $file_id:ident => $body:block) => {
        match $kind {
            FileKind::Planning => {
                #[allow(unused_imports)]
                use entity::{
                    planning_files as $file, task_planning_files as $link,
                    task_planning_files::Column::PlanningFileId as $file_id,
                };
                $body
            }
            FileKind::Project => {
                #[allow(unused_imports)]
                use entity::{
                    project_files as $file, task_project_files as $link,
                    task_project_files::Column::ProjectFileId as $file_id,
                };
                $body
            }
            FileKind::PlanningDescription => {
                #[allow(unused_imports)]
                use entity::{
                    planning_description_files as $file, task_planning_description_files as $link,
                    task_planning_description_files::Column::PlanningDescriptionFileId as $file_id,
                };
                $body
            }
        }
    };
}

macro_rules! row {
    ($model:expr) => {{
        let model = $model;
        FileRow {
            id: model.id,
            file_url: model.file_url,
            file_name: model.file_name,
            created_at: model.created_at,
        }
    }};
}

/// Whether any attachment table already holds an object with this name.
pub async fn name_exists<C: ConnectionTrait>(conn: &C, file_name: &str) -> Result<bool, DbErr> {
    for kind in FileKind::ALL {
        let count = for_kind!(kind, file, link, FileIdCol => {
            file::Entity::find()
                .filter(file::Column::FileName.eq(file_name))
                .count(conn)
                .await?
        });
        if count > 0 {
            return Ok(true);
        }
    }
    Ok(false)
}

pub async fn attach<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    kind: FileKind,
    file_url: &str,
    file_name: &str,
) -> Result<FileRow, DbErr> {
    for_kind!(kind, file, link, FileIdCol => {
        let saved = file::ActiveModel {
            file_url: Set(file_url.to_string()),
            file_name: Set(file_name.to_string()),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        let mut link_row = <link::ActiveModel as Default>::default();
        link_row.set(link::Column::TaskId, task_id.into());
        link_row.set(FileIdCol, saved.id.into());
        link::Entity::insert(link_row).exec_without_returning(conn).await?;
        Ok(row!(saved))
    })
}

async fn linked_ids<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    kind: FileKind,
) -> Result<Vec<i32>, DbErr> {
    for_kind!(kind, file, link, FileIdCol => {
        link::Entity::find()
            .select_only()
            .column(FileIdCol)
            .filter(link::Column::TaskId.eq(task_id))
            .into_tuple::<i32>()
            .all(conn)
            .await
    })
}

pub async fn list_for_task<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    kind: FileKind,
) -> Result<Vec<FileRow>, DbErr> {
    let ids = linked_ids(conn, task_id, kind).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    for_kind!(kind, file, link, FileIdCol => {
        let models = file::Entity::find()
            .filter(file::Column::Id.is_in(ids))
            .order_by_asc(file::Column::Id)
            .all(conn)
            .await?;
        Ok(models.into_iter().map(|model| row!(model)).collect())
    })
}

/// Every attachment of a kind, paired with the task it hangs off.
pub async fn list_all<C: ConnectionTrait>(
    conn: &C,
    kind: FileKind,
) -> Result<Vec<(i32, FileRow)>, DbErr> {
    for_kind!(kind, file, link, FileIdCol => {
        let links: Vec<(i32, i32)> = link::Entity::find()
            .select_only()
            .column(link::Column::TaskId)
            .column(FileIdCol)
            .order_by_asc(link::Column::TaskId)
            .into_tuple()
            .all(conn)
            .await?;
        let mut rows = Vec::with_capacity(links.len());
        for (task_id, file_id) in links {
            if let Some(model) = file::Entity::find_by_id(file_id).one(conn).await? {
                rows.push((task_id, row!(model)));
            }
        }
        Ok(rows)
    })
}

/// Removes one attachment from a task and returns the stored name, or `None`
/// when the file is not attached to that task.
pub async fn detach<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    file_id: i32,
    kind: FileKind,
) -> Result<Option<String>, DbErr> {
    for_kind!(kind, file, link, FileIdCol => {
        let unlinked = link::Entity::delete_many()
            .filter(link::Column::TaskId.eq(task_id))
            .filter(FileIdCol.eq(file_id))
            .exec(conn)
            .await?;
        if unlinked.rows_affected == 0 {
            return Ok(None);
        }
        let Some(model) = file::Entity::find_by_id(file_id).one(conn).await? else {
            return Ok(None);
        };
        file::Entity::delete_by_id(file_id).exec(conn).await?;
        Ok(Some(model.file_name))
    })
}

/// Drops every attachment of a kind from a task and returns the object names.
pub async fn purge_for_task<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    kind: FileKind,
) -> Result<Vec<String>, DbErr> {
    let ids = linked_ids(conn, task_id, kind).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    for_kind!(kind, file, link, FileIdCol => {
        let names: Vec<String> = file::Entity::find()
            .select_only()
            .column(file::Column::FileName)
            .filter(file::Column::Id.is_in(ids.clone()))
            .into_tuple()
            .all(conn)
            .await?;
        link::Entity::delete_many()
            .filter(link::Column::TaskId.eq(task_id))
            .exec(conn)
            .await?;
        file::Entity::delete_many()
            .filter(file::Column::Id.is_in(ids))
            .exec(conn)
            .await?;
        Ok(names)
    })
}
