use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "planning_files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub file_url: String,
    #[sea_orm(indexed)]
    pub file_name: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::task_planning_files::Entity")]
    Links,
}

impl Related<super::task_planning_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Links.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
