use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub board_id: i32,
    pub owner_id: i32,
    pub name_task: String,
    pub planning_description: Option<String>,
    pub planning_description_percent: Option<String>,
    pub planning_status: Option<PlanningStatus>,
    pub project_status: Option<ProjectStatus>,
    pub planning_due_date: Option<String>,
    pub project_due_date: Option<String>,
    pub priority: Option<Priority>,
    pub project_comment: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::boards::Entity",
        from = "Column::BoardId",
        to = "super::boards::Column::Id",
        on_delete = "Cascade"
    )]
    Board,
    #[sea_orm(
        belongs_to = "super::owners::Entity",
        from = "Column::OwnerId",
        to = "super::owners::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::invitations::Entity")]
    Invitations,
}

impl Related<super::boards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Board.def()
    }
}

impl Related<super::owners::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::invitations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invitations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum PlanningStatus {
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "not_approved")]
    NotApproved,
}

impl PlanningStatus {
    /// Accepts the stored value as well as the display label, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "approved" => Some(Self::Approved),
            "not_approved" => Some(Self::NotApproved),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::NotApproved => "Not Approved",
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum ProjectStatus {
    #[sea_orm(string_value = "working")]
    Working,
    #[sea_orm(string_value = "done")]
    Done,
    #[sea_orm(string_value = "undone")]
    Undone,
}

impl ProjectStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "working" => Some(Self::Working),
            "done" => Some(Self::Done),
            "undone" => Some(Self::Undone),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Working => "Working",
            Self::Done => "Done",
            Self::Undone => "Undone",
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Priority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
}

impl Priority {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_parse_display_and_stored_forms() {
        assert_eq!(PlanningStatus::parse("Not Approved"), Some(PlanningStatus::NotApproved));
        assert_eq!(PlanningStatus::parse("not_approved"), Some(PlanningStatus::NotApproved));
        assert_eq!(PlanningStatus::parse(" APPROVED "), Some(PlanningStatus::Approved));
        assert_eq!(ProjectStatus::parse("Working"), Some(ProjectStatus::Working));
        assert_eq!(Priority::parse("high"), Some(Priority::High));
        assert_eq!(Priority::parse("urgent"), None);
        assert_eq!(ProjectStatus::parse(""), None);
    }
}
