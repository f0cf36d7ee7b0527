//! Monthly history table: one row per (user, year, month).
//!
//! `total_budget` and `budget_mode` are snapshots taken when the month is
//! first touched; they may diverge from the user row mid-transition and are
//! refreshed by settings changes targeting the current month.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "monthly_histories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub year: i32,
    pub month: i32,
    pub total_budget: i64,
    pub total_spent: i64,
    pub total_rollover: i64,
    pub budget_mode: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::weeks::Entity")]
    Weeks,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::weeks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Weeks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
