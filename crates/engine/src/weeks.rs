//! Weeks table.
//!
//! `weekly_budget` is the base share plus any rollover applied by the
//! cascade. `rollover_amount` is only meaningful while `is_closed` is true;
//! open weeks carry 0.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "weeks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub monthly_history_id: Uuid,
    pub user_id: String,
    pub week_number: i32,
    pub start_date: Date,
    pub end_date: Date,
    pub weekly_budget: i64,
    pub spent_amount: i64,
    pub rollover_amount: i64,
    pub is_closed: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::monthly_histories::Entity",
        from = "Column::MonthlyHistoryId",
        to = "super::monthly_histories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    MonthlyHistory,
    #[sea_orm(has_many = "super::week_categories::Entity")]
    WeekCategories,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::monthly_histories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MonthlyHistory.def()
    }
}

impl Related<super::week_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeekCategories.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
