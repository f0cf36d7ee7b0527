//! Expenses table.
//!
//! An expense belongs to exactly one week, chosen by which week's date
//! range contains `date` at write time.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub week_id: Uuid,
    pub category_id: Option<Uuid>,
    pub amount: i64,
    pub description: String,
    pub date: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::weeks::Entity",
        from = "Column::WeekId",
        to = "super::weeks::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Week,
}

impl Related<super::weeks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Week.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
