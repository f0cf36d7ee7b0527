//! Week-category join table, present only in categorized mode.
//!
//! `allocated_amount` is rewritten whenever the owning week's budget or the
//! category allocations change; `spent_amount` is only ever derived from
//! expense rows.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "week_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub week_id: Uuid,
    pub category_id: Uuid,
    pub allocated_amount: i64,
    pub spent_amount: i64,
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
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Category,
}

impl Related<super::weeks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Week.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
