//! Users table.
//!
//! The engine keys all ownership by `user_id`, which is the username.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// How the monthly budget is tracked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetMode {
    /// One weekly budget per week, no category split.
    Simple,
    /// Weekly budgets distributed across percentage-based categories.
    Categorized,
}

impl BudgetMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Categorized => "categorized",
        }
    }
}

impl TryFrom<&str> for BudgetMode {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "simple" => Ok(Self::Simple),
            "categorized" => Ok(Self::Categorized),
            other => Err(EngineError::Validation(format!(
                "invalid budget mode: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub monthly_budget: i64,
    pub budget_mode: String,
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::categories::Entity")]
    Categories,
    #[sea_orm(has_many = "super::monthly_histories::Entity")]
    MonthlyHistories,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::monthly_histories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MonthlyHistories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
