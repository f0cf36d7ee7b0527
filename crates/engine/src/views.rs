//! Read models and mutation inputs of the engine.
//!
//! Derived fields (`percentage_used`, `status`) are computed once when a
//! view is built, never re-derived ad hoc by callers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BudgetMode, TrafficLight, percentage_used};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub username: String,
    pub monthly_budget: i64,
    pub budget_mode: BudgetMode,
    pub role: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryView {
    pub id: Uuid,
    pub name: String,
    pub allocation: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeekCategoryView {
    pub category_id: Uuid,
    pub name: String,
    pub allocation: f64,
    pub allocated_amount: i64,
    pub spent_amount: i64,
    pub percentage_used: f64,
    pub status: TrafficLight,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeekView {
    pub id: Uuid,
    pub week_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weekly_budget: i64,
    pub spent_amount: i64,
    pub rollover_amount: i64,
    pub is_closed: bool,
    pub percentage_used: f64,
    pub status: TrafficLight,
    pub categories: Vec<WeekCategoryView>,
}

impl WeekView {
    pub(crate) fn build(
        model: &crate::weeks::Model,
        categories: Vec<WeekCategoryView>,
    ) -> Self {
        let used = percentage_used(model.spent_amount, model.weekly_budget);
        Self {
            id: model.id,
            week_number: model.week_number,
            start_date: model.start_date,
            end_date: model.end_date,
            weekly_budget: model.weekly_budget,
            spent_amount: model.spent_amount,
            rollover_amount: model.rollover_amount,
            is_closed: model.is_closed,
            percentage_used: used,
            status: TrafficLight::from_remaining_percent(100.0 - used),
            categories,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthWeeksView {
    pub year: i32,
    pub month: u32,
    pub total_budget: i64,
    pub total_spent: i64,
    pub total_rollover: i64,
    pub budget_mode: BudgetMode,
    pub weeks: Vec<WeekView>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpenseView {
    pub id: Uuid,
    pub week_id: Uuid,
    pub category_id: Option<Uuid>,
    pub amount: i64,
    pub description: String,
    pub date: NaiveDate,
}

/// Spend aggregated per category for the monthly summary. `category_id` is
/// `None` for uncategorized expenses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category_id: Option<Uuid>,
    pub name: String,
    pub spent_amount: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeekStatus {
    pub week_number: i32,
    pub is_closed: bool,
    pub percentage_used: f64,
    pub status: TrafficLight,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummaryView {
    pub year: i32,
    pub month: u32,
    pub total_budget: i64,
    /// Live sum over all weeks, open ones included.
    pub total_spent: i64,
    pub total_rollover: i64,
    pub budget_mode: BudgetMode,
    pub average_daily_spend: f64,
    pub top_categories: Vec<CategorySpend>,
    pub weeks: Vec<WeekStatus>,
}

/// Settings patch for `update_user`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub monthly_budget: Option<i64>,
    pub budget_mode: Option<BudgetMode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: i64,
    pub description: String,
    pub date: NaiveDate,
    pub category_id: Option<Uuid>,
}

/// Full replacement of an expense's editable fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    pub amount: i64,
    pub description: String,
    pub date: NaiveDate,
    pub category_id: Option<Uuid>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationUpdate {
    pub category_id: Uuid,
    pub allocation: f64,
}
