use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Budget tracking mode of a user.
///
/// - `simple`: one bucket per week.
/// - `categorized`: each week is split across the user's categories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetMode {
    #[default]
    Simple,
    Categorized,
}

impl BudgetMode {
    /// Returns the canonical mode string used by the engine/database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Categorized => "categorized",
        }
    }
}

/// Traffic-light indicator derived from remaining budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLight {
    Green,
    Yellow,
    Red,
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub username: String,
        pub monthly_budget: i64,
        pub budget_mode: BudgetMode,
        pub role: String,
    }

    /// Settings patch; absent fields stay unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserSettingsUpdate {
        pub monthly_budget: Option<i64>,
        pub budget_mode: Option<BudgetMode>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        /// Percentage of the weekly budget, 0..=100.
        pub allocation: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub allocation: f64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        pub allocation: Option<f64>,
    }

    /// Bulk rewrite of category percentages. The resulting full set must
    /// sum to 100.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AllocationsUpdate {
        pub allocations: Vec<AllocationEntry>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AllocationEntry {
        pub category_id: Uuid,
        pub allocation: f64,
    }
}

pub mod week {
    use super::*;

    /// Month selector used by week and summary reads.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthQuery {
        pub year: i32,
        pub month: u32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WeekCategoryView {
        pub category_id: Uuid,
        pub name: String,
        pub allocation: f64,
        pub allocated_amount: i64,
        pub spent_amount: i64,
        pub percentage_used: f64,
        pub status: TrafficLight,
    }

    #[derive(Debug, Serialize, Deserialize)]
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

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthWeeksResponse {
        pub year: i32,
        pub month: u32,
        pub total_budget: i64,
        pub total_spent: i64,
        pub total_rollover: i64,
        pub budget_mode: BudgetMode,
        pub weeks: Vec<WeekView>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub week_id: Uuid,
        pub category_id: Option<Uuid>,
        pub amount: i64,
        pub description: String,
        pub date: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        /// Must be > 0.
        pub amount: i64,
        pub description: String,
        pub date: NaiveDate,
        pub category_id: Option<Uuid>,
    }

    /// Full replacement of an expense's editable fields.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub amount: i64,
        pub description: String,
        pub date: NaiveDate,
        pub category_id: Option<Uuid>,
    }
}

pub mod summary {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorySpendView {
        /// `None` bucket collects uncategorized expenses.
        pub category_id: Option<Uuid>,
        pub name: String,
        pub spent_amount: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WeekStatusView {
        pub week_number: i32,
        pub is_closed: bool,
        pub percentage_used: f64,
        pub status: TrafficLight,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlySummary {
        pub year: i32,
        pub month: u32,
        pub total_budget: i64,
        /// Live sum over all weeks, open ones included.
        pub total_spent: i64,
        pub total_rollover: i64,
        pub budget_mode: BudgetMode,
        pub average_daily_spend: f64,
        pub top_categories: Vec<CategorySpendView>,
        pub weeks: Vec<WeekStatusView>,
    }
}
