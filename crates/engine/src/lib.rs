//! Weekly budget engine.
//!
//! A user's monthly budget is partitioned into Monday-start weeks clipped to
//! the month. Expenses land in the week containing their date; closing a week
//! freezes its rollover (`weekly_budget - spent_amount`) and hands it to the
//! first open week of the chain. Every read runs a reconciliation pass first,
//! so stored state drifting from the derivable one is repaired instead of
//! reported.

pub use allocation::{
    ALLOCATION_EPSILON, DEFAULT_CATEGORIES, allocate, validate_allocations, validate_percentage,
};
pub use calendar::{MonthPartition, WeekSpan, month_bounds, partition_month};
pub use error::EngineError;
pub use ops::{DEFAULT_MONTHLY_BUDGET, Engine, EngineBuilder, MIN_MONTHLY_BUDGET};
pub use status::{TrafficLight, percentage_used};
pub use users::BudgetMode;
pub use views::{
    AllocationUpdate, CategorySpend, CategoryView, ExpenseUpdate, ExpenseView, MonthWeeksView,
    MonthlySummaryView, NewExpense, UserUpdate, UserView, WeekCategoryView, WeekStatus, WeekView,
};

mod allocation;
mod calendar;
mod categories;
mod error;
mod expenses;
mod monthly_histories;
mod ops;
mod status;
mod users;
mod views;
mod week_categories;
mod weeks;

type ResultEngine<T> = Result<T, EngineError>;
