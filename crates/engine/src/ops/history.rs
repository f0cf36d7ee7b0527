//! Monthly aggregate statistics.

use chrono::{Datelike, NaiveDate};
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    CategorySpend, MonthlySummaryView, ResultEngine, TrafficLight, WeekStatus, calendar,
    categories, expenses, percentage_used, weeks,
};

use super::{Engine, history_mode, reconcile, require_user, with_tx};

const TOP_CATEGORIES: usize = 5;
const UNCATEGORIZED_NAME: &str = "Sin categoría";

/// Days to average daily spend over: the elapsed part of the current
/// month, the whole of a past month, a 1-day floor for a future one.
fn elapsed_days(year: i32, month: u32, today: NaiveDate) -> ResultEngine<u32> {
    let (month_start, month_end) = calendar::month_bounds(year, month)?;
    if today > month_end {
        return Ok(month_end.day());
    }
    if today < month_start {
        return Ok(1);
    }
    Ok(today.day())
}

impl Engine {
    /// Reconciles and returns the month's aggregate statistics: totals,
    /// per-week traffic lights, top categories by spend, daily average.
    pub async fn get_monthly_history(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> ResultEngine<MonthlySummaryView> {
        with_tx!(self, |db_tx| {
            let user = require_user(&db_tx, user_id).await?;
            let history = reconcile::reconcile_month(&db_tx, &user, year, month, today).await?;

            let week_models = weeks::Entity::find()
                .filter(weeks::Column::MonthlyHistoryId.eq(history.id))
                .order_by_asc(weeks::Column::WeekNumber)
                .all(&db_tx)
                .await?;

            let week_statuses = week_models
                .iter()
                .map(|week| {
                    let used = percentage_used(week.spent_amount, week.weekly_budget);
                    WeekStatus {
                        week_number: week.week_number,
                        is_closed: week.is_closed,
                        percentage_used: used,
                        status: TrafficLight::from_remaining_percent(100.0 - used),
                    }
                })
                .collect();

            let live_spent: i64 = week_models.iter().map(|w| w.spent_amount).sum();

            let week_ids: Vec<Uuid> = week_models.iter().map(|w| w.id).collect();
            let expense_models = if week_ids.is_empty() {
                Vec::new()
            } else {
                expenses::Entity::find()
                    .filter(expenses::Column::WeekId.is_in(week_ids))
                    .all(&db_tx)
                    .await?
            };

            let category_models = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id))
                .all(&db_tx)
                .await?;
            let names: HashMap<Uuid, &str> = category_models
                .iter()
                .map(|c| (c.id, c.name.as_str()))
                .collect();

            let mut by_category: HashMap<Option<Uuid>, i64> = HashMap::new();
            for expense in &expense_models {
                *by_category.entry(expense.category_id).or_insert(0) += expense.amount;
            }
            let mut top_categories: Vec<CategorySpend> = by_category
                .into_iter()
                .map(|(category_id, spent_amount)| CategorySpend {
                    category_id,
                    name: category_id
                        .and_then(|id| names.get(&id).copied())
                        .unwrap_or(UNCATEGORIZED_NAME)
                        .to_string(),
                    spent_amount,
                })
                .collect();
            top_categories.sort_by(|a, b| {
                b.spent_amount.cmp(&a.spent_amount).then(a.name.cmp(&b.name))
            });
            top_categories.truncate(TOP_CATEGORIES);

            let days = elapsed_days(year, month, today)?;
            let average_daily_spend = live_spent as f64 / f64::from(days.max(1));

            Ok(MonthlySummaryView {
                year,
                month,
                total_budget: history.total_budget,
                total_spent: live_spent,
                total_rollover: history.total_rollover,
                budget_mode: history_mode(&history)?,
                average_daily_spend,
                top_categories,
                weeks: week_statuses,
            })
        })
    }
}
