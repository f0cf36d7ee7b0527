//! Week reads and lifecycle transitions (close / reopen).

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    BudgetMode, EngineError, MonthWeeksView, ResultEngine, TrafficLight, WeekCategoryView,
    WeekView, categories, monthly_histories, percentage_used, week_categories, weeks,
};

use super::{Engine, history_by_id, history_mode, recalc, reconcile, require_user, require_week, with_tx};

/// Builds the category breakdown of one week, ordered by category name.
async fn week_category_views(
    db_tx: &DatabaseTransaction,
    week_id: Uuid,
    category_models: &[categories::Model],
) -> ResultEngine<Vec<WeekCategoryView>> {
    let rows = week_categories::Entity::find()
        .filter(week_categories::Column::WeekId.eq(week_id))
        .all(db_tx)
        .await?;

    let mut views = Vec::with_capacity(rows.len());
    for category in category_models {
        let Some(row) = rows.iter().find(|r| r.category_id == category.id) else {
            continue;
        };
        let used = percentage_used(row.spent_amount, row.allocated_amount);
        views.push(WeekCategoryView {
            category_id: category.id,
            name: category.name.clone(),
            allocation: category.allocation,
            allocated_amount: row.allocated_amount,
            spent_amount: row.spent_amount,
            percentage_used: used,
            status: TrafficLight::from_remaining_percent(100.0 - used),
        });
    }
    Ok(views)
}

pub(super) async fn build_week_views(
    db_tx: &DatabaseTransaction,
    history: &monthly_histories::Model,
) -> ResultEngine<Vec<WeekView>> {
    let week_models = weeks::Entity::find()
        .filter(weeks::Column::MonthlyHistoryId.eq(history.id))
        .order_by_asc(weeks::Column::WeekNumber)
        .all(db_tx)
        .await?;
    let category_models = categories::Entity::find()
        .filter(categories::Column::UserId.eq(history.user_id.as_str()))
        .order_by_asc(categories::Column::Name)
        .all(db_tx)
        .await?;

    let mut views = Vec::with_capacity(week_models.len());
    for week in &week_models {
        let breakdown = if history_mode(history)? == BudgetMode::Categorized {
            week_category_views(db_tx, week.id, &category_models).await?
        } else {
            Vec::new()
        };
        views.push(WeekView::build(week, breakdown));
    }
    Ok(views)
}

async fn week_view_by_id(
    db_tx: &DatabaseTransaction,
    week_id: Uuid,
    user_id: &str,
) -> ResultEngine<WeekView> {
    let week = require_week(db_tx, week_id, user_id).await?;
    let history = history_by_id(db_tx, week.monthly_history_id).await?;
    let category_models = categories::Entity::find()
        .filter(categories::Column::UserId.eq(user_id))
        .order_by_asc(categories::Column::Name)
        .all(db_tx)
        .await?;
    let breakdown = if history_mode(&history)? == BudgetMode::Categorized {
        week_category_views(db_tx, week.id, &category_models).await?
    } else {
        Vec::new()
    };
    Ok(WeekView::build(&week, breakdown))
}

impl Engine {
    /// Reconciles and returns all weeks of a month, with derived usage and
    /// category breakdowns.
    pub async fn get_weeks(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> ResultEngine<MonthWeeksView> {
        with_tx!(self, |db_tx| {
            let user = require_user(&db_tx, user_id).await?;
            let history = reconcile::reconcile_month(&db_tx, &user, year, month, today).await?;
            let weeks = build_week_views(&db_tx, &history).await?;
            Ok(MonthWeeksView {
                year,
                month,
                total_budget: history.total_budget,
                total_spent: history.total_spent,
                total_rollover: history.total_rollover,
                budget_mode: history_mode(&history)?,
                weeks,
            })
        })
    }

    /// Closes an open week: freezes its rollover and hands it to the next
    /// open week via the cascade.
    pub async fn close_week(&self, user_id: &str, week_id: Uuid) -> ResultEngine<WeekView> {
        with_tx!(self, |db_tx| {
            let week = require_week(&db_tx, week_id, user_id).await?;
            if week.is_closed {
                return Err(EngineError::Conflict("week is already closed".to_string()));
            }

            let model = weeks::ActiveModel {
                id: ActiveValue::Set(week.id),
                is_closed: ActiveValue::Set(true),
                rollover_amount: ActiveValue::Set(week.weekly_budget - week.spent_amount),
                ..Default::default()
            };
            model.update(&db_tx).await?;

            let history = history_by_id(&db_tx, week.monthly_history_id).await?;
            recalc::recalculate_chain(&db_tx, &history).await?;
            week_view_by_id(&db_tx, week_id, user_id).await
        })
    }

    /// Reopens a closed week, undoing its contribution to the month totals
    /// and re-deriving the rest of the chain.
    pub async fn reopen_week(&self, user_id: &str, week_id: Uuid) -> ResultEngine<WeekView> {
        with_tx!(self, |db_tx| {
            let week = require_week(&db_tx, week_id, user_id).await?;
            if !week.is_closed {
                return Err(EngineError::Conflict("week is not closed".to_string()));
            }

            let model = weeks::ActiveModel {
                id: ActiveValue::Set(week.id),
                is_closed: ActiveValue::Set(false),
                rollover_amount: ActiveValue::Set(0),
                ..Default::default()
            };
            model.update(&db_tx).await?;

            let history = history_by_id(&db_tx, week.monthly_history_id).await?;
            recalc::recalculate_chain(&db_tx, &history).await?;
            week_view_by_id(&db_tx, week_id, user_id).await
        })
    }
}
