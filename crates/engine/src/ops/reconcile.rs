//! Self-healing reconciliation pass.
//!
//! Runs before every read of a month and after expense mutations. Repairs
//! structural drift (missing weeks, stale date ranges, spent totals out of
//! sync with expense rows), auto-closes expired weeks, then re-runs the
//! cascade. A mutation path that crashed halfway leaves data merely
//! "pending repair", never permanently wrong.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    BudgetMode, ResultEngine, allocation, calendar, categories, expenses, monthly_histories,
    week_categories, weeks,
};

use super::{ensure_history, history_by_id, history_mode, recalc};

/// Full pass over one month. Returns the history reloaded after repair.
pub(super) async fn reconcile_month(
    db_tx: &DatabaseTransaction,
    user: &crate::users::Model,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> ResultEngine<monthly_histories::Model> {
    let history = ensure_history(db_tx, user, year, month).await?;
    ensure_weeks(db_tx, &history).await?;
    resync_spent(db_tx, &history).await?;
    auto_close(db_tx, &history, today).await?;
    recalc::recalculate_month(db_tx, &history).await?;
    history_by_id(db_tx, history.id).await
}

/// Resyncs stored spent totals and re-runs the cascade without touching the
/// week structure. Used by expense mutations, which have already ensured
/// the month exists.
pub(super) async fn resync_and_recalculate(
    db_tx: &DatabaseTransaction,
    history: &monthly_histories::Model,
) -> ResultEngine<()> {
    resync_spent(db_tx, history).await?;
    recalc::recalculate_chain(db_tx, history).await
}

/// Creates weeks missing from the canonical partition and overwrites
/// drifted date ranges. Existing weeks keep their spent/closed state.
async fn ensure_weeks(
    db_tx: &DatabaseTransaction,
    history: &monthly_histories::Model,
) -> ResultEngine<()> {
    let partition = calendar::partition_month(
        history.year,
        history.month as u32,
        history.total_budget,
    )?;
    let existing = weeks::Entity::find()
        .filter(weeks::Column::MonthlyHistoryId.eq(history.id))
        .all(db_tx)
        .await?;

    for span in &partition.weeks {
        match existing.iter().find(|w| w.week_number == span.week_number) {
            None => {
                tracing::info!(
                    user = %history.user_id,
                    year = history.year,
                    month = history.month,
                    week = span.week_number,
                    "creating missing week"
                );
                let model = weeks::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4()),
                    monthly_history_id: ActiveValue::Set(history.id),
                    user_id: ActiveValue::Set(history.user_id.clone()),
                    week_number: ActiveValue::Set(span.week_number),
                    start_date: ActiveValue::Set(span.start_date),
                    end_date: ActiveValue::Set(span.end_date),
                    weekly_budget: ActiveValue::Set(span.base_budget),
                    spent_amount: ActiveValue::Set(0),
                    rollover_amount: ActiveValue::Set(0),
                    is_closed: ActiveValue::Set(false),
                };
                model.insert(db_tx).await?;
            }
            Some(week) if week.start_date != span.start_date || week.end_date != span.end_date => {
                tracing::info!(
                    user = %history.user_id,
                    week = week.week_number,
                    "repairing drifted week date range"
                );
                let model = weeks::ActiveModel {
                    id: ActiveValue::Set(week.id),
                    start_date: ActiveValue::Set(span.start_date),
                    end_date: ActiveValue::Set(span.end_date),
                    ..Default::default()
                };
                model.update(db_tx).await?;
            }
            Some(_) => {}
        }
    }

    match history_mode(history)? {
        BudgetMode::Categorized => ensure_week_categories(db_tx, history).await,
        BudgetMode::Simple => drop_week_categories(db_tx, history).await,
    }
}

/// Creates week-category rows missing for any (week, category) pair.
async fn ensure_week_categories(
    db_tx: &DatabaseTransaction,
    history: &monthly_histories::Model,
) -> ResultEngine<()> {
    let category_models = categories::Entity::find()
        .filter(categories::Column::UserId.eq(history.user_id.as_str()))
        .order_by_asc(categories::Column::Name)
        .all(db_tx)
        .await?;
    if category_models.is_empty() {
        return Ok(());
    }
    let shares: Vec<(Uuid, f64)> = category_models
        .iter()
        .map(|c| (c.id, c.allocation))
        .collect();

    let week_models = weeks::Entity::find()
        .filter(weeks::Column::MonthlyHistoryId.eq(history.id))
        .all(db_tx)
        .await?;
    for week in &week_models {
        let rows = week_categories::Entity::find()
            .filter(week_categories::Column::WeekId.eq(week.id))
            .all(db_tx)
            .await?;
        for (category_id, amount) in allocation::allocate(week.weekly_budget, &shares) {
            if rows.iter().any(|r| r.category_id == category_id) {
                continue;
            }
            let model = week_categories::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                week_id: ActiveValue::Set(week.id),
                category_id: ActiveValue::Set(category_id),
                allocated_amount: ActiveValue::Set(amount),
                spent_amount: ActiveValue::Set(0),
            };
            model.insert(db_tx).await?;
        }
    }
    Ok(())
}

/// Removes week-category rows for a month tracked in simple mode. No-op
/// when none exist, so a repeated mode switch stays idempotent.
pub(super) async fn drop_week_categories(
    db_tx: &DatabaseTransaction,
    history: &monthly_histories::Model,
) -> ResultEngine<()> {
    let week_ids: Vec<Uuid> = weeks::Entity::find()
        .filter(weeks::Column::MonthlyHistoryId.eq(history.id))
        .all(db_tx)
        .await?
        .into_iter()
        .map(|w| w.id)
        .collect();
    if week_ids.is_empty() {
        return Ok(());
    }
    week_categories::Entity::delete_many()
        .filter(week_categories::Column::WeekId.is_in(week_ids))
        .exec(db_tx)
        .await?;
    Ok(())
}

/// Recomputes week (and week-category) spent totals from live expense rows,
/// writing only when the stored value differs.
async fn resync_spent(
    db_tx: &DatabaseTransaction,
    history: &monthly_histories::Model,
) -> ResultEngine<()> {
    let week_models = weeks::Entity::find()
        .filter(weeks::Column::MonthlyHistoryId.eq(history.id))
        .all(db_tx)
        .await?;

    for week in &week_models {
        let expense_models = expenses::Entity::find()
            .filter(expenses::Column::WeekId.eq(week.id))
            .all(db_tx)
            .await?;
        let live_total: i64 = expense_models.iter().map(|e| e.amount).sum();
        if week.spent_amount != live_total {
            tracing::info!(
                user = %history.user_id,
                week = week.week_number,
                stored = week.spent_amount,
                live = live_total,
                "resyncing week spent amount"
            );
            let model = weeks::ActiveModel {
                id: ActiveValue::Set(week.id),
                spent_amount: ActiveValue::Set(live_total),
                ..Default::default()
            };
            model.update(db_tx).await?;
        }

        let rows = week_categories::Entity::find()
            .filter(week_categories::Column::WeekId.eq(week.id))
            .all(db_tx)
            .await?;
        for row in rows {
            let live: i64 = expense_models
                .iter()
                .filter(|e| e.category_id == Some(row.category_id))
                .map(|e| e.amount)
                .sum();
            if row.spent_amount != live {
                let model = week_categories::ActiveModel {
                    id: ActiveValue::Set(row.id),
                    spent_amount: ActiveValue::Set(live),
                    ..Default::default()
                };
                model.update(db_tx).await?;
            }
        }
    }
    Ok(())
}

/// Closes every open week whose end date has passed, in ascending week
/// order. The cascade right after derives the final rollover values.
async fn auto_close(
    db_tx: &DatabaseTransaction,
    history: &monthly_histories::Model,
    today: NaiveDate,
) -> ResultEngine<()> {
    let week_models = weeks::Entity::find()
        .filter(weeks::Column::MonthlyHistoryId.eq(history.id))
        .order_by_asc(weeks::Column::WeekNumber)
        .all(db_tx)
        .await?;

    for week in week_models {
        if week.is_closed || week.end_date >= today {
            continue;
        }
        tracing::debug!(
            user = %history.user_id,
            week = week.week_number,
            "auto-closing expired week"
        );
        let model = weeks::ActiveModel {
            id: ActiveValue::Set(week.id),
            is_closed: ActiveValue::Set(true),
            rollover_amount: ActiveValue::Set(week.weekly_budget - week.spent_amount),
            ..Default::default()
        };
        model.update(db_tx).await?;
    }
    Ok(())
}
