//! Full-month rollover cascade.
//!
//! `recalculate_month` re-derives every week's budget and every closed
//! week's rollover for one month from current state only: base shares from
//! the canonical partition, plus `{is_closed, spent_amount}` per week. It is
//! idempotent and order-independent, so any mutation path can call it
//! repeatedly without drift. Incremental patching of "the next week" is
//! deliberately not used.

use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    BudgetMode, ResultEngine, allocation, calendar, categories, monthly_histories,
    week_categories, weeks,
};

use super::{find_history, history_mode, next_month, previous_month};

/// Rollover left by the previous month when it has no open week to land on.
///
/// The chain inside a fully closed month ends in its last week's rollover,
/// which already accumulates everything before it, so that single value is
/// the carry into this month. Any open week in the previous month absorbs
/// the carry there instead.
async fn incoming_carry(
    db_tx: &DatabaseTransaction,
    user_id: &str,
    year: i32,
    month: u32,
) -> ResultEngine<i64> {
    let (prev_year, prev_month) = previous_month(year, month);
    let Some(prev) = find_history(db_tx, user_id, prev_year, prev_month).await? else {
        return Ok(0);
    };

    let prev_weeks = weeks::Entity::find()
        .filter(weeks::Column::MonthlyHistoryId.eq(prev.id))
        .order_by_asc(weeks::Column::WeekNumber)
        .all(db_tx)
        .await?;
    if prev_weeks.is_empty() || prev_weeks.iter().any(|w| !w.is_closed) {
        return Ok(0);
    }
    Ok(prev_weeks.last().map(|w| w.rollover_amount).unwrap_or(0))
}

/// Recomputes all week budgets, rollovers and month aggregates for one
/// monthly history. Runs inside the caller's transaction.
pub(super) async fn recalculate_month(
    db_tx: &DatabaseTransaction,
    history: &monthly_histories::Model,
) -> ResultEngine<()> {
    let month = history.month as u32;
    let partition = calendar::partition_month(history.year, month, history.total_budget)?;
    let week_models = weeks::Entity::find()
        .filter(weeks::Column::MonthlyHistoryId.eq(history.id))
        .order_by_asc(weeks::Column::WeekNumber)
        .all(db_tx)
        .await?;

    let base_of = |week: &weeks::Model| {
        partition
            .weeks
            .iter()
            .find(|span| span.week_number == week.week_number)
            .map(|span| span.base_budget)
            .unwrap_or(0)
    };

    // Closed weeks chain rollover from one to the next closed week,
    // regardless of open weeks between them.
    let mut carry = incoming_carry(db_tx, &history.user_id, history.year, month).await?;
    let mut total_rollover = 0i64;
    let mut total_spent = 0i64;
    let mut budgets: Vec<(Uuid, i64, i64)> = Vec::with_capacity(week_models.len());

    for week in &week_models {
        if !week.is_closed {
            continue;
        }
        let budget = base_of(week) + carry;
        let rollover = budget - week.spent_amount;
        carry = rollover;
        total_rollover += rollover;
        total_spent += week.spent_amount;
        budgets.push((week.id, budget, rollover));
    }

    // Only the first open week receives the leftover of the closed chain;
    // every other open week is reset to its base share.
    let mut first_open = true;
    for week in &week_models {
        if week.is_closed {
            continue;
        }
        let budget = if first_open {
            first_open = false;
            base_of(week) + carry
        } else {
            base_of(week)
        };
        budgets.push((week.id, budget, 0));
    }

    let mut new_budget_by_week: HashMap<Uuid, i64> = HashMap::new();
    for (week_id, budget, rollover) in &budgets {
        new_budget_by_week.insert(*week_id, *budget);
        let week = week_models
            .iter()
            .find(|w| w.id == *week_id)
            .ok_or_else(|| crate::EngineError::NotFound("week not exists".to_string()))?;
        if week.weekly_budget != *budget || week.rollover_amount != *rollover {
            let model = weeks::ActiveModel {
                id: ActiveValue::Set(*week_id),
                weekly_budget: ActiveValue::Set(*budget),
                rollover_amount: ActiveValue::Set(*rollover),
                ..Default::default()
            };
            model.update(db_tx).await?;
        }
    }

    if history_mode(history)? == BudgetMode::Categorized {
        realign_week_categories(db_tx, history, &week_models, &new_budget_by_week).await?;
    }

    if history.total_rollover != total_rollover || history.total_spent != total_spent {
        let model = monthly_histories::ActiveModel {
            id: ActiveValue::Set(history.id),
            total_rollover: ActiveValue::Set(total_rollover),
            total_spent: ActiveValue::Set(total_spent),
            ..Default::default()
        };
        model.update(db_tx).await?;
    }

    Ok(())
}

/// Recalculates a month and, because its leftover can land on the next
/// month's first open week, the next month too when it already exists.
pub(super) async fn recalculate_chain(
    db_tx: &DatabaseTransaction,
    history: &monthly_histories::Model,
) -> ResultEngine<()> {
    recalculate_month(db_tx, history).await?;

    let (year, month) = next_month(history.year, history.month as u32);
    if let Some(next) = find_history(db_tx, &history.user_id, year, month).await? {
        recalculate_month(db_tx, &next).await?;
    }
    Ok(())
}

/// Rewrites `allocated_amount` of every week's category rows from the
/// recomputed weekly budgets. Spent amounts are left untouched; they are
/// only ever derived from expense rows.
async fn realign_week_categories(
    db_tx: &DatabaseTransaction,
    history: &monthly_histories::Model,
    week_models: &[weeks::Model],
    new_budget_by_week: &HashMap<Uuid, i64>,
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

    for week in week_models {
        let budget = new_budget_by_week
            .get(&week.id)
            .copied()
            .unwrap_or(week.weekly_budget);
        let allocated = allocation::allocate(budget, &shares);

        let rows = week_categories::Entity::find()
            .filter(week_categories::Column::WeekId.eq(week.id))
            .all(db_tx)
            .await?;
        for (category_id, amount) in allocated {
            let Some(row) = rows.iter().find(|r| r.category_id == category_id) else {
                // Row creation belongs to the reconciliation pass.
                continue;
            };
            if row.allocated_amount != amount {
                let model = week_categories::ActiveModel {
                    id: ActiveValue::Set(row.id),
                    allocated_amount: ActiveValue::Set(amount),
                    ..Default::default()
                };
                model.update(db_tx).await?;
            }
        }
    }
    Ok(())
}
