//! Expense CRUD.
//!
//! The owning week is located by which week's date range contains the
//! expense date, creating the month lazily when needed. Edits into closed
//! weeks are allowed; the cascade re-derives the closed week's rollover and
//! the difference propagates to the first open week.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ExpenseUpdate, ExpenseView, NewExpense, ResultEngine, expenses,
    monthly_histories, weeks,
};

use super::{
    Engine, history_by_id, month_of, normalize_required_text, reconcile, require_category,
    require_user, validate_expense_amount, with_tx,
};

fn expense_view(model: &expenses::Model) -> ExpenseView {
    ExpenseView {
        id: model.id,
        week_id: model.week_id,
        category_id: model.category_id,
        amount: model.amount,
        description: model.description.clone(),
        date: model.date,
    }
}

async fn require_expense(
    db_tx: &DatabaseTransaction,
    expense_id: Uuid,
    user_id: &str,
) -> ResultEngine<expenses::Model> {
    let expense = expenses::Entity::find_by_id(expense_id)
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound("expense not exists".to_string()))?;
    if expense.user_id != user_id {
        return Err(EngineError::NotFound("expense not exists".to_string()));
    }
    Ok(expense)
}

/// The week of `history` whose date range contains `date`.
async fn owning_week(
    db_tx: &DatabaseTransaction,
    history: &monthly_histories::Model,
    date: NaiveDate,
) -> ResultEngine<weeks::Model> {
    weeks::Entity::find()
        .filter(weeks::Column::MonthlyHistoryId.eq(history.id))
        .filter(weeks::Column::StartDate.lte(date))
        .filter(weeks::Column::EndDate.gte(date))
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound("week not exists".to_string()))
}

impl Engine {
    pub async fn create_expense(
        &self,
        user_id: &str,
        new: NewExpense,
        today: NaiveDate,
    ) -> ResultEngine<ExpenseView> {
        validate_expense_amount(new.amount)?;
        let description = normalize_required_text(&new.description, "description")?;
        with_tx!(self, |db_tx| {
            let user = require_user(&db_tx, user_id).await?;
            if let Some(category_id) = new.category_id {
                require_category(&db_tx, category_id, user_id).await?;
            }

            let (year, month) = month_of(new.date);
            let history = reconcile::reconcile_month(&db_tx, &user, year, month, today).await?;
            let week = owning_week(&db_tx, &history, new.date).await?;

            let model = expenses::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_id: ActiveValue::Set(user_id.to_string()),
                week_id: ActiveValue::Set(week.id),
                category_id: ActiveValue::Set(new.category_id),
                amount: ActiveValue::Set(new.amount),
                description: ActiveValue::Set(description),
                date: ActiveValue::Set(new.date),
            };
            let model = model.insert(&db_tx).await?;

            reconcile::resync_and_recalculate(&db_tx, &history).await?;
            Ok(expense_view(&model))
        })
    }

    /// Replaces an expense's editable fields, relocating it when the new
    /// date falls into another week or month.
    pub async fn update_expense(
        &self,
        user_id: &str,
        expense_id: Uuid,
        update: ExpenseUpdate,
        today: NaiveDate,
    ) -> ResultEngine<ExpenseView> {
        validate_expense_amount(update.amount)?;
        let description = normalize_required_text(&update.description, "description")?;
        with_tx!(self, |db_tx| {
            let user = require_user(&db_tx, user_id).await?;
            let expense = require_expense(&db_tx, expense_id, user_id).await?;
            if let Some(category_id) = update.category_id {
                require_category(&db_tx, category_id, user_id).await?;
            }

            let old_week = weeks::Entity::find_by_id(expense.week_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("week not exists".to_string()))?;

            let (year, month) = month_of(update.date);
            let history = reconcile::reconcile_month(&db_tx, &user, year, month, today).await?;
            let week = owning_week(&db_tx, &history, update.date).await?;

            let model = expenses::ActiveModel {
                id: ActiveValue::Set(expense.id),
                week_id: ActiveValue::Set(week.id),
                category_id: ActiveValue::Set(update.category_id),
                amount: ActiveValue::Set(update.amount),
                description: ActiveValue::Set(description),
                date: ActiveValue::Set(update.date),
                ..Default::default()
            };
            let model = model.update(&db_tx).await?;

            reconcile::resync_and_recalculate(&db_tx, &history).await?;
            if old_week.monthly_history_id != history.id {
                let old_history = history_by_id(&db_tx, old_week.monthly_history_id).await?;
                reconcile::resync_and_recalculate(&db_tx, &old_history).await?;
            }
            Ok(expense_view(&model))
        })
    }

    pub async fn delete_expense(
        &self,
        user_id: &str,
        expense_id: Uuid,
        _today: NaiveDate,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            require_user(&db_tx, user_id).await?;
            let expense = require_expense(&db_tx, expense_id, user_id).await?;

            let week = weeks::Entity::find_by_id(expense.week_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("week not exists".to_string()))?;
            let history = history_by_id(&db_tx, week.monthly_history_id).await?;

            expenses::Entity::delete_by_id(expense.id).exec(&db_tx).await?;

            reconcile::resync_and_recalculate(&db_tx, &history).await?;
            Ok::<_, EngineError>(())
        })
    }
}
