//! User settings operations: first-access seeding, budget/mode changes,
//! full budget reset.

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    BudgetMode, EngineError, ResultEngine, UserUpdate, UserView, allocation, categories,
    expenses, monthly_histories, week_categories, weeks,
};

use super::{
    DEFAULT_MONTHLY_BUDGET, Engine, ensure_history, month_of, reconcile, require_user,
    validate_monthly_budget, with_tx,
};

fn user_view(user: &crate::users::Model) -> ResultEngine<UserView> {
    Ok(UserView {
        username: user.username.clone(),
        monthly_budget: user.monthly_budget,
        budget_mode: BudgetMode::try_from(user.budget_mode.as_str())?,
        role: user.role.clone(),
    })
}

/// Inserts the fixed default category set for a user.
pub(super) async fn seed_default_categories(
    db_tx: &DatabaseTransaction,
    user_id: &str,
) -> ResultEngine<()> {
    for (name, allocation) in allocation::DEFAULT_CATEGORIES {
        let model = categories::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            user_id: ActiveValue::Set(user_id.to_string()),
            name: ActiveValue::Set(name.to_string()),
            allocation: ActiveValue::Set(allocation),
        };
        model.insert(db_tx).await?;
    }
    Ok(())
}

impl Engine {
    /// Returns the user, creating it with default settings and seeding the
    /// current month's weeks on first access.
    pub async fn get_or_create_user(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> ResultEngine<UserView> {
        with_tx!(self, |db_tx| {
            let user = match crate::users::Entity::find_by_id(user_id).one(&db_tx).await? {
                Some(user) => user,
                None => {
                    let model = crate::users::ActiveModel {
                        username: ActiveValue::Set(user_id.to_string()),
                        password: ActiveValue::Set(String::new()),
                        monthly_budget: ActiveValue::Set(DEFAULT_MONTHLY_BUDGET),
                        budget_mode: ActiveValue::Set(BudgetMode::Simple.as_str().to_string()),
                        role: ActiveValue::Set("user".to_string()),
                    };
                    model.insert(&db_tx).await?
                }
            };

            let (year, month) = month_of(today);
            reconcile::reconcile_month(&db_tx, &user, year, month, today).await?;
            user_view(&user)
        })
    }

    /// Applies a settings patch. A budget change re-derives the current
    /// month's weeks; a mode change additionally drops or rebuilds the
    /// month's category allocations.
    pub async fn update_user(
        &self,
        user_id: &str,
        update: UserUpdate,
        today: NaiveDate,
    ) -> ResultEngine<UserView> {
        with_tx!(self, |db_tx| {
            let user = require_user(&db_tx, user_id).await?;
            let old_mode = BudgetMode::try_from(user.budget_mode.as_str())?;

            let new_budget = match update.monthly_budget {
                Some(budget) => {
                    validate_monthly_budget(budget)?;
                    budget
                }
                None => user.monthly_budget,
            };
            let new_mode = update.budget_mode.unwrap_or(old_mode);

            if new_mode == BudgetMode::Categorized {
                let count = categories::Entity::find()
                    .filter(categories::Column::UserId.eq(user_id))
                    .count(&db_tx)
                    .await?;
                if count == 0 {
                    seed_default_categories(&db_tx, user_id).await?;
                }
            }

            let model = crate::users::ActiveModel {
                username: ActiveValue::Set(user.username.clone()),
                monthly_budget: ActiveValue::Set(new_budget),
                budget_mode: ActiveValue::Set(new_mode.as_str().to_string()),
                ..Default::default()
            };
            let user = model.update(&db_tx).await?;

            // Refresh the current month snapshot; past months keep theirs.
            let (year, month) = month_of(today);
            let history = ensure_history(&db_tx, &user, year, month).await?;
            let model = monthly_histories::ActiveModel {
                id: ActiveValue::Set(history.id),
                total_budget: ActiveValue::Set(new_budget),
                budget_mode: ActiveValue::Set(new_mode.as_str().to_string()),
                ..Default::default()
            };
            let history = model.update(&db_tx).await?;

            if old_mode == BudgetMode::Categorized && new_mode == BudgetMode::Simple {
                reconcile::drop_week_categories(&db_tx, &history).await?;
            }

            reconcile::reconcile_month(&db_tx, &user, year, month, today).await?;
            user_view(&user)
        })
    }

    /// Deletes all of the user's expenses, weeks, categories and histories,
    /// then reseeds the current month from the user's settings.
    pub async fn reset_budget(&self, user_id: &str, today: NaiveDate) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let user = require_user(&db_tx, user_id).await?;

            let week_ids: Vec<Uuid> = weeks::Entity::find()
                .filter(weeks::Column::UserId.eq(user_id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|w| w.id)
                .collect();
            if !week_ids.is_empty() {
                week_categories::Entity::delete_many()
                    .filter(week_categories::Column::WeekId.is_in(week_ids))
                    .exec(&db_tx)
                    .await?;
            }
            expenses::Entity::delete_many()
                .filter(expenses::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;
            weeks::Entity::delete_many()
                .filter(weeks::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;
            monthly_histories::Entity::delete_many()
                .filter(monthly_histories::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;
            categories::Entity::delete_many()
                .filter(categories::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;

            if BudgetMode::try_from(user.budget_mode.as_str())? == BudgetMode::Categorized {
                seed_default_categories(&db_tx, user_id).await?;
            }

            let (year, month) = month_of(today);
            reconcile::reconcile_month(&db_tx, &user, year, month, today).await?;
            Ok::<_, EngineError>(())
        })
    }
}
