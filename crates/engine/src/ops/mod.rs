use chrono::Datelike;
use sea_orm::{
    ActiveValue, DatabaseConnection, DatabaseTransaction, QueryFilter, prelude::*,
};
use uuid::Uuid;

use crate::{BudgetMode, EngineError, ResultEngine, monthly_histories};

mod categories;
mod expenses;
mod history;
mod recalc;
mod reconcile;
mod users;
mod weeks;

/// Monthly budget seeded for a user on first access.
pub const DEFAULT_MONTHLY_BUDGET: i64 = 200_000;

/// Smallest accepted monthly budget.
pub const MIN_MONTHLY_BUDGET: i64 = 1_000;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn validate_expense_amount(amount: i64) -> ResultEngine<()> {
    if amount <= 0 {
        return Err(EngineError::Validation("amount must be > 0".to_string()));
    }
    Ok(())
}

fn validate_monthly_budget(budget: i64) -> ResultEngine<()> {
    if budget < MIN_MONTHLY_BUDGET {
        return Err(EngineError::Validation(format!(
            "monthly budget must be at least {MIN_MONTHLY_BUDGET}"
        )));
    }
    Ok(())
}

fn history_mode(history: &monthly_histories::Model) -> ResultEngine<BudgetMode> {
    BudgetMode::try_from(history.budget_mode.as_str())
}

/// (year, month) of the previous calendar month.
fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

/// (year, month) of the next calendar month.
fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

fn month_of(date: chrono::NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

async fn require_user(
    db_tx: &DatabaseTransaction,
    user_id: &str,
) -> ResultEngine<crate::users::Model> {
    crate::users::Entity::find_by_id(user_id)
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound("user not exists".to_string()))
}

async fn require_week(
    db_tx: &DatabaseTransaction,
    week_id: Uuid,
    user_id: &str,
) -> ResultEngine<crate::weeks::Model> {
    let week = crate::weeks::Entity::find_by_id(week_id)
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound("week not exists".to_string()))?;
    if week.user_id != user_id {
        return Err(EngineError::NotFound("week not exists".to_string()));
    }
    Ok(week)
}

async fn require_category(
    db_tx: &DatabaseTransaction,
    category_id: Uuid,
    user_id: &str,
) -> ResultEngine<crate::categories::Model> {
    let category = crate::categories::Entity::find_by_id(category_id)
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound("category not exists".to_string()))?;
    if category.user_id != user_id {
        return Err(EngineError::NotFound("category not exists".to_string()));
    }
    Ok(category)
}

async fn find_history(
    db_tx: &DatabaseTransaction,
    user_id: &str,
    year: i32,
    month: u32,
) -> ResultEngine<Option<monthly_histories::Model>> {
    Ok(monthly_histories::Entity::find()
        .filter(monthly_histories::Column::UserId.eq(user_id))
        .filter(monthly_histories::Column::Year.eq(year))
        .filter(monthly_histories::Column::Month.eq(month as i32))
        .one(db_tx)
        .await?)
}

async fn history_by_id(
    db_tx: &DatabaseTransaction,
    history_id: Uuid,
) -> ResultEngine<monthly_histories::Model> {
    monthly_histories::Entity::find_by_id(history_id)
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound("monthly history not exists".to_string()))
}

/// Finds or creates the monthly history for (user, year, month), snapshotting
/// the user's budget and mode on creation. Weeks themselves are materialized
/// by the reconciliation pass.
async fn ensure_history(
    db_tx: &DatabaseTransaction,
    user: &crate::users::Model,
    year: i32,
    month: u32,
) -> ResultEngine<monthly_histories::Model> {
    crate::calendar::month_bounds(year, month)?;
    if let Some(history) = find_history(db_tx, &user.username, year, month).await? {
        return Ok(history);
    }

    let model = monthly_histories::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4()),
        user_id: ActiveValue::Set(user.username.clone()),
        year: ActiveValue::Set(year),
        month: ActiveValue::Set(month as i32),
        total_budget: ActiveValue::Set(user.monthly_budget),
        total_spent: ActiveValue::Set(0),
        total_rollover: ActiveValue::Set(0),
        budget_mode: ActiveValue::Set(user.budget_mode.clone()),
    };
    Ok(model.insert(db_tx).await?)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
