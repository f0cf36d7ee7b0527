//! Category CRUD and allocation rewrites.
//!
//! The engine does not hard-block allocation sets that do not sum to 100
//! while categories are created or edited one by one (the client enforces
//! that before allocation-dependent submissions); the bulk rewrite entry
//! point does validate the final sum.

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    AllocationUpdate, BudgetMode, CategoryView, EngineError, ResultEngine, allocation,
    categories, expenses, week_categories,
};

use super::{
    Engine, month_of, normalize_required_text, reconcile, require_category, require_user,
    with_tx,
};

fn category_view(model: &categories::Model) -> CategoryView {
    CategoryView {
        id: model.id,
        name: model.name.clone(),
        allocation: model.allocation,
    }
}

impl Engine {
    pub async fn list_categories(&self, user_id: &str) -> ResultEngine<Vec<CategoryView>> {
        with_tx!(self, |db_tx| {
            require_user(&db_tx, user_id).await?;
            let models = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id))
                .order_by_asc(categories::Column::Name)
                .all(&db_tx)
                .await?;
            Ok(models.iter().map(category_view).collect())
        })
    }

    pub async fn create_category(
        &self,
        user_id: &str,
        name: &str,
        allocation: f64,
    ) -> ResultEngine<CategoryView> {
        let name = normalize_required_text(name, "category name")?;
        allocation::validate_percentage(allocation)?;
        with_tx!(self, |db_tx| {
            require_user(&db_tx, user_id).await?;
            let duplicate = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id))
                .filter(categories::Column::Name.eq(name.as_str()))
                .one(&db_tx)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::Conflict(format!(
                    "category '{name}' already exists"
                )));
            }

            let model = categories::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_id: ActiveValue::Set(user_id.to_string()),
                name: ActiveValue::Set(name.clone()),
                allocation: ActiveValue::Set(allocation),
            };
            let model = model.insert(&db_tx).await?;
            Ok(category_view(&model))
        })
    }

    pub async fn update_category(
        &self,
        user_id: &str,
        category_id: Uuid,
        name: Option<&str>,
        allocation: Option<f64>,
        today: NaiveDate,
    ) -> ResultEngine<CategoryView> {
        with_tx!(self, |db_tx| {
            let user = require_user(&db_tx, user_id).await?;
            let category = require_category(&db_tx, category_id, user_id).await?;

            let mut model: categories::ActiveModel = category.into();
            if let Some(name) = name {
                model.name = ActiveValue::Set(normalize_required_text(name, "category name")?);
            }
            if let Some(allocation) = allocation {
                allocation::validate_percentage(allocation)?;
                model.allocation = ActiveValue::Set(allocation);
            }
            let model = model.update(&db_tx).await?;

            // A changed percentage must be reflected in the current month's
            // per-week allocations.
            if BudgetMode::try_from(user.budget_mode.as_str())? == BudgetMode::Categorized {
                let (year, month) = month_of(today);
                reconcile::reconcile_month(&db_tx, &user, year, month, today).await?;
            }
            Ok(category_view(&model))
        })
    }

    /// Deletes a category, detaching its expenses and removing its per-week
    /// allocation rows.
    pub async fn delete_category(
        &self,
        user_id: &str,
        category_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let user = require_user(&db_tx, user_id).await?;
            let category = require_category(&db_tx, category_id, user_id).await?;

            expenses::Entity::update_many()
                .col_expr(expenses::Column::CategoryId, Expr::value(Option::<Uuid>::None))
                .filter(expenses::Column::CategoryId.eq(category_id))
                .exec(&db_tx)
                .await?;
            week_categories::Entity::delete_many()
                .filter(week_categories::Column::CategoryId.eq(category_id))
                .exec(&db_tx)
                .await?;
            categories::Entity::delete_by_id(category.id)
                .exec(&db_tx)
                .await?;

            let (year, month) = month_of(today);
            reconcile::reconcile_month(&db_tx, &user, year, month, today).await?;
            Ok::<_, EngineError>(())
        })
    }

    /// Rewrites category percentages in bulk and realigns every week of the
    /// current month. The resulting full set must sum to 100.
    pub async fn update_category_allocations(
        &self,
        user_id: &str,
        updates: &[AllocationUpdate],
        today: NaiveDate,
    ) -> ResultEngine<Vec<CategoryView>> {
        with_tx!(self, |db_tx| {
            let user = require_user(&db_tx, user_id).await?;
            let models = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id))
                .order_by_asc(categories::Column::Name)
                .all(&db_tx)
                .await?;

            let mut final_allocations: Vec<f64> = Vec::with_capacity(models.len());
            for model in &models {
                let updated = updates
                    .iter()
                    .find(|u| u.category_id == model.id)
                    .map(|u| u.allocation)
                    .unwrap_or(model.allocation);
                final_allocations.push(updated);
            }
            for update in updates {
                if !models.iter().any(|m| m.id == update.category_id) {
                    return Err(EngineError::NotFound("category not exists".to_string()));
                }
            }
            allocation::validate_allocations(&final_allocations)?;

            let mut out = Vec::with_capacity(models.len());
            for (model, allocation) in models.into_iter().zip(final_allocations) {
                if (model.allocation - allocation).abs() > f64::EPSILON {
                    let active = categories::ActiveModel {
                        id: ActiveValue::Set(model.id),
                        allocation: ActiveValue::Set(allocation),
                        ..Default::default()
                    };
                    out.push(category_view(&active.update(&db_tx).await?));
                } else {
                    out.push(category_view(&model));
                }
            }

            let (year, month) = month_of(today);
            reconcile::reconcile_month(&db_tx, &user, year, month, today).await?;
            Ok(out)
        })
    }
}
