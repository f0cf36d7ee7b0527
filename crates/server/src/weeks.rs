//! Week API endpoints.

use api_types::week::{MonthQuery, MonthWeeksResponse, WeekCategoryView, WeekView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{ServerError, map_mode, map_status, server::ServerState, today, user};

fn category_view(category: engine::WeekCategoryView) -> WeekCategoryView {
    WeekCategoryView {
        category_id: category.category_id,
        name: category.name,
        allocation: category.allocation,
        allocated_amount: category.allocated_amount,
        spent_amount: category.spent_amount,
        percentage_used: category.percentage_used,
        status: map_status(category.status),
    }
}

pub(crate) fn week_view(week: engine::WeekView) -> WeekView {
    WeekView {
        id: week.id,
        week_number: week.week_number,
        start_date: week.start_date,
        end_date: week.end_date,
        weekly_budget: week.weekly_budget,
        spent_amount: week.spent_amount,
        rollover_amount: week.rollover_amount,
        is_closed: week.is_closed,
        percentage_used: week.percentage_used,
        status: map_status(week.status),
        categories: week.categories.into_iter().map(category_view).collect(),
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthWeeksResponse>, ServerError> {
    let month = state
        .engine
        .get_weeks(&user.username, query.year, query.month, today())
        .await?;
    Ok(Json(MonthWeeksResponse {
        year: month.year,
        month: month.month,
        total_budget: month.total_budget,
        total_spent: month.total_spent,
        total_rollover: month.total_rollover,
        budget_mode: map_mode(month.budget_mode),
        weeks: month.weeks.into_iter().map(week_view).collect(),
    }))
}

pub async fn close(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WeekView>, ServerError> {
    let week = state.engine.close_week(&user.username, id).await?;
    Ok(Json(week_view(week)))
}

pub async fn reopen(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WeekView>, ServerError> {
    let week = state.engine.reopen_week(&user.username, id).await?;
    Ok(Json(week_view(week)))
}
