//! Expense API endpoints.

use api_types::expense::{ExpenseNew, ExpenseUpdate, ExpenseView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, today, user};

fn view(expense: engine::ExpenseView) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        week_id: expense.week_id,
        category_id: expense.category_id,
        amount: expense.amount,
        description: expense.description,
        date: expense.date,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let new = engine::NewExpense {
        amount: payload.amount,
        description: payload.description,
        date: payload.date,
        category_id: payload.category_id,
    };
    let expense = state
        .engine
        .create_expense(&user.username, new, today())
        .await?;
    Ok((StatusCode::CREATED, Json(view(expense))))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseView>, ServerError> {
    let update = engine::ExpenseUpdate {
        amount: payload.amount,
        description: payload.description,
        date: payload.date,
        category_id: payload.category_id,
    };
    let expense = state
        .engine
        .update_expense(&user.username, id, update, today())
        .await?;
    Ok(Json(view(expense)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_expense(&user.username, id, today())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
