//! Category API endpoints.

use api_types::category::{AllocationsUpdate, CategoryNew, CategoryUpdate, CategoryView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, today, user};

fn view(category: engine::CategoryView) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        allocation: category.allocation,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let categories = state.engine.list_categories(&user.username).await?;
    Ok(Json(categories.into_iter().map(view).collect()))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(&user.username, &payload.name, payload.allocation)
        .await?;
    Ok((StatusCode::CREATED, Json(view(category))))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state
        .engine
        .update_category(
            &user.username,
            id,
            payload.name.as_deref(),
            payload.allocation,
            today(),
        )
        .await?;
    Ok(Json(view(category)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_category(&user.username, id, today())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_allocations(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AllocationsUpdate>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let updates: Vec<engine::AllocationUpdate> = payload
        .allocations
        .iter()
        .map(|entry| engine::AllocationUpdate {
            category_id: entry.category_id,
            allocation: entry.allocation,
        })
        .collect();
    let categories = state
        .engine
        .update_category_allocations(&user.username, &updates, today())
        .await?;
    Ok(Json(categories.into_iter().map(view).collect()))
}
