//! The authenticated user: entity used by the auth middleware plus the
//! settings endpoints.

use api_types::user::{UserSettingsUpdate, UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use sea_orm::entity::prelude::*;

use crate::{ServerError, map_mode, map_mode_to_engine, server::ServerState, today};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub monthly_budget: i64,
    pub budget_mode: String,
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn view(user: engine::UserView) -> UserView {
    UserView {
        username: user.username,
        monthly_budget: user.monthly_budget,
        budget_mode: map_mode(user.budget_mode),
        role: user.role,
    }
}

pub async fn get(
    Extension(user): Extension<Model>,
    State(state): State<ServerState>,
) -> Result<Json<UserView>, ServerError> {
    let user = state
        .engine
        .get_or_create_user(&user.username, today())
        .await?;
    Ok(Json(view(user)))
}

pub async fn update(
    Extension(user): Extension<Model>,
    State(state): State<ServerState>,
    Json(payload): Json<UserSettingsUpdate>,
) -> Result<Json<UserView>, ServerError> {
    let update = engine::UserUpdate {
        monthly_budget: payload.monthly_budget,
        budget_mode: payload.budget_mode.map(map_mode_to_engine),
    };
    let user = state
        .engine
        .update_user(&user.username, update, today())
        .await?;
    Ok(Json(view(user)))
}

/// Wipes the user's budget data and reseeds the current month.
pub async fn reset(
    Extension(user): Extension<Model>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.reset_budget(&user.username, today()).await?;
    Ok(StatusCode::NO_CONTENT)
}
