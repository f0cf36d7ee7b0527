use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, EntityTrait};

use std::sync::Arc;

use crate::{categories, expenses, summary, user, weeks};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Basic-auth middleware with first-use registration: unknown usernames are
/// created with the presented password, known ones must match it exactly.
async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let found: Option<user::Model> = user::Entity::find_by_id(auth_header.username())
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let user = match found {
        Some(user) => {
            if user.password != auth_header.password() {
                return Err(StatusCode::UNAUTHORIZED);
            }
            user
        }
        None => {
            let model = user::ActiveModel {
                username: ActiveValue::Set(auth_header.username().to_string()),
                password: ActiveValue::Set(auth_header.password().to_string()),
                monthly_budget: ActiveValue::Set(engine::DEFAULT_MONTHLY_BUDGET),
                budget_mode: ActiveValue::Set("simple".to_string()),
                role: ActiveValue::Set("user".to_string()),
            };
            model
                .insert(&state.db)
                .await
                .map_err(|_| StatusCode::UNAUTHORIZED)?
        }
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/user", get(user::get).patch(user::update))
        .route("/user/reset", post(user::reset))
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            axum::routing::patch(categories::update).delete(categories::remove),
        )
        .route(
            "/categories/allocations",
            put(categories::update_allocations),
        )
        .route("/weeks", get(weeks::list))
        .route("/weeks/{id}/close", post(weeks::close))
        .route("/weeks/{id}/reopen", post(weeks::reopen))
        .route("/expenses", post(expenses::create))
        .route(
            "/expenses/{id}",
            axum::routing::patch(expenses::update).delete(expenses::remove),
        )
        .route("/history", get(summary::get))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
