use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod categories;
mod expenses;
mod server;
mod summary;
mod user;
mod weeks;

pub mod types {
    pub mod user {
        pub use api_types::user::{UserSettingsUpdate, UserView};
    }

    pub mod category {
        pub use api_types::category::{
            AllocationEntry, AllocationsUpdate, CategoryNew, CategoryUpdate, CategoryView,
        };
    }

    pub mod week {
        pub use api_types::week::{MonthQuery, MonthWeeksResponse, WeekCategoryView, WeekView};
    }

    pub mod expense {
        pub use api_types::expense::{ExpenseNew, ExpenseUpdate, ExpenseView};
    }

    pub mod summary {
        pub use api_types::summary::{CategorySpendView, MonthlySummary, WeekStatusView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

//TODO: Find a better solution
#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Calendar day the engine should treat as "today".
pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

pub(crate) fn map_mode(mode: engine::BudgetMode) -> api_types::BudgetMode {
    match mode {
        engine::BudgetMode::Simple => api_types::BudgetMode::Simple,
        engine::BudgetMode::Categorized => api_types::BudgetMode::Categorized,
    }
}

pub(crate) fn map_mode_to_engine(mode: api_types::BudgetMode) -> engine::BudgetMode {
    match mode {
        api_types::BudgetMode::Simple => engine::BudgetMode::Simple,
        api_types::BudgetMode::Categorized => engine::BudgetMode::Categorized,
    }
}

pub(crate) fn map_status(status: engine::TrafficLight) -> api_types::TrafficLight {
    match status {
        engine::TrafficLight::Green => api_types::TrafficLight::Green,
        engine::TrafficLight::Yellow => api_types::TrafficLight::Yellow,
        engine::TrafficLight::Red => api_types::TrafficLight::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::Conflict("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
