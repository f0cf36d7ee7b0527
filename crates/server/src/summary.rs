//! Monthly summary endpoint.

use api_types::summary::{CategorySpendView, MonthlySummary, WeekStatusView};
use api_types::week::MonthQuery;
use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::{ServerError, map_mode, map_status, server::ServerState, today, user};

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlySummary>, ServerError> {
    let summary = state
        .engine
        .get_monthly_history(&user.username, query.year, query.month, today())
        .await?;

    Ok(Json(MonthlySummary {
        year: summary.year,
        month: summary.month,
        total_budget: summary.total_budget,
        total_spent: summary.total_spent,
        total_rollover: summary.total_rollover,
        budget_mode: map_mode(summary.budget_mode),
        average_daily_spend: summary.average_daily_spend,
        top_categories: summary
            .top_categories
            .into_iter()
            .map(|c| CategorySpendView {
                category_id: c.category_id,
                name: c.name,
                spent_amount: c.spent_amount,
            })
            .collect(),
        weeks: summary
            .weeks
            .into_iter()
            .map(|w| WeekStatusView {
                week_number: w.week_number,
                is_closed: w.is_closed,
                percentage_used: w.percentage_used,
                status: map_status(w.status),
            })
            .collect(),
    }))
}
