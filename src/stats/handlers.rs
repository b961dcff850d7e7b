use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::services::{compute_stats, DashboardStats};
use crate::{error::AppResult, state::AppState};

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}

#[instrument(skip(state))]
pub async fn get_stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    let stats = compute_stats(
        state.posts.as_ref(),
        state.users.as_ref(),
        state.clock.as_ref(),
    )
    .await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[tokio::test]
    async fn empty_platform_reports_zeroes() {
        let Json(stats) = get_stats(State(AppState::fake())).await.unwrap();
        assert_eq!(stats, DashboardStats::default());
    }
}
