use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use super::services::{collection_priority, impact_insight, Insight};
use crate::{
    error::AppResult,
    posts::query::{query, Order, PostFilter},
    posts::repo_types::{FoodType, PostStatus},
    stats::services::compute_stats,
    state::AppState,
};

pub fn insight_routes() -> Router<AppState> {
    Router::new()
        .route("/insights/impact", get(impact))
        .route("/insights/priority", get(priority))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriorityQuery {
    pub district: Option<String>,
    #[serde(rename = "type")]
    pub food_type: Option<FoodType>,
}

#[instrument(skip(state))]
pub async fn impact(State(state): State<AppState>) -> AppResult<Json<Insight>> {
    let stats = compute_stats(
        state.posts.as_ref(),
        state.users.as_ref(),
        state.clock.as_ref(),
    )
    .await?;
    Ok(Json(impact_insight(state.advisor.as_ref(), &stats).await))
}

#[instrument(skip(state))]
pub async fn priority(
    State(state): State<AppState>,
    Query(q): Query<PriorityQuery>,
) -> AppResult<Json<Insight>> {
    let filter = PostFilter {
        district: q.district.filter(|d| !d.is_empty()),
        food_type: q.food_type,
        status: Some(PostStatus::Available),
        ..PostFilter::default()
    };
    let posts = query(
        state.posts.as_ref(),
        state.clock.as_ref(),
        &filter,
        Order::NewestFirst,
    )
    .await?;
    Ok(Json(collection_priority(state.advisor.as_ref(), &posts).await))
}
