//! Best-effort advisory text. Nothing here can fail a request: every error is
//! logged and replaced by a canned fallback.

pub mod gemini;
pub mod handlers;
pub mod services;

use async_trait::async_trait;

use crate::state::AppState;
use axum::Router;

#[async_trait]
pub trait Advisor: Send + Sync {
    /// Short impact summary for `meals` served and `kg_saved` of food.
    async fn impact_insight(&self, meals: i64, kg_saved: f64) -> anyhow::Result<String>;
    /// Collection-order recommendation for a digest of available posts.
    async fn collection_priority(&self, digest: &str) -> anyhow::Result<String>;
}

/// Used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAdvisor;

#[async_trait]
impl Advisor for DisabledAdvisor {
    async fn impact_insight(&self, _meals: i64, _kg_saved: f64) -> anyhow::Result<String> {
        anyhow::bail!("advisor disabled")
    }

    async fn collection_priority(&self, _digest: &str) -> anyhow::Result<String> {
        anyhow::bail!("advisor disabled")
    }
}

pub fn router() -> Router<AppState> {
    handlers::insight_routes()
}
