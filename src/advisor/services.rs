use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

use super::Advisor;
use crate::posts::repo_types::Post;
use crate::stats::services::DashboardStats;

/// Rough weight of food rescued per meal served.
pub const KG_PER_MEAL: f64 = 0.4;

pub const PRIORITY_FALLBACK: &str =
    "Focus on batches with the earliest expiry times and highest quantity.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub insight: String,
    /// True when the advisor was unavailable and canned text was used.
    pub fallback: bool,
}

impl Insight {
    fn canned(text: String) -> Self {
        Self {
            insight: text,
            fallback: true,
        }
    }
}

pub fn food_saved_kg(meals: i64) -> f64 {
    (meals as f64 * KG_PER_MEAL * 10.0).round() / 10.0
}

pub fn impact_fallback(meals: i64, kg_saved: f64) -> String {
    format!("Together, we've served {meals} meals and saved {kg_saved}kg of food. Every plate counts!")
}

/// One line per post, in the order given.
pub fn priority_digest(posts: &[Post]) -> String {
    posts
        .iter()
        .map(|p| {
            let expires = p
                .expiry_time
                .format(&Rfc3339)
                .unwrap_or_else(|_| p.expiry_time.to_string());
            format!(
                "{} ({} ppl) at {}, expires {}",
                p.food_items, p.quantity, p.district, expires
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub async fn impact_insight(advisor: &dyn Advisor, stats: &DashboardStats) -> Insight {
    let meals = stats.total_meals_served;
    let kg_saved = food_saved_kg(meals);
    match advisor.impact_insight(meals, kg_saved).await {
        Ok(text) if !text.trim().is_empty() => Insight {
            insight: text,
            fallback: false,
        },
        Ok(_) => Insight::canned(impact_fallback(meals, kg_saved)),
        Err(e) => {
            warn!(error = %e, "impact insight unavailable");
            Insight::canned(impact_fallback(meals, kg_saved))
        }
    }
}

pub async fn collection_priority(advisor: &dyn Advisor, posts: &[Post]) -> Insight {
    if posts.is_empty() {
        debug!("no available posts to prioritise");
        return Insight::canned(PRIORITY_FALLBACK.to_string());
    }
    match advisor.collection_priority(&priority_digest(posts)).await {
        Ok(text) if !text.trim().is_empty() => Insight {
            insight: text,
            fallback: false,
        },
        Ok(_) => Insight::canned(PRIORITY_FALLBACK.to_string()),
        Err(e) => {
            warn!(error = %e, posts = posts.len(), "collection priority unavailable");
            Insight::canned(PRIORITY_FALLBACK.to_string())
        }
    }
}
