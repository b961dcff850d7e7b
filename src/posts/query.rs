//! Availability queries with lazy, read-triggered expiry.
//!
//! There is no background sweep. A post past its expiry keeps its stored
//! Available status until some read reaches it; [`reconcile`] then rewrites it
//! to Expired through the store's per-record transition. Two readers racing on
//! the same stale post may briefly disagree, and both converge once either
//! write lands.

use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::dto::ListPostsQuery;
use super::expiry::is_stale;
use super::lifecycle::Transition;
use super::repo::{PostStore, TransitionOutcome};
use super::repo_types::{FoodType, Post, PostStatus};
use crate::clock::Clock;

/// Exact-match predicates; `None` matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub district: Option<String>,
    pub food_type: Option<FoodType>,
    pub status: Option<PostStatus>,
    pub provider_id: Option<Uuid>,
    pub ngo_id: Option<Uuid>,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        self.district.as_ref().map_or(true, |d| *d == post.district)
            && self.food_type.map_or(true, |t| t == post.food_type)
            && self.status.map_or(true, |s| s == post.status)
            && self.provider_id.map_or(true, |id| id == post.provider_id)
            && self.ngo_id.map_or(true, |id| Some(id) == post.ngo_id)
    }
}

impl From<ListPostsQuery> for PostFilter {
    fn from(q: ListPostsQuery) -> Self {
        Self {
            district: q.district.filter(|d| !d.is_empty()),
            food_type: q.food_type,
            status: Some(q.status.unwrap_or(PostStatus::Available)),
            provider_id: None,
            ngo_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Most recent `created_at` first, for presentation.
    NewestFirst,
    /// Store order, for aggregation.
    Unordered,
}

/// Snapshot of every post with stale expiries written back to the store.
pub async fn reconcile(store: &dyn PostStore, now: OffsetDateTime) -> anyhow::Result<Vec<Post>> {
    let posts = store.list_all().await?;
    let mut out = Vec::with_capacity(posts.len());
    for post in posts {
        if !is_stale(&post, now) {
            out.push(post);
            continue;
        }
        match store.transition(post.id, Transition::Expire, now).await? {
            TransitionOutcome::Applied(p) => {
                debug!(post_id = %p.id, expiry_time = %p.expiry_time, "post expired on read");
                out.push(p);
            }
            // Another writer settled it first.
            TransitionOutcome::Rejected(p) => out.push(p),
            TransitionOutcome::NotFound => {}
        }
    }
    Ok(out)
}

pub async fn query(
    store: &dyn PostStore,
    clock: &dyn Clock,
    filter: &PostFilter,
    order: Order,
) -> anyhow::Result<Vec<Post>> {
    let mut posts: Vec<Post> = reconcile(store, clock.now())
        .await?
        .into_iter()
        .filter(|p| filter.matches(p))
        .collect();
    if order == Order::NewestFirst {
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
    Ok(posts)
}
