//! Transition rules applied under a record lock by every `PostStore` adapter.

use time::OffsetDateTime;
use uuid::Uuid;

use super::expiry::effective_status;
use super::repo_types::{Post, PostStatus};

#[derive(Debug, Clone)]
pub struct Collector {
    pub ngo_id: Uuid,
    pub ngo_name: String,
}

#[derive(Debug, Clone)]
pub enum Transition {
    /// Available -> Collected.
    Collect(Collector),
    /// Available -> Expired, only once the expiry time has passed.
    Expire,
}

/// Result of applying a transition to a locked record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// The requested transition happened.
    pub accepted: bool,
    /// The record changed and must be written back.
    pub dirty: bool,
}

/// Apply `transition` to `post` as one indivisible step.
///
/// A post found expired while still stored as Available is moved to Expired
/// even when the caller asked for something else, so a rejected claim still
/// persists the expiry it discovered.
pub fn apply(post: &mut Post, transition: &Transition, now: OffsetDateTime) -> Step {
    match (effective_status(post, now), transition) {
        (PostStatus::Available, Transition::Collect(collector)) => {
            post.status = PostStatus::Collected;
            post.ngo_id = Some(collector.ngo_id);
            post.ngo_name = Some(collector.ngo_name.clone());
            post.collected_at = Some(now);
            Step {
                accepted: true,
                dirty: true,
            }
        }
        (PostStatus::Expired, _) if post.status == PostStatus::Available => {
            post.status = PostStatus::Expired;
            Step {
                accepted: matches!(transition, Transition::Expire),
                dirty: true,
            }
        }
        _ => Step {
            accepted: false,
            dirty: false,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Allowed,
    NotOwner,
    /// Post is no longer Available.
    Blocked,
}

/// Decide whether `requester` may delete `post`; reconciles a stale expiry in place.
///
/// Returns the verdict and whether the record changed.
pub fn check_removal(post: &mut Post, requester: Uuid, now: OffsetDateTime) -> (Removal, bool) {
    let effective = effective_status(post, now);
    let dirty = effective != post.status;
    post.status = effective;

    let verdict = if post.provider_id != requester {
        Removal::NotOwner
    } else if effective == PostStatus::Available {
        Removal::Allowed
    } else {
        Removal::Blocked
    };
    (verdict, dirty)
}
