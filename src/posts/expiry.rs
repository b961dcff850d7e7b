use time::OffsetDateTime;

use super::repo_types::{Post, PostStatus};

/// Status the post should report at `now`.
///
/// Stored status lags real time until a read reconciles it, so every
/// liveness check goes through here instead of reading `post.status`.
pub fn effective_status(post: &Post, now: OffsetDateTime) -> PostStatus {
    if !post.status.is_terminal() && post.expiry_time < now {
        PostStatus::Expired
    } else {
        post.status
    }
}

/// True when the stored status is behind the effective one.
pub fn is_stale(post: &Post, now: OffsetDateTime) -> bool {
    effective_status(post, now) != post.status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::repo_types::{FoodType, PostDraft};
    use time::macros::datetime;
    use uuid::Uuid;

    fn post_expiring_at(expiry: OffsetDateTime) -> Post {
        PostDraft {
            provider_id: Uuid::new_v4(),
            provider_name: "Provider".into(),
            food_items: "Bread".into(),
            food_type: FoodType::Veg,
            quantity: 10,
            district: "Alpha".into(),
            location: "Dock 3".into(),
            expiry_time: expiry,
            contact_number: "555-0101".into(),
        }
        .into_post(Uuid::new_v4(), datetime!(2025-01-01 08:00 UTC))
    }

    #[test]
    fn available_before_expiry_stays_available() {
        let post = post_expiring_at(datetime!(2025-01-01 12:00 UTC));
        let now = datetime!(2025-01-01 11:59 UTC);
        assert_eq!(effective_status(&post, now), PostStatus::Available);
        assert!(!is_stale(&post, now));
    }

    #[test]
    fn exactly_at_expiry_is_still_available() {
        let post = post_expiring_at(datetime!(2025-01-01 12:00 UTC));
        assert_eq!(
            effective_status(&post, datetime!(2025-01-01 12:00 UTC)),
            PostStatus::Available
        );
    }

    #[test]
    fn available_past_expiry_is_expired() {
        let post = post_expiring_at(datetime!(2025-01-01 12:00 UTC));
        let now = datetime!(2025-01-01 12:00:01 UTC);
        assert_eq!(effective_status(&post, now), PostStatus::Expired);
        assert!(is_stale(&post, now));
    }

    #[test]
    fn terminal_statuses_are_never_reinterpreted() {
        let mut post = post_expiring_at(datetime!(2025-01-01 12:00 UTC));
        post.status = PostStatus::Collected;
        let later = datetime!(2025-06-01 00:00 UTC);
        assert_eq!(effective_status(&post, later), PostStatus::Collected);

        post.status = PostStatus::Expired;
        let earlier = datetime!(2024-01-01 00:00 UTC);
        assert_eq!(effective_status(&post, earlier), PostStatus::Expired);
    }
}
