use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::CreatePostRequest;
use super::expiry::is_stale;
use super::lifecycle::Transition;
use super::repo::{PostStore, RemoveOutcome, TransitionOutcome};
use super::repo_types::{Post, PostDraft, PostStatus};
use crate::auth::repo_types::User;
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult, Conflict};

/// Parse an expiry timestamp: RFC 3339, or a zone-less local time taken as UTC.
pub fn parse_expiry(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .or_else(|| {
            PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
                .ok()
                .map(PrimitiveDateTime::assume_utc)
        })
        .or_else(|| {
            PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
                .ok()
                .map(PrimitiveDateTime::assume_utc)
        })
}

/// Check a create request against the post invariants.
pub fn validate_draft(
    config: &AppConfig,
    provider: &User,
    req: CreatePostRequest,
    now: OffsetDateTime,
) -> AppResult<PostDraft> {
    let food_items = req.food_items.trim().to_string();
    if food_items.is_empty() {
        return Err(AppError::Validation("Food description is required".into()));
    }
    let quantity = i32::try_from(req.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| AppError::Validation("Quantity must be a positive number".into()))?;
    let district = req.district.trim().to_string();
    if !config.is_known_district(&district) {
        return Err(AppError::Validation(format!("Unknown district {district:?}")));
    }
    let expiry_time = parse_expiry(&req.expiry_time).ok_or_else(|| {
        AppError::Validation(format!("Unparseable expiry time {:?}", req.expiry_time))
    })?;
    if expiry_time <= now {
        return Err(AppError::Validation("Expiry time must be in the future".into()));
    }

    Ok(PostDraft {
        provider_id: provider.id,
        provider_name: provider.display_name().to_string(),
        food_items,
        food_type: req.food_type,
        quantity,
        district,
        location: req.location.trim().to_string(),
        expiry_time,
        contact_number: req.contact_number.trim().to_string(),
    })
}

pub async fn create_post(
    store: &dyn PostStore,
    clock: &dyn Clock,
    config: &AppConfig,
    provider: &User,
    req: CreatePostRequest,
) -> AppResult<Post> {
    let now = clock.now();
    let draft = validate_draft(config, provider, req, now)?;
    let post = store.insert(draft.into_post(Uuid::new_v4(), now)).await?;
    info!(post_id = %post.id, provider_id = %post.provider_id, district = %post.district, "post created");
    Ok(post)
}

/// Fetch one post, persisting its expiry first if it is stale.
pub async fn get_post(store: &dyn PostStore, clock: &dyn Clock, id: Uuid) -> AppResult<Post> {
    let post = store.get(id).await?.ok_or(AppError::NotFound("Post"))?;
    let now = clock.now();
    if !is_stale(&post, now) {
        return Ok(post);
    }
    match store.transition(id, Transition::Expire, now).await? {
        TransitionOutcome::Applied(p) | TransitionOutcome::Rejected(p) => Ok(p),
        TransitionOutcome::NotFound => Err(AppError::NotFound("Post")),
    }
}

/// Delete a post; only its provider may, and only while it is Available.
pub async fn delete_post(
    store: &dyn PostStore,
    clock: &dyn Clock,
    id: Uuid,
    requester: Uuid,
) -> AppResult<Post> {
    match store.remove(id, requester, clock.now()).await? {
        RemoveOutcome::Removed(post) => {
            info!(post_id = %id, %requester, "post removed");
            Ok(post)
        }
        RemoveOutcome::NotOwner => {
            warn!(post_id = %id, %requester, "delete by non-owner");
            Err(AppError::Forbidden("Only the post's provider may delete it".into()))
        }
        RemoveOutcome::Rejected(post) => {
            warn!(post_id = %id, status = post.status.as_str(), "delete of non-available post");
            Err(AppError::Conflict(conflict_for(post.status)))
        }
        RemoveOutcome::NotFound => Err(AppError::NotFound("Post")),
    }
}

pub(crate) fn conflict_for(status: PostStatus) -> Conflict {
    match status {
        PostStatus::Expired => Conflict::Expired,
        PostStatus::Collected | PostStatus::Available => Conflict::AlreadyClaimed,
    }
}
