use tracing::{info, warn};
use uuid::Uuid;

use super::lifecycle::{Collector, Transition};
use super::repo::{PostStore, TransitionOutcome};
use super::repo_types::Post;
use super::services::conflict_for;
use crate::clock::Clock;
use crate::error::{AppError, AppResult};

/// Claim an Available post for an NGO. At most one claim per post succeeds.
///
/// The status check and the write happen inside one store transition, so a
/// losing claim sees the winner's Collected state (or the expiry that beat
/// both) and fails with a conflict instead of overwriting it.
pub async fn claim_post(
    store: &dyn PostStore,
    clock: &dyn Clock,
    post_id: Uuid,
    collector: Collector,
) -> AppResult<Post> {
    let ngo_id = collector.ngo_id;
    match store
        .transition(post_id, Transition::Collect(collector), clock.now())
        .await?
    {
        TransitionOutcome::Applied(post) => {
            info!(%post_id, %ngo_id, quantity = post.quantity, "post collected");
            Ok(post)
        }
        TransitionOutcome::Rejected(post) => {
            warn!(%post_id, %ngo_id, status = post.status.as_str(), "claim lost");
            Err(AppError::Conflict(conflict_for(post.status)))
        }
        TransitionOutcome::NotFound => Err(AppError::NotFound("Post")),
    }
}
