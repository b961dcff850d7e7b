use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::lifecycle::{self, Removal, Transition};
use super::repo::{PostStore, RemoveOutcome, TransitionOutcome};
use super::repo_types::Post;

/// `None` marks a post deleted while another task was waiting on its lock.
type Slot = Arc<Mutex<Option<Post>>>;

/// Process-local post store with one async mutex per post.
#[derive(Default)]
pub struct InMemoryPostStore {
    posts: DashMap<Uuid, Slot>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: Uuid) -> Option<Slot> {
        self.posts.get(&id).map(|entry| Arc::clone(entry.value()))
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert(&self, post: Post) -> anyhow::Result<Post> {
        match self.posts.entry(post.id) {
            Entry::Occupied(_) => anyhow::bail!("duplicate post id {}", post.id),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(Some(post.clone()))));
                Ok(post)
            }
        }
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let Some(slot) = self.slot(id) else {
            return Ok(None);
        };
        let guard = slot.lock().await;
        Ok(guard.clone())
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Post>> {
        let slots: Vec<Slot> = self
            .posts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut out = Vec::with_capacity(slots.len());
        for slot in slots {
            if let Some(post) = slot.lock().await.as_ref() {
                out.push(post.clone());
            }
        }
        Ok(out)
    }

    async fn transition(
        &self,
        id: Uuid,
        transition: Transition,
        now: OffsetDateTime,
    ) -> anyhow::Result<TransitionOutcome> {
        let Some(slot) = self.slot(id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        let mut guard = slot.lock().await;
        let Some(post) = guard.as_mut() else {
            return Ok(TransitionOutcome::NotFound);
        };

        let step = lifecycle::apply(post, &transition, now);
        Ok(if step.accepted {
            TransitionOutcome::Applied(post.clone())
        } else {
            TransitionOutcome::Rejected(post.clone())
        })
    }

    async fn remove(
        &self,
        id: Uuid,
        requester: Uuid,
        now: OffsetDateTime,
    ) -> anyhow::Result<RemoveOutcome> {
        let Some(slot) = self.slot(id) else {
            return Ok(RemoveOutcome::NotFound);
        };
        let mut guard = slot.lock().await;
        let Some(post) = guard.as_mut() else {
            return Ok(RemoveOutcome::NotFound);
        };

        match lifecycle::check_removal(post, requester, now).0 {
            Removal::Allowed => {
                let removed = guard.take();
                self.posts.remove(&id);
                Ok(removed.map_or(RemoveOutcome::NotFound, RemoveOutcome::Removed))
            }
            Removal::NotOwner => Ok(RemoveOutcome::NotOwner),
            Removal::Blocked => Ok(RemoveOutcome::Rejected(post.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::lifecycle::Collector;
    use crate::posts::repo_types::{FoodType, PostDraft, PostStatus};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-04-01 10:00 UTC);

    fn draft(expiry: OffsetDateTime) -> Post {
        PostDraft {
            provider_id: Uuid::new_v4(),
            provider_name: "Canteen".into(),
            food_items: "Dal".into(),
            food_type: FoodType::Veg,
            quantity: 30,
            district: "Alpha".into(),
            location: "Kitchen".into(),
            expiry_time: expiry,
            contact_number: "555-0103".into(),
        }
        .into_post(Uuid::new_v4(), datetime!(2025-04-01 09:00 UTC))
    }

    fn collector() -> Transition {
        Transition::Collect(Collector {
            ngo_id: Uuid::new_v4(),
            ngo_name: "Helping Hands".into(),
        })
    }

    #[tokio::test]
    async fn insert_get_and_list() {
        let store = InMemoryPostStore::new();
        let post = store.insert(draft(datetime!(2025-04-01 12:00 UTC))).await.unwrap();
        assert_eq!(store.get(post.id).await.unwrap(), Some(post.clone()));
        assert_eq!(store.list_all().await.unwrap(), vec![post.clone()]);
        assert!(store.insert(post).await.is_err());
        assert_eq!(store.get(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn transition_persists_and_rejects_repeat() {
        let store = InMemoryPostStore::new();
        let post = store.insert(draft(datetime!(2025-04-01 12:00 UTC))).await.unwrap();

        let first = store.transition(post.id, collector(), NOW).await.unwrap();
        let TransitionOutcome::Applied(collected) = first else {
            panic!("expected the first claim to apply");
        };
        assert_eq!(collected.status, PostStatus::Collected);
        assert_eq!(store.get(post.id).await.unwrap(), Some(collected.clone()));

        let second = store.transition(post.id, collector(), NOW).await.unwrap();
        assert_eq!(second, TransitionOutcome::Rejected(collected));
    }

    #[tokio::test]
    async fn remove_tombstones_then_reports_not_found() {
        let store = InMemoryPostStore::new();
        let post = store.insert(draft(datetime!(2025-04-01 12:00 UTC))).await.unwrap();

        assert_eq!(
            store.remove(post.id, Uuid::new_v4(), NOW).await.unwrap(),
            RemoveOutcome::NotOwner
        );
        assert!(matches!(
            store.remove(post.id, post.provider_id, NOW).await.unwrap(),
            RemoveOutcome::Removed(_)
        ));
        assert_eq!(
            store.remove(post.id, post.provider_id, NOW).await.unwrap(),
            RemoveOutcome::NotFound
        );
        assert_eq!(
            store.transition(post.id, collector(), NOW).await.unwrap(),
            TransitionOutcome::NotFound
        );
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_remove_of_stale_post_persists_expiry() {
        let store = InMemoryPostStore::new();
        let post = store.insert(draft(datetime!(2025-04-01 09:30 UTC))).await.unwrap();

        let outcome = store.remove(post.id, post.provider_id, NOW).await.unwrap();
        assert!(matches!(outcome, RemoveOutcome::Rejected(ref p) if p.status == PostStatus::Expired));
        let stored = store.get(post.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Expired);
    }
}
