use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use super::lifecycle::{self, Removal, Transition};
use super::repo_types::{Post, PostRow};

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied(Post),
    /// The post refused the transition; carries its reconciled state.
    Rejected(Post),
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    Removed(Post),
    NotOwner,
    /// Post is no longer Available; carries its reconciled state.
    Rejected(Post),
    NotFound,
}

/// Canonical owner of all posts. The only component that mutates them.
///
/// `transition` and `remove` are serialized per post id; operations on
/// different posts never wait on each other.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, post: Post) -> anyhow::Result<Post>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    async fn list_all(&self) -> anyhow::Result<Vec<Post>>;
    async fn transition(
        &self,
        id: Uuid,
        transition: Transition,
        now: OffsetDateTime,
    ) -> anyhow::Result<TransitionOutcome>;
    async fn remove(
        &self,
        id: Uuid,
        requester: Uuid,
        now: OffsetDateTime,
    ) -> anyhow::Result<RemoveOutcome>;
}

const POST_COLUMNS: &str = r#"
    id, provider_id, provider_name, food_items, food_type, quantity, district,
    location, expiry_time, contact_number, status, ngo_id, ngo_name,
    collected_at, created_at
"#;

/// `food_posts` table; a row lock taken with `FOR UPDATE` is the per-record lock.
#[derive(Clone)]
pub struct PgPostStore {
    db: PgPool,
}

impl PgPostStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn lock_row(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM food_posts WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .context("lock post row")?;
        row.map(Post::try_from).transpose()
    }

    async fn write_state(tx: &mut Transaction<'_, Postgres>, post: &Post) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE food_posts
               SET status = $2, ngo_id = $3, ngo_name = $4, collected_at = $5
             WHERE id = $1
            "#,
        )
        .bind(post.id)
        .bind(post.status.as_str())
        .bind(post.ngo_id)
        .bind(post.ngo_name.as_deref())
        .bind(post.collected_at)
        .execute(&mut **tx)
        .await
        .context("update post state")?;
        Ok(())
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn insert(&self, post: Post) -> anyhow::Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO food_posts (
                id, provider_id, provider_name, food_items, food_type, quantity, district,
                location, expiry_time, contact_number, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post.id)
        .bind(post.provider_id)
        .bind(&post.provider_name)
        .bind(&post.food_items)
        .bind(post.food_type.as_str())
        .bind(post.quantity)
        .bind(&post.district)
        .bind(&post.location)
        .bind(post.expiry_time)
        .bind(&post.contact_number)
        .bind(post.status.as_str())
        .bind(post.created_at)
        .fetch_one(&self.db)
        .await
        .context("insert post")?;
        Post::try_from(row)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM food_posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get post")?;
        row.map(Post::try_from).transpose()
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!("SELECT {POST_COLUMNS} FROM food_posts"))
            .fetch_all(&self.db)
            .await
            .context("list posts")?;
        rows.into_iter().map(Post::try_from).collect()
    }

    async fn transition(
        &self,
        id: Uuid,
        transition: Transition,
        now: OffsetDateTime,
    ) -> anyhow::Result<TransitionOutcome> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let Some(mut post) = Self::lock_row(&mut tx, id).await? else {
            return Ok(TransitionOutcome::NotFound);
        };

        let step = lifecycle::apply(&mut post, &transition, now);
        if step.dirty {
            Self::write_state(&mut tx, &post).await?;
        }
        tx.commit().await.context("commit tx")?;

        Ok(if step.accepted {
            TransitionOutcome::Applied(post)
        } else {
            TransitionOutcome::Rejected(post)
        })
    }

    async fn remove(
        &self,
        id: Uuid,
        requester: Uuid,
        now: OffsetDateTime,
    ) -> anyhow::Result<RemoveOutcome> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let Some(mut post) = Self::lock_row(&mut tx, id).await? else {
            return Ok(RemoveOutcome::NotFound);
        };

        let (verdict, dirty) = lifecycle::check_removal(&mut post, requester, now);
        let outcome = match verdict {
            Removal::Allowed => {
                sqlx::query("DELETE FROM food_posts WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("delete post")?;
                RemoveOutcome::Removed(post)
            }
            Removal::NotOwner | Removal::Blocked => {
                if dirty {
                    Self::write_state(&mut tx, &post).await?;
                }
                if verdict == Removal::NotOwner {
                    RemoveOutcome::NotOwner
                } else {
                    RemoveOutcome::Rejected(post)
                }
            }
        };
        tx.commit().await.context("commit tx")?;
        Ok(outcome)
    }
}
