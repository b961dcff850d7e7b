use anyhow::Context;
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User, UserRow};

#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Created(User),
    EmailTaken,
}

/// User directory.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user; email uniqueness is enforced atomically.
    async fn create(&self, new: NewUser) -> anyhow::Result<Registration>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn list_all(&self) -> anyhow::Result<Vec<User>>;
}

const USER_COLUMNS: &str = r#"
    id, name, email, password_hash, role, district, organization, phone,
    is_verified, created_at
"#;

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new: NewUser) -> anyhow::Result<Registration> {
        let user = new.into_user(Uuid::new_v4(), OffsetDateTime::now_utc());
        let inserted = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (
                id, name, email, password_hash, role, district, organization, phone,
                is_verified, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.district.as_deref())
        .bind(user.organization.as_deref())
        .bind(user.phone.as_deref())
        .bind(user.is_verified)
        .bind(user.created_at)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;

        match inserted {
            Some(row) => Ok(Registration::Created(User::try_from(row)?)),
            None => Ok(Registration::EmailTaken),
        }
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        row.map(User::try_from).transpose()
    }

    async fn list_all(&self) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users"))
            .fetch_all(&self.db)
            .await
            .context("list users")?;
        rows.into_iter().map(User::try_from).collect()
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    by_id: DashMap<Uuid, User>,
    by_email: DashMap<String, Uuid>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new: NewUser) -> anyhow::Result<Registration> {
        match self.by_email.entry(new.email.clone()) {
            Entry::Occupied(_) => Ok(Registration::EmailTaken),
            Entry::Vacant(slot) => {
                let user = new.into_user(Uuid::new_v4(), OffsetDateTime::now_utc());
                self.by_id.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(Registration::Created(user))
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let Some(id) = self.by_email.get(email).map(|e| *e.value()) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.by_id.get(&id).map(|e| e.value().clone()))
    }

    async fn list_all(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.by_id.iter().map(|e| e.value().clone()).collect())
    }
}
