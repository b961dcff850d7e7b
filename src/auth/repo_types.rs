use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Provider,
    #[serde(rename = "NGO")]
    Ngo,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Provider => "PROVIDER",
            Role::Ngo => "NGO",
            Role::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROVIDER" => Ok(Role::Provider),
            "NGO" => Ok(Role::Ngo),
            "ADMIN" => Ok(Role::Admin),
            other => anyhow::bail!("unknown role {other:?}"),
        }
    }
}

/// Registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub role: Role,
    pub district: Option<String>,
    pub organization: Option<String>,
    pub phone: Option<String>,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// Name shown on posts and claims: the organization when set.
    pub fn display_name(&self) -> &str {
        self.organization
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub district: Option<String>,
    pub organization: Option<String>,
    pub phone: Option<String>,
}

impl NewUser {
    pub fn into_user(self, id: Uuid, created_at: OffsetDateTime) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            is_verified: self.role == Role::Admin,
            role: self.role,
            district: self.district,
            organization: self.organization,
            phone: self.phone,
            created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub district: Option<String>,
    pub organization: Option<String>,
    pub phone: Option<String>,
    pub is_verified: bool,
    pub created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            name: r.name,
            email: r.email,
            password_hash: r.password_hash,
            role: r.role.parse()?,
            district: r.district,
            organization: r.organization,
            phone: r.phone,
            is_verified: r.is_verified,
            created_at: r.created_at,
        })
    }
}
