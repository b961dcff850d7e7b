use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostStatus {
    Available,
    Collected,
    Expired,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Available => "Available",
            PostStatus::Collected => "Collected",
            PostStatus::Expired => "Expired",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, PostStatus::Available)
    }
}

impl FromStr for PostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(PostStatus::Available),
            "Collected" => Ok(PostStatus::Collected),
            "Expired" => Ok(PostStatus::Expired),
            other => anyhow::bail!("unknown post status {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodType {
    Veg,
    #[serde(rename = "Non-Veg")]
    NonVeg,
}

impl FoodType {
    pub fn as_str(self) -> &'static str {
        match self {
            FoodType::Veg => "Veg",
            FoodType::NonVeg => "Non-Veg",
        }
    }
}

impl FromStr for FoodType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Veg" => Ok(FoodType::Veg),
            "Non-Veg" => Ok(FoodType::NonVeg),
            other => anyhow::bail!("unknown food type {other:?}"),
        }
    }
}

/// One surplus-food batch offered by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub food_items: String,
    #[serde(rename = "type")]
    pub food_type: FoodType,
    pub quantity: i32,
    pub district: String,
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry_time: OffsetDateTime,
    pub contact_number: String,
    pub status: PostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ngo_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ngo_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub collected_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated input for a new post; id, status and creation time are assigned by the store layer.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub provider_id: Uuid,
    pub provider_name: String,
    pub food_items: String,
    pub food_type: FoodType,
    pub quantity: i32,
    pub district: String,
    pub location: String,
    pub expiry_time: OffsetDateTime,
    pub contact_number: String,
}

impl PostDraft {
    pub fn into_post(self, id: Uuid, created_at: OffsetDateTime) -> Post {
        Post {
            id,
            provider_id: self.provider_id,
            provider_name: self.provider_name,
            food_items: self.food_items,
            food_type: self.food_type,
            quantity: self.quantity,
            district: self.district,
            location: self.location,
            expiry_time: self.expiry_time,
            contact_number: self.contact_number,
            status: PostStatus::Available,
            ngo_id: None,
            ngo_name: None,
            collected_at: None,
            created_at,
        }
    }
}

/// Raw `food_posts` row; enums are stored as text.
#[derive(Debug, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub food_items: String,
    pub food_type: String,
    pub quantity: i32,
    pub district: String,
    pub location: String,
    pub expiry_time: OffsetDateTime,
    pub contact_number: String,
    pub status: String,
    pub ngo_id: Option<Uuid>,
    pub ngo_name: Option<String>,
    pub collected_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl TryFrom<PostRow> for Post {
    type Error = anyhow::Error;

    fn try_from(r: PostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            provider_id: r.provider_id,
            provider_name: r.provider_name,
            food_items: r.food_items,
            food_type: r.food_type.parse()?,
            quantity: r.quantity,
            district: r.district,
            location: r.location,
            expiry_time: r.expiry_time,
            contact_number: r.contact_number,
            status: r.status.parse()?,
            ngo_id: r.ngo_id,
            ngo_name: r.ngo_name,
            collected_at: r.collected_at,
            created_at: r.created_at,
        })
    }
}
