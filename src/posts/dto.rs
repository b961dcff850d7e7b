use serde::Deserialize;

use super::repo_types::{FoodType, PostStatus};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub food_items: String,
    #[serde(rename = "type")]
    pub food_type: FoodType,
    /// People served; wider than the stored type so out-of-range input is a validation error.
    pub quantity: i64,
    pub district: String,
    #[serde(default)]
    pub location: String,
    /// RFC 3339, or `YYYY-MM-DDTHH:MM[:SS]` read as UTC.
    pub expiry_time: String,
    #[serde(default)]
    pub contact_number: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPostsQuery {
    pub district: Option<String>,
    #[serde(rename = "type")]
    pub food_type: Option<FoodType>,
    /// Defaults to Available.
    pub status: Option<PostStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPostRequest {
    pub ngo_name: Option<String>,
}
