use std::sync::Arc;

use time::{format_description::well_known::Rfc3339, macros::datetime, Duration};

use crate::auth::{
    identity::Identity,
    repo::Registration,
    repo_types::{NewUser, Role, User},
};
use crate::clock::{Clock, ManualClock};
use crate::posts::{
    dto::CreatePostRequest,
    repo::PostStore,
    repo_types::{FoodType, Post},
    services::create_post,
};
use crate::state::AppState;

/// In-memory state driven by a manual clock.
pub struct TestEnv {
    pub state: AppState,
    pub time: Arc<ManualClock>,
}

impl TestEnv {
    pub fn new() -> Self {
        let time = Arc::new(ManualClock::new(datetime!(2025-05-01 12:00 UTC)));
        let state = AppState::fake_with_clock(time.clone());
        Self { state, time }
    }

    pub fn posts(&self) -> &dyn PostStore {
        self.state.posts.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.time.as_ref()
    }

    pub fn in_hours(&self, hours: i64) -> String {
        (self.time.now() + Duration::hours(hours))
            .format(&Rfc3339)
            .unwrap()
    }

    pub async fn seed_post(&self, provider: &User, district: &str, hours: i64) -> Post {
        self.seed_post_with(provider, district, FoodType::Veg, 50, hours)
            .await
    }

    pub async fn seed_post_with(
        &self,
        provider: &User,
        district: &str,
        food_type: FoodType,
        quantity: i64,
        hours: i64,
    ) -> Post {
        let req = CreatePostRequest {
            food_items: "Rice and sambar".into(),
            food_type,
            quantity,
            district: district.into(),
            location: "Back entrance".into(),
            expiry_time: self.in_hours(hours),
            contact_number: "555-0100".into(),
        };
        create_post(self.posts(), self.clock(), &self.state.config, provider, req)
            .await
            .unwrap()
    }
}

pub async fn register(state: &AppState, email: &str, role: Role) -> User {
    let new = NewUser {
        name: "Test User".into(),
        email: email.into(),
        password_hash: "not-a-real-hash".into(),
        role,
        district: Some("Alpha".into()),
        organization: Some("Test Org".into()),
        phone: None,
    };
    match state.users.create(new).await.unwrap() {
        Registration::Created(user) => user,
        Registration::EmailTaken => panic!("{email} already registered"),
    }
}

pub fn identity_of(user: &User) -> Identity {
    Identity {
        user_id: user.id,
        role: user.role,
    }
}
