use serde::Serialize;
use time::OffsetDateTime;

use crate::auth::repo::UserStore;
use crate::auth::repo_types::{Role, User};
use crate::clock::Clock;
use crate::posts::expiry::effective_status;
use crate::posts::repo::PostStore;
use crate::posts::repo_types::{Post, PostStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_meals_served: i64,
    pub active_donations: i64,
    pub total_donors: i64,
    #[serde(rename = "activeNGOs")]
    pub active_ngos: i64,
}

/// Fold posts and users into dashboard counters as of `now`.
///
/// Liveness is judged by effective status, so a stale Available post counts as
/// expired here even though nothing is written back.
pub fn tally(posts: &[Post], users: &[User], now: OffsetDateTime) -> DashboardStats {
    let mut stats = posts.iter().fold(DashboardStats::default(), |mut acc, post| {
        match effective_status(post, now) {
            PostStatus::Collected => acc.total_meals_served += i64::from(post.quantity),
            PostStatus::Available => acc.active_donations += 1,
            PostStatus::Expired => {}
        }
        acc
    });
    for user in users {
        match user.role {
            Role::Provider => stats.total_donors += 1,
            Role::Ngo => stats.active_ngos += 1,
            Role::Admin => {}
        }
    }
    stats
}

pub async fn compute_stats(
    posts: &dyn PostStore,
    users: &dyn UserStore,
    clock: &dyn Clock,
) -> anyhow::Result<DashboardStats> {
    let all_posts = posts.list_all().await?;
    let all_users = users.list_all().await?;
    Ok(tally(&all_posts, &all_users, clock.now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::claim::claim_post;
    use crate::posts::lifecycle::Collector;
    use crate::posts::repo_types::FoodType;
    use crate::posts::services::delete_post;
    use crate::test_support::{register, TestEnv};
    use time::Duration;

    async fn stats(env: &TestEnv) -> DashboardStats {
        compute_stats(env.posts(), env.state.users.as_ref(), env.clock())
            .await
            .unwrap()
    }

    async fn collected_sum(env: &TestEnv) -> i64 {
        env.posts()
            .list_all()
            .await
            .unwrap()
            .iter()
            .filter(|p| p.status == PostStatus::Collected)
            .map(|p| i64::from(p.quantity))
            .sum()
    }

    #[test]
    fn serializes_dashboard_field_names() {
        let json = serde_json::to_value(DashboardStats {
            total_meals_served: 80,
            active_donations: 2,
            total_donors: 3,
            active_ngos: 1,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "totalMealsServed": 80,
                "activeDonations": 2,
                "totalDonors": 3,
                "activeNGOs": 1,
            })
        );
    }

    #[tokio::test]
    async fn meals_served_tracks_collected_quantity() {
        let env = TestEnv::new();
        let provider = register(&env.state, "p@example.com", Role::Provider).await;
        let ngo = register(&env.state, "n@example.com", Role::Ngo).await;
        register(&env.state, "admin@example.com", Role::Admin).await;

        let a = env.seed_post_with(&provider, "Alpha", FoodType::Veg, 30, 2).await;
        let b = env.seed_post_with(&provider, "Beta", FoodType::NonVeg, 50, 2).await;
        let c = env.seed_post_with(&provider, "Gamma", FoodType::Veg, 7, 2).await;
        env.seed_post_with(&provider, "Alpha", FoodType::Veg, 11, 1).await;

        let collector = || Collector {
            ngo_id: ngo.id,
            ngo_name: "Test Org".into(),
        };
        claim_post(env.posts(), env.clock(), a.id, collector()).await.unwrap();
        claim_post(env.posts(), env.clock(), b.id, collector()).await.unwrap();
        delete_post(env.posts(), env.clock(), c.id, provider.id).await.unwrap();

        let before = stats(&env).await;
        assert_eq!(before.total_meals_served, 80);
        assert_eq!(before.total_meals_served, collected_sum(&env).await);
        assert_eq!(before.active_donations, 1);
        assert_eq!(before.total_donors, 1);
        assert_eq!(before.active_ngos, 1);
        assert_eq!(stats(&env).await, before);

        // The remaining post lapses without any read rewriting it.
        env.time.advance(Duration::minutes(90));
        let after = stats(&env).await;
        assert_eq!(after.active_donations, 0);
        assert_eq!(after.total_meals_served, 80);

        let stored = env.posts().list_all().await.unwrap();
        assert!(stored.iter().any(|p| p.status == PostStatus::Available));
    }
}
