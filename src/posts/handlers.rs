use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    routing::{get, patch},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::claim::claim_post;
use super::dto::{ClaimPostRequest, CreatePostRequest, ListPostsQuery};
use super::lifecycle::Collector;
use super::query::{query, Order, PostFilter};
use super::repo_types::Post;
use super::services::{create_post, delete_post, get_post};
use crate::{
    auth::{extractors::AuthUser, repo_types::Role, services::load_account},
    error::AppResult,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/mine", get(list_my_posts))
        .route("/posts/:id", get(get_one))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", axum::routing::post(create))
        .route("/posts/:id", axum::routing::delete(remove))
        .route("/posts/:id/claim", patch(claim))
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(q): Query<ListPostsQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let filter = PostFilter::from(q);
    let posts = query(
        state.posts.as_ref(),
        state.clock.as_ref(),
        &filter,
        Order::NewestFirst,
    )
    .await?;
    Ok(Json(posts))
}

/// Provider: posts they created. NGO: posts they collected. Admin: everything.
#[instrument(skip(state))]
pub async fn list_my_posts(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> AppResult<Json<Vec<Post>>> {
    let filter = match identity.role {
        Role::Provider => PostFilter {
            provider_id: Some(identity.user_id),
            ..PostFilter::default()
        },
        Role::Ngo => PostFilter {
            ngo_id: Some(identity.user_id),
            ..PostFilter::default()
        },
        Role::Admin => PostFilter::default(),
    };
    let posts = query(
        state.posts.as_ref(),
        state.clock.as_ref(),
        &filter,
        Order::NewestFirst,
    )
    .await?;
    Ok(Json(posts))
}

#[instrument(skip(state))]
pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<Post>> {
    Ok(Json(get_post(state.posts.as_ref(), state.clock.as_ref(), id).await?))
}

#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(body): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, [(header::HeaderName, String); 1], Json<Post>)> {
    let provider = load_account(state.users.as_ref(), identity, Role::Provider).await?;
    let post = create_post(
        state.posts.as_ref(),
        state.clock.as_ref(),
        &state.config,
        &provider,
        body,
    )
    .await?;
    let location = format!("/api/v1/posts/{}", post.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(post)))
}

#[instrument(skip(state, body))]
pub async fn claim(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<ClaimPostRequest>>,
) -> AppResult<Json<Post>> {
    let ngo = load_account(state.users.as_ref(), identity, Role::Ngo).await?;
    let ngo_name = body
        .and_then(|Json(b)| b.ngo_name)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| ngo.display_name().to_string());
    let collector = Collector {
        ngo_id: ngo.id,
        ngo_name,
    };
    Ok(Json(
        claim_post(state.posts.as_ref(), state.clock.as_ref(), id, collector).await?,
    ))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    delete_post(state.posts.as_ref(), state.clock.as_ref(), id, identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Conflict};
    use crate::posts::repo_types::{FoodType, PostStatus};
    use crate::test_support::{identity_of, register, TestEnv};

    fn body(district: &str, expiry: String) -> CreatePostRequest {
        CreatePostRequest {
            food_items: "Chicken curry, rice".into(),
            food_type: FoodType::NonVeg,
            quantity: 50,
            district: district.into(),
            location: "Kitchen door".into(),
            expiry_time: expiry,
            contact_number: "555-0130".into(),
        }
    }

    #[tokio::test]
    async fn provider_creates_and_ngo_claims_over_handlers() {
        let env = TestEnv::new();
        let provider = register(&env.state, "p@example.com", Role::Provider).await;
        let ngo = register(&env.state, "n@example.com", Role::Ngo).await;

        let (status, [(_, location)], Json(post)) = create(
            State(env.state.clone()),
            AuthUser(identity_of(&provider)),
            Json(body("Alpha", env.in_hours(1))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(location, format!("/api/v1/posts/{}", post.id));

        let Json(listed) = list_posts(
            State(env.state.clone()),
            Query(ListPostsQuery {
                district: Some("Alpha".into()),
                ..ListPostsQuery::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(listed, vec![post.clone()]);

        let Json(claimed) = claim(
            State(env.state.clone()),
            AuthUser(identity_of(&ngo)),
            Path(post.id),
            None,
        )
        .await
        .unwrap();
        assert_eq!(claimed.status, PostStatus::Collected);
        assert_eq!(claimed.ngo_id, Some(ngo.id));
        assert_eq!(claimed.ngo_name.as_deref(), Some("Test Org"));

        let Json(mine) = list_my_posts(State(env.state.clone()), AuthUser(identity_of(&ngo)))
            .await
            .unwrap();
        assert_eq!(mine, vec![claimed.clone()]);

        let Json(provider_view) =
            list_my_posts(State(env.state.clone()), AuthUser(identity_of(&provider)))
                .await
                .unwrap();
        assert_eq!(provider_view, vec![claimed]);

        let err = remove(State(env.state.clone()), AuthUser(identity_of(&provider)), Path(post.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(Conflict::AlreadyClaimed)));
    }

    #[tokio::test]
    async fn roles_are_enforced() {
        let env = TestEnv::new();
        let provider = register(&env.state, "p@example.com", Role::Provider).await;
        let ngo = register(&env.state, "n@example.com", Role::Ngo).await;

        let err = create(
            State(env.state.clone()),
            AuthUser(identity_of(&ngo)),
            Json(body("Alpha", env.in_hours(1))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let post = env.seed_post(&provider, "Alpha", 1).await;
        let err = claim(
            State(env.state.clone()),
            AuthUser(identity_of(&provider)),
            Path(post.id),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = remove(State(env.state.clone()), AuthUser(identity_of(&ngo)), Path(post.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn claim_uses_requested_ngo_name_and_owner_can_delete() {
        let env = TestEnv::new();
        let provider = register(&env.state, "p@example.com", Role::Provider).await;
        let ngo = register(&env.state, "n@example.com", Role::Ngo).await;
        let first = env.seed_post(&provider, "Beta", 2).await;
        let second = env.seed_post(&provider, "Beta", 2).await;

        let Json(claimed) = claim(
            State(env.state.clone()),
            AuthUser(identity_of(&ngo)),
            Path(first.id),
            Some(Json(ClaimPostRequest {
                ngo_name: Some("Night Shelter".into()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(claimed.ngo_name.as_deref(), Some("Night Shelter"));

        let status = remove(State(env.state.clone()), AuthUser(identity_of(&provider)), Path(second.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_one(State(env.state.clone()), Path(second.id)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Post")));
    }
}
