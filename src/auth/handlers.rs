use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::verify_password,
        repo::Registration,
        services::{is_valid_email, issue_tokens, normalize_email, prepare_registration},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let new_user = prepare_registration(&state.config, payload)?;
    let email = new_user.email.clone();

    let user = match state.users.create(new_user).await? {
        Registration::Created(u) => u,
        Registration::EmailTaken => {
            warn!(%email, "email already registered");
            return Err(AppError::EmailTaken);
        }
    };

    info!(user_id = %user.id, role = user.role.as_str(), "user registered");
    let keys = JwtKeys::from_ref(&state);
    Ok((StatusCode::CREATED, Json(issue_tokens(&keys, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email".into()));
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user.id, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(Json(PublicUser::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::Role;

    fn register_body(email: &str, role: Role) -> RegisterRequest {
        RegisterRequest {
            name: "Kiran".into(),
            email: email.into(),
            password: "kiran-secret".into(),
            role,
            district: Some("Beta".into()),
            organization: Some("Kiran Caterers".into()),
            phone: None,
        }
    }

    #[tokio::test]
    async fn register_login_refresh_and_me() {
        let state = AppState::fake();

        let (status, Json(registered)) = register(
            State(state.clone()),
            Json(register_body("kiran@example.com", Role::Provider)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(registered.user.role, Role::Provider);
        assert!(!registered.user.is_verified);

        let Json(logged_in) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "KIRAN@example.com ".into(),
                password: "kiran-secret".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);

        let Json(refreshed) = refresh(
            State(state.clone()),
            Json(RefreshRequest {
                refresh_token: logged_in.refresh_token,
            }),
        )
        .await
        .unwrap();
        let identity = state.identity.verify(&refreshed.access_token).unwrap();
        assert_eq!(identity.user_id, registered.user.id);
        assert_eq!(identity.role, Role::Provider);

        let Json(me) = get_me(State(state.clone()), AuthUser(identity)).await.unwrap();
        assert_eq!(me.email, "kiran@example.com");
        assert_eq!(me.organization.as_deref(), Some("Kiran Caterers"));
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let state = AppState::fake();
        register(State(state.clone()), Json(register_body("dup@example.com", Role::Ngo)))
            .await
            .unwrap();
        let err = register(State(state), Json(register_body("dup@example.com", Role::Admin)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailTaken));
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let state = AppState::fake();
        register(State(state.clone()), Json(register_body("k@example.com", Role::Ngo)))
            .await
            .unwrap();

        for (email, password) in [("k@example.com", "wrong-secret"), ("x@example.com", "kiran-secret")] {
            let err = login(
                State(state.clone()),
                Json(LoginRequest {
                    email: email.into(),
                    password: password.into(),
                }),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::Unauthorized(_)));
        }
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens() {
        let state = AppState::fake();
        let (_, Json(registered)) =
            register(State(state.clone()), Json(register_body("r@example.com", Role::Ngo)))
                .await
                .unwrap();
        let err = refresh(
            State(state),
            Json(RefreshRequest {
                refresh_token: registered.access_token,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
