use lazy_static::lazy_static;
use regex::Regex;

use super::dto::{AuthResponse, PublicUser, RegisterRequest};
use super::identity::Identity;
use super::jwt::JwtKeys;
use super::password::hash_password;
use super::repo::UserStore;
use super::repo_types::{NewUser, Role, User};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Validate a registration request and hash its password.
pub fn prepare_registration(config: &AppConfig, req: RegisterRequest) -> AppResult<NewUser> {
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation("Password too short".into()));
    }
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    let district = non_blank(req.district);
    if let Some(d) = &district {
        if !config.is_known_district(d) {
            return Err(AppError::Validation(format!("Unknown district {d:?}")));
        }
    }

    Ok(NewUser {
        name,
        email,
        password_hash: hash_password(&req.password)?,
        role: req.role,
        district,
        organization: non_blank(req.organization),
        phone: non_blank(req.phone),
    })
}

pub fn issue_tokens(keys: &JwtKeys, user: User) -> AppResult<AuthResponse> {
    let access_token = keys.sign_access(user.id, user.role)?;
    let refresh_token = keys.sign_refresh(user.id, user.role)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(user),
    })
}

/// Resolve the caller to a stored account holding `role`.
pub async fn load_account(users: &dyn UserStore, identity: Identity, role: Role) -> AppResult<User> {
    identity.require(role)?;
    let user = users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    if user.role != role {
        return Err(AppError::Forbidden(format!("{} role required", role.as_str())));
    }
    Ok(user)
}
