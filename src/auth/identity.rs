use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::repo_types::Role;
use crate::error::AppError;

/// Who is making a request, as asserted by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn require(self, role: Role) -> Result<Self, AppError> {
        if self.role == role {
            Ok(self)
        } else {
            Err(AppError::Forbidden(format!(
                "{} role required",
                role.as_str()
            )))
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid or expired token")]
pub struct InvalidToken;

/// Narrow contract the lifecycle engine depends on for identity.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, InvalidToken>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_other_roles() {
        let ngo = Identity {
            user_id: Uuid::new_v4(),
            role: Role::Ngo,
        };
        assert!(ngo.require(Role::Ngo).is_ok());
        let err = ngo.require(Role::Provider).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m.contains("PROVIDER")));
    }
}
