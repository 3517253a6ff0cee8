use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription tier or staff role carried in the identity token.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Base,
    Kiconu,
    Premium,
    Coach,
    Admin,
}

impl Role {
    /// Coaches and admins manage course content.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Coach | Role::Admin)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

/// The authenticated caller of one request.
///
/// Built by the auth middleware from verified claims and handed to handlers
/// through request extensions; nothing about the session is global.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<TokenClaims> for Session {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_roles() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Coach.is_staff());
        assert!(!Role::Premium.is_staff());
        assert!(!Role::Base.is_staff());
    }

    #[test]
    fn role_deserializes_lowercase() {
        let claims: TokenClaims = serde_json::from_str(
            r#"{"sub":"00000000-0000-0000-0000-000000000001","role":"kiconu","exp":10,"iat":1}"#,
        )
        .unwrap();
        assert_eq!(claims.role, Role::Kiconu);
        let session = Session::from(claims);
        assert_eq!(session.role, Role::Kiconu);
    }
}
