use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of roles. Authorization checks match on this exhaustively
/// instead of comparing strings per handler.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Accountant,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Type of JWT: access or refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload. Carries the resolved `{userId, role}` pair so downstream
/// authorization never re-reads the identity store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // user ID
    pub role: Role,      // authorization role at issue time
    pub iat: usize,      // issued at (unix timestamp)
    pub exp: usize,      // expires at (unix timestamp)
    pub iss: String,     // issuer
    pub aud: String,     // audience
    pub kind: TokenKind, // access or refresh
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
pub(crate) fn test_claims(sub: Uuid, role: Role) -> Claims {
    Claims {
        sub,
        role,
        iat: 0,
        exp: usize::MAX,
        iss: "test-issuer".into(),
        aud: "test-aud".into(),
        kind: TokenKind::Access,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"accountant\"").unwrap(),
            Role::Accountant
        );
    }

    #[test]
    fn only_admin_is_admin() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::Staff.is_admin());
        assert!(!Role::Accountant.is_admin());
    }
}
