use chrono::{DateTime, Utc};

use campus_auth::{JwtClaims, Principal};

/// Authenticated caller of the current request.
///
/// Inserted by the auth middleware; present for every protected route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
    expires_at: DateTime<Utc>,
}

impl PrincipalContext {
    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self {
            principal: claims.principal(),
            expires_at: claims.expires_at,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}
