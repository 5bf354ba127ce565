//! Authorization gate: which role sets may exercise which capability.
//!
//! Pure functions, independent of the HTTP layer. The axum wiring lives in
//! `middleware::auth`.

use crate::models::Role;
use thiserror::Error;

use super::jwt::SessionClaims;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Public,
    Authenticated,
    AnyRole(&'static [Role]),
}

pub const COMPONENT_WRITERS: Capability = Capability::AnyRole(&[Role::Professor, Role::Admin]);
pub const ADMINISTRATORS: Capability = Capability::AnyRole(&[Role::Admin]);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Insufficient role")]
    Forbidden,
}

/// Whether an authenticated caller holding `roles` may use `capability`.
pub fn permits(roles: &[Role], capability: &Capability) -> bool {
    match capability {
        Capability::Public | Capability::Authenticated => true,
        Capability::AnyRole(allowed) => roles.iter().any(|r| allowed.contains(r)),
    }
}

/// `claims` is `None` when the request carried no valid session token.
pub fn authorize(claims: Option<&SessionClaims>, capability: &Capability) -> Result<(), GateError> {
    if *capability == Capability::Public {
        return Ok(());
    }

    let claims = claims.ok_or(GateError::Unauthorized)?;
    if permits(&claims.roles, capability) {
        Ok(())
    } else {
        Err(GateError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(roles: Vec<Role>) -> SessionClaims {
        SessionClaims {
            sub: "ana@gmail.com".to_string(),
            roles,
            iat: 0,
            exp: i64::MAX,
            jti: "jti".to_string(),
        }
    }

    #[test]
    fn test_public_needs_nothing() {
        assert_eq!(authorize(None, &Capability::Public), Ok(()));
    }

    #[test]
    fn test_missing_token_is_unauthorized() {
        assert_eq!(
            authorize(None, &Capability::Authenticated),
            Err(GateError::Unauthorized)
        );
        assert_eq!(authorize(None, &ADMINISTRATORS), Err(GateError::Unauthorized));
    }

    #[test]
    fn test_any_valid_token_is_authenticated() {
        let c = claims(vec![Role::Academico]);
        assert_eq!(authorize(Some(&c), &Capability::Authenticated), Ok(()));
    }

    #[test]
    fn test_component_writers() {
        assert!(!permits(&[Role::Academico], &COMPONENT_WRITERS));
        assert!(permits(&[Role::Professor], &COMPONENT_WRITERS));
        assert!(permits(&[Role::Academico, Role::Admin], &COMPONENT_WRITERS));
    }

    #[test]
    fn test_insufficient_role_is_forbidden() {
        let c = claims(vec![Role::Academico, Role::Professor]);
        assert_eq!(authorize(Some(&c), &ADMINISTRATORS), Err(GateError::Forbidden));
        assert_eq!(authorize(Some(&c), &COMPONENT_WRITERS), Ok(()));
    }
}
