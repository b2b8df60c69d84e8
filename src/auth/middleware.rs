// Extractors for staff routes

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts},
};
use std::net::{IpAddr, SocketAddr};
use tracing::debug;

use crate::auth::error::AuthError;
use crate::config::AppConfig;
use crate::directory::User;
use crate::AppState;

/// Staff user behind a valid Bearer token
#[derive(Debug, Clone)]
pub struct StaffIdentity {
    pub user: User,
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken)
}

#[async_trait]
impl FromRequestParts<AppState> for StaffIdentity {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = state.tokens.validate_access_token(bearer_token(parts)?)?;

        let user = state
            .directory
            .find_user(claims.sub)
            .await?
            .ok_or(AuthError::UnknownUser(claims.sub))?;

        if !user.is_staff && !user.is_superuser {
            return Err(AuthError::NotStaff(user.id));
        }

        Ok(StaffIdentity { user })
    }
}

/// Whether the fence lets this user in from this address
///
/// Superusers and users allowed off premise are never fenced.
pub fn fence_allows(config: &AppConfig, user: &User, ip: Option<IpAddr>) -> bool {
    if !config.ip_whitelist_enabled || user.is_superuser || user.can_login_off_premise {
        return true;
    }
    ip.map(|ip| config.ip_whitelist.contains(&ip)).unwrap_or(false)
}

/// Staff user who may use the issuance workflow from where they are connecting
#[derive(Debug, Clone)]
pub struct Operator {
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for Operator {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let StaffIdentity { user } = StaffIdentity::from_request_parts(parts, state).await?;

        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        if !fence_allows(&state.config, &user, ip) {
            return Err(AuthError::OutsideWhitelist { user_id: user.id, ip });
        }

        debug!("Operator {} authorized", user.id);
        Ok(Operator { user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_superuser: bool, can_login_off_premise: bool) -> User {
        User {
            id: 7,
            email: "staff@example.com".into(),
            first_name: "Sam".into(),
            last_name: "Staff".into(),
            membership_number: None,
            employee_number: Some("E100".into()),
            is_staff: true,
            is_superuser,
            can_login_off_premise,
        }
    }

    fn fenced_config() -> AppConfig {
        let mut config = AppConfig::for_tests();
        config.ip_whitelist_enabled = true;
        config.ip_whitelist = vec!["10.0.0.5".parse().unwrap()];
        config
    }

    #[test]
    fn test_fence_disabled_allows_everyone() {
        let config = AppConfig::for_tests();
        assert!(fence_allows(&config, &user(false, false), None));
    }

    #[test]
    fn test_fence_checks_whitelist() {
        let config = fenced_config();
        let staff = user(false, false);

        assert!(fence_allows(&config, &staff, Some("10.0.0.5".parse().unwrap())));
        assert!(!fence_allows(&config, &staff, Some("192.168.1.9".parse().unwrap())));
        assert!(!fence_allows(&config, &staff, None));
    }

    #[test]
    fn test_fence_bypass() {
        let config = fenced_config();
        let outside = Some("192.168.1.9".parse().unwrap());

        assert!(fence_allows(&config, &user(true, false), outside));
        assert!(fence_allows(&config, &user(false, true), outside));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let request = axum::http::Request::builder()
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        assert!(matches!(bearer_token(&parts), Err(AuthError::InvalidToken)));

        let request = axum::http::Request::builder().body(()).unwrap();
        let (parts, _) = request.into_parts();
        assert!(matches!(bearer_token(&parts), Err(AuthError::MissingToken)));
    }
}
