//! Console authentication
//!
//! Profiles log in with email and password. A successful login opens a
//! session that lasts seven days; its id is the bearer token.

use super::content::{ContentError, ContentService};
use super::password::{verify_password, PasswordError};
use crate::config::AdminConfig;
use crate::db::repositories::{RpcRepository, SessionRepository};
use crate::models::profile::CreateProfileInput;
use crate::models::{Profile, Session};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not logged in")]
    Unauthenticated,

    #[error("Admin access required")]
    Forbidden,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub profile: Profile,
}

#[derive(Clone)]
pub struct AuthService {
    profiles: ContentService<Profile>,
    sessions: Arc<dyn SessionRepository>,
    rpc: Arc<dyn RpcRepository>,
}

impl AuthService {
    pub fn new(
        profiles: ContentService<Profile>,
        sessions: Arc<dyn SessionRepository>,
        rpc: Arc<dyn RpcRepository>,
    ) -> Self {
        Self {
            profiles,
            sessions,
            rpc,
        }
    }

    pub async fn login(&self, input: LoginInput) -> Result<LoginResult, AuthError> {
        let email = input.email.trim().to_lowercase();
        let profile = self
            .profiles
            .find_by("email", email.as_str())
            .await?
            .filter(|p| p.is_active)
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = profile
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(&input.password, hash)? {
            tracing::warn!("Failed login for {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        let session = self
            .sessions
            .create(&Session::start(&profile.id))
            .await
            .context("Failed to create session")?;
        tracing::info!("{} logged in", profile.email);

        Ok(LoginResult {
            token: session.id,
            expires_at: session.expires_at,
            profile,
        })
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Profile behind a live session; expired sessions are removed
    pub async fn validate_session(&self, token: &str) -> Result<Option<Profile>, AuthError> {
        let session = match self
            .sessions
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.sessions.delete(token).await;
            return Ok(None);
        }

        match self.profiles.get(&session.profile_id).await {
            Ok(profile) if profile.is_active => Ok(Some(profile)),
            Ok(_) | Err(ContentError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn me(&self, token: &str) -> Result<Profile, AuthError> {
        self.validate_session(token)
            .await?
            .ok_or(AuthError::Unauthenticated)
    }

    /// Profile behind `token`, which must hold the admin role
    pub async fn require_admin(&self, token: &str) -> Result<Profile, AuthError> {
        let profile = self.me(token).await?;
        if self.rpc.is_admin(&profile.id).await? {
            Ok(profile)
        } else {
            Err(AuthError::Forbidden)
        }
    }

    /// Create the configured admin account unless its email is taken.
    /// Returns the created profile.
    pub async fn bootstrap_admin(&self, config: &AdminConfig) -> Result<Option<Profile>, AuthError> {
        let (Some(email), Some(password)) = (config.email.as_deref(), config.password.as_deref())
        else {
            return Ok(None);
        };

        let email = email.trim().to_lowercase();
        if self.profiles.find_by("email", email.as_str()).await?.is_some() {
            tracing::debug!("Admin account {} already exists", email);
            return Ok(None);
        }

        let profile = self
            .profiles
            .create(CreateProfileInput {
                email,
                full_name: Some("Administrator".to_string()),
                role: Some("admin".to_string()),
                is_active: Some(true),
                password: Some(password.to_string()),
                ..Default::default()
            })
            .await?;
        tracing::info!("Created admin account {}", profile.email);
        Ok(Some(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_test_cache;
    use crate::db::create_test_pool;
    use crate::db::migrations::run_migrations;
    use crate::db::repositories::{SqlxRpcRepository, SqlxSessionRepository, SqlxTableRepository};
    use crate::models::profile::UpdateProfileInput;

    async fn service() -> AuthService {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        AuthService::new(
            ContentService::new(SqlxTableRepository::boxed(pool.clone()), create_test_cache()),
            SqlxSessionRepository::boxed(pool.clone()),
            SqlxRpcRepository::boxed(pool),
        )
    }

    fn admin_config() -> AdminConfig {
        AdminConfig {
            email: Some("Admin@Example.com".into()),
            password: Some("harvest-2024".into()),
        }
    }

    fn login(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let svc = service().await;
        let created = svc.bootstrap_admin(&admin_config()).await.unwrap().unwrap();
        assert_eq!(created.email, "admin@example.com");
        assert_eq!(created.role, "admin");

        assert!(svc.bootstrap_admin(&admin_config()).await.unwrap().is_none());
        assert!(svc
            .bootstrap_admin(&AdminConfig::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_login_me_logout() {
        let svc = service().await;
        svc.bootstrap_admin(&admin_config()).await.unwrap();

        let result = svc
            .login(login(" ADMIN@example.com", "harvest-2024"))
            .await
            .unwrap();
        assert_eq!(result.token.len(), 64);
        assert!(result.expires_at > Utc::now() + chrono::Duration::days(6));

        let me = svc.me(&result.token).await.unwrap();
        assert_eq!(me.id, result.profile.id);
        let admin = svc.require_admin(&result.token).await.unwrap();
        assert_eq!(admin.email, "admin@example.com");

        svc.logout(&result.token).await.unwrap();
        assert!(matches!(
            svc.me(&result.token).await,
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email() {
        let svc = service().await;
        svc.bootstrap_admin(&admin_config()).await.unwrap();

        assert!(matches!(
            svc.login(login("admin@example.com", "wrong-pass")).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            svc.login(login("nobody@example.com", "harvest-2024")).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let svc = service().await;
        let profile = svc
            .profiles
            .create(CreateProfileInput {
                email: "editor@example.com".into(),
                role: Some("editor".into()),
                password: Some("editor-pass".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let result = svc.login(login("editor@example.com", "editor-pass")).await.unwrap();
        assert!(matches!(
            svc.require_admin(&result.token).await,
            Err(AuthError::Forbidden)
        ));

        svc.profiles
            .update(
                &profile.id,
                UpdateProfileInput {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(svc.validate_session(&result.token).await.unwrap().is_none());
    }
}
