//! Admin sign-in against the backend's identity provider.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::backend::{AuthProvider, BackendError, Credentials, IdToken};

mod gate;
mod login;
mod logout;

pub use gate::{AdminGate, RequireAdmin};
pub use login::login;
pub use logout::logout;

/// Tokens are treated as expired this long before the provider says so.
const EXPIRY_SKEW: Duration = Duration::seconds(60);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("sign-in is unavailable: {0}")]
    Unavailable(#[source] BackendError),
    #[error("sign-in was refused: {0}")]
    Rejected(#[source] BackendError),
}

impl AuthError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Unavailable(_))
    }

    fn from_backend(err: BackendError) -> Self {
        match err {
            BackendError::InvalidCredentials => AuthError::InvalidCredentials,
            err if err.is_retryable() => AuthError::Unavailable(err),
            err => AuthError::Rejected(err),
        }
    }
}

/// What the cookie session remembers about a signed-in admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSession {
    pub uid: String,
    pub email: String,
    pub id_token: IdToken,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    fn from_credentials(creds: Credentials, now: DateTime<Utc>) -> Self {
        let lifetime = Duration::from_std(creds.expires_in).unwrap_or(Duration::zero());
        Self {
            uid: creds.uid,
            email: creds.email,
            id_token: creds.id_token,
            refresh_token: creds.refresh_token,
            expires_at: now + lifetime,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + EXPIRY_SKEW >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { uid: String },
    Refreshed { uid: String },
    SignedOut { uid: String },
}

#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            events: broadcast::channel(32).0,
        }
    }

    /// Every sign-in, refresh and sign-out from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AdminSession, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let creds = self
            .provider
            .sign_in(email, password)
            .await
            .map_err(AuthError::from_backend)?;
        let session = AdminSession::from_credentials(creds, Utc::now());

        tracing::info!(uid = %session.uid, "admin signed in");
        let _ = self.events.send(SessionEvent::SignedIn { uid: session.uid.clone() });
        Ok(session)
    }

    /// Exchanges the refresh token for a fresh id token.
    pub async fn refresh(&self, session: &AdminSession) -> Result<AdminSession, AuthError> {
        let creds = self
            .provider
            .refresh(&session.refresh_token)
            .await
            .map_err(|err| match err {
                BackendError::InvalidCredentials => AuthError::Rejected(err),
                err => AuthError::from_backend(err),
            })?;

        let mut refreshed = AdminSession::from_credentials(creds, Utc::now());
        if refreshed.email.is_empty() {
            refreshed.email = session.email.clone();
        }
        tracing::debug!(uid = %refreshed.uid, "admin token refreshed");
        let _ = self.events.send(SessionEvent::Refreshed { uid: refreshed.uid.clone() });
        Ok(refreshed)
    }

    pub fn signed_out(&self, session: &AdminSession) {
        tracing::info!(uid = %session.uid, "admin signed out");
        let _ = self.events.send(SessionEvent::SignedOut { uid: session.uid.clone() });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use super::*;
    use crate::backend::{FailPoint, MemoryBackend};

    fn service() -> (AuthService, Arc<MemoryBackend>) {
        let memory = Arc::new(MemoryBackend::new());
        memory.add_user("admin@example.com", "secret");
        (AuthService::new(memory.clone()), memory)
    }

    #[tokio::test]
    async fn sign_in_emits_an_event() {
        let (auth, _memory) = service();
        let mut events = auth.subscribe();

        let session = auth.sign_in(" admin@example.com ", "secret").await.unwrap();

        assert_eq!(session.email, "admin@example.com");
        assert!(!session.is_expired(Utc::now()));
        assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedIn { uid: session.uid });
    }

    #[tokio::test]
    async fn wrong_password_and_outage_are_distinct() {
        let (auth, memory) = service();

        let err = auth.sign_in("admin@example.com", "nope").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(!err.is_retryable());

        memory.fail_next(FailPoint::SignIn, BackendError::Transient("timeout".into()));
        let err = auth.sign_in("admin@example.com", "secret").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn blank_fields_never_reach_the_provider() {
        let (auth, memory) = service();
        memory.fail_next(FailPoint::SignIn, BackendError::Transient("should not be hit".into()));
        assert!(matches!(auth.sign_in("", "secret").await, Err(AuthError::InvalidCredentials)));
        assert!(matches!(auth.sign_in("admin@example.com", "").await, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn refresh_keeps_identity_and_rotates_tokens() {
        let (auth, memory) = service();
        memory.set_token_lifetime(StdDuration::from_secs(30));
        let session = auth.sign_in("admin@example.com", "secret").await.unwrap();
        assert!(session.is_expired(Utc::now()));

        let refreshed = auth.refresh(&session).await.unwrap();
        assert_eq!(refreshed.uid, session.uid);
        assert_eq!(refreshed.email, session.email);
        assert_ne!(refreshed.id_token, session.id_token);

        let err = auth.refresh(&session).await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected(_)));
    }
}
