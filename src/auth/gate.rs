use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::{
    session::{set_flash, Flash, ADMIN},
    AppError, AppResult,
};

use super::{AdminSession, AuthError, AuthService};

/// Whether the request comes from a signed-in admin. Expired tokens are
/// refreshed on the way in.
#[derive(Debug, Clone)]
pub enum AdminGate {
    Authenticated(AdminSession),
    Unauthenticated,
}

impl AdminGate {
    pub fn admin(&self) -> Option<&AdminSession> {
        match self {
            AdminGate::Authenticated(admin) => Some(admin),
            AdminGate::Unauthenticated => None,
        }
    }
}

impl<S> FromRequestParts<S> for AdminGate
where
    S: Send + Sync,
    AuthService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::from(msg))?;
        resolve(&session, &AuthService::from_ref(state)).await
    }
}

async fn resolve(session: &Session, auth: &AuthService) -> AppResult<AdminGate> {
    let Some(admin) = session.get::<AdminSession>(ADMIN).await? else {
        return Ok(AdminGate::Unauthenticated);
    };
    if !admin.is_expired(Utc::now()) {
        return Ok(AdminGate::Authenticated(admin));
    }

    match auth.refresh(&admin).await {
        Ok(refreshed) => {
            session.insert(ADMIN, &refreshed).await?;
            Ok(AdminGate::Authenticated(refreshed))
        }
        // keep the session; the next request tries again
        Err(err @ AuthError::Unavailable(_)) => {
            tracing::warn!(uid = %admin.uid, %err, "token refresh failed");
            Ok(AdminGate::Authenticated(admin))
        }
        Err(err) => {
            tracing::info!(uid = %admin.uid, %err, "admin session ended");
            session.remove::<AdminSession>(ADMIN).await?;
            auth.signed_out(&admin);
            Ok(AdminGate::Unauthenticated)
        }
    }
}

/// Extracts the admin or sends the visitor to the sign-in form.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AdminSession);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AuthService: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        match resolve(&session, &AuthService::from_ref(state)).await {
            Ok(AdminGate::Authenticated(admin)) => Ok(RequireAdmin(admin)),
            Ok(AdminGate::Unauthenticated) => {
                set_flash(&session, Flash::error("Please sign in to continue."))
                    .await
                    .map_err(IntoResponse::into_response)?;
                Err(Redirect::to("/admin").into_response())
            }
            Err(err) => Err(err.into_response()),
        }
    }
}
