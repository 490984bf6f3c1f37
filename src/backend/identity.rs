use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{error_from_response, AuthProvider, BackendError, Credentials, GetField, IdToken};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordSignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'a str,
    refresh_token: &'a str,
}

/// Identity Toolkit (password sign-in) and Secure Token (refresh) adapter.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    api_key: String,
    identity_base: String,
    token_base: String,
}

impl IdentityClient {
    pub fn new(http: reqwest::Client, api_key: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_owned(),
            identity_base: "https://identitytoolkit.googleapis.com".to_owned(),
            token_base: "https://securetoken.googleapis.com".to_owned(),
        }
    }

    /// Points both endpoints at one host.
    pub fn with_base_url(http: reqwest::Client, api_key: &str, base: &str) -> Self {
        let base = base.trim_end_matches('/').to_owned();
        Self {
            http,
            api_key: api_key.to_owned(),
            identity_base: base.clone(),
            token_base: base,
        }
    }
}

fn expires_in(body: &Value, field: &str) -> Result<Duration, BackendError> {
    let raw = body.get_str_field(field)?;
    raw.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| BackendError::Decode(format!("{field} {raw:?}")))
}

/// Sign-in failures arrive as HTTP 400 with a code in the message.
fn classify_sign_in_error(err: BackendError) -> BackendError {
    let BackendError::Rejected { status, message } = err else {
        return err;
    };
    let code = message.split([' ', ':']).next().unwrap_or_default();
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL"
        | "MISSING_PASSWORD" | "USER_DISABLED" => BackendError::InvalidCredentials,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => BackendError::Transient(message),
        _ => BackendError::Rejected { status, message },
    }
}

#[async_trait]
impl AuthProvider for IdentityClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credentials, BackendError> {
        let response = self
            .http
            .post(format!("{}/v1/accounts:signInWithPassword", self.identity_base))
            .query(&[("key", &self.api_key)])
            .json(&PasswordSignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(classify_sign_in_error(error_from_response(response).await));
        }

        let body: Value = response.json().await?;
        Ok(Credentials {
            uid: body.get_str_field("localId")?,
            email: body.get_str_field("email")?,
            id_token: IdToken(body.get_str_field("idToken")?),
            refresh_token: body.get_str_field("refreshToken")?,
            expires_in: expires_in(&body, "expiresIn")?,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, BackendError> {
        let response = self
            .http
            .post(format!("{}/v1/token", self.token_base))
            .query(&[("key", &self.api_key)])
            .form(&RefreshRequest {
                grant_type: "refresh_token",
                refresh_token,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(match error_from_response(response).await {
                // revoked, expired or malformed refresh tokens
                BackendError::Rejected { message, .. } => BackendError::Unauthorized(message),
                other => other,
            });
        }

        let body: Value = response.json().await?;
        Ok(Credentials {
            uid: body.get_str_field("user_id")?,
            email: String::new(),
            id_token: IdToken(body.get_str_field("id_token")?),
            refresh_token: body.get_str_field("refresh_token")?,
            expires_in: expires_in(&body, "expires_in")?,
        })
    }
}
