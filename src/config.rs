use std::{net::SocketAddr, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Which backend implementation serves documents, blobs and sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    Firebase(FirebaseConfig),
    /// Process-local backend for development and tests, seeded with one
    /// admin account.
    Memory { admin_email: String, admin_password: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub storage_bucket: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub backend: BackendKind,
    pub request_timeout: Duration,
    pub secure_cookies: bool,
    pub session_idle_minutes: i64,
    pub max_upload_bytes: usize,
    pub site_name: String,
    pub contact_email: String,
    pub instagram_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            backend: BackendKind::Memory {
                admin_email: "admin@example.com".to_owned(),
                admin_password: "change-me".to_owned(),
            },
            request_timeout: Duration::from_secs(15),
            secure_cookies: false,
            session_idle_minutes: 60,
            max_upload_bytes: 10 * 1024 * 1024,
            site_name: "Alicia R.".to_owned(),
            contact_email: "contact@aliciar.photo".to_owned(),
            instagram_url: "https://instagram.com".to_owned(),
        }
    }
}

impl Config {
    /// Reads configuration from the process environment, after loading a
    /// `.env` file when one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend = match lookup("REVERIE_BACKEND").as_deref() {
            Some("memory") => BackendKind::Memory {
                admin_email: lookup("REVERIE_ADMIN_EMAIL")
                    .ok_or(ConfigError::Missing("REVERIE_ADMIN_EMAIL"))?,
                admin_password: lookup("REVERIE_ADMIN_PASSWORD")
                    .ok_or(ConfigError::Missing("REVERIE_ADMIN_PASSWORD"))?,
            },
            None | Some("firebase") => BackendKind::Firebase(FirebaseConfig {
                api_key: lookup("FIREBASE_API_KEY").ok_or(ConfigError::Missing("FIREBASE_API_KEY"))?,
                project_id: lookup("FIREBASE_PROJECT_ID")
                    .ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))?,
                storage_bucket: lookup("FIREBASE_STORAGE_BUCKET")
                    .ok_or(ConfigError::Missing("FIREBASE_STORAGE_BUCKET"))?,
            }),
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "REVERIE_BACKEND",
                    value: other.to_owned(),
                });
            }
        };

        Ok(Self {
            bind: parse_or(&lookup, "REVERIE_BIND", defaults.bind)?,
            backend,
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "REVERIE_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            secure_cookies: parse_or(&lookup, "REVERIE_SECURE_COOKIES", defaults.secure_cookies)?,
            session_idle_minutes: parse_or(
                &lookup,
                "REVERIE_SESSION_IDLE_MINUTES",
                defaults.session_idle_minutes,
            )?,
            max_upload_bytes: parse_or(&lookup, "REVERIE_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            site_name: lookup("REVERIE_SITE_NAME").unwrap_or(defaults.site_name),
            contact_email: lookup("REVERIE_CONTACT_EMAIL").unwrap_or(defaults.contact_email),
            instagram_url: lookup("REVERIE_INSTAGRAM_URL").unwrap_or(defaults.instagram_url),
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
