#![allow(dead_code)]

use std::sync::Arc;

use reqwest::{header::LOCATION, redirect::Policy, Response, StatusCode};
use reverie::{
    auth::AuthService,
    backend::{AuthProvider, Backend, IdToken, InlineData, MemoryBackend},
    config::Config,
    model::{Category, NewPhoto, Photo},
    store::SiteStore,
    AppState,
};
use tokio::net::TcpListener;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse";

pub fn png() -> InlineData {
    InlineData::new("image/png", vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a])
}

/// A server on a random local port over an in-memory backend, plus a
/// cookie-keeping client that does not follow redirects.
pub struct TestApp {
    pub base: String,
    pub client: reqwest::Client,
    pub memory: Arc<MemoryBackend>,
    pub store: SiteStore,
    pub auth: AuthService,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(Arc::new(MemoryBackend::new())).await
    }

    /// Documents already in `memory` are loaded like a real start-up.
    pub async fn spawn_with(memory: Arc<MemoryBackend>) -> Self {
        memory.add_user(ADMIN_EMAIL, ADMIN_PASSWORD);
        let backend = Backend::memory(memory.clone());
        let auth = AuthService::new(backend.auth.clone());
        let store = SiteStore::load(backend).await;

        let app = reverie::app(AppState {
            store: store.clone(),
            auth: auth.clone(),
            config: Arc::new(Config::default()),
        });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .unwrap();

        Self { base: format!("http://{addr}"), client, memory, store, auth }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// GETs `path` and expects a page.
    pub async fn page(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        response.text().await.unwrap()
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client.post(self.url(path)).form(form).send().await.unwrap()
    }

    pub async fn post_multipart(&self, path: &str, form: reqwest::multipart::Form) -> Response {
        self.client.post(self.url(path)).multipart(form).send().await.unwrap()
    }

    /// Asserts a redirect and loads its target.
    pub async fn follow(&self, response: Response) -> String {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[LOCATION].to_str().unwrap().to_owned();
        self.page(&location).await
    }

    /// The CSRF token the admin page hands this client's session.
    pub async fn csrf(&self) -> String {
        let html = self.page("/admin").await;
        extract_csrf(&html)
    }

    pub async fn sign_in(&self) -> String {
        let csrf = self.csrf().await;
        let response = self
            .post_form(
                "/admin/login",
                &[("email", ADMIN_EMAIL), ("password", ADMIN_PASSWORD), ("csrf_token", &csrf)],
            )
            .await;
        let html = self.follow(response).await;
        assert!(html.contains("Signed in."), "sign-in failed: {html}");
        extract_csrf(&html)
    }

    /// A write credential for seeding through the store directly.
    pub async fn token(&self) -> IdToken {
        self.memory.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap().id_token
    }

    pub async fn seed_photo(&self, title: &str, category: Category) -> Photo {
        let new = NewPhoto { title: title.to_owned(), category, caption: None };
        self.store.add_photo(new, png(), &self.token().await).await.unwrap()
    }
}

pub fn extract_csrf(html: &str) -> String {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker).expect("no csrf field") + marker.len();
    let end = html[start..].find('"').unwrap() + start;
    html[start..end].to_owned()
}
