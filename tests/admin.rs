mod common;

use std::{sync::Arc, time::Duration};

use common::{extract_csrf, png, TestApp, ADMIN_EMAIL};
use reqwest::{
    header::LOCATION,
    multipart::{Form, Part},
    StatusCode,
};
use reverie::{
    auth::SessionEvent,
    backend::{BackendError, Document, FailPoint, MemoryBackend},
    model::{Category, NewMessage, MESSAGES, PHOTOS},
};
use serde_json::json;

fn image_part(name: &str) -> Part {
    Part::bytes(png().bytes)
        .file_name(name.to_owned())
        .mime_str("image/png")
        .unwrap()
}

fn upload_form(csrf: &str, title: &str, category: &str) -> Form {
    Form::new()
        .text("csrf_token", csrf.to_owned())
        .text("title", title.to_owned())
        .text("category", category.to_owned())
        .text("caption", "Golden hour")
        .part("photo", image_part("dunes.png"))
}

#[tokio::test]
async fn signed_out_visitors_get_the_login_form() {
    let app = TestApp::spawn().await;
    let html = app.page("/admin").await;
    assert!(html.contains("Admin Login"));
    assert!(!html.contains("Logout"));
}

#[tokio::test]
async fn wrong_password_is_refused() {
    let app = TestApp::spawn().await;
    let csrf = app.csrf().await;
    let response = app
        .post_form(
            "/admin/login",
            &[("email", ADMIN_EMAIL), ("password", "wrong"), ("csrf_token", &csrf)],
        )
        .await;
    let html = app.follow(response).await;
    assert!(html.contains("Invalid email or password."));
    assert!(html.contains("Admin Login"));
}

#[tokio::test]
async fn sign_in_outage_invites_a_retry() {
    let app = TestApp::spawn().await;
    let csrf = app.csrf().await;
    app.memory.fail_next(FailPoint::SignIn, BackendError::Transient("offline".into()));
    let response = app
        .post_form(
            "/admin/login",
            &[("email", ADMIN_EMAIL), ("password", common::ADMIN_PASSWORD), ("csrf_token", &csrf)],
        )
        .await;
    let html = app.follow(response).await;
    assert!(html.contains(r#"class="notice retry""#));
    assert!(html.contains("Sign-in is unavailable right now. Please try again."));
}

#[tokio::test]
async fn login_needs_the_session_token() {
    let app = TestApp::spawn().await;
    app.csrf().await;
    let response = app
        .post_form(
            "/admin/login",
            &[("email", ADMIN_EMAIL), ("password", common::ADMIN_PASSWORD), ("csrf_token", "forged")],
        )
        .await;
    let html = app.follow(response).await;
    assert!(html.contains("The form expired. Please try again."));
    assert!(html.contains("Admin Login"));
}

#[tokio::test]
async fn commands_require_a_signed_in_admin() {
    let app = TestApp::spawn().await;
    let csrf = app.csrf().await;
    let response = app
        .post_form("/admin/design/color", &[("site_bg_color", "#000000"), ("csrf_token", &csrf)])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/admin");
    let html = app.follow(response).await;
    assert!(html.contains("Please sign in to continue."));
    assert_eq!(app.store.design().await.site_bg_color.as_str(), "#d1fffc");
}

#[tokio::test]
async fn signed_in_admin_sees_the_tabs() {
    let app = TestApp::spawn().await;
    app.sign_in().await;

    let html = app.page("/admin").await;
    assert!(html.contains(ADMIN_EMAIL));
    assert!(html.contains(r#"<a href="/admin?tab=content" class="active">Content</a>"#));
    assert!(html.contains("Edit Home Page Hero"));

    let mailbox = app.page("/admin?tab=mailbox").await;
    assert!(mailbox.contains("No messages yet."));
}

#[tokio::test]
async fn stale_token_does_not_run_the_command() {
    let app = TestApp::spawn().await;
    app.sign_in().await;
    let response = app
        .post_form("/admin/design/color", &[("site_bg_color", "#000000"), ("csrf_token", "old")])
        .await;
    let html = app.follow(response).await;
    assert!(html.contains("The form expired. Please try again."));
    assert_eq!(app.store.design().await.site_bg_color.as_str(), "#d1fffc");
}

#[tokio::test]
async fn photo_lifecycle() {
    let app = TestApp::spawn().await;
    let csrf = app.sign_in().await;

    let response = app.post_multipart("/admin/photos", upload_form(&csrf, "Dunes", "Landscapes")).await;
    let html = app.follow(response).await;
    assert!(html.contains("Uploaded &quot;Dunes&quot;."));
    assert!(html.contains("Active Photos (1)"));

    let photo = app.store.photos().await.remove(0);
    assert_eq!(photo.category, Category::Landscapes);
    assert_eq!(photo.caption.as_deref(), Some("Golden hour"));
    assert!(app.memory.blob(&photo.storage_path).is_some());
    assert!(app.page("/").await.contains("Dunes"));
    assert!(app.page("/portfolio?category=Landscapes").await.contains("Dunes"));

    let edit = app.page(&format!("/admin/photos/{}/edit", photo.id)).await;
    assert!(edit.contains(r#"<option value="Landscapes" selected>"#));
    let response = app
        .post_form(
            &format!("/admin/photos/{}/edit", photo.id),
            &[("title", "Red Dunes"), ("category", "Events"), ("caption", ""), ("csrf_token", &csrf)],
        )
        .await;
    assert!(app.follow(response).await.contains("Saved &quot;Red Dunes&quot;."));
    let edited = app.store.photo(&photo.id).await.unwrap();
    assert_eq!(edited.category, Category::Events);
    assert_eq!(edited.caption, None);

    let response = app
        .post_form(&format!("/admin/photos/{}/archive", photo.id), &[("csrf_token", &csrf)])
        .await;
    let html = app.follow(response).await;
    assert!(html.contains("&quot;Red Dunes&quot; archived."));
    assert!(html.contains("Archived Photos (1)"));
    assert!(!app.page("/portfolio").await.contains("Red Dunes"));

    let confirm = app.page(&format!("/admin/photos/{}/delete", photo.id)).await;
    assert!(confirm.contains("permanently delete &quot;Red Dunes&quot;?"));
    let response = app
        .post_form(&format!("/admin/photos/{}/delete", photo.id), &[("csrf_token", &csrf)])
        .await;
    assert!(app.follow(response).await.contains("Deleted &quot;Red Dunes&quot;."));
    assert!(app.store.photos().await.is_empty());
    assert!(app.memory.document(PHOTOS, &photo.id).is_none());
    assert_eq!(app.memory.blob_count(), 0);
}

#[tokio::test]
async fn upload_needs_a_file_and_a_title() {
    let app = TestApp::spawn().await;
    let csrf = app.sign_in().await;

    let form = Form::new()
        .text("csrf_token", csrf.clone())
        .text("title", "No file")
        .text("category", "Events");
    let html = app.follow(app.post_multipart("/admin/photos", form).await).await;
    assert!(html.contains("Upload: please select a file and provide a title."));

    let form = Form::new()
        .text("csrf_token", csrf)
        .text("title", "Notes")
        .text("category", "Events")
        .part("photo", Part::bytes(b"hello".to_vec()).file_name("notes.txt").mime_str("text/plain").unwrap());
    let html = app.follow(app.post_multipart("/admin/photos", form).await).await;
    assert!(html.contains("Upload: the upload must be an image file."));
    assert!(app.store.photos().await.is_empty());
    assert_eq!(app.memory.blob_count(), 0);
}

#[tokio::test]
async fn interrupted_delete_is_finished_by_the_sweep() {
    let app = TestApp::spawn().await;
    let csrf = app.sign_in().await;
    let photo = app.seed_photo("Sisters", Category::Portraits).await;

    app.memory.fail_next(FailPoint::DeleteBlob, BackendError::Transient("offline".into()));
    let response = app
        .post_form(&format!("/admin/photos/{}/delete", photo.id), &[("csrf_token", &csrf)])
        .await;
    let html = app.follow(response).await;
    assert!(html.contains("could not be fully removed"));
    assert!(html.contains(r#"action="/admin/photos/sweep""#));
    assert!(html.contains("Active Photos (0)"));
    assert!(!app.page("/portfolio").await.contains("Sisters"));
    assert!(app.memory.document(PHOTOS, &photo.id).is_some());

    let response = app.post_form("/admin/photos/sweep", &[("csrf_token", &csrf)]).await;
    let html = app.follow(response).await;
    assert!(html.contains("Finished 1 pending deletion(s)."));
    assert!(!html.contains(r#"action="/admin/photos/sweep""#));
    assert!(app.memory.document(PHOTOS, &photo.id).is_none());
    assert_eq!(app.memory.blob_count(), 0);
}

#[tokio::test]
async fn content_edits_show_on_the_public_pages() {
    let app = TestApp::spawn().await;
    let csrf = app.sign_in().await;

    let hero = Form::new()
        .text("csrf_token", csrf.clone())
        .text("hero_title", "Light & Shadow")
        .text("hero_subtitle", "Portraits in Lisbon")
        .part("hero_image", image_part("hero.png"));
    let html = app.follow(app.post_multipart("/admin/hero", hero).await).await;
    assert!(html.contains("Hero section saved."));
    let home = app.page("/").await;
    assert!(home.contains("Light &amp; Shadow"));
    assert!(home.contains("Portraits in Lisbon"));
    assert!(home.contains("data:image/png;base64,iVBORw0KGgo="));

    let about = Form::new()
        .text("csrf_token", csrf)
        .text("about_title", "Hello")
        .text("about_paragraphs", "First part.\r\n\r\nSecond *part*.");
    let html = app.follow(app.post_multipart("/admin/about", about).await).await;
    assert!(html.contains("About page saved."));
    let page = app.page("/about").await;
    assert!(page.contains("<p>First part.</p>"));
    assert!(page.contains("<p>Second <em>part</em>.</p>"));
    // the headshot was left alone
    assert!(page.contains("https://picsum.photos/id/1027/600/800"));
}

#[tokio::test]
async fn design_changes_apply_site_wide() {
    let app = TestApp::spawn().await;
    let csrf = app.sign_in().await;

    let response = app
        .post_form("/admin/design/color", &[("site_bg_color", "#1A2B3C"), ("csrf_token", &csrf)])
        .await;
    assert!(app.follow(response).await.contains("Background colour set to #1a2b3c."));
    assert!(app.page("/contact").await.contains("background-color: #1a2b3c"));

    let response = app
        .post_form("/admin/design/color", &[("site_bg_color", "tomato"), ("csrf_token", &csrf)])
        .await;
    assert!(app.follow(response).await.contains("Design: colour"));

    let logo = Form::new().text("csrf_token", csrf.clone()).part("logo", image_part("logo.png"));
    let html = app.follow(app.post_multipart("/admin/design/logo", logo).await).await;
    assert!(html.contains("Logo updated."));
    assert!(app.page("/").await.contains("Photography Logo"));

    let response = app.post_form("/admin/design/logo/remove", &[("csrf_token", &csrf)]).await;
    let html = app.follow(response).await;
    assert!(html.contains("Logo removed."));
    assert!(!app.page("/").await.contains("Photography Logo"));
}

#[tokio::test]
async fn short_colours_fill_the_picker() {
    let app = TestApp::spawn().await;
    let csrf = app.sign_in().await;

    let response = app
        .post_form("/admin/design/color", &[("site_bg_color", "#0aF"), ("csrf_token", &csrf)])
        .await;
    assert!(app.follow(response).await.contains("Background colour set to #00aaff."));
    let panel = app.page("/admin?tab=design").await;
    assert!(panel.contains(r##"type="color" value="#00aaff""##));
    assert_eq!(app.memory.document("settings", "siteDesign").unwrap()["siteBgColor"], "#00aaff");
}

#[tokio::test]
async fn mailbox_marks_messages_replied() {
    let app = TestApp::spawn().await;
    let csrf = app.sign_in().await;
    let message = app
        .store
        .add_message(NewMessage {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            message: "Are you free in June?".into(),
        })
        .await
        .unwrap();

    let html = app.page("/admin?tab=mailbox").await;
    assert!(html.contains("Are you free in June?"));
    assert!(html.contains("Mark as replied"));

    let path = format!("/admin/messages/{}/replied", message.id);
    let html = app.follow(app.post_form(&path, &[("csrf_token", &csrf)]).await).await;
    assert!(html.contains("Message from Ana marked as replied."));
    assert!(html.contains("Mark as unreplied"));
    assert!(app.store.messages().await[0].replied);

    let html = app.follow(app.post_form(&path, &[("csrf_token", &csrf)]).await).await;
    assert!(html.contains("Message from Ana marked as not replied."));
}

#[tokio::test]
async fn mailbox_is_read_with_the_admin_credential() {
    let memory = Arc::new(MemoryBackend::new());
    memory.insert_document(
        MESSAGES,
        Document {
            id: "m1".into(),
            fields: json!({
                "name": "Bo", "email": "bo@example.com", "message": "Engagement shoot?",
                "timestamp": "2024-03-01T10:00:00.000000000Z", "replied": false
            })
            .as_object()
            .unwrap()
            .clone(),
        },
    );
    let app = TestApp::spawn_with(memory).await;
    assert!(app.store.messages().await.is_empty());

    app.sign_in().await;
    let html = app.page("/admin?tab=mailbox").await;
    assert!(html.contains("Engagement shoot?"));
    assert_eq!(app.store.messages().await.len(), 1);
}

#[tokio::test]
async fn mailbox_outage_at_sign_in_is_reported() {
    let app = TestApp::spawn().await;
    let csrf = app.csrf().await;
    app.memory.fail_next(FailPoint::Query, BackendError::Transient("offline".into()));
    let response = app
        .post_form(
            "/admin/login",
            &[("email", ADMIN_EMAIL), ("password", common::ADMIN_PASSWORD), ("csrf_token", &csrf)],
        )
        .await;
    let html = app.follow(response).await;
    assert!(html.contains("The mailbox could not be loaded; sign in again to retry."));
    assert!(html.contains("Logout"));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::spawn().await;
    let mut events = app.auth.subscribe();
    let csrf = app.sign_in().await;

    let response = app.post_form("/admin/logout?return_url=/portfolio", &[("csrf_token", &csrf)]).await;
    assert_eq!(response.headers()[LOCATION], "/portfolio");
    assert!(app.page("/admin").await.contains("Admin Login"));

    assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedIn { .. }));
    assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedOut { .. }));
}

#[tokio::test]
async fn expiring_tokens_are_refreshed_per_request() {
    let app = TestApp::spawn().await;
    app.memory.set_token_lifetime(Duration::from_secs(30));
    let mut events = app.auth.subscribe();
    app.sign_in().await;

    assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedIn { .. }));
    assert!(matches!(events.recv().await.unwrap(), SessionEvent::Refreshed { .. }));

    // an outage keeps the admin signed in
    app.memory.fail_next(FailPoint::Refresh, BackendError::Transient("offline".into()));
    assert!(app.page("/admin").await.contains("Logout"));

    app.memory.fail_next(FailPoint::Refresh, BackendError::Unauthorized("revoked".into()));
    let html = app.page("/admin").await;
    assert!(html.contains("Admin Login"));
    assert!(!extract_csrf(&html).is_empty());
}
