mod common;

use std::sync::Arc;

use common::TestApp;
use reqwest::{header::LOCATION, StatusCode};
use reverie::{
    backend::{BackendError, Document, FailPoint, MemoryBackend},
    model::{Category, Photo, MESSAGES, PHOTOS},
};
use serde_json::json;

fn stored_photo(id: &str, title: &str, category: Category, archived: bool) -> Document {
    let photo = Photo {
        id: id.to_owned(),
        src: format!("https://img.example/{id}.jpg"),
        title: title.to_owned(),
        category,
        storage_path: Photo::storage_path_for(id),
        caption: Some(format!("About {title}")),
        is_archived: archived,
        pending_delete: false,
    };
    Document::from_record(id, &photo).unwrap()
}

async fn gallery_app() -> TestApp {
    let memory = Arc::new(MemoryBackend::new());
    memory.insert_document(PHOTOS, stored_photo("1700000000003", "Dunes", Category::Landscapes, false));
    memory.insert_document(PHOTOS, stored_photo("1700000000002", "Wedding", Category::Events, false));
    memory.insert_document(PHOTOS, stored_photo("1700000000001", "Hidden", Category::Portraits, true));
    memory.insert_document(PHOTOS, stored_photo("1700000000000", "Sisters", Category::Portraits, false));
    TestApp::spawn_with(memory).await
}

#[tokio::test]
async fn home_shows_defaults_when_nothing_is_stored() {
    let app = TestApp::spawn().await;
    let html = app.page("/").await;

    assert!(html.contains("Passionfruit Reverie"));
    assert!(html.contains("Timeless photography that tells your story."));
    assert!(html.contains("No featured photos yet. Upload some in the admin panel!"));
    assert!(html.contains("background-color: #d1fffc"));
    assert!(!html.contains("lightbox.js"));
}

#[tokio::test]
async fn home_features_active_photos_newest_first() {
    let app = gallery_app().await;
    let html = app.page("/").await;

    let dunes = html.find("Dunes").unwrap();
    let wedding = html.find("Wedding").unwrap();
    let sisters = html.find("Sisters").unwrap();
    assert!(dunes < wedding && wedding < sisters);
    assert!(!html.contains("Hidden"));
}

#[tokio::test]
async fn portfolio_filters_by_category() {
    let app = gallery_app().await;

    let all = app.page("/portfolio").await;
    for title in ["Dunes", "Wedding", "Sisters"] {
        assert!(all.contains(title));
    }
    assert!(!all.contains("Hidden"));

    let portraits = app.page("/portfolio?category=Portraits").await;
    assert!(portraits.contains("Sisters"));
    assert!(!portraits.contains("Dunes"));
    assert!(!portraits.contains("Hidden"));
    assert!(portraits.contains(r#"<a href="/portfolio?category=Portraits" class="active">Portraits</a>"#));
}

#[tokio::test]
async fn empty_category_says_so() {
    let app = TestApp::spawn().await;
    let html = app.page("/portfolio?category=Events").await;
    assert!(html.contains("No photos in this category yet."));
}

#[tokio::test]
async fn lightbox_opens_over_the_filtered_list() {
    let app = gallery_app().await;
    let html = app.page("/portfolio?category=Portraits&photo=1700000000000").await;

    assert!(html.contains(r#"class="lightbox-open""#));
    assert!(html.contains("/static/lightbox.js"));
    assert!(html.contains("<p>About Sisters</p>"));
    // one portrait is active, so both neighbours are itself
    assert!(html.contains(r#"href="/portfolio?category=Portraits&amp;photo=1700000000000" data-lightbox="next""#));
    assert!(html.contains(r#"href="/portfolio?category=Portraits" data-lightbox="close""#));
}

#[tokio::test]
async fn lightbox_keys_redirect_through_the_list() {
    let app = gallery_app().await;

    let response = app.get("/portfolio?photo=1700000000000&key=ArrowRight").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/portfolio?photo=1700000000003");

    let response = app.get("/?photo=1700000000003&key=ArrowLeft").await;
    assert_eq!(response.headers()[LOCATION], "/?photo=1700000000000");

    let response = app.get("/?photo=1700000000003&key=Escape").await;
    assert_eq!(response.headers()[LOCATION], "/");
}

#[tokio::test]
async fn archived_photo_cannot_be_opened() {
    let app = gallery_app().await;
    let html = app.page("/portfolio?photo=1700000000001").await;
    assert!(!html.contains("lightbox-open"));
}

#[tokio::test]
async fn about_headshot_opens_alone() {
    let app = TestApp::spawn().await;
    let html = app.page("/about").await;
    assert!(html.contains("About Alicia"));
    assert!(html.contains(r#"href="/about?photo=portrait-headshot""#));

    let open = app.page("/about?photo=portrait-headshot").await;
    assert!(open.contains("A portrait of the photographer."));
    assert!(open.contains(r#"href="/about?photo=portrait-headshot" data-lightbox="prev""#));
}

#[tokio::test]
async fn contact_submission_is_recorded_and_acknowledged() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form("/contact", &[("name", "Ana"), ("email", "ana@example.com"), ("message", "June?")])
        .await;
    let html = app.follow(response).await;

    assert!(html.contains("Thank you! Your message has been sent."));
    let messages = app.store.messages().await;
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].replied);
    assert!(app.memory.document(MESSAGES, &messages[0].id).is_some());

    // the notice is shown once
    assert!(!app.page("/contact").await.contains("Thank you!"));
}

#[tokio::test]
async fn contact_errors_keep_what_was_typed() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form("/contact", &[("name", "Ana <3"), ("email", "ana@example.com"), ("message", " ")])
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = response.text().await.unwrap();
    assert!(html.contains("the message field is required"));
    assert!(html.contains(r#"value="Ana &lt;3""#));

    app.memory.fail_next(FailPoint::Set, BackendError::Transient("offline".into()));
    let response = app
        .post_form("/contact", &[("name", "Ana"), ("email", "ana@example.com"), ("message", "Hello")])
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let html = response.text().await.unwrap();
    assert!(html.contains("Please try again."));
    assert!(html.contains(">Hello</textarea>"));
    assert!(app.store.messages().await.is_empty());
}

#[tokio::test]
async fn user_text_is_escaped() {
    let memory = Arc::new(MemoryBackend::new());
    memory.insert_document(
        "settings",
        Document {
            id: "aboutContent".into(),
            fields: json!({ "title": "<b>Me</b>", "paragraphs": ["I love *light*.", "<script>x()</script>"] })
                .as_object()
                .unwrap()
                .clone(),
        },
    );
    let app = TestApp::spawn_with(memory).await;
    let html = app.page("/about").await;

    assert!(html.contains("&lt;b&gt;Me&lt;/b&gt;"));
    assert!(html.contains("<em>light</em>"));
    assert!(!html.contains("<script>x()"));
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = TestApp::spawn().await;
    let response = app.get("/weddings").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.text().await.unwrap().contains("Page not found"));
}

#[tokio::test]
async fn static_assets_are_served() {
    let app = TestApp::spawn().await;
    let css = app.get("/static/site.css").await;
    assert_eq!(css.status(), StatusCode::OK);
    assert!(css.headers()["content-type"].to_str().unwrap().starts_with("text/css"));
    assert!(css.text().await.unwrap().contains(".lightbox-open"));
}
