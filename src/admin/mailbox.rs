use axum::{
    debug_handler,
    extract::{Path, State},
    response::Redirect,
    Form,
};
use chrono::SecondsFormat;
use tower_sessions::Session;

use crate::{
    auth::RequireAdmin,
    html::escape_html,
    include_res,
    model::Message,
    session::verify_csrf,
    store::SiteStore,
    AppResult, AppState,
};

use super::{finish, forms::TokenForm, stale_form, Tab};

fn message_item(message: &Message, csrf: &str) -> String {
    let (class, replied_label) = if message.replied {
        ("replied", "Mark as unreplied")
    } else {
        ("", "Mark as replied")
    };
    include_res!(str, "/pages/admin/message.html")
        .replace("{class}", class)
        .replace("{replied_label}", replied_label)
        .replace("{csrf_token}", csrf)
        .replace("{id}", &escape_html(&message.id))
        .replace("{timestamp}", &message.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true))
        .replace("{received}", &message.timestamp.format("%b %e, %Y %H:%M UTC").to_string())
        .replace("{name}", &escape_html(&message.name))
        .replace("{email}", &escape_html(&message.email))
        .replace("{body}", &escape_html(&message.body))
}

pub(crate) async fn panel(store: &SiteStore, csrf: &str) -> String {
    let messages = store.messages().await;
    let list = if messages.is_empty() {
        r#"<p class="empty">No messages yet.</p>"#.to_owned()
    } else {
        let items: String = messages.iter().map(|m| message_item(m, csrf)).collect();
        format!(r#"<ul class="mail">{items}</ul>"#)
    };
    include_res!(str, "/pages/admin/mailbox.html").replace("{messages}", &list)
}

#[debug_handler(state = AppState)]
pub(crate) async fn toggle_replied(
    State(store): State<SiteStore>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    session: Session,
    Form(TokenForm { csrf_token }): Form<TokenForm>,
) -> AppResult<Redirect> {
    if !verify_csrf(&session, &csrf_token).await? {
        return stale_form(&session, Tab::Mailbox).await;
    }
    let result = store.toggle_replied(&id, &admin.id_token).await;
    finish(&session, Tab::Mailbox, "Mailbox", result, |message| {
        let state = if message.replied { "replied" } else { "not replied" };
        format!("Message from {} marked as {state}.", message.name)
    })
    .await
}
