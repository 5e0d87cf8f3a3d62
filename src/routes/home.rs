use askama_axum::Template;
use axum::response::{IntoResponse, Response};
use axum_flash::IncomingFlashes;

use crate::session_state::TypedSession;
use crate::utils::{e500, read_flash_messages, see_other, FlashMessage};

#[derive(Template)]
#[template(path = "index.html")]
struct Index {
    messages: Vec<FlashMessage>,
}

/// Login and registration page. Visitors that are already logged in go
/// straight to the user list.
pub async fn home(session: TypedSession, flash_messages: IncomingFlashes) -> Response {
    match session.user_id() {
        Ok(Some(_)) => return see_other("/users"),
        Ok(None) => {}
        Err(e) => return e500(e),
    }
    let messages = read_flash_messages(&flash_messages);
    (flash_messages, Index { messages }).into_response()
}
