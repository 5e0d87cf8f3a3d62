use axum::response::{IntoResponse, Redirect, Response};
use axum_flash::Flash;

use crate::session_state::TypedSession;

pub async fn log_out(session: TypedSession, flash: Flash) -> Response {
    session.end();
    (
        flash.info("You have successfully logged out."),
        Redirect::to("/"),
    )
        .into_response()
}
