use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_flash::Flash;
use std::ops::Deref;
use uuid::Uuid;

use crate::{session_state::TypedSession, utils::e500};

#[derive(Copy, Clone, Debug)]
pub struct UserId(Uuid);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Deref for UserId {
    type Target = Uuid;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Lets the request through only when the session belongs to a logged-in
/// user, whose id is then available to handlers as `Extension<UserId>`.
pub async fn reject_anonymous_users(
    session: TypedSession,
    flash: Flash,
    mut request: Request,
    next: Next,
) -> Response {
    match session.user_id() {
        Ok(Some(user_id)) => {
            request.extensions_mut().insert(UserId(user_id));
            next.run(request).await
        }
        Ok(None) => {
            tracing::warn!("Anonymous request to a protected route");
            (flash.error("Please log in first."), Redirect::to("/")).into_response()
        }
        Err(e) => e500(e),
    }
}
