use axum::{extract::State, http::StatusCode, response::Response, Form};
use secrecy::Secret;
use serde::Deserialize;

use crate::{
    authentication::{validate_credentials, AuthError, Credentials},
    routes::error_response,
    session_state::TypedSession,
    utils::{e500, see_other},
    AppState,
};

#[derive(Deserialize)]
pub struct LoginFormData {
    username: String,
    password: Secret<String>,
}

#[tracing::instrument(
    skip(state, session, form),
    fields(username=tracing::field::Empty, user_id=tracing::field::Empty)
)]
pub async fn login(
    state: State<AppState>,
    session: TypedSession,
    form: Form<LoginFormData>,
) -> Response {
    let credentials = Credentials {
        username: form.0.username,
        password: form.0.password,
    };
    tracing::Span::current().record("username", &tracing::field::display(&credentials.username));

    match validate_credentials(&state.pg_connection_pool, credentials).await {
        Ok(user_id) => {
            tracing::Span::current().record("user_id", &tracing::field::display(&user_id));
            match session.start(user_id) {
                Ok(()) => see_other("/users"),
                Err(e) => e500(e),
            }
        }
        Err(AuthError::InvalidCredentials(e)) => {
            tracing::warn!("Login rejected: {e:?}");
            // Same answer whether the username or the password was wrong.
            error_response(StatusCode::FORBIDDEN, "Wrong username or password")
        }
        Err(e) => e500(e),
    }
}
