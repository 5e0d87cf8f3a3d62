use anyhow::Context;
use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::Response,
    Form,
};
use chrono::Utc;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    authentication::compute_password_hash,
    domain::NewUser,
    routes::error_response,
    session_state::TypedSession,
    telemetry::spawn_blocking_with_tracing,
    utils::{e500, error_chain_fmt, see_other},
    AppState,
};

#[derive(Deserialize)]
pub struct RegisterFormData {
    pub username: String,
    pub password: Secret<String>,
    pub email: String,
    pub birth: String,
}

#[derive(thiserror::Error)]
pub enum RegisterError {
    #[error("A user with this name already exists")]
    UsernameTaken,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for RegisterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[tracing::instrument(
    name = "Registering a new user",
    skip(state, session, form),
    fields(
        username = tracing::field::Empty,
        user_email = tracing::field::Empty,
        user_id = tracing::field::Empty,
    )
)]
pub async fn register(
    state: State<AppState>,
    session: TypedSession,
    form: Result<Form<RegisterFormData>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            tracing::warn!("Rejected registration form: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };
    let span = tracing::Span::current();
    span.record("username", &tracing::field::display(&form.username));
    span.record("user_email", &tracing::field::display(&form.email));

    let new_user: NewUser = match form.try_into() {
        Ok(new_user) => new_user,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };
    let user_id = match insert_user(&state.pg_connection_pool, new_user).await {
        Ok(user_id) => user_id,
        Err(e @ RegisterError::UsernameTaken) => {
            tracing::warn!("{e}");
            return error_response(StatusCode::FORBIDDEN, &e.to_string());
        }
        Err(e) => return e500(e),
    };
    span.record("user_id", &tracing::field::display(&user_id));

    match session.start(user_id) {
        Ok(()) => see_other("/users"),
        Err(e) => e500(e),
    }
}

#[tracing::instrument(name = "Saving new user details in the database", skip_all)]
pub async fn insert_user(pg_pool: &PgPool, new_user: NewUser) -> Result<Uuid, RegisterError> {
    let NewUser {
        username,
        password,
        email,
        birthday,
    } = new_user;
    let password_hash = spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .context("Failed to spawn blocking task.")??;

    let user_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (user_id, username, password_hash, email, birthday, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(username.as_ref())
    .bind(password_hash.expose_secret())
    .bind(email.as_ref())
    .bind(birthday.date())
    .bind(Utc::now())
    .execute(pg_pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => {
            RegisterError::UsernameTaken
        }
        e => RegisterError::UnexpectedError(
            anyhow::Error::new(e).context("Failed to insert a new user."),
        ),
    })?;
    Ok(user_id)
}
