use anyhow::Context;
use askama_axum::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension,
};
use axum_flash::IncomingFlashes;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    authentication::UserId,
    utils::{e500, read_flash_messages, FlashMessage},
    AppState,
};

#[derive(Template)]
#[template(path = "users.html")]
struct UsersPage {
    username: String,
    me: Uuid,
    users: Vec<UserEntry>,
    messages: Vec<FlashMessage>,
}

/// A registered user, seen from the point of view of the logged-in one.
#[derive(Debug, sqlx::FromRow)]
pub struct UserEntry {
    pub user_id: Uuid,
    pub username: String,
    pub birthday: NaiveDate,
    pub subscribed: bool,
    pub days_alert: Option<i32>,
}

#[tracing::instrument(name = "List users", skip_all, fields(user_id = %*user_id))]
pub async fn users_list(
    state: State<AppState>,
    flash_messages: IncomingFlashes,
    user_id: Extension<UserId>,
) -> Response {
    let me = **user_id;
    let username = match get_username(&state.pg_connection_pool, me).await {
        Ok(username) => username,
        Err(e) => return e500(e),
    };
    let users = match get_users_for(&state.pg_connection_pool, me).await {
        Ok(users) => users,
        Err(e) => return e500(e),
    };
    let messages = read_flash_messages(&flash_messages);
    (
        flash_messages,
        UsersPage {
            username,
            me,
            users,
            messages,
        },
    )
        .into_response()
}

#[tracing::instrument(name = "Get username", skip(pg_pool))]
pub async fn get_username(pg_pool: &PgPool, user_id: Uuid) -> anyhow::Result<String> {
    let (username,): (String,) = sqlx::query_as(
        r#"
        SELECT username
        FROM users
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(pg_pool)
    .await
    .context("Failed to perform a query to retrieve a username.")?;
    Ok(username)
}

/// Every user, flagged with whether `subscriber_id` follows their birthday.
#[tracing::instrument(name = "Get users with subscription status", skip(pg_pool))]
pub async fn get_users_for(pg_pool: &PgPool, subscriber_id: Uuid) -> anyhow::Result<Vec<UserEntry>> {
    sqlx::query_as::<_, UserEntry>(
        r#"
        SELECT
            u.user_id,
            u.username,
            u.birthday,
            (s.subscriber_id IS NOT NULL) AS subscribed,
            s.days_alert
        FROM users AS u
        LEFT JOIN subscriptions AS s
            ON s.subscription_id = u.user_id AND s.subscriber_id = $1
        ORDER BY u.username
        "#,
    )
    .bind(subscriber_id)
    .fetch_all(pg_pool)
    .await
    .context("Failed to list users.")
}
