use anyhow::Context;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_flash::Flash;
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    authentication::UserId,
    domain::DaysAlert,
    utils::{e500, error_chain_fmt},
    AppState,
};

#[derive(Deserialize)]
pub struct SubscribeFormData {
    days_alert: String,
}

#[derive(thiserror::Error)]
pub enum SubscriptionError {
    #[error("There is no such user.")]
    UnknownUser,
    #[error("You were not subscribed to this user.")]
    NotSubscribed,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

fn back_to_users(flash: Flash) -> Response {
    (flash, Redirect::to("/users")).into_response()
}

/// An id that is not a UUID cannot name any user.
fn target_user(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, SubscriptionError> {
    match path {
        Ok(Path(user_id)) => Ok(user_id),
        Err(rejection) => {
            tracing::warn!("Malformed user id in path: {rejection}");
            Err(SubscriptionError::UnknownUser)
        }
    }
}

#[tracing::instrument(
    name = "Subscribe to a birthday",
    skip_all,
    fields(subscriber_id = %*user_id, subscription_id = tracing::field::Empty)
)]
pub async fn subscribe(
    state: State<AppState>,
    flash: Flash,
    user_id: Extension<UserId>,
    path: Result<Path<Uuid>, PathRejection>,
    form: Form<SubscribeFormData>,
) -> Response {
    let subscriber_id = **user_id;
    let subscription_id = match target_user(path) {
        Ok(subscription_id) => subscription_id,
        Err(e) => return back_to_users(flash.error(e.to_string())),
    };
    tracing::Span::current()
        .record("subscription_id", &tracing::field::display(&subscription_id));
    let days_alert = match DaysAlert::parse(&form.days_alert) {
        Ok(days_alert) => days_alert,
        Err(e) => return back_to_users(flash.error(e)),
    };
    if subscriber_id == subscription_id {
        return back_to_users(flash.error("You cannot subscribe to your own birthday."));
    }

    match upsert_subscription(
        &state.pg_connection_pool,
        subscriber_id,
        subscription_id,
        days_alert,
    )
    .await
    {
        Ok(()) => back_to_users(flash.info(format!(
            "Subscribed! You will be reminded {} days before the birthday.",
            days_alert.days()
        ))),
        Err(e @ SubscriptionError::UnknownUser) => back_to_users(flash.error(e.to_string())),
        Err(e) => e500(e),
    }
}

#[tracing::instrument(
    name = "Unsubscribe from a birthday",
    skip_all,
    fields(subscriber_id = %*user_id, subscription_id = tracing::field::Empty)
)]
pub async fn unsubscribe(
    state: State<AppState>,
    flash: Flash,
    user_id: Extension<UserId>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let subscription_id = match target_user(path) {
        Ok(subscription_id) => subscription_id,
        Err(e) => return back_to_users(flash.error(e.to_string())),
    };
    tracing::Span::current()
        .record("subscription_id", &tracing::field::display(&subscription_id));
    match delete_subscription(&state.pg_connection_pool, **user_id, subscription_id).await {
        Ok(()) => back_to_users(flash.info("Unsubscribed.")),
        Err(e @ SubscriptionError::NotSubscribed) => back_to_users(flash.error(e.to_string())),
        Err(e) => e500(e),
    }
}

/// Creates the subscription, or changes the lead time of an existing one.
#[tracing::instrument(name = "Saving subscription in the database", skip(pg_pool))]
pub async fn upsert_subscription(
    pg_pool: &PgPool,
    subscriber_id: Uuid,
    subscription_id: Uuid,
    days_alert: DaysAlert,
) -> Result<(), SubscriptionError> {
    sqlx::query(
        r#"
        INSERT INTO subscriptions (subscriber_id, subscription_id, days_alert, created_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (subscriber_id, subscription_id)
        DO UPDATE SET days_alert = EXCLUDED.days_alert
        "#,
    )
    .bind(subscriber_id)
    .bind(subscription_id)
    .bind(days_alert.days())
    .bind(Utc::now())
    .execute(pg_pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_error) if db_error.is_foreign_key_violation() => {
            SubscriptionError::UnknownUser
        }
        e => SubscriptionError::UnexpectedError(
            anyhow::Error::new(e).context("Failed to save the subscription."),
        ),
    })?;
    Ok(())
}

#[tracing::instrument(name = "Removing subscription from the database", skip(pg_pool))]
pub async fn delete_subscription(
    pg_pool: &PgPool,
    subscriber_id: Uuid,
    subscription_id: Uuid,
) -> Result<(), SubscriptionError> {
    let removed = sqlx::query(
        r#"
        DELETE FROM subscriptions
        WHERE subscriber_id = $1 AND subscription_id = $2
        "#,
    )
    .bind(subscriber_id)
    .bind(subscription_id)
    .execute(pg_pool)
    .await
    .context("Failed to remove the subscription.")?
    .rows_affected();

    if removed == 0 {
        return Err(SubscriptionError::NotSubscribed);
    }
    Ok(())
}
