use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    configuration::{AlertSettings, Settings},
    domain::{Birthday, Contact, UserEmail, Username},
    email_client::EmailClient,
    startup::get_connection_pool,
};

/// One subscription, joined with both users it links.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriptionRow {
    pub birthday_user_id: Uuid,
    pub birthday_username: String,
    pub birthday: NaiveDate,
    pub subscriber_username: String,
    pub subscriber_email: String,
    pub days_alert: i32,
}

#[derive(Debug, Clone)]
pub struct BirthdayAlert {
    pub username: String,
    pub days: i64,
    pub recipients: Vec<Contact>,
}

impl BirthdayAlert {
    pub const SUBJECT: &'static str = "Birthday reminder!";

    pub fn message(&self) -> String {
        format!(
            "{} celebrates their birthday in {} days!",
            self.username, self.days
        )
    }
}

/// Groups `rows` by the user whose birthday it is and keeps, for each, the
/// subscribers who asked to be reminded exactly that many days ahead.
pub fn plan_alerts(today: NaiveDate, rows: Vec<SubscriptionRow>) -> Vec<BirthdayAlert> {
    let mut alerts: BTreeMap<Uuid, BirthdayAlert> = BTreeMap::new();
    for row in rows {
        let days = Birthday::from(row.birthday).days_until_next(today);
        if i64::from(row.days_alert) != days {
            continue;
        }
        let recipient = match (
            Username::parse(row.subscriber_username),
            UserEmail::parse(row.subscriber_email),
        ) {
            (Ok(name), Ok(email)) => Contact { name, email },
            other => {
                tracing::warn!(
                    "Skipping a subscriber. Their stored contact details are invalid. {other:?}"
                );
                continue;
            }
        };
        alerts
            .entry(row.birthday_user_id)
            .or_insert_with(|| BirthdayAlert {
                username: row.birthday_username,
                days,
                recipients: Vec::new(),
            })
            .recipients
            .push(recipient);
    }
    alerts.into_values().collect()
}

#[tracing::instrument(skip_all)]
async fn get_subscriptions(pg_pool: &PgPool) -> anyhow::Result<Vec<SubscriptionRow>> {
    sqlx::query_as::<_, SubscriptionRow>(
        r#"
        SELECT
            b.user_id AS birthday_user_id,
            b.username AS birthday_username,
            b.birthday,
            s.username AS subscriber_username,
            s.email AS subscriber_email,
            sub.days_alert
        FROM subscriptions AS sub
        INNER JOIN users AS b ON b.user_id = sub.subscription_id
        INNER JOIN users AS s ON s.user_id = sub.subscriber_id
        "#,
    )
    .fetch_all(pg_pool)
    .await
    .context("Failed to load subscriptions.")
}

/// Sends today's reminders. A failed delivery is logged and doesn't stop the
/// remaining ones. Returns how many reminders went out.
#[tracing::instrument(skip(pg_pool, email_client))]
pub async fn try_send_alerts(
    pg_pool: &PgPool,
    email_client: &EmailClient,
    today: NaiveDate,
) -> anyhow::Result<usize> {
    let alerts = plan_alerts(today, get_subscriptions(pg_pool).await?);
    tracing::info!("Sending {} different birthday reminders today", alerts.len());

    let mut delivered = 0;
    for alert in alerts {
        match email_client
            .send_email(&alert.recipients, BirthdayAlert::SUBJECT, &alert.message())
            .await
        {
            Ok(()) => delivered += 1,
            Err(e) => tracing::error!(
                birthday_username = %alert.username,
                "Failed to deliver a birthday reminder. Skipping. {e:?}"
            ),
        }
    }
    Ok(delivered)
}

/// Time left until the next `start` (UTC) strictly after `now`, or zero when
/// `now` is exactly `start`.
pub fn delay_until(now: DateTime<Utc>, start: NaiveTime) -> Duration {
    let now = now.time();
    let delay = if start >= now {
        start - now
    } else {
        chrono::Duration::days(1) - (now - start)
    };
    delay.to_std().unwrap_or_default()
}

async fn worker_loop(
    pg_pool: PgPool,
    email_client: EmailClient,
    settings: AlertSettings,
) -> anyhow::Result<()> {
    if let Some(start_time) = settings.start_time {
        let delay = delay_until(Utc::now(), start_time);
        tracing::info!("Birthday reminders will start in {}s", delay.as_secs());
        tokio::time::sleep(delay).await;
    }

    tracing::info!("Birthday reminder service started");
    let mut interval = tokio::time::interval(settings.period());
    loop {
        interval.tick().await;
        let today = Utc::now().date_naive();
        if let Err(e) = try_send_alerts(&pg_pool, &email_client, today).await {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Failed to send birthday reminders for {today}. Retrying on the next tick."
            );
        }
    }
}

pub async fn run_worker_until_stopped(configuration: Settings) -> anyhow::Result<()> {
    let connection_pool = get_connection_pool(&configuration.database);
    let email_client = configuration.email.client()?;
    worker_loop(connection_pool, email_client, configuration.alerts).await
}
