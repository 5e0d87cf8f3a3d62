use axum::extract::FromRef;
use sqlx::PgPool;

pub mod authentication;
pub mod birthday_alert_worker;
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod routes;
pub mod session_state;
pub mod startup;
pub mod submission;
pub mod telemetry;
pub mod utils;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub pg_connection_pool: PgPool,
    pub flash_config: axum_flash::Config,
}
