use std::time::Duration;

use chrono::NaiveTime;
use config::{Config, ConfigError, Environment as EnvironmentSource, File};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::ConnectOptions;

use crate::domain::{ApplicationBaseUrl, Contact};
use crate::email_client::EmailClient;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub email: EmailSettings,
    pub telemetry: TelemetrySettings,
    pub alerts: AlertSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub base_url: ApplicationBaseUrl,
    pub hmac_secret: Secret<String>,
    #[serde(default)]
    pub secure_cookies: bool,
    pub session_ttl_minutes: i64,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub database_name: String,
    #[serde(default)]
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db()
            .database(&self.database_name)
            .log_statements(tracing::log::LevelFilter::Trace)
    }
}

#[derive(Deserialize, Clone)]
pub struct EmailSettings {
    pub endpoint: String,
    pub api_key: Secret<String>,
    pub sender: Contact,
    pub timeout_millis: u64,
}

impl EmailSettings {
    pub fn client(self) -> anyhow::Result<EmailClient> {
        EmailClient::new(self)
    }
}

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    pub enabled: bool,
    #[serde(default)]
    pub json: bool,
    pub endpoint: String,
    pub api_key: Secret<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AlertSettings {
    #[serde(deserialize_with = "deserialize_positive_seconds")]
    pub period_seconds: u64,
    /// Time of day (UTC) of the first run. `None` starts right away.
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
}

impl AlertSettings {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_seconds)
    }
}

fn deserialize_positive_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let seconds: u64 = deserialize_number_from_string(deserializer)?;
    if seconds == 0 {
        return Err(serde::de::Error::custom(
            "period_seconds must be at least 1",
        ));
    }
    Ok(seconds)
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT.");
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = Config::builder()
        .add_source(File::from(configuration_directory.join("base.yaml")))
        .add_source(File::from(configuration_directory.join(environment_filename)))
        // APP_APPLICATION__PORT=5001 sets `Settings.application.port`
        .add_source(
            EnvironmentSource::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
