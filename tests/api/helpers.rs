use birthday_congrats::authentication::compute_password_hash;
use birthday_congrats::configuration::{get_configuration, DatabaseSettings};
use birthday_congrats::email_client::EmailClient;
use birthday_congrats::startup::{get_connection_pool, Application};
use birthday_congrats::telemetry::init_subscriber;
use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, Secret};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;
use wiremock::MockServer;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    let configuration = get_configuration().expect("Failed to read configuration.");

    if std::env::var("TEST_LOG").is_ok() {
        init_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::stdout,
            &configuration.telemetry,
        );
    } else {
        init_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::sink,
            &configuration.telemetry,
        );
    };
});

pub struct TestApp {
    pub port: u16,
    pub address: String,
    pub db_pool: PgPool,
    pub email_server: MockServer,
    pub email_client: EmailClient,
    pub test_user: TestUser,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_register<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(&format!("{}/register", &self.address))
            .form(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_register_raw(&self, body: &'static str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/register", &self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_login<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(&format!("{}/login", &self.address))
            .form(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login_test_user(&self) {
        let response = self
            .post_login(&serde_json::json!({
                "username": &self.test_user.username,
                "password": &self.test_user.password,
            }))
            .await;
        assert_is_redirect_to(&response, "/users");
    }

    pub async fn get_home(&self) -> reqwest::Response {
        self.api_client
            .get(&format!("{}/", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_home_html(&self) -> String {
        self.get_home().await.text().await.unwrap()
    }

    pub async fn get_users(&self) -> reqwest::Response {
        self.api_client
            .get(&format!("{}/users", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_users_html(&self) -> String {
        self.get_users().await.text().await.unwrap()
    }

    pub async fn post_subscribe(&self, user_id: Uuid, days_alert: &str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/subscribe/{}", &self.address, user_id))
            .form(&serde_json::json!({ "days_alert": days_alert }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Posts to a subscription route with an arbitrary `user_id` path segment.
    pub async fn post_subscription_route(
        &self,
        route: &str,
        user_id: &str,
        days_alert: &str,
    ) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/{}/{}", &self.address, route, user_id))
            .form(&serde_json::json!({ "days_alert": days_alert }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_unsubscribe(&self, user_id: Uuid) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/unsubscribe/{}", &self.address, user_id))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_logout(&self) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/logout", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn days_alert(&self, subscriber_id: Uuid, subscription_id: Uuid) -> Option<i32> {
        sqlx::query_as::<_, (i32,)>(
            "SELECT days_alert FROM subscriptions WHERE subscriber_id = $1 AND subscription_id = $2",
        )
        .bind(subscriber_id)
        .bind(subscription_id)
        .fetch_optional(&self.db_pool)
        .await
        .expect("Failed to fetch subscription.")
        .map(|(days_alert,)| days_alert)
    }
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.database.database_name = Uuid::new_v4().to_string();
        c.application.port = 0;
        c.email.endpoint = email_server.uri();
        c
    };
    configure_database(&configuration.database).await;

    let application = Application::build(configuration.clone())
        .await
        .expect("Failed to build application.");
    let application_port = application.port();
    let address = format!("http://localhost:{}", application_port);
    tokio::spawn(application.run_until_stopped());

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true)
        .build()
        .unwrap();

    let test_app = TestApp {
        port: application_port,
        address,
        db_pool: get_connection_pool(&configuration.database),
        email_client: configuration
            .email
            .client()
            .expect("Failed to build email client."),
        email_server,
        test_user: TestUser::generate(),
        api_client,
    };
    test_app.test_user.store(&test_app.db_pool).await;
    test_app
}

async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.database_name).as_str())
        .await
        .expect("Failed to create database.");

    // Migrate database
    let connection_pool = PgPool::connect_with(config.with_db())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");

    connection_pool
}

pub struct TestUser {
    pub user_id: Uuid,
    pub username: String,
    pub password: String,
    pub email: String,
    pub birthday: NaiveDate,
}

impl TestUser {
    pub fn generate() -> Self {
        Self::born_on(NaiveDate::from_ymd_opt(1990, 5, 17).unwrap())
    }

    pub fn born_on(birthday: NaiveDate) -> Self {
        let username = Uuid::new_v4().to_string();
        Self {
            user_id: Uuid::new_v4(),
            email: format!("{username}@example.com"),
            username,
            password: Uuid::new_v4().to_string(),
            birthday,
        }
    }

    pub async fn store(&self, pool: &PgPool) {
        let password_hash = compute_password_hash(Secret::new(self.password.clone())).unwrap();
        sqlx::query(
            "INSERT INTO users (user_id, username, password_hash, email, birthday, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(self.user_id)
        .bind(&self.username)
        .bind(password_hash.expose_secret())
        .bind(&self.email)
        .bind(self.birthday)
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("Failed to store test user.");
    }

    pub async fn subscribe_to(&self, pool: &PgPool, other: &TestUser, days_alert: i32) {
        sqlx::query(
            "INSERT INTO subscriptions (subscriber_id, subscription_id, days_alert, created_at)
            VALUES ($1, $2, $3, $4)",
        )
        .bind(self.user_id)
        .bind(other.user_id)
        .bind(days_alert)
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("Failed to store test subscription.");
    }
}

pub fn assert_is_redirect_to(response: &reqwest::Response, location: &str) {
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers().get("Location").unwrap(), location);
}
