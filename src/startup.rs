use std::time::Duration;

use anyhow::Context;
use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    http::{Request, StatusCode},
    middleware,
    routing::{get, post},
    BoxError, Router,
};
use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tower_sessions::{Expiry, PostgresStore, SessionManagerLayer};

use crate::{
    authentication::reject_anonymous_users,
    configuration::{ApplicationSettings, DatabaseSettings, Settings},
    routes::{
        error_page, health_check, home, log_out, login, register, subscribe, unsubscribe,
        users_list,
    },
    AppState,
};

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(configuration: Settings) -> anyhow::Result<Self> {
        let connection_pool = get_connection_pool(&configuration.database);

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {address}"))?;
        let port = listener.local_addr()?.port();

        let router = router(&configuration.application, connection_pool).await?;
        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        tracing::info!("Listening on port {}", self.port);
        axum::serve(self.listener, self.router.into_make_service()).await
    }
}

pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(configuration.with_db())
}

async fn router(settings: &ApplicationSettings, pg_connection_pool: PgPool) -> anyhow::Result<Router> {
    let session_store = PostgresStore::new(pg_connection_pool.clone());
    session_store
        .migrate()
        .await
        .context("Failed to prepare the session store")?;
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(settings.secure_cookies)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            settings.session_ttl_minutes,
        )));

    let flash_key = axum_flash::Key::try_from(settings.hmac_secret.expose_secret().as_bytes())
        .map_err(|e| anyhow::anyhow!("The hmac secret can't sign flash cookies: {e}"))?;
    let app_state = AppState {
        pg_connection_pool,
        flash_config: axum_flash::Config::new(flash_key).use_secure_cookies(settings.secure_cookies),
    };

    let logged_in = Router::new()
        .route("/users", get(users_list))
        .route("/subscribe/:user_id", post(subscribe))
        .route("/unsubscribe/:user_id", post(unsubscribe))
        .route("/logout", post(log_out))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            reject_anonymous_users,
        ));

    let router = Router::new()
        .route("/health_check", get(health_check))
        .route("/", get(home))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/error", get(error_page))
        .merge(logged_in)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|_: BoxError| async {
                    StatusCode::BAD_REQUEST
                }))
                .layer(session_layer),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        let request_id = request
                            .headers()
                            .get("x-request-id")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default();
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id,
                        )
                    }),
                )
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(app_state);
    Ok(router)
}
