use axum::extract::FromRequestParts;
use tower_sessions::Session;
use uuid::Uuid;

/// Server-side session of a browser, keyed by the `id` cookie.
#[derive(FromRequestParts)]
pub struct TypedSession(Session);

impl TypedSession {
    const USER_ID_KEY: &'static str = "user_id";

    /// Binds the session to `user_id`. The session id is rotated first so an
    /// id handed out before login can't be reused afterwards.
    pub fn start(&self, user_id: Uuid) -> anyhow::Result<()> {
        self.0.cycle_id();
        self.0
            .insert(Self::USER_ID_KEY, user_id)
            .map_err(|e| anyhow::anyhow!("Failed to store the user id in the session: {e}"))
    }

    pub fn user_id(&self) -> anyhow::Result<Option<Uuid>> {
        self.0
            .get(Self::USER_ID_KEY)
            .map_err(|e| anyhow::anyhow!("Failed to read the user id from the session: {e}"))
    }

    pub fn end(self) {
        self.0.flush()
    }
}
