use axum::response::{IntoResponse, Redirect, Response};
use axum_flash::{IncomingFlashes, Level};

/// Logs an unexpected failure and sends the browser to the generic error page.
pub fn e500<T>(e: T) -> Response
where
    T: std::fmt::Debug + std::fmt::Display + 'static,
{
    tracing::error!("Internal Server error: {e:?}");
    Redirect::to("/error").into_response()
}

pub fn see_other(location: &str) -> Response {
    Redirect::to(location).into_response()
}

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

pub struct FlashMessage {
    pub kind: &'static str,
    pub text: String,
}

pub fn read_flash_messages(flash_messages: &IncomingFlashes) -> Vec<FlashMessage> {
    flash_messages
        .iter()
        .map(|(level, text)| FlashMessage {
            kind: match level {
                Level::Error | Level::Warning => "error",
                _ => "info",
            },
            text: text.to_owned(),
        })
        .collect()
}
