//! Client side of the contact form: intercepts a submit, posts the two field
//! values to the server and logs how it went.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::domain::ApplicationBaseUrl;
use crate::utils::error_chain_fmt;

pub const SUBMISSION_ENDPOINT: &str = "/your_server_endpoint";

/// Anything that can report the current value of a named input.
pub trait FormFields {
    fn value(&self, field: &str) -> Option<String>;
}

/// Handle to a form's inputs. Clones share the same inputs, so values typed
/// after the handler was bound are the ones read at submit time.
#[derive(Clone, Debug, Default)]
pub struct HtmlForm {
    fields: Arc<RwLock<HashMap<String, String>>>,
}

impl HtmlForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&self, field: &str, value: impl Into<String>) {
        self.fields
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(field.to_owned(), value.into());
    }
}

impl FormFields for HtmlForm {
    fn value(&self, field: &str) -> Option<String> {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field)
            .cloned()
    }
}

#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    name: String,
    email: String,
}

impl SubmissionPayload {
    /// Values are taken as they are, empty strings included.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

#[derive(thiserror::Error)]
#[error("Failed to submit form data")]
pub struct RequestFailure(#[from] reqwest::Error);

impl std::fmt::Debug for RequestFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub struct SubmissionHandler<F> {
    form: F,
    http_client: Client,
    endpoint: Url,
}

impl<F: FormFields> SubmissionHandler<F> {
    /// Binds a handler to `form`. Call once at startup.
    pub fn bind(form: F, base_url: &ApplicationBaseUrl, http_client: Client) -> anyhow::Result<Self> {
        let endpoint = base_url
            .join(SUBMISSION_ENDPOINT)
            .map_err(|e| anyhow::anyhow!("Invalid submission endpoint: {e}"))?;
        Ok(Self {
            form,
            http_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Suppresses the default submission and posts the current field values.
    ///
    /// Returns as soon as the request is spawned. Awaiting the handle is
    /// optional; the outcome is logged either way. Must be called from within
    /// a Tokio runtime.
    pub fn on_submit(&self, event: &mut SubmitEvent) -> JoinHandle<Result<(), RequestFailure>> {
        event.prevent_default();

        let payload = SubmissionPayload::new(
            self.form.value("name").unwrap_or_default(),
            self.form.value("email").unwrap_or_default(),
        );
        let span = tracing::info_span!(
            "Submit form",
            submitter_name = %payload.name(),
            submitter_email = %payload.email(),
            endpoint = %self.endpoint,
        );
        let request = self.http_client.post(self.endpoint.clone()).form(&payload);

        tokio::spawn(dispatch(request).instrument(span))
    }
}

async fn dispatch(request: RequestBuilder) -> Result<(), RequestFailure> {
    let outcome = match request.send().await {
        Ok(response) => response.error_for_status(),
        Err(e) => Err(e),
    };
    match outcome {
        Ok(response) => {
            tracing::info!(status = %response.status(), "Form data submitted successfully");
            Ok(())
        }
        Err(e) => {
            let failure = RequestFailure::from(e);
            tracing::error!(
                error.cause_chain = ?failure,
                error.message = %failure.0,
                "Failed to submit form data"
            );
            Err(failure)
        }
    }
}
