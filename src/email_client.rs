use std::time::Duration;

use reqwest::{header, Client, ClientBuilder, Url};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::configuration::EmailSettings;
use crate::domain::Contact;

/// Client for a Brevo-compatible transactional email API.
pub struct EmailClient {
    http_client: Client,
    url: Url,
    sender: Contact,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender: &'a Contact,
    to: &'a [Contact],
    subject: &'a str,
    html_content: &'a str,
}

impl EmailClient {
    pub fn new(config: EmailSettings) -> anyhow::Result<Self> {
        let url = Url::parse(&config.endpoint)
            .map_err(|e| anyhow::anyhow!("Invalid email API endpoint: {e}"))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "api-key",
            config
                .api_key
                .expose_secret()
                .parse()
                .map_err(|e| anyhow::anyhow!("Failed to parse api_key: {e}"))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http_client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_millis))
            .build()
            .map_err(|e| anyhow::anyhow!(e))?;

        Ok(Self {
            http_client,
            url,
            sender: config.sender,
        })
    }

    /// Sends one email to every address in `recipients`.
    #[tracing::instrument(name = "Send email", skip(self, html_content), fields(recipients = recipients.len()))]
    pub async fn send_email(
        &self,
        recipients: &[Contact],
        subject: &str,
        html_content: &str,
    ) -> anyhow::Result<()> {
        if recipients.is_empty() {
            anyhow::bail!("An email needs at least one recipient.");
        }
        let url = self
            .url
            .join("/v3/smtp/email")
            .map_err(|e| anyhow::anyhow!(e))?;
        let body = SendEmailRequest {
            sender: &self.sender,
            to: recipients,
            subject,
            html_content,
        };

        self.http_client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to reach the email API. {e}"))?
            .error_for_status()
            .map_err(|e| anyhow::anyhow!("The email API rejected the request. {e}"))?;
        Ok(())
    }
}
