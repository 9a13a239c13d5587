use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time;

use crate::domain::subscriber_email::SubscriberEmail;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// Thin client for Resend's HTTP API (`POST {base_url}/emails`).
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    sender_name: String,
    api_key: Option<Secret<String>>,
}

#[derive(serde::Serialize)]
pub struct SendEmailBody {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        sender_name: String,
        api_key: Option<Secret<String>>,
        timeout: Option<time::Duration>,
    ) -> EmailClient {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()
            .unwrap();

        EmailClient {
            http_client,
            base_url,
            sender,
            sender_name,
            api_key,
        }
    }

    /// Sends a single HTML email. Without an API key configured this is a logged
    /// no-op so that environments with no email provider still accept sign-ups.
    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
    ) -> Result<(), reqwest::Error> {
        let Some(api_key) = &self.api_key else {
            tracing::warn!("Email API key is not configured; skipping email dispatch");
            return Ok(());
        };

        let url = format!("{}/emails", self.base_url);
        let body = SendEmailBody {
            from: format!("{} <{}>", self.sender_name, self.sender.as_ref()),
            to: vec![String::from(recipient.as_ref())],
            subject: String::from(subject),
            html: String::from(html_content),
        };

        self.http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await?
            .error_for_status()?; // return an error when server response status code is 4xx or 5xx

        Ok(())
    }
}
