use async_trait::async_trait;
use serde::Serialize;

use crate::domain::ports::{Mail, MailError, Mailer};

const BREVO_API: &str = "https://api.brevo.com/v3";

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmail<'a> {
    sender: Address<'a>,
    to: Vec<Address<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<Address<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

impl<'a> From<&'a Mail> for SendEmail<'a> {
    fn from(mail: &'a Mail) -> Self {
        SendEmail {
            sender: Address {
                email: &mail.from,
                name: Some(&mail.sender_name),
            },
            to: mail
                .to
                .iter()
                .map(|email| Address { email, name: None })
                .collect(),
            reply_to: mail.reply_to.as_deref().map(|email| Address { email, name: None }),
            subject: &mail.subject,
            html_content: &mail.html,
        }
    }
}

/// Brevo transactional email client (`POST /smtp/email`)
pub struct BrevoMailer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl BrevoMailer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: BREVO_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Mailer for BrevoMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailError> {
        if mail.to.is_empty() {
            return Ok(());
        }
        let resp = self
            .client
            .post(format!("{}/smtp/email", self.base_url))
            .header("api-key", &self.api_key)
            .json(&SendEmail::from(&mail))
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
