use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Mail transport error: {0}")]
    Transport(String),
}

/// A rendered HTML email
#[derive(Debug, Clone, PartialEq)]
pub struct Mail {
    pub from: String,
    pub sender_name: String,
    pub to: Vec<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> Result<(), MailError>;
}
