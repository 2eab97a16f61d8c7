use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::ports::{Mail, MailError, Mailer};

/// Mailer that keeps every message instead of sending it
///
/// `failing()` builds one that rejects everything, for exercising
/// best-effort and 502 paths.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Mail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().clone()
    }

    /// Messages addressed to `recipient`
    pub fn sent_to(&self, recipient: &str) -> Vec<Mail> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.to.iter().any(|to| to == recipient))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("mail delivery disabled".to_string()));
        }
        self.sent.lock().push(mail);
        Ok(())
    }
}
