// Side effects that follow a committed change
// Notifications and email are best-effort: failures are logged, never returned

use uuid::Uuid;

use crate::domain::notification::Notification;
use crate::domain::ports::Mail;
use crate::state::AppState;

pub const SENDER_NAME: &str = "Nagaing";

/// Builds a mail from the info mailbox
pub fn outgoing(state: &AppState, to: Vec<String>, subject: &str, html: String) -> Mail {
    Mail {
        from: state.config.mail.info.clone(),
        sender_name: SENDER_NAME.to_string(),
        to,
        reply_to: None,
        subject: subject.to_string(),
        html,
    }
}

pub async fn notify(state: &AppState, account_id: Uuid, message: impl Into<String>) {
    let notification = Notification::new(account_id, message);
    if let Err(e) = state.notifications.create(&notification).await {
        tracing::warn!(account_id = %account_id, error = %e, "failed to store notification");
    }
}

pub async fn deliver(state: &AppState, mail: Mail) {
    if mail.to.is_empty() {
        return;
    }
    let subject = mail.subject.clone();
    if let Err(e) = state.mailer.send(mail).await {
        tracing::warn!(subject = %subject, error = %e, "failed to send email");
    }
}
