use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::response::{ApiResponse, ApiResult};
use crate::domain::account::Email;
use crate::domain::ports::Mail;
use crate::infrastructure::mail::templates;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub fullname: String,
    pub email: String,
    pub phone_number: String,
    pub message: String,
}

impl ContactRequest {
    fn validate(&self) -> Result<Email, String> {
        let name_len = self.fullname.trim().chars().count();
        if !(2..=35).contains(&name_len) {
            return Err("fullname must be between 2 and 35 characters".to_string());
        }
        let email = Email::new(self.email.as_str())?;
        let phone = self.phone_number.trim();
        if !(8..=12).contains(&phone.len()) || !phone.chars().all(|c| c.is_ascii_digit()) {
            return Err("phoneNumber must be 8 to 12 digits".to_string());
        }
        let message_len = self.message.trim().chars().count();
        if !(3..=255).contains(&message_len) {
            return Err("message must be between 3 and 255 characters".to_string());
        }
        Ok(email)
    }
}

/// Forwards a contact form to the info mailbox
///
/// POST /api/v1/contact-us
pub async fn contact_us(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ContactRequest>,
) -> ApiResult {
    let email = req.validate().map_err(ApiError::validation)?;

    let mail = Mail {
        from: state.config.mail.no_reply.clone(),
        sender_name: req.fullname.trim().to_string(),
        to: vec![state.config.mail.info.clone()],
        reply_to: Some(email.to_string()),
        subject: format!("Contact request from {}", req.fullname.trim()),
        html: templates::contact_us(
            req.fullname.trim(),
            email.as_str(),
            req.phone_number.trim(),
            &req.message,
        ),
    };
    state.mailer.send(mail).await?;
    tracing::info!(from = %email, "contact request forwarded");

    Ok(ApiResponse::ok("Message sent, we will get back to you shortly", json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ContactRequest {
        ContactRequest {
            fullname: "Ada Obi".to_string(),
            email: "ada@example.com".to_string(),
            phone_number: "08012345678".to_string(),
            message: "I would like to invest".to_string(),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn phone_must_be_digits() {
        let req = ContactRequest {
            phone_number: "0801-234-56".to_string(),
            ..request()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn message_is_bounded() {
        let req = ContactRequest {
            message: "x".repeat(256),
            ..request()
        };
        assert!(req.validate().is_err());
    }
}
