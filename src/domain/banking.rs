// Payout and checkout details
// Bank accounts, cards (never stored in full) and checkout contact info

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::account::value_objects::Email;

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(())
    }
}

fn length_between(field: &str, value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        Err(format!("{} must be between {} and {} characters", field, min, max))
    } else {
        Ok(())
    }
}

/// Accepts `"0123"` as well as `123`; card forms send either
fn digits<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Digits {
        Text(String),
        Number(u64),
    }

    Ok(match Digits::deserialize(deserializer)? {
        Digits::Text(text) => text,
        Digits::Number(number) => number.to_string(),
    })
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Bank account an investor is paid out to
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bank_name: String,
    pub account_number: String,
    pub account_holder_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetailsInput {
    pub bank_name: String,
    pub account_number: String,
    pub account_holder_name: String,
}

impl AccountDetailsInput {
    pub fn validate(&self) -> Result<(), String> {
        require("bankName", &self.bank_name)?;
        require("accountHolderName", &self.account_holder_name)?;
        if !all_digits(self.account_number.trim()) {
            return Err("accountNumber must contain only digits".to_string());
        }
        Ok(())
    }

    pub fn into_details(self, user_id: Uuid) -> AccountDetails {
        AccountDetails {
            id: Uuid::new_v4(),
            user_id,
            bank_name: self.bank_name.trim().to_string(),
            account_number: self.account_number.trim().to_string(),
            account_holder_name: self.account_holder_name.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetailsPatch {
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_holder_name: Option<String>,
}

impl AccountDetailsPatch {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(bank) = &self.bank_name {
            require("bankName", bank)?;
        }
        if let Some(holder) = &self.account_holder_name {
            require("accountHolderName", holder)?;
        }
        if let Some(number) = &self.account_number {
            if !all_digits(number.trim()) {
                return Err("accountNumber must contain only digits".to_string());
            }
        }
        Ok(())
    }

    pub fn apply(&self, details: &mut AccountDetails) {
        if let Some(bank) = &self.bank_name {
            details.bank_name = bank.trim().to_string();
        }
        if let Some(number) = &self.account_number {
            details.account_number = number.trim().to_string();
        }
        if let Some(holder) = &self.account_holder_name {
            details.account_holder_name = holder.trim().to_string();
        }
    }
}

/// Stored card reference; only the last four digits survive validation
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub card_holder_name: String,
    pub card_last4: String,
    pub expiry_month: i16,
    pub expiry_year: i16,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInput {
    pub card_holder_name: String,
    #[serde(deserialize_with = "digits")]
    pub card_number: String,
    pub expiry_month: i16,
    pub expiry_year: i16,
    #[serde(deserialize_with = "digits")]
    pub cvv: String,
}

impl CardInput {
    /// Validates the card and reduces it to what may be stored
    ///
    /// # Arguments
    /// * `user_id` - Owner of the card
    /// * `now` - Reference time for the expiry check
    pub fn into_details(self, user_id: Uuid, now: DateTime<Utc>) -> Result<PaymentDetails, String> {
        require("cardHolderName", &self.card_holder_name)?;

        let number: String = self
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if !all_digits(&number) || !(12..=19).contains(&number.len()) {
            return Err("cardNumber must be 12 to 19 digits".to_string());
        }
        if !(1..=12).contains(&self.expiry_month) {
            return Err("expiryMonth must be between 1 and 12".to_string());
        }
        if i32::from(self.expiry_year) < now.year() {
            return Err("expiryYear cannot be in the past".to_string());
        }
        let cvv = self.cvv.trim();
        if !all_digits(cvv) || !(3..=4).contains(&cvv.len()) {
            return Err("cvv must be 3 or 4 digits".to_string());
        }

        Ok(PaymentDetails {
            id: Uuid::new_v4(),
            user_id,
            card_holder_name: self.card_holder_name.trim().to_string(),
            card_last4: number[number.len() - 4..].to_string(),
            expiry_month: self.expiry_month,
            expiry_year: self.expiry_year,
            created_at: now,
        })
    }
}

/// Delivery and contact info collected before a purchase
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub address: String,
    pub accept_terms: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub address: String,
    pub accept_terms: bool,
}

impl CheckoutInput {
    pub fn into_checkout(self, account_id: Uuid) -> Result<Checkout, String> {
        length_between("name", &self.name, 2, 50)?;
        length_between("phoneNumber", &self.phone_number, 5, 20)?;
        if self.email.trim().chars().count() > 40 {
            return Err("email must be at most 40 characters".to_string());
        }
        let email = Email::new(self.email)?;
        length_between("address", &self.address, 2, 250)?;
        if !self.accept_terms {
            return Err("You must accept the terms and conditions".to_string());
        }

        Ok(Checkout {
            id: Uuid::new_v4(),
            account_id,
            name: self.name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            email: email.into(),
            address: self.address.trim().to_string(),
            accept_terms: true,
            created_at: Utc::now(),
        })
    }
}
