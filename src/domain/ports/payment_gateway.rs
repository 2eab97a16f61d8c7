use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::ledger::PaymentProvider;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment gateway declined the request: {0}")]
    Declined(String),

    #[error("Payment gateway unreachable: {0}")]
    Transport(String),

    #[error("Unexpected payment gateway response: {0}")]
    Unexpected(String),
}

/// What was bought; sent with the checkout and echoed back on verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseMetadata {
    pub product_id: Uuid,
    pub quantity: i32,
    pub amount: Decimal,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub email: String,
    /// Major currency units (naira); gateways always charge in NGN
    pub amount: Decimal,
    pub metadata: PurchaseMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub authorization_url: String,
    pub reference: String,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct VerifyRequest {
    pub reference: String,
    /// Gateway-side id; Flutterwave verifies by id, Paystack by reference
    pub transaction_id: Option<String>,
}

/// Result of asking the gateway about a payment
#[derive(Debug, Clone)]
pub struct Verification {
    pub reference: String,
    pub successful: bool,
    /// Major currency units actually charged
    pub amount: Decimal,
    pub currency: String,
    pub metadata: Option<PurchaseMetadata>,
    pub raw: Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> PaymentProvider;

    async fn initialize(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError>;

    async fn verify(&self, request: &VerifyRequest) -> Result<Verification, PaymentError>;
}
