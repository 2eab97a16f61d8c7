use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{decimal_field, metadata_field, read_json};
use crate::domain::ledger::PaymentProvider;
use crate::domain::ports::{
    CheckoutRequest, CheckoutSession, PaymentError, PaymentGateway, Verification, VerifyRequest,
};

const FLUTTERWAVE_API: &str = "https://api.flutterwave.com/v3";
const SETTLEMENT_CURRENCY: &str = "NGN";

/// Decodes `POST /payments`; the reference is our own `tx_ref`
pub fn parse_initialize(tx_ref: &str, body: Value) -> Result<CheckoutSession, PaymentError> {
    if body["status"].as_str() != Some("success") {
        let message = body["message"].as_str().unwrap_or("initialize failed").to_string();
        return Err(PaymentError::Declined(message));
    }
    let authorization_url = body["data"]["link"]
        .as_str()
        .ok_or_else(|| PaymentError::Unexpected("missing payment link".to_string()))?
        .to_string();
    Ok(CheckoutSession {
        authorization_url,
        reference: tx_ref.to_string(),
        raw: body,
    })
}

/// Decodes `GET /transactions/{id}/verify`
///
/// A charge counts only when it is `successful`, was made for our `tx_ref`,
/// settled in NGN and covers the amount recorded in the metadata.
pub fn parse_verify(tx_ref: &str, body: Value) -> Result<Verification, PaymentError> {
    if body["status"].as_str() != Some("success") {
        let message = body["message"].as_str().unwrap_or("verification failed").to_string();
        return Err(PaymentError::Declined(message));
    }
    let data = &body["data"];
    let amount = decimal_field(&data["amount"])
        .ok_or_else(|| PaymentError::Unexpected("missing amount".to_string()))?;
    let currency = data["currency"].as_str().unwrap_or_default().to_string();
    let metadata = metadata_field(&data["meta"]);

    let successful = data["status"].as_str() == Some("successful")
        && data["tx_ref"].as_str() == Some(tx_ref)
        && currency == SETTLEMENT_CURRENCY
        && metadata.as_ref().map(|m| m.amount == amount).unwrap_or(true);

    Ok(Verification {
        reference: tx_ref.to_string(),
        successful,
        amount,
        currency,
        metadata,
        raw: body,
    })
}

/// Flutterwave Standard checkout client
pub struct FlutterwaveGateway {
    client: reqwest::Client,
    secret_key: String,
    redirect_url: String,
    base_url: String,
}

impl FlutterwaveGateway {
    pub fn new(secret_key: impl Into<String>, redirect_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
            redirect_url: redirect_url.into(),
            base_url: FLUTTERWAVE_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PaymentGateway for FlutterwaveGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Flutterwave
    }

    async fn initialize(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        let tx_ref = Uuid::new_v4().to_string();
        let payload = json!({
            "tx_ref": tx_ref,
            "amount": request.amount,
            "currency": SETTLEMENT_CURRENCY,
            "redirect_url": self.redirect_url,
            "meta": request.metadata,
            "customer": { "email": request.email },
        });
        let resp = self
            .client
            .post(format!("{}/payments", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;
        let body = read_json(resp).await?;
        parse_initialize(&tx_ref, body)
    }

    async fn verify(&self, request: &VerifyRequest) -> Result<Verification, PaymentError> {
        let transaction_id = request
            .transaction_id
            .as_deref()
            .ok_or_else(|| PaymentError::Declined("transaction_id is required".to_string()))?;
        let resp = self
            .client
            .get(format!("{}/transactions/{}/verify", self.base_url, transaction_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;
        let body = read_json(resp).await?;
        parse_verify(&request.reference, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn verify_body(tx_ref: &str, status: &str, currency: &str, amount: u64) -> Value {
        json!({
            "status": "success",
            "message": "Transaction fetched successfully",
            "data": {
                "id": 288200108,
                "tx_ref": tx_ref,
                "status": status,
                "amount": amount,
                "currency": currency,
                "meta": {
                    "product_id": Uuid::new_v4().to_string(),
                    "quantity": "10",
                    "amount": "15000",
                    "email": "ada@example.com"
                }
            }
        })
    }

    #[test]
    fn decodes_payment_link() {
        let session = parse_initialize(
            "tx-1",
            json!({"status": "success", "data": {"link": "https://checkout.flutterwave.com/pay/x"}}),
        )
        .unwrap();
        assert_eq!(session.reference, "tx-1");
        assert_eq!(session.authorization_url, "https://checkout.flutterwave.com/pay/x");
    }

    #[test]
    fn successful_ngn_charge_verifies() {
        let v = parse_verify("tx-1", verify_body("tx-1", "successful", "NGN", 15000)).unwrap();
        assert!(v.successful);
        assert_eq!(v.amount, Decimal::from(15000));
        assert_eq!(v.metadata.unwrap().quantity, 10);
    }

    #[test]
    fn foreign_currency_is_rejected() {
        let v = parse_verify("tx-1", verify_body("tx-1", "successful", "USD", 15000)).unwrap();
        assert!(!v.successful);
    }

    #[test]
    fn mismatched_reference_is_rejected() {
        let v = parse_verify("tx-1", verify_body("tx-2", "successful", "NGN", 15000)).unwrap();
        assert!(!v.successful);
    }

    #[test]
    fn short_payment_is_rejected() {
        let v = parse_verify("tx-1", verify_body("tx-1", "successful", "NGN", 100)).unwrap();
        assert!(!v.successful);
    }

    #[test]
    fn error_envelope_is_declined() {
        let err = parse_verify("tx-1", json!({"status": "error", "message": "No transaction was found"}))
            .unwrap_err();
        assert!(matches!(err, PaymentError::Declined(_)));
    }
}
