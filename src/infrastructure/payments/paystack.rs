use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use super::{metadata_field, read_json};
use crate::domain::ledger::PaymentProvider;
use crate::domain::ports::{
    CheckoutRequest, CheckoutSession, PaymentError, PaymentGateway, Verification, VerifyRequest,
};

const PAYSTACK_API: &str = "https://api.paystack.co";
const SETTLEMENT_CURRENCY: &str = "NGN";

/// Paystack amounts are integers in kobo
pub fn to_kobo(amount: Decimal) -> Result<i64, PaymentError> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| PaymentError::Unexpected(format!("amount {} out of range", amount)))
}

pub fn from_kobo(kobo: i64) -> Decimal {
    Decimal::new(kobo, 2)
}

/// Decodes `POST /transaction/initialize`
pub fn parse_initialize(body: Value) -> Result<CheckoutSession, PaymentError> {
    if body["status"].as_bool() != Some(true) {
        let message = body["message"].as_str().unwrap_or("initialize failed").to_string();
        return Err(PaymentError::Declined(message));
    }
    let data = &body["data"];
    let authorization_url = data["authorization_url"]
        .as_str()
        .ok_or_else(|| PaymentError::Unexpected("missing authorization_url".to_string()))?
        .to_string();
    let reference = data["reference"]
        .as_str()
        .ok_or_else(|| PaymentError::Unexpected("missing reference".to_string()))?
        .to_string();
    Ok(CheckoutSession {
        authorization_url,
        reference,
        raw: body,
    })
}

/// Decodes `GET /transaction/verify/{reference}`
pub fn parse_verify(reference: &str, body: Value) -> Result<Verification, PaymentError> {
    if body["status"].as_bool() != Some(true) {
        let message = body["message"].as_str().unwrap_or("verification failed").to_string();
        return Err(PaymentError::Declined(message));
    }
    let data = &body["data"];
    if let Some(echoed) = data["reference"].as_str() {
        if echoed != reference {
            return Err(PaymentError::Unexpected(format!(
                "reference mismatch: {} != {}",
                echoed, reference
            )));
        }
    }
    let kobo = data["amount"]
        .as_i64()
        .ok_or_else(|| PaymentError::Unexpected("missing amount".to_string()))?;
    let amount = from_kobo(kobo);
    let metadata = metadata_field(&data["metadata"]);
    let currency = data["currency"].as_str().unwrap_or_default().to_string();
    let amount_matches = metadata
        .as_ref()
        .map(|m| m.amount == amount)
        .unwrap_or(true);
    let successful = data["status"].as_str() == Some("success")
        && currency == SETTLEMENT_CURRENCY
        && amount_matches;

    Ok(Verification {
        reference: reference.to_string(),
        successful,
        amount,
        currency,
        metadata,
        raw: body,
    })
}

/// Paystack REST client
pub struct PaystackGateway {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl PaystackGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
            base_url: PAYSTACK_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Paystack
    }

    async fn initialize(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        let payload = json!({
            "email": request.email,
            "amount": to_kobo(request.amount)?,
            "currency": SETTLEMENT_CURRENCY,
            "metadata": request.metadata,
        });
        let resp = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;
        let body = read_json(resp).await?;
        parse_initialize(body)
    }

    async fn verify(&self, request: &VerifyRequest) -> Result<Verification, PaymentError> {
        let resp = self
            .client
            .get(format!("{}/transaction/verify/{}", self.base_url, request.reference))
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
    use uuid::Uuid;

    #[test]
    fn converts_naira_to_kobo() {
        assert_eq!(to_kobo(Decimal::new(1500050, 2)).unwrap(), 1_500_050);
        assert_eq!(from_kobo(1_500_050), Decimal::new(1500050, 2));
    }

    #[test]
    fn decodes_initialize_response() {
        let session = parse_initialize(json!({
            "status": true,
            "message": "Authorization URL created",
            "data": {
                "authorization_url": "https://checkout.paystack.com/abc",
                "access_code": "abc",
                "reference": "ref_1"
            }
        }))
        .unwrap();
        assert_eq!(session.reference, "ref_1");
        assert_eq!(session.authorization_url, "https://checkout.paystack.com/abc");
    }

    #[test]
    fn rejected_initialize_is_declined() {
        let err = parse_initialize(json!({"status": false, "message": "Invalid key"})).unwrap_err();
        assert!(matches!(err, PaymentError::Declined(m) if m == "Invalid key"));
    }

    #[test]
    fn decodes_successful_verification() {
        let product = Uuid::new_v4();
        let verification = parse_verify(
            "ref_1",
            json!({
                "status": true,
                "data": {
                    "status": "success",
                    "reference": "ref_1",
                    "amount": 2400000,
                    "currency": "NGN",
                    "metadata": {
                        "product_id": product.to_string(),
                        "quantity": 12,
                        "amount": "24000",
                        "email": "ada@example.com"
                    }
                }
            }),
        )
        .unwrap();
        assert!(verification.successful);
        assert_eq!(verification.amount, Decimal::from(24000));
        assert_eq!(verification.metadata.unwrap().product_id, product);
    }

    #[test]
    fn abandoned_payment_is_unsuccessful() {
        let verification = parse_verify(
            "ref_2",
            json!({
                "status": true,
                "data": {"status": "abandoned", "reference": "ref_2", "amount": 100, "currency": "NGN"}
            }),
        )
        .unwrap();
        assert!(!verification.successful);
        assert!(verification.metadata.is_none());
    }

    #[test]
    fn underpaid_charge_is_unsuccessful() {
        let verification = parse_verify(
            "ref_3",
            json!({
                "status": true,
                "data": {
                    "status": "success",
                    "reference": "ref_3",
                    "amount": 100,
                    "currency": "NGN",
                    "metadata": {
                        "product_id": Uuid::new_v4().to_string(),
                        "quantity": 10,
                        "amount": 5000,
                        "email": "ada@example.com"
                    }
                }
            }),
        )
        .unwrap();
        assert!(!verification.successful);
    }

    #[test]
    fn charge_in_another_currency_is_unsuccessful() {
        let verification = parse_verify(
            "ref_4",
            json!({
                "status": true,
                "data": {
                    "status": "success",
                    "reference": "ref_4",
                    "amount": 2400000,
                    "currency": "USD",
                    "metadata": {
                        "product_id": Uuid::new_v4().to_string(),
                        "quantity": 12,
                        "amount": "24000",
                        "email": "ada@example.com"
                    }
                }
            }),
        )
        .unwrap();
        assert!(!verification.successful);
        assert_eq!(verification.currency, "USD");
    }
}
