use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::ledger::PaymentProvider;
use crate::domain::ports::{
    CheckoutRequest, CheckoutSession, PaymentError, PaymentGateway, PurchaseMetadata,
    Verification, VerifyRequest,
};

/// Gateway double that remembers initialised checkouts
///
/// Every checkout succeeds unless `decline_checkouts` is set; a reference
/// verifies successfully unless it was marked with `fail_reference`, and
/// reports the checkout amount unless `settle_amount` overrode it.
pub struct ScriptedGateway {
    provider: PaymentProvider,
    decline_checkouts: bool,
    checkouts: Mutex<HashMap<String, (Decimal, PurchaseMetadata)>>,
    failed: Mutex<Vec<String>>,
    settled: Mutex<HashMap<String, Decimal>>,
}

impl ScriptedGateway {
    pub fn new(provider: PaymentProvider) -> Self {
        Self {
            provider,
            decline_checkouts: false,
            checkouts: Mutex::new(HashMap::new()),
            failed: Mutex::new(Vec::new()),
            settled: Mutex::new(HashMap::new()),
        }
    }

    pub fn declining(provider: PaymentProvider) -> Self {
        Self {
            decline_checkouts: true,
            ..Self::new(provider)
        }
    }

    pub fn fail_reference(&self, reference: &str) {
        self.failed.lock().push(reference.to_string());
    }

    /// Makes `reference` verify as a charge of `amount`
    pub fn settle_amount(&self, reference: &str, amount: Decimal) {
        self.settled.lock().insert(reference.to_string(), amount);
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    fn provider(&self) -> PaymentProvider {
        self.provider
    }

    async fn initialize(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        if self.decline_checkouts {
            return Err(PaymentError::Declined("checkout declined".to_string()));
        }
        let reference = Uuid::new_v4().to_string();
        self.checkouts
            .lock()
            .insert(reference.clone(), (request.amount, request.metadata.clone()));
        Ok(CheckoutSession {
            authorization_url: format!("https://checkout.test/{}", reference),
            reference: reference.clone(),
            raw: json!({ "reference": reference }),
        })
    }

    async fn verify(&self, request: &VerifyRequest) -> Result<Verification, PaymentError> {
        let (amount, metadata) = self
            .checkouts
            .lock()
            .get(&request.reference)
            .cloned()
            .ok_or_else(|| PaymentError::Declined("unknown reference".to_string()))?;
        let amount = self
            .settled
            .lock()
            .get(&request.reference)
            .copied()
            .unwrap_or(amount);
        let successful = !self.failed.lock().contains(&request.reference);
        Ok(Verification {
            reference: request.reference.clone(),
            successful,
            amount,
            currency: "NGN".to_string(),
            metadata: Some(metadata),
            raw: json!({ "status": if successful { "success" } else { "failed" } }),
        })
    }
}
