// Payment gateway adapters
// Paystack and Flutterwave over their REST APIs

pub mod flutterwave;
pub mod paystack;

pub use flutterwave::FlutterwaveGateway;
pub use paystack::PaystackGateway;

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::ports::{PaymentError, PurchaseMetadata};

/// Reads a decimal that the gateway may encode as a number or a string
pub(crate) fn decimal_field(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Gateways echo metadata back with loosely typed values
pub(crate) fn metadata_field(value: &Value) -> Option<PurchaseMetadata> {
    let product_id = value.get("product_id")?.as_str().and_then(|s| Uuid::parse_str(s).ok())?;
    let quantity = match value.get("quantity")? {
        Value::Number(n) => i32::try_from(n.as_i64()?).ok()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    let amount = decimal_field(value.get("amount")?)?;
    let email = value.get("email")?.as_str()?.to_string();
    Some(PurchaseMetadata {
        product_id,
        quantity,
        amount,
        email,
    })
}

/// Both gateways answer errors with a JSON envelope, so the status code is not inspected
pub(crate) async fn read_json(resp: reqwest::Response) -> Result<Value, PaymentError> {
    resp.json::<Value>()
        .await
        .map_err(|e| PaymentError::Unexpected(e.to_string()))
}
