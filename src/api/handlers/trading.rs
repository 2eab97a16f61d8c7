// Buy and sell flows
// Gateway checkout, payment callbacks and sell requests

use axum::extract::State;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::effects::{self, outgoing};
use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::middleware::AuthUser;
use crate::api::response::{ApiResponse, ApiResult};
use crate::domain::account::{Email, PhoneNumber};
use crate::domain::banking::Checkout;
use crate::domain::catalog::Opportunity;
use crate::domain::ledger::{
    PaymentProvider, PaymentReceipt, Position, SaleRequest, MIN_PURCHASE_QUANTITY,
};
use crate::domain::ports::{
    CheckoutRequest, PaymentError, PurchaseMetadata, Verification, VerifyRequest,
};
use crate::domain::repositories::{Credited, Purchase};
use crate::infrastructure::mail::templates::{self, PaymentSummary};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyRequest {
    pub investment_opportunity_id: Uuid,
    pub quantity: i32,
    pub email: String,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub payment_method: String,
}

const SETTLEMENT_CURRENCY: &str = "NGN";

fn default_currency() -> String {
    SETTLEMENT_CURRENCY.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaystackCallback {
    pub reference: String,
    pub user_investment_id: Uuid,
    pub checkout_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlutterwaveCallback {
    pub status: String,
    #[serde(rename = "tx_ref")]
    pub tx_ref: String,
    #[serde(rename = "transaction_id")]
    pub transaction_id: Option<String>,
    pub user_investment_id: Uuid,
    pub checkout_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellRequestBody {
    pub investment_opportunity_id: Uuid,
    pub quantity: i32,
    pub phone_number: String,
}

async fn opportunity(state: &AppState, id: Uuid) -> Result<Opportunity, ApiError> {
    state
        .opportunities
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No investment opportunity for this {} found", id)))
}

/// Units are always priced at the opportunity's current unit amount
fn purchase_price(opportunity: &Opportunity, quantity: i32) -> Decimal {
    opportunity.amount * Decimal::from(quantity)
}

/// Start a gateway checkout and open a pending position
///
/// POST /api/v1/user/dashboard/buy
pub async fn buy(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<BuyRequest>,
) -> ApiResult {
    if req.quantity < MIN_PURCHASE_QUANTITY {
        return Err(ApiError::validation(format!(
            "quantity must be at least {}",
            MIN_PURCHASE_QUANTITY
        )));
    }
    if req.amount <= Decimal::ZERO {
        return Err(ApiError::validation("amount must be greater than 0"));
    }
    let email = Email::new(&req.email)
        .map_err(|_| ApiError::bad_request(format!("Email is invalid {}", req.email)))?;

    if !req.currency.eq_ignore_ascii_case(SETTLEMENT_CURRENCY) {
        return Err(ApiError::validation(format!(
            "currency must be {}",
            SETTLEMENT_CURRENCY
        )));
    }

    let opportunity = opportunity(&state, req.investment_opportunity_id).await?;
    let provider = PaymentProvider::parse(&req.payment_method)
        .ok_or_else(|| ApiError::bad_request("Invalid payment method"))?;

    let price = purchase_price(&opportunity, req.quantity);
    if req.amount != price {
        return Err(ApiError::bad_request(format!(
            "Amount does not match the price of {} units ({})",
            req.quantity, price
        )));
    }

    let session = state
        .gateway(provider)
        .initialize(&CheckoutRequest {
            email: email.to_string(),
            amount: price,
            metadata: PurchaseMetadata {
                product_id: opportunity.id,
                quantity: req.quantity,
                amount: price,
                email: email.to_string(),
            },
        })
        .await?;

    let (position, opened) = state.ledger.open_position(user.id, opportunity.id).await?;
    if let Some(event) = opened {
        tracing::info!(?event, "position opened");
    }
    tracing::info!(
        user_id = %user.id,
        position_id = %position.id(),
        provider = %provider,
        reference = %session.reference,
        "checkout initialised"
    );

    effects::notify(
        &state,
        user.id,
        format!(
            "Acknowledged, please wait for payment confirmation to get your product {}",
            opportunity.title
        ),
    )
    .await;

    Ok(ApiResponse::ok(
        "Acknowledged, please wait for payment confirmation to get your product",
        json!({ "transactionResult": session, "products": position }),
    ))
}

/// GET /api/v1/user/dashboard/paystack/verify
pub async fn paystack_verify(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<PaystackCallback>,
) -> ApiResult {
    let request = VerifyRequest {
        reference: query.reference,
        transaction_id: None,
    };
    settle_payment(
        &state,
        &user,
        PaymentProvider::Paystack,
        request,
        query.user_investment_id,
        query.checkout_id.as_deref(),
    )
    .await
}

/// GET /api/v1/user/dashboard/flutterwave/verify
pub async fn flutterwave_verify(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<FlutterwaveCallback>,
) -> ApiResult {
    let position = owned_position(&state, &user, query.user_investment_id).await?;
    if !matches!(query.status.as_str(), "successful" | "completed") {
        return payment_failed(&state, &position).await;
    }
    let request = VerifyRequest {
        reference: query.tx_ref,
        transaction_id: query.transaction_id,
    };
    settle_payment(
        &state,
        &user,
        PaymentProvider::Flutterwave,
        request,
        query.user_investment_id,
        query.checkout_id.as_deref(),
    )
    .await
}

async fn owned_position(
    state: &AppState,
    user: &AuthUser,
    position_id: Uuid,
) -> Result<Position, ApiError> {
    state
        .ledger
        .find_position(position_id)
        .await?
        .filter(|p| p.user_id() == user.id)
        .ok_or_else(|| ApiError::not_found("Investment not found"))
}

/// Drops a checkout that was never paid
async fn payment_failed(state: &AppState, position: &Position) -> ApiResult {
    if state.ledger.abandon_checkout(position.id()).await? {
        tracing::info!(position_id = %position.id(), "unpaid checkout removed");
    }
    Err(ApiError::bad_request("Payment was unsuccessful"))
}

async fn settle_payment(
    state: &AppState,
    user: &AuthUser,
    provider: PaymentProvider,
    request: VerifyRequest,
    position_id: Uuid,
    checkout_id: Option<&str>,
) -> ApiResult {
    let position = owned_position(state, user, position_id).await?;

    let verification: Verification = match state.gateway(provider).verify(&request).await {
        Ok(v) if v.successful => v,
        Ok(_) | Err(PaymentError::Declined(_)) => return payment_failed(state, &position).await,
        Err(e) => return Err(e.into()),
    };

    let metadata = verification
        .metadata
        .clone()
        .ok_or_else(|| ApiError::bad_request("Payment metadata missing"))?;
    if metadata.product_id != position.opportunity_id() {
        return Err(ApiError::bad_request("Payment does not match this investment"));
    }
    let opportunity = opportunity(state, position.opportunity_id()).await?;
    if verification.amount < purchase_price(&opportunity, metadata.quantity) {
        tracing::warn!(
            position_id = %position.id(),
            reference = %verification.reference,
            paid = %verification.amount,
            quantity = metadata.quantity,
            "payment does not cover the units requested"
        );
        return Err(ApiError::bad_request(format!(
            "Amount paid does not cover {} units",
            metadata.quantity
        )));
    }

    let Credited {
        position,
        transaction,
        event,
    } = state
        .ledger
        .confirm_purchase(
            position.id(),
            Purchase {
                quantity: metadata.quantity,
                amount: verification.amount,
                receipt: Some(PaymentReceipt::new(provider.as_str(), &verification.reference)),
            },
        )
        .await?;
    tracing::info!(?event, provider = %provider, reference = %verification.reference, "payment confirmed");

    let title = opportunity.title;
    effects::notify(
        state,
        user.id,
        format!("Payment confirmed for {} units of {}", metadata.quantity, title),
    )
    .await;

    let checkout = match checkout_id.and_then(|id| Uuid::parse_str(id).ok()) {
        Some(id) => state
            .banking
            .find_checkout(id)
            .await?
            .filter(|c| c.account_id == user.id),
        None => None,
    };
    let Some(checkout) = checkout else {
        return Err(ApiError::bad_request("Can't find your checkout info")
            .with_error("Email won't be sent"));
    };

    send_purchase_mails(state, &checkout, &title, metadata.quantity, &verification).await;

    Ok(ApiResponse::ok(
        "Payment confirmed",
        json!({ "position": position, "transaction": transaction, "verified": verification.raw }),
    ))
}

/// Buyer, admin and insurers each get a confirmation
async fn send_purchase_mails(
    state: &AppState,
    checkout: &Checkout,
    title: &str,
    quantity: i32,
    verification: &Verification,
) {
    let summary = PaymentSummary {
        name: &checkout.name,
        email: &checkout.email,
        phone_number: &checkout.phone_number,
        address: &checkout.address,
        product: title,
        quantity,
        amount: verification.amount,
        reference: &verification.reference,
    };
    let buyer = outgoing(
        state,
        vec![checkout.email.clone()],
        "Buy Product Confirmation",
        templates::payment_confirmation(&summary),
    );
    let staff = outgoing(
        state,
        vec![state.config.mail.admin.clone()],
        "Buy Product Confirmation",
        templates::message(
            "New purchase",
            &format!(
                "This product: {} was bought by {}\nName - {}, email: {}, phone number: {}\nAmount - {}",
                title, checkout.email, checkout.name, checkout.email, checkout.phone_number,
                verification.amount
            ),
        ),
    );
    let mut insurers = outgoing(
        state,
        state.config.mail.insurers.clone(),
        "Nagaing Investor Product Buy Confirmation",
        templates::payment_confirmation(&summary),
    );
    insurers.sender_name = format!("{} (Insurance)", effects::SENDER_NAME);

    tokio::join!(
        effects::deliver(state, buyer),
        effects::deliver(state, staff),
        effects::deliver(state, insurers),
    );
}

/// Reserve units for sale and wait for admin approval
///
/// POST /api/v1/user/dashboard/sell
pub async fn sell(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<SellRequestBody>,
) -> ApiResult {
    if req.quantity < 1 {
        return Err(ApiError::validation("quantity must be at least 1"));
    }
    let phone = PhoneNumber::new(&req.phone_number).map_err(ApiError::validation)?;
    let opportunity = opportunity(&state, req.investment_opportunity_id).await?;
    let account = state
        .accounts
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    if state
        .ledger
        .find_position_for(user.id, opportunity.id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("User has no investment in this opportunity"));
    }

    let amount = opportunity.amount * Decimal::from(req.quantity);
    let recorded = state
        .ledger
        .request_sale(SaleRequest {
            account_id: user.id,
            opportunity_id: opportunity.id,
            quantity: req.quantity,
            amount,
            seller: account.username.clone(),
            email: account.email.clone(),
            phone_number: phone.as_str().to_string(),
            product: opportunity.title.clone(),
        })
        .await?;
    tracing::info!(event = ?recorded.event, sell_request_id = %recorded.sell_request.id, "sale requested");

    effects::notify(
        &state,
        user.id,
        format!("{} units of {} have been put up for sale", req.quantity, opportunity.title),
    )
    .await;
    let mail = outgoing(
        &state,
        vec![state.config.mail.admin.clone()],
        "Sell confirmation email",
        templates::message(
            "New sell request",
            &format!(
                "There is a sell request from\nusername: {}\nEmail: {}\nPhone number: {}\nProduct: {}\nQuantity: {}\nAmount: {}",
                account.username,
                account.email,
                phone.as_str(),
                opportunity.title,
                req.quantity,
                amount
            ),
        ),
    );
    effects::deliver(&state, mail).await;

    Ok(ApiResponse::ok(
        "Waiting for approval from admin to get your product sold",
        json!({
            "waitingForApproval": recorded.sell_request,
            "transaction": recorded.transaction,
        }),
    ))
}
