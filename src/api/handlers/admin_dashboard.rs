use axum::extract::State;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::effects::{self, outgoing};
use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::handlers::dashboard::window;
use crate::api::middleware::{AdminUser, AuthUser};
use crate::api::response::{ApiResponse, ApiResult};
use crate::domain::account::Email;
use crate::domain::catalog::{NewNews, NewOpportunity, NewsPatch, OpportunityPatch};
use crate::domain::ledger::Settlement;
use crate::domain::pagination::PageQuery;
use crate::domain::repositories::Purchase;
use crate::infrastructure::mail::templates;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMailRequest {
    pub emails: Vec<String>,
    pub subject: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveSaleRequest {
    pub sell_request_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub user_investment_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBuyRequest {
    pub user_id: Uuid,
    pub investment_opportunity_id: Uuid,
    pub quantity: i32,
    pub amount: Decimal,
}

/// GET /api/v1/admin/dashboard/users
pub async fn users(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = state.accounts.list(window(query)?).await?;
    Ok(ApiResponse::ok(
        "Users fetched",
        page.map(|account| account.view()).into_json("users"),
    ))
}

/// Sends one copy per recipient so addresses are not disclosed to each other
///
/// POST /api/v1/admin/dashboard/users/send-mail
pub async fn send_mail(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<SendMailRequest>,
) -> ApiResult {
    if req.emails.is_empty() {
        return Err(ApiError::validation("emails must contain at least one address"));
    }
    let recipients = req
        .emails
        .iter()
        .map(|e| Email::new(e.as_str()).map(String::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApiError::validation)?;
    let subject_len = req.subject.trim().chars().count();
    if !(3..=50).contains(&subject_len) {
        return Err(ApiError::validation("subject must be between 3 and 50 characters"));
    }
    if req.content.trim().chars().count() < 10 {
        return Err(ApiError::validation("content must be at least 10 characters"));
    }

    let html = templates::broadcast(req.subject.trim(), &req.content);
    let mut sent = Vec::new();
    let mut failed = Vec::new();
    for recipient in recipients {
        let mail = outgoing(&state, vec![recipient.clone()], req.subject.trim(), html.clone());
        match state.mailer.send(mail).await {
            Ok(()) => sent.push(recipient),
            Err(e) => {
                tracing::warn!(recipient = %recipient, error = %e, "broadcast mail failed");
                failed.push(recipient);
            }
        }
    }
    if sent.is_empty() {
        return Err(ApiError::bad_gateway("Email could not be sent").with_error(json!({ "failed": failed })));
    }

    Ok(ApiResponse::ok("Mail sent", json!({ "sent": sent, "failed": failed })))
}

/// DELETE /api/v1/admin/dashboard/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult {
    if id == admin.id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }
    state.accounts.delete(id).await?;
    tracing::info!(account_id = %id, admin_id = %admin.id, "account deleted");
    Ok(ApiResponse::ok("User deleted", json!({})))
}

/// GET /api/v1/admin/dashboard/transactions
pub async fn transactions(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = state.ledger.all_transactions(window(query)?).await?;
    Ok(ApiResponse::ok("Transactions fetched", page.into_json("transactions")))
}

/// GET /api/v1/admin/dashboard/transaction/approve/sell
pub async fn sell_requests(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = state.ledger.sell_requests(window(query)?).await?;
    Ok(ApiResponse::ok("Sell requests fetched", page.into_json("sellRequests")))
}

/// Settle a pending sell request against the seller's position
///
/// PATCH /api/v1/admin/dashboard/transactions/approve
pub async fn approve_sale(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<ApproveSaleRequest>,
) -> ApiResult {
    let approved = state.ledger.approve_sale(req.sell_request_id).await?;
    let request = &approved.sell_request;
    tracing::info!(
        event = ?approved.event,
        sell_request_id = %request.id,
        admin_id = %admin.id,
        "sale approved"
    );

    let message = format!(
        "Your sell request for {} units of {} has been approved",
        request.quantity, request.product
    );
    effects::notify(&state, request.account_id, message.clone()).await;
    let mail = outgoing(
        &state,
        vec![request.email.clone()],
        "Sell request approved",
        templates::message("Sell request approved", &format!("{}. Amount: {}", message, request.amount)),
    );
    effects::deliver(&state, mail).await;

    Ok(ApiResponse::ok(
        "Sell request approved",
        json!({
            "sellRequest": request,
            "positionClosed": approved.settlement == Settlement::Closed,
        }),
    ))
}

/// Confirms a checkout by hand when no gateway callback arrived
///
/// POST /api/v1/admin/dashboard/verify-payment
pub async fn verify_payment(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<VerifyPaymentRequest>,
) -> ApiResult {
    if req.quantity < 1 {
        return Err(ApiError::validation("quantity must be at least 1"));
    }
    let credited = state
        .ledger
        .confirm_purchase(
            req.user_investment_id,
            Purchase {
                quantity: req.quantity,
                amount: Decimal::ZERO,
                receipt: None,
            },
        )
        .await?;
    tracing::info!(event = ?credited.event, admin_id = %admin.id, "payment verified manually");

    effects::notify(
        &state,
        credited.position.user_id(),
        format!("Your payment for {} units has been confirmed", req.quantity),
    )
    .await;
    Ok(ApiResponse::ok("Payment verified", json!({ "position": credited.position })))
}

/// POST /api/v1/admin/dashboard/buy
pub async fn buy_for_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<AdminBuyRequest>,
) -> ApiResult {
    if req.quantity < 1 {
        return Err(ApiError::validation("quantity must be at least 1"));
    }
    if req.amount <= Decimal::ZERO {
        return Err(ApiError::validation("amount must be greater than 0"));
    }
    let account = state
        .accounts
        .find_by_id(req.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let opportunity = state
        .opportunities
        .find_by_id(req.investment_opportunity_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Investment opportunity not found"))?;

    let credited = state
        .ledger
        .credit_account(
            account.id,
            opportunity.id,
            Purchase {
                quantity: req.quantity,
                amount: req.amount,
                receipt: None,
            },
        )
        .await?;
    tracing::info!(event = ?credited.event, admin_id = %admin.id, "admin purchase recorded");

    let message = format!(
        "{} units of {} have been added to your portfolio",
        req.quantity, opportunity.title
    );
    effects::notify(&state, account.id, message.clone()).await;
    let mail = outgoing(
        &state,
        vec![account.email.clone()],
        "Buy Product Confirmation",
        templates::message("Purchase recorded", &format!("{}. Amount: {}", message, req.amount)),
    );
    effects::deliver(&state, mail).await;

    Ok(ApiResponse::ok(
        "Purchase recorded",
        json!({ "position": credited.position, "transaction": credited.transaction }),
    ))
}

/// POST /api/v1/admin/dashboard/investor-news
pub async fn create_news(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<NewNews>,
) -> ApiResult {
    req.validate().map_err(ApiError::validation)?;
    let news = req.into_news();
    state.news.create(&news).await?;
    Ok(ApiResponse::created("News created", json!({ "news": news })))
}

/// GET /api/v1/admin/dashboard/investor-news
pub async fn list_news(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = state.news.list(window(query)?).await?;
    Ok(ApiResponse::ok("News fetched", page.into_json("news")))
}

/// GET /api/v1/admin/dashboard/investment-news/:newsId
pub async fn get_news(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult {
    let news = state
        .news
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("News not found"))?;
    Ok(ApiResponse::ok("News fetched", json!({ "news": news })))
}

/// PATCH /api/v1/admin/dashboard/investor-news/:id
pub async fn update_news(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<NewsPatch>,
) -> ApiResult {
    req.validate().map_err(ApiError::validation)?;
    let mut news = state
        .news
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("News not found"))?;
    req.apply(&mut news);
    state.news.update(&news).await?;
    Ok(ApiResponse::ok("News updated", json!({ "news": news })))
}

/// DELETE /api/v1/admin/dashboard/investor-news/:id
pub async fn delete_news(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult {
    state.news.delete(id).await?;
    Ok(ApiResponse::ok("News deleted", json!({})))
}

/// GET /api/v1/admin/dashboard/investor-opportunities
pub async fn list_opportunities(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = state.opportunities.list(window(query)?).await?;
    Ok(ApiResponse::ok(
        "Investment opportunities fetched",
        page.into_json("opportunities"),
    ))
}

/// GET /api/v1/admin/dashboard/investor-opportunities/:id
pub async fn get_opportunity(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult {
    let opportunity = state
        .opportunities
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Investment opportunity not found"))?;
    Ok(ApiResponse::ok(
        "Investment opportunity fetched",
        json!({ "opportunity": opportunity }),
    ))
}

/// POST /api/v1/admin/dashboard/investor-opportunities
pub async fn create_opportunity(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<NewOpportunity>,
) -> ApiResult {
    req.validate().map_err(ApiError::validation)?;
    let opportunity = req.into_opportunity();
    state.opportunities.create(&opportunity).await?;
    tracing::info!(opportunity_id = %opportunity.id, admin_id = %admin.id, "opportunity created");
    Ok(ApiResponse::created(
        "Investment opportunity created",
        json!({ "opportunity": opportunity }),
    ))
}

/// PATCH /api/v1/admin/dashboard/investor-opportunities/:id
pub async fn update_opportunity(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<OpportunityPatch>,
) -> ApiResult {
    req.validate().map_err(ApiError::validation)?;
    let mut opportunity = state
        .opportunities
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Investment opportunity not found"))?;
    req.apply(&mut opportunity);
    state.opportunities.update(&opportunity).await?;
    Ok(ApiResponse::ok(
        "Investment opportunity updated",
        json!({ "opportunity": opportunity }),
    ))
}

/// DELETE /api/v1/admin/dashboard/investor-opportunities/:id
pub async fn delete_opportunity(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult {
    state.opportunities.delete(id).await?;
    Ok(ApiResponse::ok("Investment opportunity deleted", json!({})))
}

/// GET /api/v1/admin/dashboard/account-details/:userId
pub async fn account_details(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(account_id): ApiPath<Uuid>,
) -> ApiResult {
    let details = state.banking.account_details_for(account_id).await?;
    Ok(ApiResponse::ok(
        "Account details fetched",
        json!({ "accountDetails": details }),
    ))
}

/// GET /api/v1/admin/dashboard/payment-details/:userId
pub async fn payment_details(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(account_id): ApiPath<Uuid>,
) -> ApiResult {
    let details = state.banking.payment_details_for(account_id).await?;
    Ok(ApiResponse::ok(
        "Payment details fetched",
        json!({ "paymentDetails": details }),
    ))
}
