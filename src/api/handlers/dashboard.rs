use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::effects;
use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{AuthUser, InvestorUser};
use crate::api::response::{ApiResponse, ApiResult};
use crate::auth::password::{hash_password, verify_password};
use crate::domain::account::value_objects::validate_password;
use crate::domain::account::{PhoneNumber, ProfileUpdate, Username};
use crate::domain::banking::{AccountDetails, AccountDetailsInput, AccountDetailsPatch, CardInput};
use crate::domain::pagination::{PageQuery, Pagination};
use crate::domain::stats::{investment_stats, transaction_stats};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoRequest {
    pub fullname: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
    pub username: Option<String>,
}

pub(crate) fn window(query: PageQuery) -> Result<Pagination, ApiError> {
    Pagination::from_query(query).map_err(ApiError::validation)
}

/// GET /api/v1/user/dashboard/news
pub async fn news(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = state.news.list(window(query)?).await?;
    Ok(ApiResponse::ok("News fetched", page.into_json("news")))
}

/// GET /api/v1/user/dashboard/opportunity
pub async fn opportunities(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = state.opportunities.list(window(query)?).await?;
    Ok(ApiResponse::ok(
        "Investment opportunities fetched",
        page.into_json("opportunities"),
    ))
}

/// GET /api/v1/user/dashboard/opportunity/titles
pub async fn opportunity_titles(State(state): State<AppState>) -> ApiResult {
    let titles = state.opportunities.titles().await?;
    Ok(ApiResponse::ok("Titles fetched", json!({ "titles": titles })))
}

/// GET /api/v1/user/dashboard/opportunity/:id
pub async fn opportunity(
    State(state): State<AppState>,
    _user: AuthUser,
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

/// GET /api/v1/user/dashboard/checkout
pub async fn checkouts(State(state): State<AppState>, user: AuthUser) -> ApiResult {
    let checkouts = state.banking.checkouts_for(user.id).await?;
    Ok(ApiResponse::ok("Checkout info fetched", json!({ "checkouts": checkouts })))
}

/// Positions of a user with their opportunity
///
/// GET /api/v1/user/dashboard/:id/investment
pub async fn investments(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(account_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    user.ensure_self_or_admin(account_id)?;
    let page = state.ledger.holdings_for(account_id, window(query)?).await?;
    Ok(ApiResponse::ok("Investments fetched", page.into_json("investments")))
}

/// PATCH /api/v1/user/dashboard/password
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult {
    validate_password(&req.new_password).map_err(ApiError::validation)?;
    let account = state
        .accounts
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    if !verify_password(&req.current_password, &account.password_hash)? {
        return Err(ApiError::forbidden("Current password is incorrect"));
    }

    let password_hash = hash_password(&req.new_password, state.config.bcrypt_cost)?;
    state.accounts.update_password(account.id, &password_hash).await?;
    tracing::info!(account_id = %account.id, "password changed");

    effects::notify(&state, user.id, "Your password was changed").await;
    Ok(ApiResponse::ok("Password updated successfully", json!({})))
}

/// PATCH /api/v1/user/dashboard/user-info
pub async fn update_user_info(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<UserInfoRequest>,
) -> ApiResult {
    let update = ProfileUpdate {
        username: req
            .username
            .map(|u| Username::new(u).map(|u| u.as_str().to_string()))
            .transpose()
            .map_err(ApiError::validation)?,
        phone_number: req
            .phone_number
            .map(|p| PhoneNumber::new(p).map(|p| p.as_str().to_string()))
            .transpose()
            .map_err(ApiError::validation)?,
        fullname: req.fullname.map(|f| f.trim().to_string()),
        profile_image: req.profile_image.map(|i| i.trim().to_string()),
    };

    let mut account = state
        .accounts
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;
    update.apply(&mut account);
    state.accounts.update_profile(&account).await?;

    effects::notify(&state, user.id, "Your profile was updated").await;
    Ok(ApiResponse::ok(
        "Profile updated successfully",
        json!({ "user": account.view() }),
    ))
}

/// GET /api/v1/user/dashboard/transaction-history
pub async fn transaction_history(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = state.ledger.transactions_for(user.id, window(query)?).await?;
    Ok(ApiResponse::ok("Transactions fetched", page.into_json("transactions")))
}

/// POST /api/v1/user/dashboard/account-details
pub async fn create_account_details(
    State(state): State<AppState>,
    InvestorUser(user): InvestorUser,
    ApiJson(req): ApiJson<AccountDetailsInput>,
) -> ApiResult {
    req.validate().map_err(ApiError::validation)?;
    let details = req.into_details(user.id);
    state.banking.create_account_details(&details).await?;

    effects::notify(&state, user.id, "Your bank account details were added").await;
    Ok(ApiResponse::created(
        "Account details saved",
        json!({ "accountDetails": details }),
    ))
}

/// GET /api/v1/user/dashboard/account-details/:userId
pub async fn account_details(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(account_id): ApiPath<Uuid>,
) -> ApiResult {
    user.ensure_self_or_admin(account_id)?;
    let details = state.banking.account_details_for(account_id).await?;
    Ok(ApiResponse::ok(
        "Account details fetched",
        json!({ "accountDetails": details }),
    ))
}

async fn owned_details(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> Result<AccountDetails, ApiError> {
    let details = state
        .banking
        .find_account_details(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account details not found"))?;
    if details.user_id != user.id {
        return Err(ApiError::forbidden("Access Forbidden"));
    }
    Ok(details)
}

/// PATCH /api/v1/user/dashboard/account-details/:id
pub async fn update_account_details(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AccountDetailsPatch>,
) -> ApiResult {
    req.validate().map_err(ApiError::validation)?;
    let mut details = owned_details(&state, &user, id).await?;
    req.apply(&mut details);
    state.banking.update_account_details(&details).await?;

    effects::notify(&state, user.id, "Your bank account details were updated").await;
    Ok(ApiResponse::ok(
        "Account details updated",
        json!({ "accountDetails": details }),
    ))
}

/// DELETE /api/v1/user/dashboard/account-details/:id
pub async fn delete_account_details(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult {
    let details = owned_details(&state, &user, id).await?;
    state.banking.delete_account_details(details.id).await?;

    effects::notify(&state, user.id, "Your bank account details were removed").await;
    Ok(ApiResponse::ok("Account details deleted", json!({})))
}

/// POST /api/v1/user/dashboard/payment-details
pub async fn create_payment_details(
    State(state): State<AppState>,
    InvestorUser(user): InvestorUser,
    ApiJson(req): ApiJson<CardInput>,
) -> ApiResult {
    let details = req
        .into_details(user.id, Utc::now())
        .map_err(ApiError::validation)?;
    state.banking.create_payment_details(&details).await?;

    effects::notify(&state, user.id, "A payment card was added to your account").await;
    Ok(ApiResponse::created(
        "Payment details saved",
        json!({ "paymentDetails": details }),
    ))
}

/// GET /api/v1/user/dashboard/payment-details/:userId
pub async fn payment_details(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(account_id): ApiPath<Uuid>,
) -> ApiResult {
    user.ensure_self_or_admin(account_id)?;
    let details = state.banking.payment_details_for(account_id).await?;
    Ok(ApiResponse::ok(
        "Payment details fetched",
        json!({ "paymentDetails": details }),
    ))
}

/// GET /api/v1/user/dashboard/transactions/stats
pub async fn transaction_statistics(State(state): State<AppState>, user: AuthUser) -> ApiResult {
    let amounts = state.ledger.transaction_amounts(user.id).await?;
    Ok(ApiResponse::ok(
        "Transaction stats fetched",
        transaction_stats(amounts),
    ))
}

/// GET /api/v1/user/dashboard/investment-stats
pub async fn investment_statistics(State(state): State<AppState>, user: AuthUser) -> ApiResult {
    let holdings = state.ledger.all_holdings_for(user.id).await?;
    let stats = investment_stats(
        holdings
            .iter()
            .map(|h| (&h.position, &h.investment_opportunity)),
    );
    Ok(ApiResponse::ok("Investment stats fetched", stats))
}
