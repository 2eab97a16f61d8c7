use axum::{extract::State, response::Redirect};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::effects::{self, outgoing};
use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::middleware::AuthUser;
use crate::api::response::{ApiResponse, ApiResult};
use crate::auth::password::{hash_password, verify_password};
use crate::domain::account::value_objects::validate_password;
use crate::domain::account::{Account, Email, NewAccount, PhoneNumber, Role, Username};
use crate::domain::banking::CheckoutInput;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::mail::templates;
use crate::state::AppState;

/// Request body for account signup
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

fn parse_token(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid token"))
}

/// Unique violations at signup are reported as 400, not 409
fn signup_conflict(err: RepositoryError) -> ApiError {
    match err {
        RepositoryError::Conflict(message) => ApiError::bad_request(message),
        other => other.into(),
    }
}

async fn send_verification(state: &AppState, account: &Account) -> Result<(), ApiError> {
    let token = state.verification_tokens.issue(&account.email).await?;
    let link = format!(
        "{}/api/v1/user/account/verify/{}",
        state.config.base_url, token
    );
    let mail = outgoing(
        state,
        vec![account.email.clone()],
        "Verify your email",
        templates::signup_verification(&account.username, &link),
    );
    state.mailer.send(mail).await?;
    Ok(())
}

/// Validates signup input and stores the account
async fn register(state: &AppState, req: SignupRequest, role: Role) -> Result<Account, ApiError> {
    let email = Email::new(&req.email).map_err(ApiError::validation)?;
    let username = Username::new(&req.username).map_err(ApiError::validation)?;
    validate_password(&req.password).map_err(ApiError::validation)?;
    let phone = match (role, req.phone_number.as_deref()) {
        (_, Some(phone)) => Some(PhoneNumber::new(phone).map_err(ApiError::validation)?),
        (Role::Investor, None) => return Err(ApiError::validation("phoneNumber is required")),
        (Role::Admin, None) => None,
    };

    if state.accounts.find_by_username(username.as_str()).await?.is_some() {
        return Err(ApiError::bad_request("Username already exists"));
    }
    if state.accounts.find_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request("Email already exists"));
    }

    let password_hash = hash_password(&req.password, state.config.bcrypt_cost)?;
    let account = state
        .accounts
        .create(NewAccount {
            email: email.into(),
            username: username.as_str().to_string(),
            password_hash,
            role,
            is_verified: role == Role::Admin,
            phone_number: phone.map(|p| p.as_str().to_string()),
        })
        .await
        .map_err(signup_conflict)?;

    tracing::info!(account_id = %account.id, role = %account.role, "account created");
    Ok(account)
}

/// Opens a session and issues an access/refresh pair
async fn issue_tokens(state: &AppState, account: &Account) -> ApiResult {
    let session_id = state.sessions.open(account.id).await?;
    let access_token = state.jwt.issue_access(account, session_id)?;
    let refresh_token = state.jwt.issue_refresh(account.id)?;

    Ok(ApiResponse::ok(
        "Login successful",
        json!({
            "user": account.view(),
            "accessToken": access_token,
            "refreshToken": refresh_token,
        }),
    ))
}

async fn authenticate(state: &AppState, req: &LoginRequest) -> Result<Account, ApiError> {
    let email = Email::new(&req.email).map_err(ApiError::validation)?;
    if req.password.is_empty() {
        return Err(ApiError::validation("password is required"));
    }

    let account = state
        .accounts
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    if !verify_password(&req.password, &account.password_hash)? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }
    if !account.is_verified {
        return Err(ApiError::unauthorized(
            "Account not verified, check your email for the verification link",
        ));
    }
    Ok(account)
}

/// Register an investor account
///
/// POST /api/v1/user/account/signup
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> ApiResult {
    let account = register(&state, req, Role::Investor).await?;

    if let Err(e) = send_verification(&state, &account).await {
        tracing::warn!(account_id = %account.id, error = %e.message, "verification email not sent");
    }

    Ok(ApiResponse::created(
        "Account created, check your email to verify your account",
        json!({ "user": account.view() }),
    ))
}

/// POST /api/v1/user/account/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult {
    let account = authenticate(&state, &req).await?;
    issue_tokens(&state, &account).await
}

/// POST /api/v1/user/account/resend-verification-link
pub async fn resend_verification_link(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<EmailRequest>,
) -> ApiResult {
    let email = Email::new(&req.email).map_err(ApiError::validation)?;
    let account = state
        .accounts
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;
    if account.is_verified {
        return Err(ApiError::bad_request("Account already verified"));
    }

    send_verification(&state, &account).await?;
    Ok(ApiResponse::ok("Verification link sent", json!({})))
}

/// Marks the account verified and sends the browser to the sign-in page
///
/// GET /api/v1/user/account/verify/:token
pub async fn verify_account(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> Result<Redirect, ApiError> {
    let token = parse_token(&token)?;
    let email = state
        .verification_tokens
        .consume(token)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired verification link"))?;
    let email = Email::new(email).map_err(ApiError::validation)?;

    let account = state
        .accounts
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;
    state.accounts.mark_verified(account.id).await?;
    tracing::info!(account_id = %account.id, "account verified");

    Ok(Redirect::to(&format!(
        "{}/signin?status=verified",
        state.config.web_url
    )))
}

/// POST /api/v1/user/account/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<EmailRequest>,
) -> ApiResult {
    let email = Email::new(&req.email).map_err(ApiError::validation)?;
    let account = state
        .accounts
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    let token = state.reset_tokens.issue(&account.email).await?;
    let link = format!(
        "{}/api/v1/user/account/reset-password-link/{}",
        state.config.base_url, token
    );
    let mail = outgoing(
        &state,
        vec![account.email.clone()],
        "Reset your password",
        templates::reset_password(&link),
    );
    state.mailer.send(mail).await?;

    Ok(ApiResponse::ok("Password reset link sent to your email", json!({})))
}

/// Trades the emailed link for a fresh token the web app can post back
///
/// GET /api/v1/user/account/reset-password-link/:token
pub async fn reset_password_link(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> Result<Redirect, ApiError> {
    let token = parse_token(&token)?;
    let email = state
        .reset_tokens
        .consume(token)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired reset link"))?;

    let fresh = state.reset_tokens.issue(&email).await?;
    let link = format!("{}/resetpassword/{}", state.config.web_url, fresh);
    let mail = outgoing(
        &state,
        vec![email],
        "Reset your password",
        templates::reset_password(&link),
    );
    effects::deliver(&state, mail).await;

    Ok(Redirect::to(&format!("{}/successreset", state.config.web_url)))
}

/// POST /api/v1/user/account/reset-password/:token
pub async fn reset_password(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> ApiResult {
    if req.password != req.confirm_password {
        return Err(ApiError::bad_request("Passwords do not match"));
    }
    validate_password(&req.password).map_err(ApiError::validation)?;
    let token = parse_token(&token)?;

    let email = state
        .reset_tokens
        .consume(token)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired reset link"))?;
    let email = Email::new(email).map_err(ApiError::validation)?;
    let account = state
        .accounts
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    let password_hash = hash_password(&req.password, state.config.bcrypt_cost)?;
    state.accounts.update_password(account.id, &password_hash).await?;
    tracing::info!(account_id = %account.id, "password reset");

    Ok(ApiResponse::created("Password reset successfully", json!({})))
}

/// POST /api/v1/user/account/checkout
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CheckoutInput>,
) -> ApiResult {
    let checkout = req.into_checkout(user.id).map_err(ApiError::validation)?;
    state.banking.create_checkout(&checkout).await?;
    Ok(ApiResponse::created("Checkout info saved", json!({ "checkout": checkout })))
}

async fn refresh(state: &AppState, req: RefreshRequest, admin_only: bool) -> ApiResult {
    let claims = state
        .jwt
        .verify_refresh(&req.token)
        .map_err(|e| ApiError::forbidden("Invalid refresh token").with_error(e.to_string()))?;
    let account = state
        .accounts
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;
    if admin_only && !account.is_admin() {
        return Err(ApiError::forbidden("Access Forbidden"));
    }
    issue_tokens(state, &account).await
}

/// POST /api/v1/user/account/refresh-token
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult {
    refresh(&state, req, false).await
}

/// GET /api/v1/{user,admin}/account/logout
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> ApiResult {
    state.sessions.close(user.session_id).await?;
    tracing::info!(account_id = %user.id, "logged out");
    Ok(ApiResponse::ok("Logged out successfully", json!({})))
}

/// Creates a verified admin; only routed when admin signup is enabled
///
/// POST /api/v1/admin/account/signup
pub async fn admin_signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> ApiResult {
    if !state.config.admin_signup_enabled {
        return Err(ApiError::not_found("Admin signup is disabled"));
    }
    let account = register(&state, req, Role::Admin).await?;
    Ok(ApiResponse::created(
        "Admin account created",
        json!({ "user": account.view() }),
    ))
}

/// POST /api/v1/admin/account/login
pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult {
    let account = authenticate(&state, &req).await?;
    if !account.is_admin() {
        return Err(ApiError::forbidden("Access Forbidden"));
    }
    issue_tokens(&state, &account).await
}

/// POST /api/v1/admin/account/refresh-token
pub async fn admin_refresh_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult {
    refresh(&state, req, true).await
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
