use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{
    account, admin_dashboard as admin, contact, dashboard, notifications, trading,
};
use crate::state::AppState;

fn user_account() -> Router<AppState> {
    Router::new()
        .route("/signup", post(account::signup))
        .route("/login", post(account::login))
        .route(
            "/resend-verification-link",
            post(account::resend_verification_link),
        )
        .route("/verify/:token", get(account::verify_account))
        .route("/forgot-password", post(account::forgot_password))
        .route(
            "/reset-password-link/:token",
            get(account::reset_password_link),
        )
        .route("/reset-password/:token", post(account::reset_password))
        .route("/checkout", post(account::checkout))
        .route("/refresh-token", post(account::refresh_token))
        .route("/logout", get(account::logout))
}

fn user_dashboard() -> Router<AppState> {
    Router::new()
        .route("/news", get(dashboard::news))
        .route("/opportunity", get(dashboard::opportunities))
        .route("/opportunity/titles", get(dashboard::opportunity_titles))
        .route("/opportunity/:id", get(dashboard::opportunity))
        .route("/buy", post(trading::buy))
        .route("/paystack/verify", get(trading::paystack_verify))
        .route("/flutterwave/verify", get(trading::flutterwave_verify))
        .route("/sell", post(trading::sell))
        .route("/checkout", get(dashboard::checkouts))
        .route("/:id/investment", get(dashboard::investments))
        .route("/password", patch(dashboard::change_password))
        .route("/user-info", patch(dashboard::update_user_info))
        .route("/transaction-history", get(dashboard::transaction_history))
        .route("/account-details", post(dashboard::create_account_details))
        .route(
            "/account-details/:id",
            get(dashboard::account_details)
                .patch(dashboard::update_account_details)
                .delete(dashboard::delete_account_details),
        )
        .route("/payment-details", post(dashboard::create_payment_details))
        .route("/payment-details/:id", get(dashboard::payment_details))
        .route("/transactions/stats", get(dashboard::transaction_statistics))
        .route("/investment-stats", get(dashboard::investment_statistics))
}

fn user_notifications() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::list))
        .route(
            "/:id",
            get(notifications::get).delete(notifications::delete),
        )
        .route("/:id/mark-as-read", patch(notifications::mark_as_read))
}

fn admin_account() -> Router<AppState> {
    Router::new()
        .route("/signup", post(account::admin_signup))
        .route("/login", post(account::admin_login))
        .route("/refresh-token", post(account::admin_refresh_token))
        .route("/logout", get(account::logout))
}

fn admin_dashboard() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::users))
        .route("/users/send-mail", post(admin::send_mail))
        .route("/users/:id", axum::routing::delete(admin::delete_user))
        .route("/transactions", get(admin::transactions))
        .route("/transaction/approve/sell", get(admin::sell_requests))
        .route("/transactions/approve", patch(admin::approve_sale))
        .route("/verify-payment", post(admin::verify_payment))
        .route("/buy", post(admin::buy_for_user))
        .route(
            "/investor-news",
            post(admin::create_news).get(admin::list_news),
        )
        .route("/investment-news/:id", get(admin::get_news))
        .route(
            "/investor-news/:id",
            patch(admin::update_news).delete(admin::delete_news),
        )
        .route(
            "/investor-opportunities",
            get(admin::list_opportunities).post(admin::create_opportunity),
        )
        .route(
            "/investor-opportunities/:id",
            get(admin::get_opportunity)
                .patch(admin::update_opportunity)
                .delete(admin::delete_opportunity),
        )
        .route("/account-details/:id", get(admin::account_details))
        .route("/payment-details/:id", get(admin::payment_details))
}

fn cors(origin: &str) -> CorsLayer {
    let allow_origin = match HeaderValue::from_str(origin) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            tracing::warn!(origin, "invalid CORS origin, allowing none");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Builds the full application router
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/user/account", user_account())
        .nest("/user/dashboard", user_dashboard())
        .nest("/user/notifications", user_notifications())
        .nest("/admin/account", admin_account())
        .nest("/admin/dashboard", admin_dashboard())
        .route("/contact-us", post(contact::contact_us));

    let cors = cors(&state.config.cors_origin);

    Router::new()
        .route("/health", get(account::health_check))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
