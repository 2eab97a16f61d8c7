//! End-to-end API integration tests
//!
//! These tests drive the full router with in-memory adapters, a recording
//! mailer and scripted payment gateways:
//! - Signup, email verification, login and logout
//! - Buying through a gateway checkout and confirming the payment
//! - Selling and admin approval
//! - Guards, pagination and best-effort side effects

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for oneshot
use uuid::Uuid;

use agrotrade_api::api::create_router;
use agrotrade_api::auth::password::hash_password;
use agrotrade_api::config::Config;
use agrotrade_api::domain::account::{NewAccount, Role};
use agrotrade_api::domain::catalog::NewOpportunity;
use agrotrade_api::domain::ledger::PaymentProvider;
use agrotrade_api::infrastructure::memory::{RecordingMailer, ScriptedGateway};
use agrotrade_api::state::{Adapters, AppState};

const PASSWORD: &str = "harvest-season-1";

struct TestApp {
    router: Router,
    state: AppState,
    mailer: Arc<RecordingMailer>,
    paystack: Arc<ScriptedGateway>,
    flutterwave: Arc<ScriptedGateway>,
}

/// Setup test application with in-memory adapters
fn setup_app() -> TestApp {
    setup_app_with_mailer(RecordingMailer::new())
}

fn setup_app_with_mailer(mailer: RecordingMailer) -> TestApp {
    let mailer = Arc::new(mailer);
    let paystack = Arc::new(ScriptedGateway::new(PaymentProvider::Paystack));
    let flutterwave = Arc::new(ScriptedGateway::new(PaymentProvider::Flutterwave));
    let adapters = Adapters {
        mailer: mailer.clone(),
        paystack: paystack.clone(),
        flutterwave: flutterwave.clone(),
        ..Adapters::in_memory()
    };
    let state = AppState::new(Config::development(), adapters);
    TestApp {
        router: create_router(state.clone()),
        state,
        mailer,
        paystack,
        flutterwave,
    }
}

impl TestApp {
    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.raw(method, uri, token, body).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn create_account(&self, email: &str, username: &str, role: Role) -> Uuid {
        let account = self
            .state
            .accounts
            .create(NewAccount {
                email: email.to_string(),
                username: username.to_string(),
                password_hash: hash_password(PASSWORD, 4).unwrap(),
                role,
                is_verified: true,
                phone_number: Some("08012345678".to_string()),
            })
            .await
            .unwrap();
        account.id
    }

    async fn login(&self, path: &str, email: &str) -> String {
        let (status, json) = self
            .request(
                "POST",
                path,
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", json);
        json["data"]["accessToken"].as_str().unwrap().to_string()
    }

    async fn investor(&self, email: &str, username: &str) -> (Uuid, String) {
        let id = self.create_account(email, username, Role::Investor).await;
        let token = self.login("/api/v1/user/account/login", email).await;
        (id, token)
    }

    async fn admin(&self) -> (Uuid, String) {
        let id = self
            .create_account("admin@nagaing.com", "chief", Role::Admin)
            .await;
        let token = self
            .login("/api/v1/admin/account/login", "admin@nagaing.com")
            .await;
        (id, token)
    }

    async fn opportunity(&self, title: &str, amount: i64) -> Uuid {
        let opportunity = NewOpportunity {
            title: title.to_string(),
            amount: Decimal::from(amount),
            image: "https://cdn.nagaing.com/maize.png".to_string(),
            growth_rate: Some(Decimal::new(15, 2)),
        }
        .into_opportunity();
        self.state.opportunities.create(&opportunity).await.unwrap();
        opportunity.id
    }

    async fn checkout(&self, token: &str) -> String {
        let (status, json) = self
            .request(
                "POST",
                "/api/v1/user/account/checkout",
                Some(token),
                Some(json!({
                    "name": "Ada Obi",
                    "phoneNumber": "08012345678",
                    "email": "ada.checkout@example.com",
                    "address": "12 Farm Road, Kaduna",
                    "acceptTerms": true
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "checkout failed: {}", json);
        json["data"]["checkout"]["id"].as_str().unwrap().to_string()
    }

    /// Starts a paystack checkout; returns (reference, position id)
    async fn buy(&self, token: &str, opportunity_id: Uuid, quantity: i32) -> (String, String) {
        self.buy_with(token, opportunity_id, quantity, "paystack").await
    }

    /// Starts a checkout at the listed price through `method`
    async fn buy_with(
        &self,
        token: &str,
        opportunity_id: Uuid,
        quantity: i32,
        method: &str,
    ) -> (String, String) {
        let unit_price = self
            .state
            .opportunities
            .find_by_id(opportunity_id)
            .await
            .unwrap()
            .expect("opportunity exists")
            .amount;
        let (status, json) = self
            .request(
                "POST",
                "/api/v1/user/dashboard/buy",
                Some(token),
                Some(json!({
                    "investmentOpportunityId": opportunity_id,
                    "quantity": quantity,
                    "email": "ada@example.com",
                    "amount": unit_price * Decimal::from(quantity),
                    "currency": "NGN",
                    "paymentMethod": method
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "buy failed: {}", json);
        (
            json["data"]["transactionResult"]["reference"]
                .as_str()
                .unwrap()
                .to_string(),
            json["data"]["products"]["id"].as_str().unwrap().to_string(),
        )
    }

    async fn confirm(&self, token: &str, reference: &str, position: &str, checkout: &str) -> (StatusCode, Value) {
        let uri = format!(
            "/api/v1/user/dashboard/paystack/verify?reference={}&userInvestmentId={}&checkoutId={}",
            reference, position, checkout
        );
        self.request("GET", &uri, Some(token), None).await
    }
}

/// Pulls the token out of the last emailed `.../{marker}/{uuid}` link
fn token_from_mail(mailer: &RecordingMailer, recipient: &str, marker: &str) -> String {
    let mail = mailer.sent_to(recipient).pop().expect("mail was sent");
    let start = mail.html.rfind(marker).expect("link present") + marker.len();
    mail.html[start..start + 36].to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_app();

    let response = app.raw("GET", "/health", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_signup_verify_and_login_flow() {
    let app = setup_app();
    let signup = json!({
        "email": "farmer@example.com",
        "username": "farmer",
        "password": PASSWORD,
        "phoneNumber": "08012345678"
    });

    // Step 1: Sign up
    let (status, json) = app
        .request("POST", "/api/v1/user/account/signup", None, Some(signup.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "success");
    assert!(json["data"]["user"].get("passwordHash").is_none());

    // Step 2: Unverified accounts cannot log in
    let login = json!({ "email": "farmer@example.com", "password": PASSWORD });
    let (status, _) = app
        .request("POST", "/api/v1/user/account/login", None, Some(login.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Step 3: Follow the emailed link
    let token = token_from_mail(&app.mailer, "farmer@example.com", "/verify/");
    let uri = format!("/api/v1/user/account/verify/{}", token);
    let response = app.raw("GET", &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "http://localhost:3000/signin?status=verified"
    );

    // The link works once
    let (status, _) = app.request("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Step 4: Log in
    let (status, json) = app
        .request("POST", "/api/v1/user/account/login", None, Some(login))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["accessToken"].is_string());
    assert!(json["data"]["refreshToken"].is_string());
    assert_eq!(json["data"]["user"]["role"], "INVESTOR");

    // Duplicate signup is rejected
    let (status, json) = app
        .request("POST", "/api/v1/user/account/signup", None, Some(signup))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "failure");
}

#[tokio::test]
async fn test_login_errors() {
    let app = setup_app();
    app.create_account("known@example.com", "known", Role::Investor)
        .await;

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/user/account/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/user/account/login",
            None,
            Some(json!({ "email": "known@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = app
        .request("POST", "/api/v1/user/account/login", None, Some(json!({ "email": 42 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "validation error");
}

#[tokio::test]
async fn test_guards_reject_missing_and_malformed_tokens() {
    let app = setup_app();

    let (status, json) = app
        .request("GET", "/api/v1/user/notifications", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "No access token found");

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/user/notifications")
                .header(header::AUTHORIZATION, "Token abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request("GET", "/api/v1/user/notifications", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_access_token() {
    let app = setup_app();
    let (_, token) = app.investor("leaver@example.com", "leaver").await;

    let (status, _) = app
        .request("GET", "/api/v1/user/notifications", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request("GET", "/api/v1/user/account/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request("GET", "/api/v1/user/notifications", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_issues_new_pair() {
    let app = setup_app();
    app.create_account("refresh@example.com", "refresher", Role::Investor)
        .await;
    let (_, json) = app
        .request(
            "POST",
            "/api/v1/user/account/login",
            None,
            Some(json!({ "email": "refresh@example.com", "password": PASSWORD })),
        )
        .await;
    let refresh = json["data"]["refreshToken"].as_str().unwrap().to_string();
    let access = json["data"]["accessToken"].as_str().unwrap().to_string();

    let (status, json) = app
        .request(
            "POST",
            "/api/v1/user/account/refresh-token",
            None,
            Some(json!({ "token": refresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["accessToken"].is_string());

    // An access token is not a refresh token
    let (status, _) = app
        .request(
            "POST",
            "/api/v1/user/account/refresh-token",
            None,
            Some(json!({ "token": access })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_buy_and_confirm_with_paystack() {
    let app = setup_app();
    let (user_id, token) = app.investor("ada@example.com", "ada").await;
    let opportunity = app.opportunity("Maize", 1500).await;
    let checkout = app.checkout(&token).await;

    let (reference, position) = app.buy(&token, opportunity, 10).await;

    let (status, json) = app.confirm(&token, &reference, &position, &checkout).await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["message"], "Payment confirmed");
    assert_eq!(json["data"]["position"]["quantity"], 10);
    assert_eq!(json["data"]["position"]["status"], "completed");
    assert_eq!(json["data"]["transaction"]["status"], "Invested");

    // Buyer and insurers are emailed
    assert!(!app.mailer.sent_to("ada.checkout@example.com").is_empty());
    assert!(!app.mailer.sent_to("insurer@example.com").is_empty());

    // A reference is applied once
    let (status, json) = app.confirm(&token, &reference, &position, &checkout).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Already verified");

    let (status, json) = app
        .request(
            "GET",
            &format!("/api/v1/user/dashboard/{}/investment", user_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["investments"][0]["quantity"], 10);
    assert_eq!(json["data"]["investments"][0]["investmentOpportunity"]["title"], "Maize");
}

#[tokio::test]
async fn test_buy_requires_minimum_quantity_and_known_method() {
    let app = setup_app();
    let (_, token) = app.investor("small@example.com", "smallbuyer").await;
    let opportunity = app.opportunity("Rice", 2000).await;

    let mut body = json!({
        "investmentOpportunityId": opportunity,
        "quantity": 5,
        "email": "small@example.com",
        "amount": 10000,
        "currency": "NGN",
        "paymentMethod": "paystack"
    });
    let (status, _) = app
        .request("POST", "/api/v1/user/dashboard/buy", Some(&token), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    body["quantity"] = json!(10);
    body["paymentMethod"] = json!("cash");
    let (status, json) = app
        .request("POST", "/api/v1/user/dashboard/buy", Some(&token), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid payment method");

    body["paymentMethod"] = json!("paystack");
    body["investmentOpportunityId"] = json!(Uuid::new_v4());
    let (status, _) = app
        .request("POST", "/api/v1/user/dashboard/buy", Some(&token), Some(body))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_payment_removes_unpaid_position() {
    let app = setup_app();
    let (_, token) = app.investor("unlucky@example.com", "unlucky").await;
    let opportunity = app.opportunity("Soybean", 1800).await;
    let checkout = app.checkout(&token).await;

    let (reference, position) = app.buy(&token, opportunity, 10).await;
    app.paystack.fail_reference(&reference);

    let (status, json) = app.confirm(&token, &reference, &position, &checkout).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Payment was unsuccessful");

    let position_id = Uuid::parse_str(&position).unwrap();
    assert!(app.state.ledger.find_position(position_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_other_users_cannot_confirm_a_position() {
    let app = setup_app();
    let (_, owner) = app.investor("owner@example.com", "owner").await;
    let (_, intruder) = app.investor("intruder@example.com", "intruder").await;
    let opportunity = app.opportunity("Sorghum", 1200).await;
    let checkout = app.checkout(&intruder).await;

    let (reference, position) = app.buy(&owner, opportunity, 10).await;

    let (status, _) = app.confirm(&intruder, &reference, &position, &checkout).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sell_and_admin_approval() {
    let app = setup_app();
    let (user_id, token) = app.investor("seller@example.com", "seller").await;
    let (_, admin) = app.admin().await;
    let opportunity = app.opportunity("Cassava", 1000).await;

    // Admin credits the investor directly
    let (status, json) = app
        .request(
            "POST",
            "/api/v1/admin/dashboard/buy",
            Some(&admin),
            Some(json!({
                "userId": user_id,
                "investmentOpportunityId": opportunity,
                "quantity": 20,
                "amount": 20000
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["data"]["position"]["quantity"], 20);

    // Cannot sell more than is held
    let sell = |quantity: i32| {
        json!({
            "investmentOpportunityId": opportunity,
            "quantity": quantity,
            "phoneNumber": "08012345678"
        })
    };
    let (status, _) = app
        .request("POST", "/api/v1/user/dashboard/sell", Some(&token), Some(sell(21)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .request("POST", "/api/v1/user/dashboard/sell", Some(&token), Some(sell(15)))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    let sell_request = json["data"]["waitingForApproval"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(json["data"]["transaction"]["status"], "Sell Approval Pending");

    // Reserved units cannot be sold twice
    let (status, _) = app
        .request("POST", "/api/v1/user/dashboard/sell", Some(&token), Some(sell(6)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Staff are told about the request
    assert!(!app.mailer.sent_to("admin@nagaing.com").is_empty());

    let (status, json) = app
        .request(
            "GET",
            "/api/v1/admin/dashboard/transaction/approve/sell",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["sellRequests"][0]["status"], "Pending");

    let approve = json!({ "sellRequestId": sell_request });
    let (status, json) = app
        .request(
            "PATCH",
            "/api/v1/admin/dashboard/transactions/approve",
            Some(&admin),
            Some(approve.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["data"]["positionClosed"], false);

    let (status, _) = app
        .request(
            "PATCH",
            "/api/v1/admin/dashboard/transactions/approve",
            Some(&admin),
            Some(approve),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, json) = app
        .request(
            "GET",
            &format!("/api/v1/user/dashboard/{}/investment", user_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(json["data"]["investments"][0]["quantity"], 5);
    assert_eq!(json["data"]["investments"][0]["sellRequestQuantity"], 0);
}

#[tokio::test]
async fn test_investor_cannot_use_admin_routes() {
    let app = setup_app();
    let (_, token) = app.investor("curious@example.com", "curious").await;

    let (status, json) = app
        .request("GET", "/api/v1/admin/dashboard/users", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Access Forbidden");

    // Admin login refuses investors
    let (status, _) = app
        .request(
            "POST",
            "/api/v1/admin/account/login",
            None,
            Some(json!({ "email": "curious@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_users_cannot_read_each_others_records() {
    let app = setup_app();
    let (_, token) = app.investor("first@example.com", "first").await;
    let (other, _) = app.investor("second@example.com", "second").await;

    let (status, _) = app
        .request(
            "GET",
            &format!("/api/v1/user/dashboard/account-details/{}", other),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            "GET",
            "/api/v1/user/dashboard/account-details/not-a-uuid",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_notifications_lifecycle() {
    let app = setup_app();
    let (_, token) = app.investor("notified@example.com", "notified").await;
    let (_, stranger) = app.investor("stranger@example.com", "stranger").await;
    let opportunity = app.opportunity("Millet", 900).await;
    app.buy(&token, opportunity, 10).await;

    let (status, json) = app
        .request("GET", "/api/v1/user/notifications", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let notification = json["data"]["notifications"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(json["data"]["notifications"][0]["read"], false);

    let uri = format!("/api/v1/user/notifications/{}", notification);
    let (status, _) = app.request("GET", &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = app
        .request("PATCH", &format!("{}/mark-as-read", uri), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["notification"]["read"], true);

    let (status, _) = app.request("DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_opportunities_are_paginated() {
    let app = setup_app();
    for title in ["Maize", "Beans", "Yam"] {
        app.opportunity(title, 1000).await;
    }

    let (status, json) = app
        .request("GET", "/api/v1/user/dashboard/opportunity?page=1&limit=2", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["opportunities"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["totalPage"], 2);
    assert_eq!(json["data"]["hasNextPage"], true);
    assert_eq!(json["data"]["hasPrevPage"], false);

    let (status, _) = app
        .request("GET", "/api/v1/user/dashboard/opportunity?limit=0", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_account_details_are_unique_and_investor_only() {
    let app = setup_app();
    let (_, token) = app.investor("payee@example.com", "payee").await;
    let (_, admin) = app.admin().await;
    let details = json!({
        "bankName": "First Bank",
        "accountNumber": "0123456789",
        "accountHolderName": "Ada Obi"
    });

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/user/dashboard/account-details",
            Some(&token),
            Some(details.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/user/dashboard/account-details",
            Some(&token),
            Some(details.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/user/dashboard/account-details",
            Some(&admin),
            Some(details),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_card_details_keep_only_last_four_digits() {
    let app = setup_app();
    let (user_id, token) = app.investor("card@example.com", "cardholder").await;

    let (status, json) = app
        .request(
            "POST",
            "/api/v1/user/dashboard/payment-details",
            Some(&token),
            Some(json!({
                "cardHolderName": "Ada Obi",
                "cardNumber": "4084084084084081",
                "expiryMonth": 12,
                "expiryYear": 2099,
                "cvv": 408
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", json);

    let (_, json) = app
        .request(
            "GET",
            &format!("/api/v1/user/dashboard/payment-details/{}", user_id),
            Some(&token),
            None,
        )
        .await;
    let text = json.to_string();
    assert!(text.contains("4081"));
    assert!(!text.contains("4084084084084081"));
    assert!(!text.contains("cvv"));
}

#[tokio::test]
async fn test_transaction_stats_group_admin_purchase() {
    let app = setup_app();
    let (user_id, token) = app.investor("stats@example.com", "stats").await;
    let (_, admin) = app.admin().await;
    let opportunity = app.opportunity("Groundnut", 500).await;

    app.request(
        "POST",
        "/api/v1/admin/dashboard/buy",
        Some(&admin),
        Some(json!({
            "userId": user_id,
            "investmentOpportunityId": opportunity,
            "quantity": 4,
            "amount": 2000
        })),
    )
    .await;

    let (status, json) = app
        .request("GET", "/api/v1/user/dashboard/transactions/stats", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    assert_eq!(json["data"]["daily"][today.as_str()], "2000");

    let (status, json) = app
        .request("GET", "/api/v1/user/dashboard/investment-stats", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["totalInvestment"], 1);
    assert_eq!(json["data"]["activeInvestment"], 1);
}

#[tokio::test]
async fn test_forgot_password_reports_mail_failure() {
    let app = setup_app_with_mailer(RecordingMailer::failing());
    app.create_account("forgetful@example.com", "forgetful", Role::Investor)
        .await;

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/user/account/forgot-password",
            None,
            Some(json!({ "email": "forgetful@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = setup_app();
    app.create_account("reset@example.com", "resetter", Role::Investor)
        .await;

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/user/account/forgot-password",
            None,
            Some(json!({ "email": "reset@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let first = token_from_mail(&app.mailer, "reset@example.com", "/reset-password-link/");
    let response = app
        .raw(
            "GET",
            &format!("/api/v1/user/account/reset-password-link/{}", first),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let second = token_from_mail(&app.mailer, "reset@example.com", "/resetpassword/");
    let uri = format!("/api/v1/user/account/reset-password/{}", second);
    let (status, _) = app
        .request(
            "POST",
            &uri,
            None,
            Some(json!({ "password": "new-password-1", "confirmPassword": "different-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            "POST",
            &uri,
            None,
            Some(json!({ "password": "new-password-1", "confirmPassword": "new-password-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/user/account/login",
            None,
            Some(json!({ "email": "reset@example.com", "password": "new-password-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_contact_us_forwards_to_info_mailbox() {
    let app = setup_app();

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/contact-us",
            None,
            Some(json!({
                "fullname": "Ada Obi",
                "email": "ada@example.com",
                "phoneNumber": "08012345678",
                "message": "I would like to invest in maize"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let mail = app.mailer.sent_to("info@nagaing.com").pop().unwrap();
    assert_eq!(mail.reply_to.as_deref(), Some("ada@example.com"));
    assert!(mail.html.contains("I would like to invest in maize"));
}

#[tokio::test]
async fn test_buy_rejects_amount_that_differs_from_listed_price() {
    let app = setup_app();
    let (user_id, token) = app.investor("bargain@example.com", "bargain").await;
    let opportunity = app.opportunity("Maize", 1500).await;

    let mut body = json!({
        "investmentOpportunityId": opportunity,
        "quantity": 1000,
        "email": "bargain@example.com",
        "amount": 1,
        "currency": "NGN",
        "paymentMethod": "paystack"
    });
    let (status, json) = app
        .request("POST", "/api/v1/user/dashboard/buy", Some(&token), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Amount does not match the price of 1000 units (1500000)");

    // Only naira checkouts are offered
    body["amount"] = json!(1_500_000);
    body["currency"] = json!("USD");
    let (status, _) = app
        .request("POST", "/api/v1/user/dashboard/buy", Some(&token), Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No position was opened for either attempt
    let (_, json) = app
        .request(
            "GET",
            &format!("/api/v1/user/dashboard/{}/investment", user_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(json["data"]["investments"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_short_payment_is_not_credited() {
    let app = setup_app();
    let (_, token) = app.investor("shortpay@example.com", "shortpay").await;
    let opportunity = app.opportunity("Maize", 1500).await;
    let checkout = app.checkout(&token).await;

    let (reference, position) = app.buy(&token, opportunity, 10).await;
    app.paystack.settle_amount(&reference, Decimal::from(1500));

    let (status, json) = app.confirm(&token, &reference, &position, &checkout).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Amount paid does not cover 10 units");

    let position_id = Uuid::parse_str(&position).unwrap();
    let stored = app
        .state
        .ledger
        .find_position(position_id)
        .await
        .unwrap()
        .expect("position kept for follow-up");
    assert_eq!(stored.quantity(), 0);
}

#[tokio::test]
async fn test_buy_and_confirm_with_flutterwave() {
    let app = setup_app();
    let (_, token) = app.investor("wave@example.com", "wave").await;
    let opportunity = app.opportunity("Sesame", 1200).await;
    let checkout = app.checkout(&token).await;

    let (reference, position) = app.buy_with(&token, opportunity, 12, "flutterwave").await;

    let uri = format!(
        "/api/v1/user/dashboard/flutterwave/verify?status=successful&tx_ref={}&transaction_id=4471&userInvestmentId={}&checkoutId={}",
        reference, position, checkout
    );
    let (status, json) = app.request("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["data"]["position"]["quantity"], 12);
    assert_eq!(json["data"]["transaction"]["status"], "Invested");
    assert!(!app.mailer.sent_to("ada.checkout@example.com").is_empty());
}

#[tokio::test]
async fn test_flutterwave_unsuccessful_redirect_removes_unpaid_position() {
    let app = setup_app();
    let (_, token) = app.investor("cancelled@example.com", "cancelled").await;
    let opportunity = app.opportunity("Sesame", 1200).await;
    let checkout = app.checkout(&token).await;

    // The customer closed the checkout page
    let (reference, position) = app.buy_with(&token, opportunity, 10, "flutterwave").await;
    let uri = format!(
        "/api/v1/user/dashboard/flutterwave/verify?status=cancelled&tx_ref={}&userInvestmentId={}&checkoutId={}",
        reference, position, checkout
    );
    let (status, json) = app.request("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Payment was unsuccessful");
    let position_id = Uuid::parse_str(&position).unwrap();
    assert!(app.state.ledger.find_position(position_id).await.unwrap().is_none());

    // The redirect claims success but the gateway disagrees
    let (reference, position) = app.buy_with(&token, opportunity, 10, "flutterwave").await;
    app.flutterwave.fail_reference(&reference);
    let uri = format!(
        "/api/v1/user/dashboard/flutterwave/verify?status=successful&tx_ref={}&transaction_id=4472&userInvestmentId={}&checkoutId={}",
        reference, position, checkout
    );
    let (status, _) = app.request("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let position_id = Uuid::parse_str(&position).unwrap();
    assert!(app.state.ledger.find_position(position_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_admin_verify_payment_credits_pending_position() {
    let app = setup_app();
    let (_, token) = app.investor("manual@example.com", "manual").await;
    let (_, admin) = app.admin().await;
    let opportunity = app.opportunity("Cowpea", 700).await;

    let (_, position) = app.buy(&token, opportunity, 10).await;

    let (status, json) = app
        .request(
            "POST",
            "/api/v1/admin/dashboard/verify-payment",
            Some(&admin),
            Some(json!({ "userInvestmentId": position, "quantity": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["data"]["position"]["quantity"], 10);
    assert_eq!(json["data"]["position"]["status"], "completed");

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/admin/dashboard/verify-payment",
            Some(&admin),
            Some(json!({ "userInvestmentId": Uuid::new_v4(), "quantity": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_change_password_requires_current_password() {
    let app = setup_app();
    let (_, token) = app.investor("rotate@example.com", "rotate").await;

    let (status, json) = app
        .request(
            "PATCH",
            "/api/v1/user/dashboard/password",
            Some(&token),
            Some(json!({ "currentPassword": "not-my-password", "newPassword": "fresh-harvest-2" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Current password is incorrect");

    let (status, _) = app
        .request(
            "PATCH",
            "/api/v1/user/dashboard/password",
            Some(&token),
            Some(json!({ "currentPassword": PASSWORD, "newPassword": "fresh-harvest-2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/user/account/login",
            None,
            Some(json!({ "email": "rotate@example.com", "password": "fresh-harvest-2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_user_info_rejects_taken_username() {
    let app = setup_app();
    let (_, token) = app.investor("renamer@example.com", "renamer").await;
    app.create_account("holder@example.com", "holder", Role::Investor)
        .await;

    let (status, json) = app
        .request(
            "PATCH",
            "/api/v1/user/dashboard/user-info",
            Some(&token),
            Some(json!({ "username": "holder" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["status"], "failure");

    let (status, json) = app
        .request(
            "PATCH",
            "/api/v1/user/dashboard/user-info",
            Some(&token),
            Some(json!({ "username": "grower", "fullname": "Ada Obi" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["data"]["user"]["username"], "grower");
}

#[tokio::test]
async fn test_admin_send_mail_validates_and_delivers() {
    let app = setup_app();
    let (_, admin) = app.admin().await;
    let send = |emails: Value, subject: &str, content: &str| {
        json!({ "emails": emails, "subject": subject, "content": content })
    };

    let invalid = [
        send(json!([]), "Harvest update", "Yields are up this season"),
        send(json!(["not-an-email"]), "Harvest update", "Yields are up this season"),
        send(json!(["ada@example.com"]), "Hi", "Yields are up this season"),
        send(json!(["ada@example.com"]), "Harvest update", "Short"),
    ];
    for body in invalid {
        let (status, json) = app
            .request("POST", "/api/v1/admin/dashboard/users/send-mail", Some(&admin), Some(body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", json);
        assert_eq!(json["message"], "validation error");
    }

    let (status, json) = app
        .request(
            "POST",
            "/api/v1/admin/dashboard/users/send-mail",
            Some(&admin),
            Some(send(
                json!(["ada@example.com", "obi@example.com"]),
                "Harvest update",
                "Yields are up this season",
            )),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["data"]["sent"].as_array().unwrap().len(), 2);
    assert_eq!(app.mailer.sent_to("ada@example.com").len(), 1);
    assert_eq!(app.mailer.sent_to("obi@example.com").len(), 1);
}

#[tokio::test]
async fn test_admin_send_mail_fails_when_no_message_is_delivered() {
    let app = setup_app_with_mailer(RecordingMailer::failing());
    let (_, admin) = app.admin().await;

    let (status, json) = app
        .request(
            "POST",
            "/api/v1/admin/dashboard/users/send-mail",
            Some(&admin),
            Some(json!({
                "emails": ["ada@example.com"],
                "subject": "Harvest update",
                "content": "Yields are up this season"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["message"], "Email could not be sent");
}

#[tokio::test]
async fn test_admin_delete_user() {
    let app = setup_app();
    let (admin_id, admin) = app.admin().await;
    let victim = app
        .create_account("gone@example.com", "gone", Role::Investor)
        .await;

    let (status, json) = app
        .request(
            "DELETE",
            &format!("/api/v1/admin/dashboard/users/{}", admin_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "You cannot delete your own account");

    let uri = format!("/api/v1/admin/dashboard/users/{}", victim);
    let (status, _) = app.request("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.state.accounts.find_by_id(victim).await.unwrap().is_none());

    let (status, _) = app.request("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resend_verification_link() {
    let app = setup_app();
    app.create_account("verified@example.com", "verified", Role::Investor)
        .await;
    let resend = |email: &str| json!({ "email": email });

    let (status, json) = app
        .request(
            "POST",
            "/api/v1/user/account/resend-verification-link",
            None,
            Some(resend("verified@example.com")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Account already verified");

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/user/account/resend-verification-link",
            None,
            Some(resend("nobody@example.com")),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.request(
        "POST",
        "/api/v1/user/account/signup",
        None,
        Some(json!({
            "email": "pending@example.com",
            "username": "pending",
            "password": PASSWORD,
            "phoneNumber": "08012345678"
        })),
    )
    .await;
    let (status, _) = app
        .request(
            "POST",
            "/api/v1/user/account/resend-verification-link",
            None,
            Some(resend("pending@example.com")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.mailer.sent_to("pending@example.com").len(), 2);
}
