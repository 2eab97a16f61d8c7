//! Integration tests for repository layer
//!
//! These tests verify that the PostgreSQL adapters honour the same ledger
//! rules as the in-memory ones: unique accounts, one-shot payment receipts,
//! reservations and sale settlement.
//!
//! Run with `DATABASE_URL` pointing at a scratch database:
//! `cargo test --test repository_integration -- --ignored`

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use agrotrade_api::domain::account::{Email, NewAccount, Role};
use agrotrade_api::domain::catalog::NewOpportunity;
use agrotrade_api::domain::ledger::{
    PaymentReceipt, SaleRequest, SellRequestStatus, Settlement, TransactionStatus,
};
use agrotrade_api::domain::notification::Notification;
use agrotrade_api::domain::pagination::Pagination;
use agrotrade_api::domain::repositories::{
    AccountRepository, LedgerRepository, NotificationRepository, OpportunityRepository, Purchase,
    RepositoryError,
};
use agrotrade_api::infrastructure::repositories::{
    PostgresAccountRepository, PostgresLedgerRepository, PostgresNotificationRepository,
    PostgresOpportunityRepository,
};

/// Set up test database connection pool and apply migrations
async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Create a verified investor with a unique email
async fn create_test_account(pool: &PgPool) -> Uuid {
    let tag = Uuid::new_v4().simple().to_string();
    PostgresAccountRepository::new(pool.clone())
        .create(NewAccount {
            email: format!("repo-{}@example.com", &tag[..12]),
            username: format!("repo-{}", &tag[..12]),
            password_hash: "not-a-real-hash".to_string(),
            role: Role::Investor,
            is_verified: true,
            phone_number: Some("08012345678".to_string()),
        })
        .await
        .expect("Failed to create test account")
        .id
}

async fn create_test_opportunity(pool: &PgPool, amount: i64) -> Uuid {
    let opportunity = NewOpportunity {
        title: "Test Maize".to_string(),
        amount: Decimal::from(amount),
        image: "https://cdn.example.com/maize.png".to_string(),
        growth_rate: None,
    }
    .into_opportunity();
    PostgresOpportunityRepository::new(pool.clone())
        .create(&opportunity)
        .await
        .expect("Failed to create test opportunity");
    opportunity.id
}

/// Clean up test data; positions and transactions cascade
async fn cleanup(pool: &PgPool, account_id: Uuid, opportunity_id: Option<Uuid>) {
    sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(account_id)
        .execute(pool)
        .await
        .expect("Failed to cleanup account");
    if let Some(id) = opportunity_id {
        sqlx::query("DELETE FROM investment_opportunities WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .expect("Failed to cleanup opportunity");
    }
}

fn sale(account_id: Uuid, opportunity_id: Uuid, quantity: i32) -> SaleRequest {
    SaleRequest {
        account_id,
        opportunity_id,
        quantity,
        amount: Decimal::from(100 * quantity),
        seller: "repo-seller".to_string(),
        email: "repo-seller@example.com".to_string(),
        phone_number: "08012345678".to_string(),
        product: "Test Maize".to_string(),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_account_repository_create_and_find_by_email() {
    let pool = setup_test_db().await;
    let repo = PostgresAccountRepository::new(pool.clone());
    let account_id = create_test_account(&pool).await;

    let account = repo
        .find_by_id(account_id)
        .await
        .expect("Failed to find account")
        .expect("Account should exist");
    let email = Email::new(&account.email).expect("valid email");

    let found = repo
        .find_by_email(&email)
        .await
        .expect("Failed to find account by email")
        .expect("Account should be found");
    assert_eq!(found.id, account_id);
    assert_eq!(found.role, Role::Investor);
    assert_eq!(found.profile.phone_number.as_deref(), Some("08012345678"));

    cleanup(&pool, account_id, None).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_account_repository_duplicate_email_is_conflict() {
    let pool = setup_test_db().await;
    let repo = PostgresAccountRepository::new(pool.clone());
    let account_id = create_test_account(&pool).await;
    let existing = repo.find_by_id(account_id).await.unwrap().unwrap();

    let result = repo
        .create(NewAccount {
            email: existing.email.clone(),
            username: format!("{}-2", existing.username),
            password_hash: "not-a-real-hash".to_string(),
            role: Role::Investor,
            is_verified: false,
            phone_number: None,
        })
        .await;

    match result {
        Err(RepositoryError::Conflict(message)) => assert_eq!(message, "Email already exists"),
        other => panic!("expected conflict, got {:?}", other.map(|a| a.id)),
    }

    cleanup(&pool, account_id, None).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_ledger_receipt_is_applied_once() {
    let pool = setup_test_db().await;
    let ledger = PostgresLedgerRepository::new(pool.clone());
    let account_id = create_test_account(&pool).await;
    let opportunity_id = create_test_opportunity(&pool, 1500).await;

    let (position, opened) = ledger
        .open_position(account_id, opportunity_id)
        .await
        .expect("Failed to open position");
    assert!(opened.is_some());

    let reference = Uuid::new_v4().to_string();
    let purchase = || Purchase {
        quantity: 10,
        amount: Decimal::from(15000),
        receipt: Some(PaymentReceipt::new("paystack", &reference)),
    };

    let credited = ledger
        .confirm_purchase(position.id(), purchase())
        .await
        .expect("Failed to confirm purchase");
    assert_eq!(credited.position.quantity(), 10);
    assert!(credited.transaction.is_some());

    let again = ledger.confirm_purchase(position.id(), purchase()).await;
    assert!(matches!(again, Err(RepositoryError::AlreadyProcessed)));

    let stored = ledger
        .find_position(position.id())
        .await
        .unwrap()
        .expect("Position should exist");
    assert_eq!(stored.quantity(), 10);

    cleanup(&pool, account_id, Some(opportunity_id)).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_ledger_abandons_only_unpaid_checkouts() {
    let pool = setup_test_db().await;
    let ledger = PostgresLedgerRepository::new(pool.clone());
    let account_id = create_test_account(&pool).await;
    let opportunity_id = create_test_opportunity(&pool, 1500).await;

    let (position, _) = ledger.open_position(account_id, opportunity_id).await.unwrap();
    assert!(ledger.abandon_checkout(position.id()).await.unwrap());
    assert!(ledger.find_position(position.id()).await.unwrap().is_none());

    let credited = ledger
        .credit_account(
            account_id,
            opportunity_id,
            Purchase {
                quantity: 3,
                amount: Decimal::from(4500),
                receipt: None,
            },
        )
        .await
        .unwrap();
    assert!(!ledger.abandon_checkout(credited.position.id()).await.unwrap());

    cleanup(&pool, account_id, Some(opportunity_id)).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_ledger_sale_lifecycle() {
    let pool = setup_test_db().await;
    let ledger = PostgresLedgerRepository::new(pool.clone());
    let account_id = create_test_account(&pool).await;
    let opportunity_id = create_test_opportunity(&pool, 100).await;

    ledger
        .credit_account(
            account_id,
            opportunity_id,
            Purchase {
                quantity: 10,
                amount: Decimal::from(1000),
                receipt: None,
            },
        )
        .await
        .unwrap();

    // Reserve part, then try to oversell the remainder
    let first = ledger
        .request_sale(sale(account_id, opportunity_id, 6))
        .await
        .expect("Failed to request sale");
    assert!(matches!(
        ledger.request_sale(sale(account_id, opportunity_id, 5)).await,
        Err(RepositoryError::Rule(_))
    ));
    let second = ledger
        .request_sale(sale(account_id, opportunity_id, 4))
        .await
        .unwrap();

    let approved = ledger.approve_sale(first.sell_request.id).await.unwrap();
    assert_eq!(approved.settlement, Settlement::Reduced);
    assert_eq!(approved.sell_request.status, SellRequestStatus::Approved);

    let approved = ledger.approve_sale(second.sell_request.id).await.unwrap();
    assert_eq!(approved.settlement, Settlement::Closed);
    assert!(ledger
        .find_position_for(account_id, opportunity_id)
        .await
        .unwrap()
        .is_none());

    assert!(matches!(
        ledger.approve_sale(first.sell_request.id).await,
        Err(RepositoryError::Conflict(_))
    ));

    let history = ledger
        .transactions_for(account_id, Pagination::default())
        .await
        .unwrap();
    let sold = history
        .items
        .iter()
        .filter(|r| r.transaction.status == TransactionStatus::Sold)
        .count();
    assert_eq!(sold, 2);

    cleanup(&pool, account_id, Some(opportunity_id)).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_notification_repository_lifecycle() {
    let pool = setup_test_db().await;
    let repo = PostgresNotificationRepository::new(pool.clone());
    let account_id = create_test_account(&pool).await;

    let notification = Notification::new(account_id, "Welcome to the farm");
    repo.create(&notification).await.unwrap();

    let listed = repo.list_for(account_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(!listed[0].read);

    repo.mark_read(notification.id).await.unwrap();
    let stored = repo.find_by_id(notification.id).await.unwrap().unwrap();
    assert!(stored.read);

    repo.delete(notification.id).await.unwrap();
    assert!(matches!(
        repo.delete(notification.id).await,
        Err(RepositoryError::NotFound(_))
    ));

    cleanup(&pool, account_id, None).await;
}
