// Shared application state
// Adapters behind their ports plus auth helpers, cloned into every handler

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::auth::{JwtKeys, OneTimeTokens, Sessions};
use crate::config::Config;
use crate::domain::ledger::PaymentProvider;
use crate::domain::ports::{Mailer, PaymentGateway, TokenStore};
use crate::domain::repositories::{
    AccountRepository, BankingRepository, LedgerRepository, NewsRepository,
    NotificationRepository, OpportunityRepository,
};
use crate::infrastructure::cache::RedisTokenStore;
use crate::infrastructure::mail::BrevoMailer;
use crate::infrastructure::memory::{
    MemoryAccountRepository, MemoryBankingRepository, MemoryLedgerRepository,
    MemoryNewsRepository, MemoryNotificationRepository, MemoryOpportunityRepository,
    MemoryTokenStore, RecordingMailer, ScriptedGateway,
};
use crate::infrastructure::payments::{FlutterwaveGateway, PaystackGateway};
use crate::infrastructure::repositories::{
    PostgresAccountRepository, PostgresBankingRepository, PostgresLedgerRepository,
    PostgresNewsRepository, PostgresNotificationRepository, PostgresOpportunityRepository,
};

/// The concrete implementation behind every port
pub struct Adapters {
    pub accounts: Arc<dyn AccountRepository>,
    pub opportunities: Arc<dyn OpportunityRepository>,
    pub news: Arc<dyn NewsRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub banking: Arc<dyn BankingRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub tokens: Arc<dyn TokenStore>,
    pub mailer: Arc<dyn Mailer>,
    pub paystack: Arc<dyn PaymentGateway>,
    pub flutterwave: Arc<dyn PaymentGateway>,
}

impl Adapters {
    /// Postgres, Redis, Brevo and the live gateways
    pub fn production(config: &Config, pool: PgPool, redis: RedisTokenStore) -> Self {
        Self {
            accounts: Arc::new(PostgresAccountRepository::new(pool.clone())),
            opportunities: Arc::new(PostgresOpportunityRepository::new(pool.clone())),
            news: Arc::new(PostgresNewsRepository::new(pool.clone())),
            notifications: Arc::new(PostgresNotificationRepository::new(pool.clone())),
            banking: Arc::new(PostgresBankingRepository::new(pool.clone())),
            ledger: Arc::new(PostgresLedgerRepository::new(pool)),
            tokens: Arc::new(redis),
            mailer: Arc::new(BrevoMailer::new(config.brevo_api_key.clone())),
            paystack: Arc::new(PaystackGateway::new(config.paystack_secret_key.clone())),
            flutterwave: Arc::new(FlutterwaveGateway::new(
                config.flutterwave_secret_key.clone(),
                config.flutterwave_redirect_url.clone(),
            )),
        }
    }

    /// Everything in process: a recording mailer and scripted gateways
    pub fn in_memory() -> Self {
        let accounts = Arc::new(MemoryAccountRepository::new());
        let opportunities = Arc::new(MemoryOpportunityRepository::new());
        let ledger = MemoryLedgerRepository::new(accounts.clone(), opportunities.clone());
        Self {
            accounts,
            opportunities,
            news: Arc::new(MemoryNewsRepository::new()),
            notifications: Arc::new(MemoryNotificationRepository::new()),
            banking: Arc::new(MemoryBankingRepository::new()),
            ledger: Arc::new(ledger),
            tokens: Arc::new(MemoryTokenStore::new()),
            mailer: Arc::new(RecordingMailer::new()),
            paystack: Arc::new(ScriptedGateway::new(PaymentProvider::Paystack)),
            flutterwave: Arc::new(ScriptedGateway::new(PaymentProvider::Flutterwave)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accounts: Arc<dyn AccountRepository>,
    pub opportunities: Arc<dyn OpportunityRepository>,
    pub news: Arc<dyn NewsRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub banking: Arc<dyn BankingRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub sessions: Sessions,
    pub verification_tokens: OneTimeTokens,
    pub reset_tokens: OneTimeTokens,
    pub jwt: JwtKeys,
    paystack: Arc<dyn PaymentGateway>,
    flutterwave: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(config: Config, adapters: Adapters) -> Self {
        let access_ttl = Duration::from_secs(config.access_token_ttl_secs);
        let token_ttl = Duration::from_secs(config.verification_ttl_secs);
        let jwt = JwtKeys::new(
            &config.jwt_secret,
            chrono::Duration::seconds(config.access_token_ttl_secs as i64),
            chrono::Duration::seconds(config.refresh_token_ttl_secs as i64),
        );

        Self {
            sessions: Sessions::new(adapters.tokens.clone(), access_ttl),
            verification_tokens: OneTimeTokens::new(
                adapters.tokens.clone(),
                config.redis_prefix.clone(),
                token_ttl,
            ),
            reset_tokens: OneTimeTokens::new(
                adapters.tokens,
                format!("{}-reset", config.redis_prefix),
                token_ttl,
            ),
            jwt,
            config: Arc::new(config),
            accounts: adapters.accounts,
            opportunities: adapters.opportunities,
            news: adapters.news,
            notifications: adapters.notifications,
            banking: adapters.banking,
            ledger: adapters.ledger,
            mailer: adapters.mailer,
            paystack: adapters.paystack,
            flutterwave: adapters.flutterwave,
        }
    }

    pub fn gateway(&self, provider: PaymentProvider) -> &Arc<dyn PaymentGateway> {
        match provider {
            PaymentProvider::Paystack => &self.paystack,
            PaymentProvider::Flutterwave => &self.flutterwave,
        }
    }
}
