// Outbound ports
// Cache, transactional email and payment gateways

pub mod mailer;
pub mod payment_gateway;
pub mod token_store;

pub use mailer::{Mail, MailError, Mailer};
pub use payment_gateway::{
    CheckoutRequest, CheckoutSession, PaymentError, PaymentGateway, PurchaseMetadata,
    Verification, VerifyRequest,
};
pub use token_store::{CacheError, TokenStore};
