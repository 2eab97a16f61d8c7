// Transactional email
// Brevo client and HTML templates

pub mod brevo;
pub mod templates;

pub use brevo::BrevoMailer;
