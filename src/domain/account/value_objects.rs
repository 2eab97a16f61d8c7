use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email regex compiles")
});

static MOBILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("mobile regex compiles"));

/// Minimum password length accepted at signup, reset and change
pub const MIN_PASSWORD_LEN: usize = 8;

/// Email value object representing a valid email address
///
/// # Invariants
/// - Has a local part, an `@` and a dotted domain with a 2+ letter TLD
/// - Stored lowercased and trimmed
/// - Is immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Creates a new Email value object
    ///
    /// # Example
    /// ```
    /// use agrotrade_api::domain::account::value_objects::Email;
    ///
    /// let email = Email::new("Investor@Example.com").expect("valid email");
    /// assert_eq!(email.as_str(), "investor@example.com");
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, String> {
        let email = email.into().trim().to_lowercase();
        if EMAIL_RE.is_match(&email) {
            Ok(Email(email))
        } else {
            Err(format!("Invalid email format: {}", email))
        }
    }

    /// Returns the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Email::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

/// Username value object, 3 to 20 characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    pub fn new(username: impl Into<String>) -> Result<Self, String> {
        let username = username.into().trim().to_string();
        let len = username.chars().count();
        if len < 3 {
            return Err("Username must be minimum of 3 characters".to_string());
        }
        if len > 20 {
            return Err("Username must be maximum of 20 characters".to_string());
        }
        Ok(Username(username))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mobile phone number: optional leading `+`, then 7 to 15 digits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn new(phone: impl Into<String>) -> Result<Self, String> {
        let phone: String = phone
            .into()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();
        if MOBILE_RE.is_match(&phone) {
            Ok(PhoneNumber(phone))
        } else {
            Err("Phone number is not valid".to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Checks the password policy for new passwords
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        ));
    }
    Ok(())
}

/// Role carried by an account and embedded in its access tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Investor,
}

impl Role {
    /// Case-insensitive parse, accepts `ADMIN` and `admin`
    pub fn parse(value: &str) -> Option<Role> {
        match value.to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "investor" => Some(Role::Investor),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Investor => write!(f, "INVESTOR"),
        }
    }
}
