use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::value_objects::Role;

/// Profile attached 1:1 to an account
#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub fullname: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
}

/// Stored account, including the password hash
///
/// Never serialized directly; responses go through [`AccountView`].
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn view(&self) -> AccountView {
        AccountView::from(self)
    }
}

/// Public shape of an account, without the password hash
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub is_verified: bool,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            username: account.username.clone(),
            role: account.role,
            is_verified: account.is_verified,
            profile: account.profile.clone(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Data for a new account; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    pub phone_number: Option<String>,
}

impl NewAccount {
    pub fn into_account(self) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            email: self.email,
            username: self.username,
            password_hash: self.password_hash,
            role: self.role,
            is_verified: self.is_verified,
            profile: Profile {
                phone_number: self.phone_number,
                ..Profile::default()
            },
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial profile update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub fullname: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
}

impl ProfileUpdate {
    pub fn apply(&self, account: &mut Account) {
        if let Some(username) = &self.username {
            account.username = username.clone();
        }
        if let Some(fullname) = &self.fullname {
            account.profile.fullname = Some(fullname.clone());
        }
        if let Some(phone) = &self.phone_number {
            account.profile.phone_number = Some(phone.clone());
        }
        if let Some(image) = &self.profile_image {
            account.profile.profile_image = Some(image.clone());
        }
        account.updated_at = Utc::now();
    }
}
