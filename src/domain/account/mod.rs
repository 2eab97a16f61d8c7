// Account domain module
// Accounts, profiles and the value objects validating their fields

#![allow(clippy::module_inception)]

pub mod account;
pub mod value_objects;

pub use account::{Account, AccountView, NewAccount, Profile, ProfileUpdate};
pub use value_objects::{Email, PhoneNumber, Role, Username};
