// Infrastructure layer module
// Database, cache, email and payment adapters behind the domain ports

pub mod cache;
pub mod mail;
pub mod memory;
pub mod payments;
pub mod repositories;
