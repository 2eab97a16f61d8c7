// Key/value cache adapters

pub mod redis_token_store;

pub use redis_token_store::RedisTokenStore;
