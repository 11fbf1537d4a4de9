//! Cache module for Redis-backed state
//!
//! This module provides the Redis client (connection retry, idempotent
//! operation retry) and the OTP repository built on it.

pub mod otp_store;
pub mod redis_client;


pub use otp_store::RedisOtpRepository;
pub use redis_client::RedisClient;

// Re-export commonly used types
pub use roomly_shared::CacheConfig;
