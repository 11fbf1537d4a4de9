//! Redis-backed OTP repository
//!
//! Each `(identifier, channel, purpose)` key maps to one hash holding the
//! authoritative record, plus a counter key holding the last generation.
//! Issuing overwrites the hash, which supersedes whatever was there. Every
//! mutation is a single Lua script, so concurrent instances see a serial
//! order per key. Hashes expire at the record's `expires_at`.
//!
//! Key names carry a SHA-256 digest of the identifier, never the raw address.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use redis::{AsyncCommands, Script};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use roomly_core::domain::entities::otp_record::{Channel, OtpKey, OtpRecord, Purpose};
use roomly_core::errors::DomainError;
use roomly_core::repositories::otp::{AttemptSlot, OtpRepository};

use crate::cache::redis_client::RedisClient;
use crate::InfrastructureError;

// Generation counters outlive their record by this much so a quick re-issue
// keeps counting upwards
const GENERATION_GRACE_HOURS: i64 = 24;

const ISSUE_SCRIPT: &str = r#"
local generation = redis.call('INCR', KEYS[2])
redis.call('PEXPIREAT', KEYS[2], ARGV[8])
redis.call('DEL', KEYS[1])
redis.call('HSET', KEYS[1],
    'id', ARGV[1],
    'identifier', ARGV[2],
    'channel', ARGV[3],
    'code', ARGV[4],
    'purpose', ARGV[5],
    'attempts', 0,
    'is_used', 0,
    'generation', generation,
    'expires_at', ARGV[6],
    'created_at', ARGV[7])
redis.call('PEXPIREAT', KEYS[1], ARGV[6])
return generation
"#;

// -1: gone, -2: exhausted, otherwise the new attempt count
const CONSUME_ATTEMPT_SCRIPT: &str = r#"
local fields = redis.call('HMGET', KEYS[1], 'id', 'is_used', 'expires_at', 'attempts')
if fields[1] ~= ARGV[1] or fields[2] == '1' then
    return -1
end
if tonumber(fields[3]) <= tonumber(ARGV[3]) then
    return -1
end
if tonumber(fields[4]) >= tonumber(ARGV[2]) then
    return -2
end
return redis.call('HINCRBY', KEYS[1], 'attempts', 1)
"#;

const MARK_USED_SCRIPT: &str = r#"
local fields = redis.call('HMGET', KEYS[1], 'id', 'is_used')
if fields[1] ~= ARGV[1] or fields[2] == '1' then
    return 0
end
redis.call('HSET', KEYS[1], 'is_used', 1)
return 1
"#;

/// OTP repository shared by every service instance
pub struct RedisOtpRepository {
    client: Arc<RedisClient>,
    issue_script: Script,
    consume_attempt_script: Script,
    mark_used_script: Script,
}

impl RedisOtpRepository {
    pub fn new(client: Arc<RedisClient>) -> Self {
        Self {
            client,
            issue_script: Script::new(ISSUE_SCRIPT),
            consume_attempt_script: Script::new(CONSUME_ATTEMPT_SCRIPT),
            mark_used_script: Script::new(MARK_USED_SCRIPT),
        }
    }

    fn record_key(&self, key: &OtpKey) -> String {
        self.client.make_key(&record_key_suffix(key))
    }

    fn generation_key(&self, key: &OtpKey) -> String {
        format!("{}:gen", self.record_key(key))
    }
}

/// `otp:<channel>:<purpose>:<sha256(identifier)>`
pub(crate) fn record_key_suffix(key: &OtpKey) -> String {
    format!(
        "otp:{}:{}:{}",
        key.channel,
        key.purpose,
        identifier_digest(&key.identifier)
    )
}

pub(crate) fn identifier_digest(identifier: &str) -> String {
    hex::encode(Sha256::digest(identifier.as_bytes()))
}

fn millis_to_datetime(field: &str, millis: i64) -> Result<DateTime<Utc>, InfrastructureError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| InfrastructureError::Corrupt(format!("{} out of range", field)))
}

fn required<'a>(
    fields: &'a HashMap<String, String>,
    name: &str,
) -> Result<&'a str, InfrastructureError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| InfrastructureError::Corrupt(format!("missing field {}", name)))
}

fn parsed<T: std::str::FromStr>(
    fields: &HashMap<String, String>,
    name: &str,
) -> Result<T, InfrastructureError> {
    required(fields, name)?
        .parse()
        .map_err(|_| InfrastructureError::Corrupt(format!("unparseable field {}", name)))
}

/// Decode a record hash; an empty hash means no record
pub(crate) fn record_from_fields(
    fields: &HashMap<String, String>,
) -> Result<Option<OtpRecord>, InfrastructureError> {
    if fields.is_empty() {
        return Ok(None);
    }

    let channel: Channel = required(fields, "channel")?
        .parse()
        .map_err(InfrastructureError::Corrupt)?;
    let purpose: Purpose = required(fields, "purpose")?
        .parse()
        .map_err(InfrastructureError::Corrupt)?;

    Ok(Some(OtpRecord {
        id: parsed::<Uuid>(fields, "id")?,
        identifier: required(fields, "identifier")?.to_string(),
        channel,
        code: required(fields, "code")?.to_string(),
        purpose,
        attempts: parsed(fields, "attempts")?,
        is_used: required(fields, "is_used")? == "1",
        generation: parsed(fields, "generation")?,
        expires_at: millis_to_datetime("expires_at", parsed(fields, "expires_at")?)?,
        created_at: millis_to_datetime("created_at", parsed(fields, "created_at")?)?,
    }))
}

#[async_trait]
impl OtpRepository for RedisOtpRepository {
    async fn issue(&self, record: &OtpRecord) -> Result<u64, DomainError> {
        let key = record.key();
        let generation_expiry = record.expires_at + Duration::hours(GENERATION_GRACE_HOURS);
        let mut conn = self.client.connection();

        let generation: u64 = self
            .issue_script
            .key(self.record_key(&key))
            .key(self.generation_key(&key))
            .arg(record.id.to_string())
            .arg(&record.identifier)
            .arg(record.channel.as_str())
            .arg(&record.code)
            .arg(record.purpose.as_str())
            .arg(record.expires_at.timestamp_millis())
            .arg(record.created_at.timestamp_millis())
            .arg(generation_expiry.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(InfrastructureError::from)?;

        tracing::debug!(generation = generation, "Stored OTP record in Redis");
        Ok(generation)
    }

    async fn find_active(
        &self,
        key: &OtpKey,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        let record_key = self.record_key(key);
        let fields: HashMap<String, String> = self
            .client
            .execute_with_retry(|mut conn| {
                let record_key = record_key.clone();
                Box::pin(async move { conn.hgetall(record_key).await })
            })
            .await
            .map_err(InfrastructureError::from)?;

        let record = record_from_fields(&fields)?;
        Ok(record.filter(|r| r.is_active_at(now)))
    }

    async fn consume_attempt(
        &self,
        key: &OtpKey,
        id: Uuid,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> Result<AttemptSlot, DomainError> {
        let mut conn = self.client.connection();
        let result: i64 = self
            .consume_attempt_script
            .key(self.record_key(key))
            .arg(id.to_string())
            .arg(max_attempts)
            .arg(now.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(InfrastructureError::from)?;

        Ok(match result {
            -2 => AttemptSlot::Exhausted,
            n if n > 0 => AttemptSlot::Granted { attempts: n as u32 },
            _ => AttemptSlot::Gone,
        })
    }

    async fn mark_used(&self, key: &OtpKey, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.client.connection();
        let flipped: i64 = self
            .mark_used_script
            .key(self.record_key(key))
            .arg(id.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(InfrastructureError::from)?;

        Ok(flipped == 1)
    }
}
