//! OTP repository trait defining the interface for code persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::otp_record::{OtpKey, OtpRecord};
use crate::errors::DomainError;

/// Outcome of trying to reserve one verification attempt on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptSlot {
    /// The attempt was recorded; `attempts` is the new count
    Granted { attempts: u32 },
    /// The record had already reached the attempt cap
    Exhausted,
    /// The record is missing, used, superseded or expired
    Gone,
}

/// Repository trait for OTP record persistence
///
/// Every method must be atomic per `OtpKey`: two concurrent callers on the
/// same key observe each other's writes in some serial order. Implementations
/// decide how (a mutex, a server-side script).
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Supersede every unused record for the record's key and insert `record`
    /// as the only active one.
    ///
    /// # Returns
    /// * `Ok(u64)` - The generation assigned to the new record
    /// * `Err(DomainError)` - Store unavailable
    async fn issue(&self, record: &OtpRecord) -> Result<u64, DomainError>;

    /// Most recent record for `key` that is unused and unexpired at `now`
    async fn find_active(
        &self,
        key: &OtpKey,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError>;

    /// Increment `attempts` on record `id` if it is still active and below
    /// `max_attempts`.
    async fn consume_attempt(
        &self,
        key: &OtpKey,
        id: Uuid,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> Result<AttemptSlot, DomainError>;

    /// Flip `is_used` from false to true on record `id`.
    ///
    /// # Returns
    /// * `Ok(true)` - This caller consumed the record
    /// * `Ok(false)` - The record was already used, superseded or is gone
    async fn mark_used(&self, key: &OtpKey, id: Uuid) -> Result<bool, DomainError>;
}
