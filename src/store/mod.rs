//! Persistence accessor for meters and alert thresholds.
//!
//! Handlers and the alert evaluator only ever see the [`LevelStore`] trait.
//! Every operation executes exactly one statement with bound parameters;
//! there are no multi-statement transactions on the request path.

use async_trait::async_trait;

use crate::{LevelReading, MeterKey, MeterStatus, NearestAlert};

#[cfg(test)]
pub mod memory;
mod postgres;

pub use postgres::PgStore;

// ---

/// Storage-level failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A meter with this device id is already registered.
    #[error("device {0} is already registered")]
    DuplicateDevice(String),

    /// No registered meter has this device id under this customer.
    #[error("customer {customer_id} has no device {device_id}")]
    UnknownDevice {
        customer_id: String,
        device_id: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Single-statement operations over the `level_meter` and `level_alerts`
/// tables.
#[async_trait]
pub trait LevelStore: Send + Sync {
    /// Insert a new meter with an empty tank.
    async fn register_device(
        &self,
        customer_id: &str,
        device_id: &str,
        max_weight: f64,
    ) -> StoreResult<()>;

    /// Record a new reading. Returns the number of meters updated, which is
    /// zero when `key` matches nothing.
    async fn update_level(
        &self,
        key: &MeterKey,
        value: f64,
        wireless_network: Option<&str>,
    ) -> StoreResult<u64>;

    async fn get_level(&self, key: &MeterKey) -> StoreResult<Option<LevelReading>>;

    async fn get_status(&self, key: &MeterKey) -> StoreResult<Option<MeterStatus>>;

    /// Add a threshold at `percentage` of the device's current
    /// `max_weight`. Fails with [`StoreError::UnknownDevice`] unless the
    /// device is registered to the customer.
    async fn create_alert(
        &self,
        customer_id: &str,
        device_id: &str,
        percentage: f64,
    ) -> StoreResult<()>;

    /// Lowest threshold of the meter behind `key` that lies within
    /// `[value, value + ALERT_BAND]`.
    async fn find_nearest_alert(
        &self,
        key: &MeterKey,
        value: f64,
    ) -> StoreResult<Option<NearestAlert>>;
}
