//! Data models for the level meter service.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---

/// Width, in absolute level units, of the window above a reading that is
/// searched for an alert threshold.
pub const ALERT_BAND: f64 = 10.0;

/// Which identifier addresses a meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterKind {
    Device,
    Customer,
}

/// A meter lookup key: a device id or a customer id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeterKey {
    Device(String),
    Customer(String),
}

impl MeterKey {
    // ---
    pub fn new(kind: MeterKind, id: impl Into<String>) -> Self {
        match kind {
            MeterKind::Device => MeterKey::Device(id.into()),
            MeterKind::Customer => MeterKey::Customer(id.into()),
        }
    }

    pub fn kind(&self) -> MeterKind {
        match self {
            MeterKey::Device(_) => MeterKind::Device,
            MeterKey::Customer(_) => MeterKind::Customer,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            MeterKey::Device(id) | MeterKey::Customer(id) => id,
        }
    }
}

impl std::fmt::Display for MeterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeterKey::Device(id) => write!(f, "device:{id}"),
            MeterKey::Customer(id) => write!(f, "customer:{id}"),
        }
    }
}

/// Current and full-tank level for `GET /api/get/level/`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct LevelReading {
    // ---
    pub current: f64,
    pub maximum: f64,
}

/// Meter details for `GET /api/get/status/`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MeterStatus {
    // ---
    pub current_level: f64,
    pub maximum_level: f64,
    pub device_id: String,
    pub wireless_network: String,
    pub last_seen: DateTime<Utc>,
}

/// The alert threshold matched for a freshly written level.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct NearestAlert {
    // ---
    pub device_id: String,
    pub percentage: f64,
}

/// `{"success": bool}` body returned by the write routes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub const OK: Ack = Ack { success: true };
    pub const FAILED: Ack = Ack { success: false };
}
