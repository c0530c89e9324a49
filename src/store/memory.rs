//! In-memory [`LevelStore`] used by the router and evaluator tests.
//!
//! Mirrors the SQL semantics of `PgStore` closely enough that the HTTP
//! surface can be exercised without a database.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{LevelStore, StoreError, StoreResult};
use crate::{LevelReading, MeterKey, MeterStatus, NearestAlert, ALERT_BAND};

// ---

#[derive(Debug, Clone)]
struct MeterRow {
    customer_id: String,
    device_id: String,
    current_weight: f64,
    max_weight: f64,
    wireless_network: String,
    last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct AlertRow {
    customer_id: String,
    device_id: String,
    percentage: f64,
    value: f64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    meters: Mutex<Vec<MeterRow>>,
    alerts: Mutex<Vec<AlertRow>>,
}

impl MemoryStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of alert rows stored so far.
    pub fn alert_count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }

    /// Change a meter's capacity behind the service's back, the way an
    /// operator editing the table would.
    pub fn set_max_weight(&self, device_id: &str, max_weight: f64) {
        let mut meters = self.meters.lock().unwrap();
        if let Some(row) = meters.iter_mut().find(|m| m.device_id == device_id) {
            row.max_weight = max_weight;
        }
    }
}

fn key_matches(key: &MeterKey, customer_id: &str, device_id: &str) -> bool {
    match key {
        MeterKey::Device(id) => id == device_id,
        MeterKey::Customer(id) => id == customer_id,
    }
}

/// Most recently seen meter matching `key`.
fn latest<'a>(meters: &'a [MeterRow], key: &MeterKey) -> Option<&'a MeterRow> {
    meters
        .iter()
        .filter(|m| key_matches(key, &m.customer_id, &m.device_id))
        .max_by_key(|m| m.last_seen)
}

#[async_trait]
impl LevelStore for MemoryStore {
    // ---
    async fn register_device(
        &self,
        customer_id: &str,
        device_id: &str,
        max_weight: f64,
    ) -> StoreResult<()> {
        let mut meters = self.meters.lock().unwrap();
        if meters.iter().any(|m| m.device_id == device_id) {
            return Err(StoreError::DuplicateDevice(device_id.to_string()));
        }
        meters.push(MeterRow {
            customer_id: customer_id.to_string(),
            device_id: device_id.to_string(),
            current_weight: 0.0,
            max_weight,
            wireless_network: String::new(),
            last_seen: Utc::now(),
        });
        Ok(())
    }

    async fn update_level(
        &self,
        key: &MeterKey,
        value: f64,
        wireless_network: Option<&str>,
    ) -> StoreResult<u64> {
        let mut meters = self.meters.lock().unwrap();
        let mut updated = 0;
        for row in meters
            .iter_mut()
            .filter(|m| key_matches(key, &m.customer_id, &m.device_id))
        {
            row.current_weight = value;
            if let Some(network) = wireless_network {
                row.wireless_network = network.to_string();
            }
            row.last_seen = Utc::now();
            updated += 1;
        }
        Ok(updated)
    }

    async fn get_level(&self, key: &MeterKey) -> StoreResult<Option<LevelReading>> {
        let meters = self.meters.lock().unwrap();
        Ok(latest(&meters, key).map(|m| LevelReading {
            current: m.current_weight,
            maximum: m.max_weight,
        }))
    }

    async fn get_status(&self, key: &MeterKey) -> StoreResult<Option<MeterStatus>> {
        let meters = self.meters.lock().unwrap();
        Ok(latest(&meters, key).map(|m| MeterStatus {
            current_level: m.current_weight,
            maximum_level: m.max_weight,
            device_id: m.device_id.clone(),
            wireless_network: m.wireless_network.clone(),
            last_seen: m.last_seen,
        }))
    }

    async fn create_alert(
        &self,
        customer_id: &str,
        device_id: &str,
        percentage: f64,
    ) -> StoreResult<()> {
        let max_weight = self
            .meters
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.customer_id == customer_id && m.device_id == device_id)
            .map(|m| m.max_weight);

        let Some(max_weight) = max_weight else {
            return Err(StoreError::UnknownDevice {
                customer_id: customer_id.to_string(),
                device_id: device_id.to_string(),
            });
        };

        self.alerts.lock().unwrap().push(AlertRow {
            customer_id: customer_id.to_string(),
            device_id: device_id.to_string(),
            percentage,
            value: percentage * max_weight / 100.0,
        });
        Ok(())
    }

    async fn find_nearest_alert(
        &self,
        key: &MeterKey,
        value: f64,
    ) -> StoreResult<Option<NearestAlert>> {
        let alerts = self.alerts.lock().unwrap();
        Ok(alerts
            .iter()
            .filter(|a| key_matches(key, &a.customer_id, &a.device_id))
            .filter(|a| a.value >= value && a.value <= value + ALERT_BAND)
            .min_by(|a, b| a.value.total_cmp(&b.value))
            .map(|a| NearestAlert {
                device_id: a.device_id.clone(),
                percentage: a.percentage,
            }))
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn device(id: &str) -> MeterKey {
        MeterKey::Device(id.to_string())
    }

    async fn seeded() -> MemoryStore {
        // ---
        let store = MemoryStore::new();
        store.register_device("C1", "D1", 100.0).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_register_then_get_level_starts_empty() {
        // ---
        let store = seeded().await;
        let level = store.get_level(&device("D1")).await.unwrap();
        assert_eq!(
            level,
            Some(LevelReading {
                current: 0.0,
                maximum: 100.0
            })
        );
    }

    #[tokio::test]
    async fn test_duplicate_device_rejected() {
        // ---
        let store = seeded().await;
        let err = store.register_device("C2", "D1", 50.0).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateDevice(id) if id == "D1"));
    }

    #[tokio::test]
    async fn test_update_is_idempotent() {
        // ---
        let store = seeded().await;
        for _ in 0..2 {
            assert_eq!(store.update_level(&device("D1"), 37.5, None).await.unwrap(), 1);
            let level = store.get_level(&device("D1")).await.unwrap().unwrap();
            assert_eq!(level.current, 37.5);
        }
    }

    #[tokio::test]
    async fn test_update_unknown_matches_nothing() {
        // ---
        let store = seeded().await;
        assert_eq!(store.update_level(&device("NOPE"), 10.0, None).await.unwrap(), 0);
        assert_eq!(store.get_level(&device("NOPE")).await.unwrap(), None);
        assert_eq!(store.get_status(&device("NOPE")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_alert_for_unknown_customer_is_rejected() {
        // ---
        let store = seeded().await;
        let err = store.create_alert("C9", "D9", 50.0).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownDevice { customer_id, .. } if customer_id == "C9"));
        assert_eq!(store.alert_count(), 0);
    }

    #[tokio::test]
    async fn test_alert_requires_device_owned_by_customer() {
        // ---
        let store = seeded().await;
        store.register_device("C2", "D2", 1000.0).await.unwrap();

        let err = store.create_alert("C1", "D2", 50.0).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownDevice { device_id, .. } if device_id == "D2"));
        assert_eq!(store.alert_count(), 0);

        // The threshold comes from the named device's own capacity
        store.create_alert("C2", "D2", 50.0).await.unwrap();
        assert!(store.find_nearest_alert(&device("D2"), 45.0).await.unwrap().is_none());
        assert!(store.find_nearest_alert(&device("D2"), 495.0).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_nearest_alert_band() {
        // ---
        let store = seeded().await;
        store.create_alert("C1", "D1", 50.0).await.unwrap();

        let hit = store.find_nearest_alert(&device("D1"), 48.0).await.unwrap();
        assert_eq!(
            hit,
            Some(NearestAlert {
                device_id: "D1".into(),
                percentage: 50.0
            })
        );

        // Band edges are inclusive
        assert!(store.find_nearest_alert(&device("D1"), 40.0).await.unwrap().is_some());
        assert!(store.find_nearest_alert(&device("D1"), 50.0).await.unwrap().is_some());

        // 50 lies outside 30..=40, and below 51
        assert_eq!(store.find_nearest_alert(&device("D1"), 30.0).await.unwrap(), None);
        assert_eq!(store.find_nearest_alert(&device("D1"), 51.0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_nearest_alert_prefers_lowest_threshold() {
        // ---
        let store = seeded().await;
        store.create_alert("C1", "D1", 25.0).await.unwrap();
        store.create_alert("C1", "D1", 28.0).await.unwrap();
        store.create_alert("C1", "D1", 22.0).await.unwrap();

        let hit = store.find_nearest_alert(&device("D1"), 21.0).await.unwrap();
        assert_eq!(hit.map(|a| a.percentage), Some(22.0));
    }

    #[tokio::test]
    async fn test_alert_value_pinned_at_creation() {
        // ---
        let store = seeded().await;
        store.create_alert("C1", "D1", 50.0).await.unwrap();
        store.set_max_weight("D1", 200.0);

        // Still matched against the 50-unit threshold fixed at creation
        assert!(store.find_nearest_alert(&device("D1"), 45.0).await.unwrap().is_some());
        assert!(store.find_nearest_alert(&device("D1"), 95.0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_alerts_scoped_to_meter() {
        // ---
        let store = seeded().await;
        store.register_device("C2", "D2", 100.0).await.unwrap();
        store.create_alert("C2", "D2", 50.0).await.unwrap();

        assert!(store.find_nearest_alert(&device("D1"), 45.0).await.unwrap().is_none());
        assert!(store
            .find_nearest_alert(&MeterKey::Customer("C2".into()), 45.0)
            .await
            .unwrap()
            .is_some());
    }
}
