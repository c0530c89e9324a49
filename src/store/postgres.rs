use async_trait::async_trait;
use sqlx::PgPool;

use super::{LevelStore, StoreError, StoreResult};
use crate::{LevelReading, MeterKey, MeterKind, MeterStatus, NearestAlert, ALERT_BAND};

// ---

/// PostgreSQL unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// [`LevelStore`] backed by a shared `PgPool`.
///
/// Cloning is cheap; every clone shares the same pool. Connections are
/// acquired per statement and released immediately.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    // ---
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Statement text per key kind. Identifiers are always bound, never spliced.
struct KeyedSql {
    update_level: &'static str,
    get_level: &'static str,
    get_status: &'static str,
    nearest_alert: &'static str,
}

static BY_DEVICE: KeyedSql = KeyedSql {
    update_level: r#"
        UPDATE level_meter
           SET current_weight   = $1,
               wireless_network = COALESCE($2, wireless_network),
               last_seen        = now()
         WHERE device_id = $3
        "#,
    get_level: r#"
        SELECT current_weight AS current, max_weight AS maximum
          FROM level_meter
         WHERE device_id = $1
        "#,
    get_status: r#"
        SELECT current_weight AS current_level, max_weight AS maximum_level,
               device_id, wireless_network, last_seen
          FROM level_meter
         WHERE device_id = $1
        "#,
    nearest_alert: r#"
        SELECT device_id, alert_level_percentage AS percentage
          FROM level_alerts
         WHERE device_id = $1
           AND alert_level_value >= $2
           AND alert_level_value <= $2 + $3
         ORDER BY alert_level_value ASC
         LIMIT 1
        "#,
};

static BY_CUSTOMER: KeyedSql = KeyedSql {
    update_level: r#"
        UPDATE level_meter
           SET current_weight   = $1,
               wireless_network = COALESCE($2, wireless_network),
               last_seen        = now()
         WHERE customer_id = $3
        "#,
    get_level: r#"
        SELECT current_weight AS current, max_weight AS maximum
          FROM level_meter
         WHERE customer_id = $1
         ORDER BY last_seen DESC
         LIMIT 1
        "#,
    get_status: r#"
        SELECT current_weight AS current_level, max_weight AS maximum_level,
               device_id, wireless_network, last_seen
          FROM level_meter
         WHERE customer_id = $1
         ORDER BY last_seen DESC
         LIMIT 1
        "#,
    nearest_alert: r#"
        SELECT device_id, alert_level_percentage AS percentage
          FROM level_alerts
         WHERE customer_id = $1
           AND alert_level_value >= $2
           AND alert_level_value <= $2 + $3
         ORDER BY alert_level_value ASC
         LIMIT 1
        "#,
};

fn sql_for(key: &MeterKey) -> &'static KeyedSql {
    match key.kind() {
        MeterKind::Device => &BY_DEVICE,
        MeterKind::Customer => &BY_CUSTOMER,
    }
}

#[async_trait]
impl LevelStore for PgStore {
    // ---
    async fn register_device(
        &self,
        customer_id: &str,
        device_id: &str,
        max_weight: f64,
    ) -> StoreResult<()> {
        // ---
        let result = sqlx::query(
            r#"
            INSERT INTO level_meter (customer_id, device_id, max_weight)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(customer_id)
        .bind(device_id)
        .bind(max_weight)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Err(StoreError::DuplicateDevice(device_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_level(
        &self,
        key: &MeterKey,
        value: f64,
        wireless_network: Option<&str>,
    ) -> StoreResult<u64> {
        // ---
        let result = sqlx::query(sql_for(key).update_level)
            .bind(value)
            .bind(wireless_network)
            .bind(key.id())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn get_level(&self, key: &MeterKey) -> StoreResult<Option<LevelReading>> {
        // ---
        let reading = sqlx::query_as::<_, LevelReading>(sql_for(key).get_level)
            .bind(key.id())
            .fetch_optional(&self.pool)
            .await?;

        Ok(reading)
    }

    async fn get_status(&self, key: &MeterKey) -> StoreResult<Option<MeterStatus>> {
        // ---
        let status = sqlx::query_as::<_, MeterStatus>(sql_for(key).get_status)
            .bind(key.id())
            .fetch_optional(&self.pool)
            .await?;

        Ok(status)
    }

    async fn create_alert(
        &self,
        customer_id: &str,
        device_id: &str,
        percentage: f64,
    ) -> StoreResult<()> {
        // ---
        // The threshold is derived from max_weight inside the same statement;
        // a device owned by another customer selects no row.
        let result = sqlx::query(
            r#"
            INSERT INTO level_alerts
                (customer_id, device_id, alert_level_percentage, alert_level_value)
            SELECT customer_id, device_id, $3::float8, $3::float8 * max_weight / 100.0
              FROM level_meter
             WHERE customer_id = $1
               AND device_id = $2
            "#,
        )
        .bind(customer_id)
        .bind(device_id)
        .bind(percentage)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UnknownDevice {
                customer_id: customer_id.to_string(),
                device_id: device_id.to_string(),
            });
        }
        Ok(())
    }

    async fn find_nearest_alert(
        &self,
        key: &MeterKey,
        value: f64,
    ) -> StoreResult<Option<NearestAlert>> {
        // ---
        let alert = sqlx::query_as::<_, NearestAlert>(sql_for(key).nearest_alert)
            .bind(key.id())
            .bind(value)
            .bind(ALERT_BAND)
            .fetch_optional(&self.pool)
            .await?;

        Ok(alert)
    }
}
