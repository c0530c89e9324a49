//! Database schema management for `kgas-level-service`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `level_meter` table (one row per registered device) and the
/// `level_alerts` table (customer thresholds). Safe to call on every startup;
/// no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // One row per physical sensor; device_id is the natural key
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS level_meter (
            device_id         TEXT             PRIMARY KEY,
            customer_id       TEXT             NOT NULL,
            current_weight    DOUBLE PRECISION NOT NULL DEFAULT 0,
            max_weight        DOUBLE PRECISION NOT NULL,
            wireless_network  TEXT             NOT NULL DEFAULT '',
            last_seen         TIMESTAMPTZ      NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Thresholds are pinned to max_weight at creation time
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS level_alerts (
            id                      BIGSERIAL        PRIMARY KEY,
            customer_id             TEXT             NOT NULL,
            device_id               TEXT             NOT NULL,
            alert_level_percentage  DOUBLE PRECISION NOT NULL,
            alert_level_value       DOUBLE PRECISION NOT NULL,
            created_at              TIMESTAMPTZ      NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_level_meter_customer_id
            ON level_meter (customer_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_level_alerts_device_value
            ON level_alerts (device_id, alert_level_value);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
