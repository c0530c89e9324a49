//! Alert evaluation for freshly written level readings.
//!
//! After a level update lands, the evaluator looks up the nearest alert
//! threshold at or above the new reading (within [`ALERT_BAND`](crate::ALERT_BAND))
//! and, on a match, pushes a notification. Everything here is best-effort:
//! failures are logged and never reach the HTTP caller.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::notify::{level_message, Delivery, Notifier, ALERT_HEADING};
use crate::store::LevelStore;
use crate::MeterKey;

// ---

#[derive(Clone)]
pub struct AlertEvaluator {
    store: Arc<dyn LevelStore>,
    notifier: Arc<dyn Notifier>,
}

/// What a single evaluation ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// No threshold inside the band.
    NoMatch,
    /// A threshold matched and the push provider accepted the message.
    Notified { device_id: String, body: String },
    /// A threshold matched but the gateway is disabled, so nothing went out.
    Suppressed { device_id: String, body: String },
    /// Lookup or delivery failed; already logged.
    Failed,
}

impl AlertEvaluator {
    // ---
    pub fn new(store: Arc<dyn LevelStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Run [`evaluate`](Self::evaluate) on a background task so the caller's
    /// response is never held up by the lookup or the push call.
    pub fn dispatch(&self, key: MeterKey, level: f64) {
        let evaluator = self.clone();
        tokio::spawn(async move {
            match evaluator.evaluate(&key, level).await {
                Evaluation::Notified { device_id, body } => {
                    info!(%key, %device_id, %body, "Level alert sent");
                }
                Evaluation::Suppressed { device_id, body } => {
                    info!(%key, %device_id, %body, "Level alert matched, push gateway disabled");
                }
                Evaluation::NoMatch | Evaluation::Failed => {}
            }
        });
    }

    pub async fn evaluate(&self, key: &MeterKey, level: f64) -> Evaluation {
        // ---
        let alert = match self.store.find_nearest_alert(key, level).await {
            Ok(Some(alert)) => alert,
            Ok(None) => {
                debug!(%key, level, "No alert threshold within band");
                return Evaluation::NoMatch;
            }
            Err(e) => {
                error!(%key, level, error = %e, "Nearest alert lookup failed");
                return Evaluation::Failed;
            }
        };

        let body = level_message(alert.percentage);
        debug!(%key, device_id = %alert.device_id, percentage = alert.percentage, "Alert threshold matched");

        match self.notifier.send(ALERT_HEADING, &body).await {
            Ok(Delivery::Sent) => Evaluation::Notified {
                device_id: alert.device_id,
                body,
            },
            Ok(Delivery::Disabled) => Evaluation::Suppressed {
                device_id: alert.device_id,
                body,
            },
            Err(e) => {
                warn!(device_id = %alert.device_id, error = %e, "Level alert delivery failed");
                Evaluation::Failed
            }
        }
    }
}
