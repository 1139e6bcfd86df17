use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::alerts::AlertsClient;
use crate::api::types::Alert;

pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Latest result of the active-alerts query.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Last successful response. Kept when a later refresh fails.
    pub alerts: Option<Vec<Alert>>,
    pub error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Number of completed fetches.
    pub version: u64,
}

impl Snapshot {
    pub fn is_loading(&self) -> bool {
        self.alerts.is_none() && self.error.is_none()
    }
}

/// Re-runs `list_active` on a fixed interval in a background task.
///
/// The first fetch starts immediately. [`ActiveAlerts::invalidate`] forces a
/// fetch out of band and restarts the interval from there.
pub struct ActiveAlerts {
    snapshot: watch::Receiver<Snapshot>,
    refetch: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ActiveAlerts {
    pub fn spawn(client: AlertsClient, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(Snapshot::default());
        let refetch = Arc::new(Notify::new());

        let task = tokio::spawn(poll(client, interval, tx, refetch.clone()));

        Self {
            snapshot: rx,
            refetch,
            task,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.clone()
    }

    pub fn invalidate(&self) {
        self.refetch.notify_one();
    }
}

impl Drop for ActiveAlerts {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll(
    client: AlertsClient,
    interval: Duration,
    tx: watch::Sender<Snapshot>,
    refetch: Arc<Notify>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = refetch.notified() => ticker.reset(),
        }

        let result = client.list_active().await;

        tx.send_modify(|snapshot| {
            match result {
                Ok(alerts) => {
                    snapshot.alerts = Some(alerts);
                    snapshot.error = None;
                }
                Err(e) => {
                    log::warn!("active alerts refresh failed: {e}");
                    snapshot.error = Some(e.to_string());
                }
            }
            snapshot.refreshed_at = Some(Utc::now());
            snapshot.version += 1;
        });

        if tx.is_closed() {
            break;
        }
    }
}
