//! Badge counters sourced from the native layer.
//!
//! Three counters are published over `watch` channels so any number of
//! views can show the latest value:
//!
//! - superuser count: privileged UIDs minus the manager's own entry
//! - APM module count: length of the native module listing
//! - kernel module count: reported directly by the native layer
//!
//! Every native failure degrades the affected counter to zero and is logged.

use crate::models::CountSnapshot;
use crate::native::NativeBridge;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How the managing application's own privileged entry is excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManagerExclusion {
    /// The manager always occupies exactly one slot: subtract one, floor at 0
    #[default]
    ReservedSlot,
    /// Drop every entry matching the manager's UID
    Uid(u32),
}

impl ManagerExclusion {
    pub fn count(&self, uids: &[u32]) -> usize {
        match self {
            ManagerExclusion::ReservedSlot => uids.len().saturating_sub(1),
            ManagerExclusion::Uid(own) => uids.iter().filter(|uid| *uid != own).count(),
        }
    }
}

pub struct CountAggregator {
    bridge: Arc<dyn NativeBridge>,
    exclusion: ManagerExclusion,
    superuser_tx: watch::Sender<usize>,
    apm_module_tx: watch::Sender<usize>,
    kernel_module_tx: watch::Sender<usize>,
}

impl CountAggregator {
    pub fn new(bridge: Arc<dyn NativeBridge>) -> Self {
        Self::with_exclusion(bridge, ManagerExclusion::default())
    }

    pub fn with_exclusion(bridge: Arc<dyn NativeBridge>, exclusion: ManagerExclusion) -> Self {
        let (superuser_tx, _) = watch::channel(0);
        let (apm_module_tx, _) = watch::channel(0);
        let (kernel_module_tx, _) = watch::channel(0);
        CountAggregator {
            bridge,
            exclusion,
            superuser_tx,
            apm_module_tx,
            kernel_module_tx,
        }
    }

    pub fn superuser_count(&self) -> watch::Receiver<usize> {
        self.superuser_tx.subscribe()
    }

    pub fn apm_module_count(&self) -> watch::Receiver<usize> {
        self.apm_module_tx.subscribe()
    }

    pub fn kernel_module_count(&self) -> watch::Receiver<usize> {
        self.kernel_module_tx.subscribe()
    }

    /// Latest published values.
    pub fn snapshot(&self) -> CountSnapshot {
        CountSnapshot {
            superuser_count: *self.superuser_tx.borrow(),
            apm_module_count: *self.apm_module_tx.borrow(),
            kernel_module_count: *self.kernel_module_tx.borrow(),
        }
    }

    /// Query the native layer off the async executor and publish the results.
    pub async fn refresh(&self) -> CountSnapshot {
        let bridge = Arc::clone(&self.bridge);
        let exclusion = self.exclusion;

        let task = tokio::task::spawn_blocking(move || query_counts(bridge.as_ref(), exclusion));
        let snapshot = match task.await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!("[Counts] Refresh task failed: {}", e);
                CountSnapshot::default()
            }
        };

        self.superuser_tx.send_replace(snapshot.superuser_count);
        self.apm_module_tx.send_replace(snapshot.apm_module_count);
        self.kernel_module_tx.send_replace(snapshot.kernel_module_count);

        log::debug!(
            "[Counts] superuser={} apm={} kpm={}",
            snapshot.superuser_count,
            snapshot.apm_module_count,
            snapshot.kernel_module_count
        );
        snapshot
    }

    /// Refresh on a fixed interval until `cancel_rx` turns true or its
    /// sender is dropped. The first refresh happens immediately.
    pub fn spawn_periodic(
        self: Arc<Self>,
        period: Duration,
        mut cancel_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                if *cancel_rx.borrow() {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => {
                        self.refresh().await;
                    }
                    changed = cancel_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            log::debug!("[Counts] Periodic refresh stopped");
        })
    }
}

fn query_counts(bridge: &dyn NativeBridge, exclusion: ManagerExclusion) -> CountSnapshot {
    CountSnapshot {
        superuser_count: superuser_count(bridge, exclusion),
        apm_module_count: apm_module_count(bridge),
        kernel_module_count: kernel_module_count(bridge),
    }
}

fn superuser_count(bridge: &dyn NativeBridge, exclusion: ManagerExclusion) -> usize {
    match bridge.privileged_uids() {
        Ok(uids) => exclusion.count(&uids),
        Err(e) => {
            log::error!("[Counts] Failed to get superuser count: {}", e);
            0
        }
    }
}

fn apm_module_count(bridge: &dyn NativeBridge) -> usize {
    let listing = match bridge.list_modules() {
        Ok(listing) => listing,
        Err(e) => {
            log::error!("[Counts] Failed to get APM module count: {}", e);
            return 0;
        }
    };

    match serde_json::from_str::<Vec<serde_json::Value>>(&listing) {
        Ok(modules) => modules.len(),
        Err(e) => {
            log::error!("[Counts] Module listing is not a JSON array: {}", e);
            0
        }
    }
}

fn kernel_module_count(bridge: &dyn NativeBridge) -> usize {
    match bridge.kernel_module_count() {
        Ok(n) => usize::try_from(n).unwrap_or(0),
        Err(e) => {
            log::error!("[Counts] Failed to get kernel module count: {}", e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NativeError;
    use crate::native::UnavailableBridge;

    struct FixedBridge {
        uids: Vec<u32>,
        modules: &'static str,
        kpms: i64,
    }

    impl NativeBridge for FixedBridge {
        fn privileged_uids(&self) -> Result<Vec<u32>, NativeError> {
            Ok(self.uids.clone())
        }

        fn list_modules(&self) -> Result<String, NativeError> {
            Ok(self.modules.to_string())
        }

        fn kernel_module_count(&self) -> Result<i64, NativeError> {
            Ok(self.kpms)
        }
    }

    #[test]
    fn test_reserved_slot_exclusion() {
        assert_eq!(ManagerExclusion::ReservedSlot.count(&[]), 0);
        assert_eq!(ManagerExclusion::ReservedSlot.count(&[2000]), 0);
        assert_eq!(ManagerExclusion::ReservedSlot.count(&[2000, 10123, 10200]), 2);
    }

    #[test]
    fn test_uid_exclusion() {
        let exclusion = ManagerExclusion::Uid(10050);
        assert_eq!(exclusion.count(&[]), 0);
        assert_eq!(exclusion.count(&[10123, 10200]), 2);
        assert_eq!(exclusion.count(&[10050, 10123, 10050]), 1);
    }

    #[tokio::test]
    async fn test_refresh_publishes_counts() {
        let bridge = FixedBridge {
            uids: vec![0, 2000, 10123],
            modules: r#"[{"id":"a"},{"id":"b"},{"id":"c"}]"#,
            kpms: 4,
        };
        let aggregator = CountAggregator::new(Arc::new(bridge));
        let su_rx = aggregator.superuser_count();

        let snapshot = aggregator.refresh().await;
        assert_eq!(
            snapshot,
            CountSnapshot {
                superuser_count: 2,
                apm_module_count: 3,
                kernel_module_count: 4,
            }
        );
        assert_eq!(*su_rx.borrow(), 2);
        assert_eq!(*aggregator.apm_module_count().borrow(), 3);
        assert_eq!(*aggregator.kernel_module_count().borrow(), 4);
        assert_eq!(aggregator.snapshot(), snapshot);
    }

    #[tokio::test]
    async fn test_native_failure_yields_zero() {
        let aggregator = CountAggregator::new(Arc::new(UnavailableBridge));
        assert_eq!(aggregator.refresh().await, CountSnapshot::default());
    }

    #[tokio::test]
    async fn test_bad_listing_and_negative_count_yield_zero() {
        let bridge = FixedBridge {
            uids: vec![2000, 10123],
            modules: "{not an array}",
            kpms: -1,
        };
        let aggregator = CountAggregator::new(Arc::new(bridge));

        let snapshot = aggregator.refresh().await;
        assert_eq!(snapshot.superuser_count, 1);
        assert_eq!(snapshot.apm_module_count, 0);
        assert_eq!(snapshot.kernel_module_count, 0);
    }

    #[tokio::test]
    async fn test_periodic_refresh_stops_on_cancel() {
        let bridge = FixedBridge {
            uids: vec![2000, 10123, 10124],
            modules: "[]",
            kpms: 1,
        };
        let aggregator = Arc::new(CountAggregator::new(Arc::new(bridge)));
        let mut su_rx = aggregator.superuser_count();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let handle = Arc::clone(&aggregator).spawn_periodic(Duration::from_millis(10), cancel_rx);

        su_rx.changed().await.unwrap();
        assert_eq!(*su_rx.borrow(), 2);

        cancel_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("periodic task should stop after cancel")
            .unwrap();
    }
}
