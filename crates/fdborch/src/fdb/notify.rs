//! Notification pipeline: the background task that drains the change
//! tracker and hands batches to the subscriber outside the fdb lock.

use super::orch::FdbOrch;
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::config::ShutdownPolicy;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What happened to pending notifications when the pipeline stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Delivered while stopping
    pub delivered: usize,
    /// Still pending after the task exited
    pub abandoned: usize,
}

/// Handle to the running pipeline task. Dropping it cancels the task
/// without waiting; use [`NotificationPipeline::shutdown`] to stop cleanly.
pub struct NotificationPipeline {
    cancel: CancellationToken,
    handle: Option<JoinHandle<ShutdownReport>>,
}

impl NotificationPipeline {
    /// Spawns the pipeline on the current tokio runtime.
    pub fn spawn(orch: Arc<FdbOrch>, policy: ShutdownPolicy) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(orch, cancel.clone(), policy));
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Stops the task and waits for it. The batch in flight always completes.
    pub async fn shutdown(mut self) -> ShutdownReport {
        self.cancel.cancel();
        let Some(handle) = self.handle.take() else {
            return ShutdownReport::default();
        };
        match handle.await {
            Ok(report) => report,
            Err(e) => {
                error_log!("FdbOrch", error = %e, "notification pipeline task failed");
                ShutdownReport::default()
            }
        }
    }
}

impl Drop for NotificationPipeline {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(orch: Arc<FdbOrch>, cancel: CancellationToken, policy: ShutdownPolicy) -> ShutdownReport {
    audit_log!(AuditRecord::new(
        AuditCategory::Lifecycle,
        "FdbOrch",
        "notification_pipeline_start"
    )
    .with_outcome(AuditOutcome::Success)
    .with_details(serde_json::json!({
        "batch_size": orch.config().notification_batch_size,
        "shutdown_policy": policy,
    })));

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = orch.notified() => {
                while !cancel.is_cancelled() {
                    let worker = Arc::clone(&orch);
                    match tokio::task::spawn_blocking(move || worker.deliver_batch()).await {
                        Ok(0) => break,
                        Ok(n) => debug_log!("FdbOrch", count = n, "delivered notification batch"),
                        Err(e) => {
                            error_log!("FdbOrch", error = %e, "notification callback panicked");
                            break;
                        }
                    }
                }
            }
        }
    }

    let delivered = match policy {
        ShutdownPolicy::Drain => {
            let worker = Arc::clone(&orch);
            match tokio::task::spawn_blocking(move || worker.deliver_pending()).await {
                Ok(n) => n,
                Err(e) => {
                    error_log!("FdbOrch", error = %e, "notification callback panicked during drain");
                    0
                }
            }
        }
        ShutdownPolicy::Drop => 0,
    };
    let abandoned = orch.pending_notifications();
    if abandoned > 0 {
        warn_log!("FdbOrch", abandoned, policy = ?policy, "undelivered notifications at shutdown");
    }

    audit_log!(AuditRecord::new(
        AuditCategory::Lifecycle,
        "FdbOrch",
        "notification_pipeline_stop"
    )
    .with_outcome(AuditOutcome::Success)
    .with_details(serde_json::json!({
        "shutdown_policy": policy,
        "delivered": delivered,
        "abandoned": abandoned,
    })));

    ShutdownReport {
        delivered,
        abandoned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FdbOrchConfig;
    use crate::fdb::locks::ModuleLocks;
    use crate::fdb::types::{FdbAttribute, FdbEntryType, FdbKey, FdbNotification, PacketAction};
    use crate::sim::{SimulatedFdbHardware, SimulatedL2Topology};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use sonic_sai::{BridgePortOid, PortOid};
    use sonic_types::{MacAddress, VlanId};
    use std::time::Duration;

    fn vlan() -> VlanId {
        VlanId::new(30).unwrap()
    }

    fn key(last: u8) -> FdbKey {
        FdbKey::vlan(vlan(), MacAddress::new([0x02, 0xaa, 0, 0, 0, last]))
    }

    fn orch() -> Arc<FdbOrch> {
        let topo = SimulatedL2Topology::new()
            .with_vlan(vlan())
            .with_port_bridge_port(BridgePortOid::from_index(1), PortOid::from_index(1));
        let orch = FdbOrch::new(
            FdbOrchConfig::default(),
            Arc::new(SimulatedFdbHardware::new(16384)),
            Arc::new(topo),
            Arc::new(ModuleLocks::new()),
        );
        orch.init().unwrap();
        orch
    }

    fn create(orch: &FdbOrch, last: u8) {
        orch.register_entry(key(last));
        orch.create_entry(
            key(last),
            &[
                FdbAttribute::Type(FdbEntryType::Dynamic),
                FdbAttribute::PacketAction(PacketAction::Forward),
                FdbAttribute::BridgePort(BridgePortOid::from_index(1)),
            ],
        )
        .unwrap();
    }

    fn recorder(orch: &FdbOrch) -> Arc<Mutex<Vec<FdbNotification>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        orch.set_notification_callback(Arc::new(move |batch: &[FdbNotification]| {
            sink.lock().extend_from_slice(batch);
        }));
        seen
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pipeline_delivers_on_wake() {
        let orch = orch();
        let seen = recorder(&orch);
        let pipeline = NotificationPipeline::spawn(orch.clone(), ShutdownPolicy::Drain);

        create(&orch, 1);
        create(&orch, 2);

        for _ in 0..200 {
            if seen.lock().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(seen.lock().len(), 2);
        assert_eq!(orch.pending_notifications(), 0);

        let report = pipeline.shutdown().await;
        assert_eq!(report.abandoned, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_drain_policy_delivers_everything() {
        let orch = orch();
        for i in 1..=5 {
            create(&orch, i);
        }
        let pipeline = NotificationPipeline::spawn(orch.clone(), ShutdownPolicy::Drain);
        let seen = recorder(&orch);

        let report = pipeline.shutdown().await;
        assert_eq!(report.abandoned, 0);
        assert_eq!(seen.lock().len(), 5);
        assert_eq!(orch.pending_notifications(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_drop_policy_reports_abandoned() {
        let orch = orch();
        create(&orch, 1);
        create(&orch, 2);

        let pipeline = NotificationPipeline::spawn(orch.clone(), ShutdownPolicy::Drop);
        let report = pipeline.shutdown().await;
        assert_eq!(
            report,
            ShutdownReport {
                delivered: 0,
                abandoned: 2
            }
        );
        assert_eq!(orch.pending_notifications(), 2);
    }
}
