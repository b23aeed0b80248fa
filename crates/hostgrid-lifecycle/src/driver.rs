//! Lifecycle driver — fires pending completions in real time.
//!
//! The driver owns the controller behind a mutex and runs a background
//! loop that sleeps until the next deadline, wakes early when a command
//! schedules new work, and exits on the shutdown signal. Callers issue
//! commands through a cloneable [`DriverHandle`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, Notify};
use tracing::{debug, info};

use hostgrid_state::{Deployment, StateResult};

use crate::controller::{LifecycleController, LifecycleEvent};

/// How long the loop sleeps when nothing is pending.
const IDLE_WAIT: Duration = Duration::from_secs(60);

pub struct LifecycleDriver {
    controller: Arc<Mutex<LifecycleController>>,
    wake: Arc<Notify>,
}

/// Cloneable command surface for a running driver.
#[derive(Clone)]
pub struct DriverHandle {
    controller: Arc<Mutex<LifecycleController>>,
    wake: Arc<Notify>,
}

impl LifecycleDriver {
    pub fn new(controller: LifecycleController) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn handle(&self) -> DriverHandle {
        DriverHandle {
            controller: self.controller.clone(),
            wake: self.wake.clone(),
        }
    }

    /// Run until `shutdown` flips (or its sender is dropped).
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("lifecycle driver started");

        loop {
            let wait = {
                let controller = self.controller.lock().await;
                let now = controller.clock().now_ms();
                controller
                    .next_deadline_ms()
                    .map(|due| Duration::from_millis(due.saturating_sub(now)))
                    .unwrap_or(IDLE_WAIT)
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    let events = self.controller.lock().await.tick();
                    log_events(&events);
                }
                _ = self.wake.notified() => {
                    debug!("lifecycle driver woken by command");
                }
                _ = shutdown.changed() => {
                    info!("lifecycle driver shutting down");
                    break;
                }
            }
        }
    }
}

fn log_events(events: &[LifecycleEvent]) {
    for event in events {
        match event {
            LifecycleEvent::Dropped { key } => debug!(?key, "completion dropped"),
            other => info!(event = ?other, "lifecycle completion"),
        }
    }
}

impl DriverHandle {
    pub async fn start_deployment(&self, id: &str) -> StateResult<()> {
        self.apply(|c| c.start_deployment(id)).await
    }

    pub async fn stop_deployment(&self, id: &str) -> StateResult<()> {
        self.apply(|c| c.stop_deployment(id)).await
    }

    pub async fn restart_deployment(&self, id: &str) -> StateResult<()> {
        self.apply(|c| c.restart_deployment(id)).await
    }

    pub async fn delete_deployment(&self, id: &str) -> StateResult<Deployment> {
        self.apply(|c| c.delete_deployment(id)).await
    }

    pub async fn start_service(&self, deployment_id: &str, service_id: &str) -> StateResult<()> {
        self.apply(|c| c.start_service(deployment_id, service_id)).await
    }

    pub async fn stop_service(&self, deployment_id: &str, service_id: &str) -> StateResult<()> {
        self.apply(|c| c.stop_service(deployment_id, service_id)).await
    }

    pub async fn scale_service(
        &self,
        deployment_id: &str,
        service_id: &str,
        replicas: u32,
    ) -> StateResult<()> {
        self.apply(|c| c.scale_service(deployment_id, service_id, replicas))
            .await
    }

    /// Read controller state under the lock.
    pub async fn read<R>(&self, f: impl FnOnce(&LifecycleController) -> R) -> R {
        let controller = self.controller.lock().await;
        f(&controller)
    }

    async fn apply<R>(&self, f: impl FnOnce(&mut LifecycleController) -> R) -> R {
        let result = {
            let mut controller = self.controller.lock().await;
            f(&mut controller)
        };
        // The command may have scheduled an earlier deadline.
        self.wake.notify_one();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TokioClock;
    use crate::placement::SeededPlacement;
    use hostgrid_state::*;

    fn store() -> DeploymentStore {
        DeploymentStore::from_deployments(vec![Deployment {
            id: "d1".to_string(),
            name: "api".to_string(),
            application: "api-app".to_string(),
            owner: "0xabc".to_string(),
            status: DeploymentStatus::Running,
            created_at: 0,
            lease: None,
            services: vec![Service {
                id: "s1".to_string(),
                name: "api".to_string(),
                image: "api:1".to_string(),
                desired_replicas: 1,
                status: ServiceStatus::Running,
                uptime: 100.0,
                resources: ResourceRequest::default(),
                replicas: vec![Replica {
                    id: "s1-0".to_string(),
                    name: "api-abcde".to_string(),
                    status: ReplicaStatus::Running,
                    node: Some(NodeAssignment {
                        node_id: "node-1".to_string(),
                        node_name: "worker-01".to_string(),
                    }),
                    started_at: None,
                    uptime: Some(100.0),
                }],
                summary: ReplicaCountSummary {
                    running: 1,
                    total: 1,
                    ..Default::default()
                },
            }],
        }])
    }

    fn driver() -> LifecycleDriver {
        let placement = SeededPlacement::from_settings(&hostgrid_core::PlacementSettings {
            seed: Some(3),
            ..Default::default()
        })
        .unwrap();
        LifecycleDriver::new(LifecycleController::new(
            store(),
            Arc::new(TokioClock::new()),
            Box::new(placement),
            Duration::from_millis(2000),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn scale_up_reconciles_in_background() {
        let driver = driver();
        let handle = driver.handle();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(driver.run(shutdown_rx));

        handle.scale_service("d1", "s1", 4).await.unwrap();
        let summary = handle
            .read(|c| c.service("d1", "s1").map(|s| s.summary))
            .await
            .unwrap();
        assert_eq!((summary.running, summary.pending, summary.total), (1, 3, 4));

        tokio::time::sleep(Duration::from_millis(2100)).await;

        let summary = handle
            .read(|c| c.service("d1", "s1").map(|s| s.summary))
            .await
            .unwrap();
        assert_eq!((summary.running, summary.pending, summary.total), (4, 0, 4));

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_settles_without_manual_tick() {
        let driver = driver();
        let handle = driver.handle();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(driver.run(shutdown_rx));

        handle.stop_deployment("d1").await.unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let status = handle.read(|c| c.deployment("d1").map(|d| d.status)).await;
        assert_eq!(status, Some(DeploymentStatus::Stopping));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let status = handle.read(|c| c.deployment("d1").map(|d| d.status)).await;
        assert_eq!(status, Some(DeploymentStatus::Stopped));

        drop(shutdown_tx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn errors_pass_through_handle() {
        let driver = driver();
        let handle = driver.handle();
        let err = handle.start_service("d1", "missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(handle.delete_deployment("d1").await.is_ok());
        assert!(handle.read(|c| c.deployments().is_empty()).await);
    }
}
