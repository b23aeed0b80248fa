//! Lifecycle controller — drives deployment and service state machines.
//!
//! Every command applies an immediate transition (`starting`, `stopping`,
//! a resized replica set) and registers a deferred completion in the
//! [`TimerTable`]. [`LifecycleController::tick`] fires completions whose
//! deadline has passed. A completion whose target has disappeared in the
//! meantime is dropped without touching state.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use hostgrid_core::HostgridConfig;
use hostgrid_state::*;

use crate::clock::{duration_ms, Clock};
use crate::placement::{PlacementSource, SeededPlacement};
use crate::timers::{Completion, DeploymentAction, ServiceAction, TimerKey, TimerTable};

/// Outcome of a fired completion.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// A deployment reached its final state (services cascaded).
    DeploymentSettled {
        deployment: DeploymentId,
        status: DeploymentStatus,
    },
    /// A service reached its final state.
    ServiceSettled {
        deployment: DeploymentId,
        service: ServiceId,
        status: ServiceStatus,
    },
    /// Pending replicas were placed on nodes.
    ReplicasPlaced {
        deployment: DeploymentId,
        service: ServiceId,
        placed: usize,
    },
    /// The target no longer exists; nothing changed.
    Dropped { key: TimerKey },
}

/// Owns the fleet and every pending completion.
pub struct LifecycleController {
    store: DeploymentStore,
    clock: Arc<dyn Clock>,
    placement: Box<dyn PlacementSource>,
    timers: TimerTable,
    transition_delay: Duration,
}

impl LifecycleController {
    /// Create a controller over `store`.
    pub fn new(
        store: DeploymentStore,
        clock: Arc<dyn Clock>,
        placement: Box<dyn PlacementSource>,
        transition_delay: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            placement,
            timers: TimerTable::new(),
            transition_delay,
        }
    }

    /// Create a controller with delay and placement taken from config.
    pub fn from_config(
        store: DeploymentStore,
        clock: Arc<dyn Clock>,
        config: &HostgridConfig,
    ) -> anyhow::Result<Self> {
        let placement = SeededPlacement::from_settings(&config.placement)?;
        Ok(Self::new(
            store,
            clock,
            Box::new(placement),
            config.lifecycle.transition_delay(),
        ))
    }

    // ── Deployment commands ────────────────────────────────────────

    /// `starting` now; `running` with every service up (uptime 100) after the delay.
    pub fn start_deployment(&mut self, id: &str) -> StateResult<()> {
        self.begin_deployment(id, DeploymentStatus::Starting, DeploymentAction::Start)
    }

    /// `stopping` now; `stopped` with every service down (uptime 0) after the delay.
    pub fn stop_deployment(&mut self, id: &str) -> StateResult<()> {
        self.begin_deployment(id, DeploymentStatus::Stopping, DeploymentAction::Stop)
    }

    /// `starting` now; `running` after the delay. Uptime is left as is.
    pub fn restart_deployment(&mut self, id: &str) -> StateResult<()> {
        self.begin_deployment(id, DeploymentStatus::Starting, DeploymentAction::Restart)
    }

    /// Remove a deployment immediately, cancelling everything pending for it.
    pub fn delete_deployment(&mut self, id: &str) -> StateResult<Deployment> {
        let removed = self
            .store
            .delete_deployment(id)
            .ok_or_else(|| StateError::DeploymentNotFound(id.to_string()))?;
        let cancelled = self.timers.cancel_deployment(id);
        info!(deployment = %id, cancelled, "deployment deleted");
        Ok(removed)
    }

    fn begin_deployment(
        &mut self,
        id: &str,
        transient: DeploymentStatus,
        action: DeploymentAction,
    ) -> StateResult<()> {
        let deployment = self.store.require_deployment_mut(id)?;
        let from = deployment.status;
        deployment.status = transient;

        // The cascade supersedes any per-service start/stop still in flight.
        let superseded = self
            .timers
            .cancel_where(|key| {
                matches!(key, TimerKey::Service { deployment, .. } if deployment == id)
            });

        let due = self.due_ms();
        self.timers.schedule(
            due,
            Completion::Deployment {
                deployment: id.to_string(),
                action,
            },
        );
        info!(
            deployment = %id,
            %from,
            to = %transient,
            ?action,
            superseded,
            due_ms = due,
            "deployment transition started"
        );
        Ok(())
    }

    // ── Service commands ───────────────────────────────────────────

    /// `starting` now; `running` with uptime 100 after the delay.
    pub fn start_service(&mut self, deployment_id: &str, service_id: &str) -> StateResult<()> {
        self.begin_service(
            deployment_id,
            service_id,
            ServiceStatus::Starting,
            ServiceAction::Start,
        )
    }

    /// `stopping` now; `stopped` with uptime 0 after the delay.
    pub fn stop_service(&mut self, deployment_id: &str, service_id: &str) -> StateResult<()> {
        self.begin_service(
            deployment_id,
            service_id,
            ServiceStatus::Stopping,
            ServiceAction::Stop,
        )
    }

    fn begin_service(
        &mut self,
        deployment_id: &str,
        service_id: &str,
        transient: ServiceStatus,
        action: ServiceAction,
    ) -> StateResult<()> {
        let service = self.store.require_service_mut(deployment_id, service_id)?;
        let from = service.status;
        service.status = transient;

        let due = self.due_ms();
        let replaced = self.timers.schedule(
            due,
            Completion::Service {
                deployment: deployment_id.to_string(),
                service: service_id.to_string(),
                action,
            },
        );
        info!(
            deployment = %deployment_id,
            service = %service_id,
            %from,
            to = %transient,
            replaced = replaced.is_some(),
            due_ms = due,
            "service transition started"
        );
        Ok(())
    }

    // ── Scaling ────────────────────────────────────────────────────

    /// Set a service's desired replica count.
    ///
    /// Growing appends pending, unplaced replicas and schedules their
    /// placement after the delay. Shrinking truncates the newest replicas
    /// immediately and schedules nothing. Counts above [`MAX_REPLICAS`]
    /// are rejected before anything changes.
    pub fn scale_service(
        &mut self,
        deployment_id: &str,
        service_id: &str,
        replicas: u32,
    ) -> StateResult<()> {
        check_replica_count(replicas)?;
        let service = self.store.require_service_mut(deployment_id, service_id)?;
        let previous = service.desired_replicas;
        let current_running = service.summary.running;
        let target_len = replicas as usize;

        while service.replicas.len() < target_len {
            let id = service.replica_id(service.replicas.len());
            let name = format!("{}-{}", service.name, self.placement.name_suffix());
            service.replicas.push(Replica::pending(id, name));
        }
        service.replicas.truncate(target_len);

        service.summary = ReplicaCountSummary {
            running: current_running.min(replicas),
            pending: replicas.saturating_sub(current_running),
            total: replicas,
            ..service.summary
        };
        service.desired_replicas = replicas;
        let summary = service.summary;

        if replicas > previous {
            let due = self.due_ms();
            self.timers.schedule(
                due,
                Completion::Reconcile {
                    deployment: deployment_id.to_string(),
                    service: service_id.to_string(),
                },
            );
            info!(
                deployment = %deployment_id,
                service = %service_id,
                from = previous,
                to = replicas,
                pending = summary.pending,
                due_ms = due,
                "scaled up"
            );
        } else if replicas < previous {
            info!(
                deployment = %deployment_id,
                service = %service_id,
                from = previous,
                to = replicas,
                "scaled down"
            );
        } else {
            debug!(
                deployment = %deployment_id,
                service = %service_id,
                replicas,
                "already at target, summary recomputed"
            );
        }
        Ok(())
    }

    // ── Timer processing ───────────────────────────────────────────

    /// Fire every completion that is due. Returns what happened, in order.
    pub fn tick(&mut self) -> Vec<LifecycleEvent> {
        let now = self.clock.now_ms();
        self.timers
            .take_due(now)
            .into_iter()
            .map(|completion| self.complete(completion, now))
            .collect()
    }

    fn complete(&mut self, completion: Completion, now: u64) -> LifecycleEvent {
        let key = completion.key();
        let event = match completion {
            Completion::Deployment { deployment, action } => {
                self.finish_deployment(deployment, action)
            }
            Completion::Service {
                deployment,
                service,
                action,
            } => self.finish_service(deployment, service, action),
            Completion::Reconcile {
                deployment,
                service,
            } => self.place_pending(deployment, service, now),
        };
        event.unwrap_or_else(|| {
            debug!(?key, "completion target gone, dropped");
            LifecycleEvent::Dropped { key }
        })
    }

    fn finish_deployment(
        &mut self,
        deployment_id: DeploymentId,
        action: DeploymentAction,
    ) -> Option<LifecycleEvent> {
        let deployment = self.store.get_deployment_mut(&deployment_id)?;
        let (status, service_status, uptime) = match action {
            DeploymentAction::Start => {
                (DeploymentStatus::Running, ServiceStatus::Running, Some(100.0))
            }
            DeploymentAction::Stop => {
                (DeploymentStatus::Stopped, ServiceStatus::Stopped, Some(0.0))
            }
            DeploymentAction::Restart => (DeploymentStatus::Running, ServiceStatus::Running, None),
        };

        deployment.status = status;
        for service in &mut deployment.services {
            service.status = service_status;
            if let Some(uptime) = uptime {
                service.uptime = uptime;
            }
        }
        debug!(
            deployment = %deployment_id,
            %status,
            services = deployment.services.len(),
            "deployment settled"
        );
        Some(LifecycleEvent::DeploymentSettled {
            deployment: deployment_id,
            status,
        })
    }

    fn finish_service(
        &mut self,
        deployment_id: DeploymentId,
        service_id: ServiceId,
        action: ServiceAction,
    ) -> Option<LifecycleEvent> {
        let service = self
            .store
            .get_deployment_mut(&deployment_id)?
            .service_mut(&service_id)?;
        let (status, uptime) = match action {
            ServiceAction::Start => (ServiceStatus::Running, 100.0),
            ServiceAction::Stop => (ServiceStatus::Stopped, 0.0),
        };
        service.status = status;
        service.uptime = uptime;
        debug!(deployment = %deployment_id, service = %service_id, %status, "service settled");
        Some(LifecycleEvent::ServiceSettled {
            deployment: deployment_id,
            service: service_id,
            status,
        })
    }

    fn place_pending(
        &mut self,
        deployment_id: DeploymentId,
        service_id: ServiceId,
        now: u64,
    ) -> Option<LifecycleEvent> {
        let service = self
            .store
            .get_deployment_mut(&deployment_id)?
            .service_mut(&service_id)?;

        service.summary.running = service.desired_replicas;
        service.summary.pending = 0;

        let mut placed = 0;
        for replica in service
            .replicas
            .iter_mut()
            .filter(|r| r.status == ReplicaStatus::Pending)
        {
            // Status and node change together.
            replica.node = Some(self.placement.pick_node());
            replica.status = ReplicaStatus::Running;
            replica.started_at = Some(now);
            replica.uptime = Some(100.0);
            placed += 1;
        }
        debug!(
            deployment = %deployment_id,
            service = %service_id,
            placed,
            running = service.summary.running,
            "pending replicas placed"
        );
        Some(LifecycleEvent::ReplicasPlaced {
            deployment: deployment_id,
            service: service_id,
            placed,
        })
    }

    fn due_ms(&self) -> u64 {
        self.clock
            .now_ms()
            .saturating_add(duration_ms(self.transition_delay))
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// Add (or replace) a deployment accepted elsewhere.
    pub fn put_deployment(&mut self, deployment: Deployment) {
        self.store.put_deployment(deployment);
    }

    pub fn deployment(&self, id: &str) -> Option<&Deployment> {
        self.store.get_deployment(id)
    }

    pub fn deployments(&self) -> &[Deployment] {
        self.store.list_deployments()
    }

    pub fn service(&self, deployment_id: &str, service_id: &str) -> StateResult<&Service> {
        self.store.require_service(deployment_id, service_id)
    }

    pub fn store(&self) -> &DeploymentStore {
        &self.store
    }

    /// Resources requested by one deployment.
    pub fn total_resources(&self, deployment_id: &str) -> StateResult<ResourceTotals> {
        Ok(self.store.require_deployment(deployment_id)?.total_resources())
    }

    /// Resources requested across the fleet.
    pub fn fleet_resources(&self) -> ResourceTotals {
        sum_across_deployments(self.store.list_deployments())
    }

    pub fn fleet_summary(&self) -> FleetSummary {
        FleetSummary::from_deployments(self.store.list_deployments())
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_pending(&self, key: &TimerKey) -> bool {
        self.timers.contains(key)
    }

    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
