//! Resource aggregation and fleet statistics.
//!
//! Pure read-side helpers: nothing here mutates state or drives
//! transitions.

use serde::Serialize;

use crate::types::*;

/// Summed resource quantities.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct ResourceTotals {
    pub cpu: f64,
    pub memory_gb: f64,
    pub storage_gb: f64,
    pub gpu: u64,
}

impl std::ops::Add for ResourceTotals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            cpu: self.cpu + rhs.cpu,
            memory_gb: self.memory_gb + rhs.memory_gb,
            storage_gb: self.storage_gb + rhs.storage_gb,
            gpu: self.gpu.saturating_add(rhs.gpu),
        }
    }
}

impl std::iter::Sum for ResourceTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, t| acc + t)
    }
}

/// Per-replica request × desired replicas, summed over services.
///
/// GPU counts are widened to `u64` before multiplying, so any `u32`
/// request and replica count fit; the running sum saturates.
pub fn sum_resources(services: &[Service]) -> ResourceTotals {
    services
        .iter()
        .map(|s| {
            let replicas = s.desired_replicas;
            let n = f64::from(replicas);
            ResourceTotals {
                cpu: s.resources.cpu * n,
                memory_gb: s.resources.memory_gb * n,
                storage_gb: s.resources.storage_gb * n,
                gpu: u64::from(s.resources.gpu.unwrap_or(0)) * u64::from(replicas),
            }
        })
        .sum()
}

/// [`sum_resources`] over every deployment.
pub fn sum_across_deployments(deployments: &[Deployment]) -> ResourceTotals {
    deployments.iter().map(|d| sum_resources(&d.services)).sum()
}

impl Deployment {
    /// Resources requested by all services at their desired replica counts.
    pub fn total_resources(&self) -> ResourceTotals {
        sum_resources(&self.services)
    }
}

/// Fleet-wide counters for a statistics view.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct FleetSummary {
    pub deployments: usize,
    pub running_deployments: usize,
    pub transitioning_deployments: usize,
    pub stopped_deployments: usize,
    pub failed_deployments: usize,
    pub services: usize,
    pub running_replicas: u64,
    pub pending_replicas: u64,
    pub resources: ResourceTotals,
}

impl FleetSummary {
    pub fn from_deployments(deployments: &[Deployment]) -> Self {
        let mut summary = FleetSummary {
            deployments: deployments.len(),
            resources: sum_across_deployments(deployments),
            ..Default::default()
        };

        for d in deployments {
            match d.status {
                DeploymentStatus::Running => summary.running_deployments += 1,
                DeploymentStatus::Pending
                | DeploymentStatus::Starting
                | DeploymentStatus::Stopping => summary.transitioning_deployments += 1,
                DeploymentStatus::Stopped => summary.stopped_deployments += 1,
                DeploymentStatus::Failed => summary.failed_deployments += 1,
            }
            summary.services += d.services.len();
            for s in &d.services {
                summary.running_replicas = summary
                    .running_replicas
                    .saturating_add(u64::from(s.summary.running));
                summary.pending_replicas = summary
                    .pending_replicas
                    .saturating_add(u64::from(s.summary.pending));
            }
        }

        summary
    }
}
