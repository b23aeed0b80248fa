//! Domain types for the hostgrid lifecycle core.
//!
//! These types describe deployments, their services and the replica sets
//! backing each service. All types are serializable to/from JSON so a
//! fleet can be loaded from a fixture file.

use serde::{Deserialize, Serialize};

/// Unique identifier for a deployment.
pub type DeploymentId = String;

/// Identifier for a service, unique within its deployment.
pub type ServiceId = String;

/// Identifier for a replica, derived from its service id and ordinal.
pub type ReplicaId = String;

/// Unique identifier for a provider node.
pub type NodeId = String;

// ── Deployment ─────────────────────────────────────────────────────

/// A user's running application instance, composed of services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deployment {
    pub id: DeploymentId,
    pub name: String,
    /// Name of the application bundle this deployment was created from.
    pub application: String,
    /// Owner address or display name.
    pub owner: String,
    pub status: DeploymentStatus,
    /// Unix timestamp (milliseconds) when the deployment request was accepted.
    #[serde(default)]
    pub created_at: u64,
    /// Lease metadata from the provider that accepted the deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease: Option<LeaseInfo>,
    #[serde(default)]
    pub services: Vec<Service>,
}

/// Provider lease attached to a deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaseInfo {
    /// Provider address or name.
    pub provider: String,
    pub price_per_hour: f64,
    /// Unix timestamp (milliseconds) when the lease ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

/// Lifecycle status of a deployment.
///
/// `Failed` is only ever supplied from outside (the orchestrator); the
/// lifecycle controller never produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

// ── Service ───────────────────────────────────────────────────────

/// One container workload inside a deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    /// Container image reference.
    pub image: String,
    pub desired_replicas: u32,
    pub status: ServiceStatus,
    /// Uptime percentage (0–100). Display only.
    #[serde(default)]
    pub uptime: f64,
    /// Resource request per replica.
    pub resources: ResourceRequest,
    #[serde(default)]
    pub replicas: Vec<Replica>,
    #[serde(default)]
    pub summary: ReplicaCountSummary,
}

/// Lifecycle status of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Pending,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Per-replica resource request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResourceRequest {
    /// CPU cores (fractional allowed).
    pub cpu: f64,
    pub memory_gb: f64,
    pub storage_gb: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<u32>,
}

// ── Replica ───────────────────────────────────────────────────────

/// One instance of a service, analogous to a pod.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Replica {
    pub id: ReplicaId,
    /// Service name plus a short random suffix.
    pub name: String,
    pub status: ReplicaStatus,
    /// Set only once the replica has been scheduled onto a node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeAssignment>,
    /// Unix timestamp (milliseconds) when the replica started running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<f64>,
}

/// Status of a single replica. Stopped replicas are removed, not flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicaStatus {
    Pending,
    Running,
    Failed,
    Succeeded,
}

/// Node a replica has been placed on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeAssignment {
    pub node_id: NodeId,
    pub node_name: String,
}

/// Denormalized replica counts kept beside the service for display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ReplicaCountSummary {
    pub running: u32,
    pub pending: u32,
    pub failed: u32,
    pub succeeded: u32,
    pub total: u32,
}

impl Deployment {
    /// Look up a service by id.
    pub fn service(&self, service_id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == service_id)
    }

    /// Mutable lookup of a service by id.
    pub fn service_mut(&mut self, service_id: &str) -> Option<&mut Service> {
        self.services.iter_mut().find(|s| s.id == service_id)
    }

    /// The status every service shares, or `None` if they diverge (or
    /// there are no services).
    ///
    /// Deployment status is tracked independently of its services; this
    /// lets callers detect when the two have drifted apart.
    pub fn uniform_service_status(&self) -> Option<ServiceStatus> {
        let first = self.services.first()?.status;
        self.services
            .iter()
            .all(|s| s.status == first)
            .then_some(first)
    }
}

impl Service {
    /// Build the replica id for the given ordinal.
    pub fn replica_id(&self, ordinal: usize) -> ReplicaId {
        format!("{}-{}", self.id, ordinal)
    }
}

impl Replica {
    /// A freshly requested replica: pending and unplaced.
    pub fn pending(id: ReplicaId, name: String) -> Self {
        Self {
            id,
            name,
            status: ReplicaStatus::Pending,
            node: None,
            started_at: None,
            uptime: None,
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Starting => "starting",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Stopping => "stopping",
            DeploymentStatus::Stopped => "stopped",
            DeploymentStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ServiceStatus::Pending => "pending",
            ServiceStatus::Starting => "starting",
            ServiceStatus::Running => "running",
            ServiceStatus::Stopping => "stopping",
            ServiceStatus::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(id: &str, status: ServiceStatus) -> Service {
        Service {
            id: id.to_string(),
            name: id.to_string(),
            image: "nginx:latest".to_string(),
            desired_replicas: 1,
            status,
            uptime: 100.0,
            resources: ResourceRequest::default(),
            replicas: Vec::new(),
            summary: ReplicaCountSummary::default(),
        }
    }

    fn deployment(services: Vec<Service>) -> Deployment {
        Deployment {
            id: "d1".to_string(),
            name: "web".to_string(),
            application: "shop".to_string(),
            owner: "0xabc".to_string(),
            status: DeploymentStatus::Running,
            created_at: 0,
            lease: None,
            services,
        }
    }

    #[test]
    fn statuses_serialize_snake_case() {
        let json = serde_json::to_string(&DeploymentStatus::Stopping).unwrap();
        assert_eq!(json, "\"stopping\"");
        let parsed: ReplicaStatus = serde_json::from_str("\"succeeded\"").unwrap();
        assert_eq!(parsed, ReplicaStatus::Succeeded);
    }

    #[test]
    fn uniform_status_when_services_agree() {
        let d = deployment(vec![
            service("a", ServiceStatus::Running),
            service("b", ServiceStatus::Running),
        ]);
        assert_eq!(d.uniform_service_status(), Some(ServiceStatus::Running));
    }

    #[test]
    fn uniform_status_none_on_divergence() {
        let d = deployment(vec![
            service("a", ServiceStatus::Running),
            service("b", ServiceStatus::Stopped),
        ]);
        assert_eq!(d.uniform_service_status(), None);
        assert_eq!(deployment(Vec::new()).uniform_service_status(), None);
    }

    #[test]
    fn replica_id_uses_service_id_and_ordinal() {
        let s = service("api", ServiceStatus::Running);
        assert_eq!(s.replica_id(3), "api-3");
    }

    #[test]
    fn fixture_defaults_fill_missing_fields() {
        let json = r#"{
            "id": "d1", "name": "web", "application": "shop", "owner": "alice",
            "status": "pending",
            "services": [{
                "id": "s1", "name": "api", "image": "api:1", "desired_replicas": 0,
                "status": "pending",
                "resources": { "cpu": 0.5, "memory_gb": 1.0, "storage_gb": 2.0 }
            }]
        }"#;
        let d: Deployment = serde_json::from_str(json).unwrap();
        assert!(d.lease.is_none());
        assert_eq!(d.services[0].summary, ReplicaCountSummary::default());
        assert!(d.services[0].resources.gpu.is_none());
    }
}
