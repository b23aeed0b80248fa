//! DeploymentStore — the in-memory fleet aggregate.
//!
//! Holds every deployment in insertion order. The store is owned by a
//! single caller (the lifecycle controller, a test harness) and mutated
//! through `&mut self`; nothing here is shared or persisted.

use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::types::*;

/// Ordered, single-owner collection of deployments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentStore {
    deployments: Vec<Deployment>,
}

impl DeploymentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an existing list, keeping its order.
    pub fn from_deployments(deployments: Vec<Deployment>) -> Self {
        Self { deployments }
    }

    /// Decode a fleet fixture: a JSON array of deployments.
    pub fn from_json_slice(bytes: &[u8]) -> StateResult<Self> {
        let deployments: Vec<Deployment> =
            serde_json::from_slice(bytes).map_err(|e| StateError::Fixture(e.to_string()))?;
        debug!(count = deployments.len(), "fleet fixture decoded");
        Ok(Self::from_deployments(deployments))
    }

    /// Serialize the fleet back to pretty JSON.
    pub fn to_json_pretty(&self) -> StateResult<String> {
        serde_json::to_string_pretty(&self.deployments)
            .map_err(|e| StateError::Fixture(e.to_string()))
    }

    // ── Deployments ────────────────────────────────────────────────

    /// Insert a deployment, or replace the one with the same id in place.
    pub fn put_deployment(&mut self, deployment: Deployment) {
        let id = deployment.id.clone();
        match self.deployments.iter_mut().find(|d| d.id == id) {
            Some(existing) => *existing = deployment,
            None => self.deployments.push(deployment),
        }
        debug!(deployment = %id, "deployment stored");
    }

    /// Get a deployment by id.
    pub fn get_deployment(&self, id: &str) -> Option<&Deployment> {
        self.deployments.iter().find(|d| d.id == id)
    }

    /// Mutable lookup of a deployment by id.
    pub fn get_deployment_mut(&mut self, id: &str) -> Option<&mut Deployment> {
        self.deployments.iter_mut().find(|d| d.id == id)
    }

    /// Get a deployment or fail with `DeploymentNotFound`.
    pub fn require_deployment(&self, id: &str) -> StateResult<&Deployment> {
        self.get_deployment(id)
            .ok_or_else(|| StateError::DeploymentNotFound(id.to_string()))
    }

    /// Mutable variant of [`require_deployment`](Self::require_deployment).
    pub fn require_deployment_mut(&mut self, id: &str) -> StateResult<&mut Deployment> {
        self.get_deployment_mut(id)
            .ok_or_else(|| StateError::DeploymentNotFound(id.to_string()))
    }

    /// All deployments, in insertion order.
    pub fn list_deployments(&self) -> &[Deployment] {
        &self.deployments
    }

    /// Remove a deployment. Returns it if it existed.
    pub fn delete_deployment(&mut self, id: &str) -> Option<Deployment> {
        let index = self.deployments.iter().position(|d| d.id == id)?;
        let removed = self.deployments.remove(index);
        debug!(deployment = %id, "deployment deleted");
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.deployments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deployments.is_empty()
    }

    // ── Services ───────────────────────────────────────────────────

    /// Get a service, failing with the appropriate not-found error.
    pub fn require_service(&self, deployment_id: &str, service_id: &str) -> StateResult<&Service> {
        self.require_deployment(deployment_id)?
            .service(service_id)
            .ok_or_else(|| StateError::service_not_found(deployment_id, service_id))
    }

    /// Mutable variant of [`require_service`](Self::require_service).
    pub fn require_service_mut(
        &mut self,
        deployment_id: &str,
        service_id: &str,
    ) -> StateResult<&mut Service> {
        self.require_deployment_mut(deployment_id)?
            .service_mut(service_id)
            .ok_or_else(|| StateError::service_not_found(deployment_id, service_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn test_deployment(id: &str) -> Deployment {
        Deployment {
            id: id.to_string(),
            name: format!("{id}-name"),
            application: "shop".to_string(),
            owner: "0xabc".to_string(),
            status: DeploymentStatus::Running,
            created_at: 1000,
            lease: None,
            services: vec![Service {
                id: "api".to_string(),
                name: "api".to_string(),
                image: "api:1".to_string(),
                desired_replicas: 0,
                status: ServiceStatus::Running,
                uptime: 100.0,
                resources: ResourceRequest::default(),
                replicas: Vec::new(),
                summary: ReplicaCountSummary::default(),
            }],
        }
    }

    #[test]
    fn put_and_get() {
        let mut store = DeploymentStore::new();
        store.put_deployment(test_deployment("d1"));

        assert_eq!(store.get_deployment("d1"), Some(&test_deployment("d1")));
        assert!(store.get_deployment("d2").is_none());
    }

    #[test]
    fn put_replaces_in_place() {
        let mut store = DeploymentStore::new();
        store.put_deployment(test_deployment("d1"));
        store.put_deployment(test_deployment("d2"));

        let mut updated = test_deployment("d1");
        updated.name = "renamed".to_string();
        store.put_deployment(updated);

        let ids: Vec<_> = store.list_deployments().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["d1", "d2"]);
        assert_eq!(store.get_deployment("d1").unwrap().name, "renamed");
    }

    #[test]
    fn delete_returns_removed() {
        let mut store = DeploymentStore::new();
        store.put_deployment(test_deployment("d1"));

        assert!(store.delete_deployment("d1").is_some());
        assert!(store.delete_deployment("d1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn require_service_distinguishes_missing_parent() {
        let mut store = DeploymentStore::new();
        store.put_deployment(test_deployment("d1"));

        assert!(store.require_service("d1", "api").is_ok());
        assert_eq!(
            store.require_service("d1", "db").unwrap_err(),
            StateError::ServiceNotFound {
                deployment: "d1".to_string(),
                service: "db".to_string()
            }
        );
        let err = store.require_service_mut("nope", "api").unwrap_err();
        assert_eq!(err, StateError::DeploymentNotFound("nope".to_string()));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn fixture_round_trip_keeps_order() {
        let store = DeploymentStore::from_deployments(vec![
            test_deployment("b"),
            test_deployment("a"),
        ]);
        let json = store.to_json_pretty().unwrap();
        let decoded = DeploymentStore::from_json_slice(json.as_bytes()).unwrap();
        assert_eq!(decoded, store);
    }

    #[test]
    fn bad_fixture_is_reported() {
        let err = DeploymentStore::from_json_slice(b"{not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fixture);
    }
}
