//! hostgrid-state — fleet state model for hostgrid.
//!
//! Deployments own services; services own replica sets and a
//! denormalized replica count summary. The whole fleet lives in a
//! single-owner [`DeploymentStore`] that callers pass around explicitly.
//!
//! # Layout
//!
//! - **`types`** — deployments, services, replicas and their statuses
//! - **`store`** — ordered in-memory collection with id lookups
//! - **`resources`** — resource aggregation and fleet statistics
//! - **`error`** — `StateError` and replica count parsing

pub mod error;
pub mod resources;
pub mod store;
pub mod types;

pub use error::{
    check_replica_count, parse_replica_count, ErrorKind, StateError, StateResult, MAX_REPLICAS,
};
pub use resources::{sum_across_deployments, sum_resources, FleetSummary, ResourceTotals};
pub use store::DeploymentStore;
pub use types::*;
