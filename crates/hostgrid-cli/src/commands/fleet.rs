use std::path::Path;

use anyhow::Context;
use serde_json::json;

use hostgrid_state::{DeploymentStore, FleetSummary};

/// Load a fleet fixture from disk.
pub fn load_fixture(path: &Path) -> anyhow::Result<DeploymentStore> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading fixture {}", path.display()))?;
    let store = DeploymentStore::from_json_slice(&bytes)
        .with_context(|| format!("decoding fixture {}", path.display()))?;
    tracing::debug!(path = %path.display(), deployments = store.len(), "fixture loaded");
    Ok(store)
}

pub fn totals(fixture: &Path) -> anyhow::Result<()> {
    let store = load_fixture(fixture)?;
    println!("{}", serde_json::to_string_pretty(&totals_json(&store))?);
    Ok(())
}

pub fn show(fixture: &Path, deployment: Option<&str>) -> anyhow::Result<()> {
    let store = load_fixture(fixture)?;
    println!("{}", render(&store, deployment)?);
    Ok(())
}

pub(crate) fn totals_json(store: &DeploymentStore) -> serde_json::Value {
    let summary = FleetSummary::from_deployments(store.list_deployments());
    json!({
        "resources": summary.resources,
        "summary": summary,
    })
}

/// Pretty JSON for one deployment, or the whole fleet.
pub(crate) fn render(store: &DeploymentStore, deployment: Option<&str>) -> anyhow::Result<String> {
    match deployment {
        Some(id) => Ok(serde_json::to_string_pretty(store.require_deployment(id)?)?),
        None => Ok(store.to_json_pretty()?),
    }
}
