pub mod config;

pub use config::{HostgridConfig, LifecycleSettings, LogSettings, NodeConfig, PlacementSettings};
