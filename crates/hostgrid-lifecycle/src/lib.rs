//! hostgrid-lifecycle — deployment and service lifecycle state machines.
//!
//! Commands move an entity into a transient state right away and leave a
//! keyed completion behind; completions fire once their delay has passed
//! on the injected clock.
//!
//! # Components
//!
//! - **`controller`** — start / stop / restart / delete / scale and `tick`
//! - **`timers`** — one pending completion per entity, newest wins
//! - **`clock`** — manual clock for tests, tokio clock for the driver
//! - **`placement`** — seedable node picks and replica name suffixes
//! - **`driver`** — tokio loop that fires completions in real time
//!
//! # Timing
//!
//! ```text
//! command ──► transient state ──► timer (delay) ──► final state
//!   start_deployment   starting                     running  (+ services running, uptime 100)
//!   stop_deployment    stopping                     stopped  (+ services stopped, uptime 0)
//!   restart_deployment starting                     running  (+ services running)
//!   scale_service (up) replicas appended pending    replicas running on a node
//! ```

pub mod clock;
pub mod controller;
pub mod driver;
pub mod placement;
pub mod timers;

pub use clock::{Clock, ManualClock, TokioClock};
pub use controller::{LifecycleController, LifecycleEvent};
pub use driver::{DriverHandle, LifecycleDriver};
pub use placement::{PlacementSource, SeededPlacement};
pub use timers::{Completion, DeploymentAction, ServiceAction, TimerKey, TimerTable};
