//! Pending completions, keyed by the entity they act on.
//!
//! At most one completion is pending per key. Scheduling a completion for
//! a key that already has one replaces it, so the most recent command on
//! an entity always wins.

use std::collections::HashMap;

use hostgrid_state::{DeploymentId, ServiceId};

/// The entity slot a pending completion occupies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKey {
    /// Deployment-level start / stop / restart.
    Deployment(DeploymentId),
    /// Service-level start / stop.
    Service {
        deployment: DeploymentId,
        service: ServiceId,
    },
    /// Replica placement after a scale-up.
    Reconcile {
        deployment: DeploymentId,
        service: ServiceId,
    },
}

impl TimerKey {
    pub fn deployment_id(&self) -> &str {
        match self {
            TimerKey::Deployment(d) => d,
            TimerKey::Service { deployment, .. } | TimerKey::Reconcile { deployment, .. } => {
                deployment
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentAction {
    Start,
    Stop,
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
}

/// Deferred mutation applied when a timer fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Deployment {
        deployment: DeploymentId,
        action: DeploymentAction,
    },
    Service {
        deployment: DeploymentId,
        service: ServiceId,
        action: ServiceAction,
    },
    Reconcile {
        deployment: DeploymentId,
        service: ServiceId,
    },
}

impl Completion {
    pub fn key(&self) -> TimerKey {
        match self {
            Completion::Deployment { deployment, .. } => TimerKey::Deployment(deployment.clone()),
            Completion::Service {
                deployment,
                service,
                ..
            } => TimerKey::Service {
                deployment: deployment.clone(),
                service: service.clone(),
            },
            Completion::Reconcile {
                deployment,
                service,
            } => TimerKey::Reconcile {
                deployment: deployment.clone(),
                service: service.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct Timer {
    due_ms: u64,
    /// Scheduling order, breaks ties between equal deadlines.
    seq: u64,
    completion: Completion,
}

/// Table of pending completions.
#[derive(Debug, Default)]
pub struct TimerTable {
    timers: HashMap<TimerKey, Timer>,
    next_seq: u64,
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `completion` at `due_ms`. Returns the completion it
    /// replaced, if one was pending for the same key.
    pub fn schedule(&mut self, due_ms: u64, completion: Completion) -> Option<Completion> {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers
            .insert(
                completion.key(),
                Timer {
                    due_ms,
                    seq,
                    completion,
                },
            )
            .map(|old| old.completion)
    }

    /// Cancel every completion whose key matches `pred`. Returns how many.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&TimerKey) -> bool) -> usize {
        let before = self.timers.len();
        self.timers.retain(|key, _| !pred(key));
        before - self.timers.len()
    }

    /// Cancel everything pending for a deployment and its services.
    pub fn cancel_deployment(&mut self, deployment_id: &str) -> usize {
        self.cancel_where(|key| key.deployment_id() == deployment_id)
    }

    pub fn contains(&self, key: &TimerKey) -> bool {
        self.timers.contains_key(key)
    }

    /// Deadline of the pending completion for `key`.
    pub fn due_at(&self, key: &TimerKey) -> Option<u64> {
        self.timers.get(key).map(|t| t.due_ms)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.values().map(|t| t.due_ms).min()
    }

    /// Remove and return every completion due at or before `now_ms`,
    /// ordered by deadline, then by scheduling order.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<Completion> {
        let due_keys: Vec<TimerKey> = self
            .timers
            .iter()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .map(|(k, _)| k.clone())
            .collect();

        let mut due: Vec<Timer> = due_keys
            .iter()
            .filter_map(|k| self.timers.remove(k))
            .collect();
        due.sort_by_key(|t| (t.due_ms, t.seq));
        due.into_iter().map(|t| t.completion).collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
