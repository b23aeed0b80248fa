//! Error types for the hostgrid lifecycle core.

use thiserror::Error;

/// Result type alias for lifecycle and state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while reading or mutating fleet state.
#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("deployment not found: {0}")]
    DeploymentNotFound(String),

    #[error("service not found: {deployment}/{service}")]
    ServiceNotFound { deployment: String, service: String },

    #[error("invalid replica count: {0:?} (expected 0 to {max})", max = MAX_REPLICAS)]
    InvalidReplicaCount(String),

    #[error("fixture error: {0}")]
    Fixture(String),
}

/// Coarse error classification for callers that only care about the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Fixture,
}

impl StateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StateError::DeploymentNotFound(_) | StateError::ServiceNotFound { .. } => {
                ErrorKind::NotFound
            }
            StateError::InvalidReplicaCount(_) => ErrorKind::InvalidArgument,
            StateError::Fixture(_) => ErrorKind::Fixture,
        }
    }

    pub(crate) fn service_not_found(deployment: &str, service: &str) -> Self {
        StateError::ServiceNotFound {
            deployment: deployment.to_string(),
            service: service.to_string(),
        }
    }
}

/// Upper bound on a service's desired replica count.
pub const MAX_REPLICAS: u32 = 1000;

/// Reject replica counts above [`MAX_REPLICAS`].
pub fn check_replica_count(replicas: u32) -> StateResult<u32> {
    if replicas > MAX_REPLICAS {
        return Err(StateError::InvalidReplicaCount(replicas.to_string()));
    }
    Ok(replicas)
}

/// Parse a replica count from untrusted text.
///
/// Accepts integers from 0 to [`MAX_REPLICAS`]. `"-1"`, `"2.5"` and
/// `"abc"` are rejected with [`StateError::InvalidReplicaCount`].
pub fn parse_replica_count(input: &str) -> StateResult<u32> {
    let replicas = input
        .trim()
        .parse::<u32>()
        .map_err(|_| StateError::InvalidReplicaCount(input.to_string()))?;
    check_replica_count(replicas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            StateError::DeploymentNotFound("d".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            StateError::service_not_found("d", "s").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            StateError::InvalidReplicaCount("-1".into()).kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn parse_accepts_non_negative_integers() {
        assert_eq!(parse_replica_count("0").unwrap(), 0);
        assert_eq!(parse_replica_count(" 12 ").unwrap(), 12);
    }

    #[test]
    fn parse_rejects_negative_and_fractional() {
        for bad in ["-1", "2.5", "", "three"] {
            let err = parse_replica_count(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "input {bad:?}");
        }
    }

    #[test]
    fn parse_rejects_counts_above_limit() {
        assert_eq!(parse_replica_count("1000").unwrap(), MAX_REPLICAS);
        for bad in ["1001", "4294967295", "99999999999"] {
            let err = parse_replica_count(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "input {bad:?}");
        }
        assert_eq!(
            check_replica_count(u32::MAX).unwrap_err().to_string(),
            "invalid replica count: \"4294967295\" (expected 0 to 1000)"
        );
    }

    #[test]
    fn service_not_found_message() {
        let err = StateError::service_not_found("d1", "api");
        assert_eq!(err.to_string(), "service not found: d1/api");
    }
}
