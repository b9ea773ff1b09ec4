use slidefence_backend::{HostError, NodeId, ObserverKind};
use slidefence_core::ConfigError;
use thiserror::Error;

/// Failures surfaced by the engine API.
///
/// Only `Configuration` and `ContainerMissing` are returned to callers;
/// `ObserverUnsupported` and `Host` are logged where they occur and the
/// engine keeps running.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("container {0} is not attached to the document")]
    ContainerMissing(NodeId),

    #[error("host cannot deliver {0} observations")]
    ObserverUnsupported(ObserverKind),

    #[error(transparent)]
    Host(#[from] HostError),
}
