use thiserror::Error;

use crate::objects::BodyHandle;

/// Recoverable failures at the public API boundary.
///
/// Hot-path precondition violations (reading a shape cache before it was
/// ever refreshed, constructing a circle with a negative radius) are
/// assertions instead; they indicate a bug in the caller.
#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("no body with handle {0}")]
    UnknownBody(BodyHandle),

    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("invalid world configuration: {0}")]
    InvalidConfig(String),

    #[error("scene serialization failed")]
    Scene(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
