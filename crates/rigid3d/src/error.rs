//! Error type for object creation, lifecycle commands and configuration.

use thiserror::Error;

use crate::object::ObjectId;

/// Which fixed-capacity store rejected a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Particles,
    Objects,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Particles => write!(f, "particle"),
            Resource::Objects => write!(f, "object"),
        }
    }
}

/// Errors reported by the simulator.
///
/// Numerical degeneracies (zero covariance, resting particles) are handled
/// inside the solver and never show up here.
#[derive(Debug, Error)]
pub enum SimError {
    /// Creating an object would overflow a store sized at initialization.
    #[error("{resource} capacity exceeded: {requested} requested, capacity is {capacity}")]
    CapacityExceeded {
        resource: Resource,
        requested: usize,
        capacity: usize,
    },

    /// The id was never issued by this simulation.
    #[error("unknown object id {0}")]
    UnknownObject(ObjectId),

    /// The box description cannot produce a particle lattice.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// Configuration or frame parameters out of range.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
