use crate::network::intersection::IntersectionId;

/// Top-level error for the simulation crate.
///
/// Structural problems abort before the run starts; per-tick data problems
/// are downgraded to warnings and substituted with zero arrivals.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Emergency dispatch referenced an intersection that is not in the
    /// network. The run continues without the vehicle.
    #[error("invalid route: intersection {0:?} is not part of the network")]
    InvalidRoute(IntersectionId),

    /// A dataset row could not be interpreted as an arrival record.
    #[error("malformed arrival record at line {line}: {reason}")]
    MalformedArrivalRecord { line: u64, reason: String },

    /// The run configuration is structurally invalid. Fatal: the engine
    /// refuses to start.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Dataset file could not be read.
    #[error("failed to read arrival dataset: {source}")]
    DatasetIo {
        #[from]
        source: std::io::Error,
    },
}
