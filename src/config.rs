use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::network::intersection::IntersectionId;

/// A scheduled emergency dispatch: at `tick`, send a vehicle from `origin`
/// to `destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchEntry {
    pub tick: u64,
    pub origin: IntersectionId,
    pub destination: IntersectionId,
}

/// How signal phases are chosen each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControlMode {
    /// Demand-driven local agents with zone reconciliation and emergency
    /// overrides.
    #[default]
    Adaptive,
    /// Alternate NS/EW on a fixed cycle; no reconciliation, no overrides.
    /// Used as the baseline for the transit-time comparison.
    FixedTiming,
}

/// Run configuration for one simulation.
///
/// Passed to the engine as a single struct; validated once before the run
/// starts so the tick loop never has to deal with degenerate values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of ticks to simulate.
    pub num_ticks: u64,
    /// Minimum ticks a green phase stays active before it may switch.
    pub min_green_ticks: u64,
    /// Vehicles drained per green approach per tick.
    pub drain_rate: u32,
    /// Normalized-wait threshold above which a zone coordinator force-extends
    /// a member's green phase.
    pub fairness_threshold: f64,
    /// Maximum queue length ahead of an emergency vehicle that still permits
    /// advancing to the next corridor intersection.
    pub clearance_threshold: u32,
    /// Scheduled emergency dispatches.
    #[serde(default)]
    pub dispatches: Vec<DispatchEntry>,
    /// Signal control mode.
    #[serde(default)]
    pub mode: ControlMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_ticks: 60,
            min_green_ticks: 3,
            drain_rate: 2,
            fairness_threshold: 1.5,
            clearance_threshold: 4,
            dispatches: Vec::new(),
            mode: ControlMode::Adaptive,
        }
    }
}

impl SimulationConfig {
    /// Checks structural validity. Called by the engine before `run()`;
    /// a failure here means the simulation never starts.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.num_ticks == 0 {
            return Err(SimulationError::ConfigurationError(
                "num_ticks must be positive".into(),
            ));
        }
        if self.min_green_ticks == 0 {
            return Err(SimulationError::ConfigurationError(
                "min_green_ticks must be positive".into(),
            ));
        }
        if self.drain_rate == 0 {
            return Err(SimulationError::ConfigurationError(
                "drain_rate must be positive".into(),
            ));
        }
        if !self.fairness_threshold.is_finite() || self.fairness_threshold <= 0.0 {
            return Err(SimulationError::ConfigurationError(format!(
                "fairness_threshold must be positive, got {}",
                self.fairness_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_ticks_rejected() {
        let cfg = SimulationConfig {
            num_ticks: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(SimulationError::ConfigurationError(_))
        ));
    }

    #[test]
    fn zero_drain_rate_rejected() {
        let cfg = SimulationConfig {
            drain_rate: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let cfg = SimulationConfig {
            fairness_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
