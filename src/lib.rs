//! Multi-agent traffic-signal simulation over a grid of intersections.
//!
//! Three agent roles cooperate each tick: per-intersection signal control,
//! per-zone fairness coordination, and city-wide emergency response. The
//! simulation engine drives them in a fixed pipeline and owns all mutable
//! state; see [`engine::simulation::SimulationEngine`].

pub mod agents;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod network;
pub mod viz;
