//! Vayu Simulator
//!
//! Drives the session engine the way a busy deployment would and checks the
//! lifecycle invariants after every step.
//!
//! - `simulator`: seeded random operations with an expected-outcome oracle
//! - `scenario`: the create, approve, phase-by-phase, close walkthrough
//! - `demo`: the built-in catalog

pub mod demo;
pub mod scenario;
pub mod simulator;

pub use demo::{demo_catalog, load_catalog};
pub use scenario::{run_scenario, ScenarioReport, ScenarioStep};
pub use simulator::{
    run_simulator, InvariantCheck, OperationDistribution, SimulatorConfig, SimulatorReport,
    Violation,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
