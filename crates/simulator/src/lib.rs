//! Exertion scenario simulator.
//!
//! Wires the dispatch shell to in-process collaborators (registry,
//! cataloger, lock manager, transaction manager, provisioner) and runs
//! TOML-described scenarios against them.
//!
//! # Example
//!
//! ```ignore
//! use exertion_simulator::{run_scenario, ScenarioConfig};
//!
//! let scenario = ScenarioConfig::load("scenarios/calculator.toml")?;
//! let report = run_scenario(&scenario)?;
//! println!("{report}");
//! ```

pub mod config;
mod error;
pub mod report;
pub mod runner;

pub use config::{Behavior, ExertionSpec, ProviderSpec, ScenarioConfig};
pub use error::SimulatorError;
pub use report::{ExertionReport, ScenarioReport};
pub use runner::{run_scenario, Simulator};
