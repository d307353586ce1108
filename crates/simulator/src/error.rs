//! Simulator errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("Failed to read scenario {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Scenario has no exertions")]
    Empty,
}
