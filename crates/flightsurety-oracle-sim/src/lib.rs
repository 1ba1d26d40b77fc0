/// Simulated oracle agents for FlightSurety.
///
/// Each agent registers once, then answers `OracleRequest` events for the
/// indexes it holds with a status code chosen by a `StatusPicker`.

pub mod config;
pub mod picker;
pub mod simulator;

pub use config::SimulatorConfig;
pub use picker::{FixedStatusPicker, RandomStatusPicker, StatusPicker};
pub use simulator::{OracleSimulator, SimulatedOracle, SimulatorError, Submission};
