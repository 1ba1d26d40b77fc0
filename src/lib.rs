/// FLIGHTSURETY NODE
///
/// Runs a FlightSurety instance together with its simulated oracles and the
/// HTTP server the dapp talks to.

pub mod node;
pub mod node_config;

pub use node::{build_system, load_reference_store, run};
pub use node_config::NodeConfig;
