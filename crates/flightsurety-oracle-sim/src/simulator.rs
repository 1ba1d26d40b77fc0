// ORACLE SIMULATOR
// Registers a pool of local oracle accounts and answers every status request
// whose index one of them holds.
//
// The simulator never holds the FlightSurety lock across an await point and
// treats rejected submissions as normal: late, duplicate or mismatched
// answers are expected from independent oracles.

use crate::config::SimulatorConfig;
use crate::picker::StatusPicker;
use flightsurety_core::{
    Address, FlightKey, FlightSuretyError, FlightSuretyEvent, ResponseOutcome, SharedFlightSurety,
    StatusCode,
};
use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("No oracles configured")]
    NoOracles,

    #[error("Oracle accounts start at {first} and overflow after {count} accounts")]
    AccountRange { first: u32, count: u32 },

    #[error("Oracle registration failed: {0}")]
    Registration(#[from] FlightSuretyError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedOracle {
    pub address: Address,
    pub indexes: Vec<u8>,
}

/// One attempted oracle response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub oracle: Address,
    pub index: u8,
    pub status: StatusCode,
    pub result: Result<ResponseOutcome, FlightSuretyError>,
}

pub struct OracleSimulator<P: StatusPicker> {
    system: SharedFlightSurety,
    config: SimulatorConfig,
    picker: P,
    oracles: Vec<SimulatedOracle>,
}

impl<P: StatusPicker> OracleSimulator<P> {
    pub fn new(system: SharedFlightSurety, config: SimulatorConfig, picker: P) -> Self {
        OracleSimulator {
            system,
            config,
            picker,
            oracles: Vec::new(),
        }
    }

    /// Local accounts reserved for oracles.
    pub fn discover_accounts(&self) -> Result<Vec<Address>, SimulatorError> {
        let range = self
            .config
            .oracle_accounts()
            .ok_or(SimulatorError::AccountRange {
                first: self.config.first_oracle_account,
                count: self.config.oracle_count,
            })?;
        Ok(range
            .map(|i| Address::derive(&self.config.account_label, i))
            .collect())
    }

    /// Register every oracle account, paying the current registration fee.
    pub fn register_all(&mut self) -> Result<usize, SimulatorError> {
        let accounts = self.discover_accounts()?;
        if accounts.is_empty() {
            return Err(SimulatorError::NoOracles);
        }

        let mut system = self.system.lock();
        let fee = system.oracle_registration_fee();
        for (i, address) in accounts.into_iter().enumerate() {
            let indexes = match system.register_oracle(address, fee) {
                Ok(indexes) => indexes,
                Err(FlightSuretyError::OracleAlreadyRegistered) => {
                    system.get_oracle_indexes(&address)?
                }
                Err(e) => return Err(e.into()),
            };
            debug!("Oracle {} ({}) holds indexes {:?}", i + 1, address, indexes);
            self.oracles.push(SimulatedOracle { address, indexes });
        }

        info!("Registered {} oracles", self.oracles.len());
        Ok(self.oracles.len())
    }

    pub fn oracles(&self) -> &[SimulatedOracle] {
        &self.oracles
    }

    /// Answer a request from every oracle holding `index`.
    pub fn handle_request(&mut self, index: u8, flight: &FlightKey) -> Vec<Submission> {
        let mut submissions = Vec::new();
        for oracle in self.oracles.iter().filter(|o| o.indexes.contains(&index)) {
            let status = self.picker.pick(&oracle.address, index, flight);
            let result = self.system.lock().submit_oracle_response(
                oracle.address,
                index,
                flight.airline,
                &flight.flight,
                flight.timestamp,
                status,
            );
            match &result {
                Ok(outcome) => debug!(
                    "Oracle {} submitted {} for {} ({} matching)",
                    oracle.address, status, flight, outcome.matching
                ),
                Err(e) => debug!("Oracle {} submission rejected: {}", oracle.address, e),
            }
            submissions.push(Submission {
                oracle: oracle.address,
                index,
                status,
                result,
            });
        }
        submissions
    }

    /// Answer requests until `shutdown` turns true or the event stream closes.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let mut events = self.system.lock().subscribe();
        info!("Oracle simulator listening for status requests");

        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Ok(record) => {
                        if let FlightSuretyEvent::OracleRequest { index, flight } = record.event {
                            info!("Captured OracleRequest {} for {}", index, flight);
                            self.handle_request(index, &flight);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Oracle simulator lagged, {} events skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Oracle simulator stopped");
        Ok(())
    }
}
