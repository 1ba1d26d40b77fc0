/// FLIGHTSURETY CORE
///
/// Decentralized flight-delay insurance:
/// - Airlines join under a 50% multi-party consensus rule once four are registered
/// - Passengers buy capped policies on specific flight departures
/// - Independent oracles agree on a flight's status by quorum
/// - Delayed flights credit 1.5x the premium to their passengers
///
/// All state lives in one `FlightSurety` value; nothing here is global.

pub mod airline_registry;
pub mod config;
pub mod entropy;
pub mod error;
pub mod events;
pub mod flight_surety;
pub mod insurance_pool;
pub mod ledger;
pub mod oracle_consensus;
pub mod types;

pub use airline_registry::{Admission, Airline, AirlineInfo, AirlineRegistry};
pub use config::ProtocolConfig;
pub use entropy::{Entropy, HashEntropy, SequenceEntropy};
pub use error::{FlightSuretyError, Result};
pub use events::{EventLog, EventRecord, FlightSuretyEvent};
pub use flight_surety::{FlightSurety, SharedFlightSurety};
pub use insurance_pool::{InsurancePolicy, InsurancePool};
pub use ledger::{DepositKind, EscrowState, Ledger};
pub use oracle_consensus::{OracleConsensus, ResponseOutcome, StatusRequest};
pub use types::{
    is_valid_status_code, Address, FlightKey, PolicyKey, RequestKey, StatusCode, Wei, STATUS_CODE_LATE_AIRLINE,
    STATUS_CODE_LATE_OTHER, STATUS_CODE_LATE_TECHNICAL, STATUS_CODE_LATE_WEATHER,
    STATUS_CODE_ON_TIME, STATUS_CODE_UNKNOWN, UNIT, VALID_STATUS_CODES,
};
