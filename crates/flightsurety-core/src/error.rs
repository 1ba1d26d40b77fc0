use thiserror::Error;

/// Every way a FlightSurety operation can be rejected.
///
/// Reason strings are part of the public contract: callers match on them,
/// so they must stay stable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlightSuretyError {
    // Authorization
    #[error("Caller is not registered")]
    NotRegistered,
    #[error("Caller is not funded")]
    NotFunded,
    #[error("Caller is not contract owner")]
    NotAuthorized,

    // Validation
    #[error("Amount is below the required minimum")]
    InvalidAmount,
    #[error("Premium exceeds the maximum insurable amount")]
    PremiumTooHigh,
    #[error("Index does not match oracle request")]
    IndexMismatch,
    #[error("Registration fee is required")]
    InsufficientFee,
    #[error("Status code is not valid")]
    InvalidStatusCode,

    // State conflicts
    #[error("Airline is already registered")]
    AlreadyRegistered,
    #[error("each registered airline can only vote once")]
    AlreadyVoted,
    #[error("Oracle has already responded to this request")]
    DuplicateResponse,
    #[error("Passenger is already insured for this flight")]
    DuplicatePolicy,
    #[error("Insurance has already been paid out")]
    AlreadyPaid,
    #[error("multi-party consensus of 50% is required")]
    ConsensusNotReached,
    #[error("Oracle is already registered")]
    OracleAlreadyRegistered,
    #[error("Airline is not funded")]
    AirlineNotFunded,
    #[error("Escrow balance is insufficient")]
    InsufficientEscrow,
    #[error("No credit available to withdraw")]
    NothingToWithdraw,

    // Lookup
    #[error("Insurance not found")]
    NotFound,
    #[error("Flight or timestamp do not match oracle request")]
    RequestNotFound,
    #[error("Caller is not a registered oracle")]
    UnknownOracle,

    // Global gate
    #[error("Contract is currently not operational")]
    NotOperational,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FlightSuretyError {
    /// Stable machine-readable identifier for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            FlightSuretyError::NotRegistered => "NotRegistered",
            FlightSuretyError::NotFunded => "NotFunded",
            FlightSuretyError::NotAuthorized => "NotAuthorized",
            FlightSuretyError::InvalidAmount => "InvalidAmount",
            FlightSuretyError::PremiumTooHigh => "PremiumTooHigh",
            FlightSuretyError::IndexMismatch => "IndexMismatch",
            FlightSuretyError::InsufficientFee => "InsufficientFee",
            FlightSuretyError::InvalidStatusCode => "InvalidStatusCode",
            FlightSuretyError::AlreadyRegistered => "AlreadyRegistered",
            FlightSuretyError::AlreadyVoted => "AlreadyVoted",
            FlightSuretyError::DuplicateResponse => "DuplicateResponse",
            FlightSuretyError::DuplicatePolicy => "DuplicatePolicy",
            FlightSuretyError::AlreadyPaid => "AlreadyPaid",
            FlightSuretyError::ConsensusNotReached => "ConsensusNotReached",
            FlightSuretyError::OracleAlreadyRegistered => "OracleAlreadyRegistered",
            FlightSuretyError::AirlineNotFunded => "AirlineNotFunded",
            FlightSuretyError::InsufficientEscrow => "InsufficientEscrow",
            FlightSuretyError::NothingToWithdraw => "NothingToWithdraw",
            FlightSuretyError::NotFound => "NotFound",
            FlightSuretyError::RequestNotFound => "RequestNotFound",
            FlightSuretyError::UnknownOracle => "UnknownOracle",
            FlightSuretyError::NotOperational => "NotOperational",
            FlightSuretyError::InvalidConfig(_) => "InvalidConfig",
        }
    }

    /// Lookup failures, as opposed to rejected requests.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            FlightSuretyError::NotFound
                | FlightSuretyError::RequestNotFound
                | FlightSuretyError::UnknownOracle
        )
    }
}

pub type Result<T> = std::result::Result<T, FlightSuretyError>;
