/// PRIMITIVE TYPES
///
/// Account addresses, currency amounts, status codes and the composite keys
/// shared by the registry, the insurance pool and the oracle layer.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Native currency in its smallest denomination.
pub type Wei = u128;

/// One unit of native currency.
pub const UNIT: Wei = 1_000_000_000_000_000_000;

/// Status code reported by oracles for a flight.
pub type StatusCode = u8;

pub const STATUS_CODE_UNKNOWN: StatusCode = 0;
pub const STATUS_CODE_ON_TIME: StatusCode = 10;
pub const STATUS_CODE_LATE_AIRLINE: StatusCode = 20;
pub const STATUS_CODE_LATE_WEATHER: StatusCode = 30;
pub const STATUS_CODE_LATE_TECHNICAL: StatusCode = 40;
pub const STATUS_CODE_LATE_OTHER: StatusCode = 50;

/// Every status code an oracle may report.
pub const VALID_STATUS_CODES: [StatusCode; 6] = [
    STATUS_CODE_UNKNOWN,
    STATUS_CODE_ON_TIME,
    STATUS_CODE_LATE_AIRLINE,
    STATUS_CODE_LATE_WEATHER,
    STATUS_CODE_LATE_TECHNICAL,
    STATUS_CODE_LATE_OTHER,
];

pub fn is_valid_status_code(code: StatusCode) -> bool {
    VALID_STATUS_CODES.contains(&code)
}

/// 20-byte account address, rendered as `0x`-prefixed hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Deterministic address derived from a label and an account number.
    /// Used wherever a set of local accounts has to be discovered.
    pub fn derive(label: &str, index: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(label.as_bytes());
        hasher.update(index.to_le_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address: {0}")]
pub struct AddressParseError(pub String);

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|_| AddressParseError(s.to_string()))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| AddressParseError(s.to_string()))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A specific departure of a flight operated by an airline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlightKey {
    pub airline: Address,
    pub flight: String,
    pub timestamp: u64,
}

impl FlightKey {
    pub fn new(airline: Address, flight: impl Into<String>, timestamp: u64) -> Self {
        FlightKey {
            airline,
            flight: flight.into(),
            timestamp,
        }
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.airline, self.flight, self.timestamp)
    }
}

/// Identifies one insurance policy: a passenger on a flight departure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyKey {
    pub airline: Address,
    pub flight: String,
    pub timestamp: u64,
    pub passenger: Address,
}

impl PolicyKey {
    pub fn new(flight: &FlightKey, passenger: Address) -> Self {
        PolicyKey {
            airline: flight.airline,
            flight: flight.flight.clone(),
            timestamp: flight.timestamp,
            passenger,
        }
    }

    pub fn flight_key(&self) -> FlightKey {
        FlightKey::new(self.airline, self.flight.clone(), self.timestamp)
    }
}

/// Identifies one oracle status request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub index: u8,
    pub flight: FlightKey,
}
