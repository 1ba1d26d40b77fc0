/// Status code selection for simulated oracles.

use flightsurety_core::{Address, FlightKey, StatusCode, STATUS_CODE_UNKNOWN, VALID_STATUS_CODES};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub trait StatusPicker: Send {
    fn pick(&mut self, oracle: &Address, index: u8, flight: &FlightKey) -> StatusCode;
}

/// Uniform choice over every valid status code.
#[derive(Debug, Clone)]
pub struct RandomStatusPicker {
    rng: StdRng,
}

impl RandomStatusPicker {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        RandomStatusPicker { rng }
    }
}

impl StatusPicker for RandomStatusPicker {
    fn pick(&mut self, _oracle: &Address, _index: u8, _flight: &FlightKey) -> StatusCode {
        VALID_STATUS_CODES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(STATUS_CODE_UNKNOWN)
    }
}

/// Every oracle reports the same code.
#[derive(Debug, Clone, Copy)]
pub struct FixedStatusPicker(pub StatusCode);

impl StatusPicker for FixedStatusPicker {
    fn pick(&mut self, _oracle: &Address, _index: u8, _flight: &FlightKey) -> StatusCode {
        self.0
    }
}
