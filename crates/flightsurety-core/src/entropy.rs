/// Injectable randomness for oracle index assignment.
///
/// The default source hashes the caller's address with a nonce. Tests swap
/// in a scripted sequence to make index assignment exact.

use crate::types::Address;
use sha2::{Digest, Sha256};

pub trait Entropy: Send {
    /// Value in `[0, bound)` derived from `seed` and `nonce`.
    fn draw(&mut self, seed: &Address, nonce: u64, bound: u8) -> u8;
}

/// SHA-256 over (seed, nonce), reduced modulo the bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashEntropy;

impl Entropy for HashEntropy {
    fn draw(&mut self, seed: &Address, nonce: u64, bound: u8) -> u8 {
        if bound == 0 {
            return 0;
        }
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(nonce.to_le_bytes());
        let digest = hasher.finalize();
        digest[0] % bound
    }
}

/// Replays a fixed sequence of values, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct SequenceEntropy {
    values: Vec<u8>,
    position: usize,
}

impl SequenceEntropy {
    pub fn new(values: Vec<u8>) -> Self {
        SequenceEntropy { values, position: 0 }
    }
}

impl Entropy for SequenceEntropy {
    fn draw(&mut self, _seed: &Address, _nonce: u64, bound: u8) -> u8 {
        if self.values.is_empty() || bound == 0 {
            return 0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value % bound
    }
}
