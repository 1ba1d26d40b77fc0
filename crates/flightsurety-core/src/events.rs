/// EVENT LOG
///
/// Append-only record of state transitions. External watchers either poll the
/// log by sequence number or subscribe to the broadcast channel.

use crate::types::{Address, FlightKey, PolicyKey, StatusCode, Wei};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const BROADCAST_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum FlightSuretyEvent {
    /// Airline admitted
    Registered { airline: Address },
    /// Registration vote recorded
    Voted { candidate: Address, voter: Address },
    /// Airline deposited its ante
    Funded { airline: Address, amount: Wei },
    /// Insurance policy created
    Purchased { key: PolicyKey, premium: Wei },
    /// Oracles are asked for a flight status
    OracleRequest { index: u8, flight: FlightKey },
    /// A status request reached quorum
    FlightStatusUpdated { index: u8, flight: FlightKey, status: StatusCode },
    /// Payout credited to a passenger
    InsureeCredited { key: PolicyKey, amount: Wei },
    /// Credit released to its owner
    Withdrawn { account: Address, amount: Wei },
    /// Operational gate toggled
    OperationalStatusChanged { operational: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub event: FlightSuretyEvent,
}

#[derive(Debug)]
pub struct EventLog {
    records: Vec<EventRecord>,
    notify_tx: broadcast::Sender<EventRecord>,
}

impl Default for EventLog {
    fn default() -> Self {
        let (notify_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        EventLog {
            records: Vec::new(),
            notify_tx,
        }
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and notify subscribers.
    pub fn emit(&mut self, event: FlightSuretyEvent) -> u64 {
        let sequence = self.records.len() as u64;
        let record = EventRecord { sequence, event };
        self.records.push(record.clone());
        // No receivers is fine
        let _ = self.notify_tx.send(record);
        sequence
    }

    pub fn emit_all(&mut self, events: impl IntoIterator<Item = FlightSuretyEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.notify_tx.subscribe()
    }

    /// Records with `sequence >= from`.
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = (from as usize).min(self.records.len());
        &self.records[start..]
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&FlightSuretyEvent> {
        self.records.last().map(|r| &r.event)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
