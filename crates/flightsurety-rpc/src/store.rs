use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Body of `POST /assign`: binds an airline address to an IATA code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub address: String,
    pub iata: String,
}

/// Static airline/flight catalogs plus the mutable address-to-IATA table.
#[derive(Debug)]
pub struct ReferenceStore {
    airlines_db: Value,
    flights_db: Value,
    airline_ids: RwLock<BTreeMap<String, String>>,
}

impl Default for ReferenceStore {
    fn default() -> Self {
        Self::from_value(Value::Null)
    }
}

impl ReferenceStore {
    /// Build from a document shaped `{ "airlinesDB": [...], "flightsDB": [...] }`.
    /// Missing catalogs are served as empty arrays.
    pub fn from_value(doc: Value) -> Self {
        let catalog = |name: &str| doc.get(name).cloned().unwrap_or_else(|| Value::Array(Vec::new()));
        ReferenceStore {
            airlines_db: catalog("airlinesDB"),
            flights_db: catalog("flightsDB"),
            airline_ids: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading reference data from {}", path.display()))?;
        let doc: Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing reference data in {}", path.display()))?;
        info!("Loaded reference data from {}", path.display());
        Ok(Self::from_value(doc))
    }

    pub fn airlines_db(&self) -> &Value {
        &self.airlines_db
    }

    pub fn flights_db(&self) -> &Value {
        &self.flights_db
    }

    /// Record (or overwrite) an address-to-IATA binding.
    pub fn assign(&self, assignment: &Assignment) {
        self.airline_ids
            .write()
            .insert(assignment.address.clone(), assignment.iata.clone());
    }

    /// All bindings as `[address, iata]` pairs.
    pub fn airline_ids(&self) -> Vec<(String, String)> {
        self.airline_ids
            .read()
            .iter()
            .map(|(address, iata)| (address.clone(), iata.clone()))
            .collect()
    }
}
