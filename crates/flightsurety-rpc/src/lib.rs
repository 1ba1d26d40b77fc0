//! HTTP front end for a running FlightSurety instance.
//!
//! Serves the airline/flight reference catalogs used by the dapp, keeps the
//! address-to-IATA assignments it posts, and exposes flight status requests.

pub mod routes;
pub mod store;

pub use routes::{
    error_reply, routes, serve, ErrorReply, FlightStatusReply, RequestedIndex, RpcState,
    StatusRequestBody,
};
pub use store::{Assignment, ReferenceStore};
