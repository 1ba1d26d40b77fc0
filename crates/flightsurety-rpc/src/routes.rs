// FLIGHTSURETY HTTP ROUTES
//
// GET  /                                         liveness text
// GET  /airlinesDB, /flightsDB                   reference catalogs
// GET  /airlinesIDs                              [address, iata] pairs
// POST /assign                                   bind an address to an IATA code
// POST /flights/status                           ask the oracles about a departure
// GET  /flights/status/{airline}/{flight}/{ts}   finalized status
// GET  /insurance/keys                           active policy keys

use crate::store::{Assignment, ReferenceStore};
use anyhow::{Context, Result};
use flightsurety_core::{Address, FlightKey, FlightSuretyError, SharedFlightSurety, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use warp::http::StatusCode as HttpStatus;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

const MAX_BODY_BYTES: u64 = 16 * 1024;

#[derive(Clone)]
pub struct RpcState {
    pub store: Arc<ReferenceStore>,
    pub system: SharedFlightSurety,
}

impl RpcState {
    pub fn new(store: ReferenceStore, system: SharedFlightSurety) -> Self {
        RpcState {
            store: Arc::new(store),
            system,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequestBody {
    pub airline: Address,
    pub flight: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedIndex {
    pub index: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightStatusReply {
    pub flight: FlightKey,
    pub status: StatusCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub code: String,
    pub reason: String,
}

fn error_response(code: &str, reason: String, status: HttpStatus) -> Response {
    let body = ErrorReply {
        code: code.to_string(),
        reason,
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

/// JSON body `{ code, reason }` with a matching HTTP status.
pub fn error_reply(err: &FlightSuretyError) -> Response {
    let status = match err {
        e if e.is_lookup() => HttpStatus::NOT_FOUND,
        FlightSuretyError::NotAuthorized => HttpStatus::FORBIDDEN,
        FlightSuretyError::NotOperational => HttpStatus::SERVICE_UNAVAILABLE,
        _ => HttpStatus::BAD_REQUEST,
    };
    error_response(err.code(), err.to_string(), status)
}

fn with_state(state: RpcState) -> impl Filter<Extract = (RpcState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

async fn request_flight_status(
    body: StatusRequestBody,
    state: RpcState,
) -> std::result::Result<Response, Infallible> {
    let result = {
        let mut system = state.system.lock();
        let owner = system.owner();
        system.fetch_flight_status(owner, body.airline, &body.flight, body.timestamp)
    };
    Ok(match result {
        Ok(index) => {
            info!("Requested status of {}/{} under index {}", body.airline, body.flight, index);
            warp::reply::json(&RequestedIndex { index }).into_response()
        }
        Err(e) => {
            warn!("Status request for {}/{} rejected: {}", body.airline, body.flight, e);
            error_reply(&e)
        }
    })
}

async fn get_flight_status(
    airline: Address,
    flight: String,
    timestamp: u64,
    state: RpcState,
) -> std::result::Result<Response, Infallible> {
    let key = FlightKey::new(airline, flight, timestamp);
    let status = state.system.lock().flight_status(&key);
    Ok(match status {
        Some(status) => warp::reply::json(&FlightStatusReply { flight: key, status }).into_response(),
        None => error_response(
            "StatusUnavailable",
            format!("No finalized status for {}", key),
            HttpStatus::NOT_FOUND,
        ),
    })
}

async fn active_insurance_keys(state: RpcState) -> std::result::Result<Response, Infallible> {
    let keys = state.system.lock().get_active_insurance_keys();
    Ok(match keys {
        Ok(keys) => warp::reply::json(&keys).into_response(),
        Err(e) => error_reply(&e),
    })
}

/// All routes, with CORS for `cors_origin` and request logging.
pub fn routes(
    state: RpcState,
    cors_origin: &str,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let hello = warp::path::end().and(warp::get()).map(|| "Hello World!");

    let airlines_db = warp::path!("airlinesDB")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: RpcState| warp::reply::json(state.store.airlines_db()));

    let flights_db = warp::path!("flightsDB")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: RpcState| warp::reply::json(state.store.flights_db()));

    let airline_ids = warp::path!("airlinesIDs")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: RpcState| warp::reply::json(&state.store.airline_ids()));

    let assign = warp::path!("assign")
        .and(warp::post())
        .and(json_body::<Assignment>())
        .and(with_state(state.clone()))
        .map(|assignment: Assignment, state: RpcState| {
            state.store.assign(&assignment);
            info!("Assigned {} to {}", assignment.iata, assignment.address);
            warp::reply::json(&assignment)
        });

    let request_status = warp::path!("flights" / "status")
        .and(warp::post())
        .and(json_body::<StatusRequestBody>())
        .and(with_state(state.clone()))
        .and_then(request_flight_status);

    let flight_status = warp::path!("flights" / "status" / Address / String / u64)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(get_flight_status);

    let insurance_keys = warp::path!("insurance" / "keys")
        .and(warp::get())
        .and(with_state(state))
        .and_then(active_insurance_keys);

    let cors = warp::cors()
        .allow_origin(cors_origin)
        .allow_methods(vec!["GET", "POST"])
        .allow_headers(vec!["content-type"]);

    hello
        .or(airlines_db)
        .or(flights_db)
        .or(airline_ids)
        .or(assign)
        .or(request_status)
        .or(flight_status)
        .or(insurance_keys)
        .with(cors)
        .with(warp::log("flightsurety_rpc"))
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    state: RpcState,
    cors_origin: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let (bound, server) = warp::serve(routes(state, cors_origin))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .with_context(|| format!("binding RPC listener on {}", addr))?;
    info!("FlightSurety RPC server running at http://{}", bound);
    server.await;
    info!("FlightSurety RPC server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_reply_status_mapping() {
        assert_eq!(error_reply(&FlightSuretyError::NotFound).status(), HttpStatus::NOT_FOUND);
        assert_eq!(error_reply(&FlightSuretyError::NotAuthorized).status(), HttpStatus::FORBIDDEN);
        assert_eq!(
            error_reply(&FlightSuretyError::NotOperational).status(),
            HttpStatus::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_reply(&FlightSuretyError::PremiumTooHigh).status(),
            HttpStatus::BAD_REQUEST
        );
    }
}
