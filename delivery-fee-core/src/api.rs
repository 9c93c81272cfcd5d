//! JSON payloads exchanged with fee API clients.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    model::FeeQuery,
    service::{FeeError, FeeService},
};

pub const INVALID_REQUEST: &str = "Invalid request body: please provide a valid JSON";

/// Request body: `{"city": "Tallinn", "vehicle": "Car", "timestamp": 1741972499}`.
///
/// `timestamp` is optional; when omitted the latest observation is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRequest {
    pub city: String,
    pub vehicle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl From<FeeRequest> for FeeQuery {
    fn from(request: FeeRequest) -> Self {
        FeeQuery { city: request.city, vehicle: request.vehicle, timestamp: request.timestamp }
    }
}

/// Response body: either `{"fee": 4.0}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeeResponse {
    Fee { fee: f64 },
    Error { error: String },
}

impl FeeResponse {
    pub fn error(message: impl Into<String>) -> Self {
        FeeResponse::Error { error: message.into() }
    }
}

impl From<Result<f64, FeeError>> for FeeResponse {
    fn from(result: Result<f64, FeeError>) -> Self {
        match result {
            Ok(fee) => FeeResponse::Fee { fee },
            // Clients cannot tell an unknown vehicle from a prohibited one.
            Err(FeeError::VehicleUnknown) => {
                FeeResponse::error(FeeError::VehicleProhibited.to_string())
            }
            Err(err) => FeeResponse::error(err.to_string()),
        }
    }
}

/// Answer a raw JSON request body.
pub fn handle_json(service: &FeeService, body: &str) -> FeeResponse {
    match serde_json::from_str::<FeeRequest>(body) {
        Ok(request) => handle(service, request),
        Err(err) => {
            debug!(error = %err, "Rejected malformed fee request");
            FeeResponse::error(INVALID_REQUEST)
        }
    }
}

pub fn handle(service: &FeeService, request: FeeRequest) -> FeeResponse {
    service.get_fee(&request.into()).into()
}
