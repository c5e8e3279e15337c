//! Decoder for the backend's workstation payload

use super::error::FetchError;
use super::model::RawGroup;
use tracing::{trace, warn};

/// Decode the JSON array of groups returned by the backend
pub fn parse_groups(body: &[u8]) -> Result<Vec<RawGroup>, FetchError> {
    trace!(len = body.len(), "Parsing workstation payload");

    serde_json::from_slice::<Vec<RawGroup>>(body).map_err(|e| {
        warn!(error = %e, "Payload does not match the workstation contract");
        FetchError::from(e)
    })
}
