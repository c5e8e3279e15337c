//! HTTP client for the workstation endpoint
//!
//! Maps transport and status failures onto [`FetchError`] kinds. A 401/403
//! also tells the session collaborator that the login is no longer valid.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, warn};

use crate::core::{parse_groups, FetchError, RawGroup, Validated};

/// Receives notice that the backend rejected the current session
pub trait SessionInvalidator: Send + Sync {
    fn invalidate(&self);
}

/// Session validity as a single flag
#[derive(Debug)]
pub struct SessionFlag {
    valid: AtomicBool,
}

impl SessionFlag {
    pub fn new() -> Self {
        Self {
            valid: AtomicBool::new(true),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Mark the session usable again, e.g. after a fresh login
    pub fn reset(&self) {
        self.valid.store(true, Ordering::Release);
    }
}

impl Default for SessionFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionInvalidator for SessionFlag {
    fn invalidate(&self) {
        if self.valid.swap(false, Ordering::AcqRel) {
            warn!("Session invalidated by backend");
        }
    }
}

/// How a response status is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Ok,
    AuthExpired,
    Failed,
}

pub fn classify_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Ok
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        StatusClass::AuthExpired
    } else {
        StatusClass::Failed
    }
}

pub struct HttpFetcher {
    client: Client,
    url: String,
    session: Arc<dyn SessionInvalidator>,
}

impl HttpFetcher {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        session: Arc<dyn SessionInvalidator>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::network(format!("failed to build HTTP client: {e}")))?;
        let url = url.into();
        info!(url = %url, timeout_ms = timeout.as_millis() as u64, "HTTP fetcher ready");
        Ok(Self {
            client,
            url,
            session,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the endpoint once
    pub async fn fetch_groups(&self) -> Validated<Vec<RawGroup>> {
        self.try_fetch().await.into()
    }

    async fn try_fetch(&self) -> Result<Vec<RawGroup>, FetchError> {
        debug!(url = %self.url, "GET workstations");

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, url = %self.url, "Request failed");
                FetchError::network(e.to_string())
            })?;

        let status = response.status();
        match classify_status(status) {
            StatusClass::Ok => {}
            StatusClass::AuthExpired => {
                self.session.invalidate();
                return Err(FetchError::auth_expired(format!("backend answered {status}")));
            }
            StatusClass::Failed => {
                warn!(%status, url = %self.url, "Unexpected status");
                return Err(FetchError::network(format!("backend answered {status}")));
            }
        }

        let body = response.bytes().await.map_err(|e| {
            error!(error = %e, "Failed to read response body");
            FetchError::network(e.to_string())
        })?;
        parse_groups(&body)
    }
}
