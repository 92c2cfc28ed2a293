// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// A request as seen by a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

/// Carries an encoded batch to the sink and reports its HTTP status.
///
/// `Err` means no status was obtained at all (connection refused, timeout).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: TransportRequest) -> Result<u16, String>;
}

#[derive(Default)]
struct InMemoryState {
    credentials: Option<String>,
    forced_status: Option<u16>,
    unreachable: bool,
    accepted: Vec<TransportRequest>,
}

/// Transport that answers in process, for demos and tests.
///
/// With credentials set it answers `401` to any request whose
/// `Authorization` header does not match them. Accepted requests are kept.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept requests carrying this `Authorization` header value.
    pub fn require_authorization(self, header: impl Into<String>) -> Self {
        self.lock().credentials = Some(header.into());
        self
    }

    /// Answer every request with `status`, or restore normal answers with `None`.
    pub fn set_status(&self, status: Option<u16>) {
        self.lock().forced_status = status;
    }

    /// Fail every request before it gets a status.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    pub fn accepted(&self) -> Vec<TransportRequest> {
        self.lock().accepted.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn post(&self, request: TransportRequest) -> Result<u16, String> {
        let mut state = self.lock();
        if state.unreachable {
            return Err(format!("connection to {} refused", request.url));
        }
        if let Some(status) = state.forced_status {
            return Ok(status);
        }
        if let Some(expected) = &state.credentials {
            if request.headers.get("Authorization") != Some(expected) {
                return Ok(401);
            }
        }
        state.accepted.push(request);
        Ok(200)
    }
}
