// src/dispatch/handler.rs
//! Three-action request protocol
//!
//! Requests are a tagged union rather than stringly-typed action dispatch, one
//! handler arm per variant. Every action forces the lazy load before touching
//! the buffer, and every action produces a response: capture acknowledges
//! success unconditionally so the sending shim never blocks or retries on it.

use crate::capture::event::CapturedEvent;
use crate::persistence::backing::DurableBacking;
use crate::persistence::coordinator::CaptureEngine;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Inbound request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    /// Read-only snapshot of the buffer
    GetEvents,

    /// Drop everything and persist the empty sequence
    ClearEvents,

    /// Ingest one raw compressed payload
    CaptureEvent {
        url: String,
        data: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
}

/// Outbound response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    /// Snapshot, newest first
    Events { events: Vec<CapturedEvent> },

    /// Acknowledgement for clear and capture
    Ack { success: bool },
}

/// Routes requests to the capture engine
pub struct Dispatcher<B> {
    engine: CaptureEngine<B>,
}

impl<B: DurableBacking> Dispatcher<B> {
    /// Wrap an engine
    pub fn new(engine: CaptureEngine<B>) -> Self {
        Self { engine }
    }

    /// Handle one request; never panics, always responds
    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::GetEvents => Response::Events {
                events: self.engine.events().await,
            },
            Request::ClearEvents => {
                let result = self.engine.clear().await;
                if let Err(e) = &result {
                    warn!("Clear could not be persisted: {}", e);
                }
                Response::Ack {
                    success: result.is_ok(),
                }
            }
            Request::CaptureEvent {
                url,
                data,
                timestamp,
            } => {
                self.engine.capture(&url, &data, timestamp).await;
                // The in-page shim must never block or retry on capture
                Response::Ack { success: true }
            }
        }
    }
}
