pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::Result;

/// HTTP verbs used by dispatch operations.
///
/// The mapping is fixed: fetch/get use GET, create POST, update PUT,
/// delete DELETE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Response envelope returned by transport calls.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub data: Value,
}

impl TransportResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    /// Bare-data response, for transports that have no status concept.
    pub fn data(data: Value) -> Self {
        Self { status: 200, data }
    }
}

/// The network seam consumed by dispatch orchestration.
///
/// This trait keeps the library agnostic to the transport in use: the
/// bundled [`HttpTransport`] talks to a real REST endpoint, while tests
/// drive the same operations against an in-memory fake.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(
        &self,
        method: Method,
        url: &str,
        payload: Option<Value>,
    ) -> Result<TransportResponse>;
}
