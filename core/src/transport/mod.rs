//! The seam between the client and the network.
//!
//! `Transport` is the only place a request leaves the process. Consumers can
//! bring their own HTTP stack by implementing `send`; `UreqTransport` is the
//! blocking default and `DebugTransport` wraps any transport with optional
//! request/response logging.

mod debug;
mod ureq_impl;

use serde::Serialize;

use crate::error::ApiError;
use crate::http::{Headers, HttpRequest, HttpResponse};

pub use debug::DebugTransport;
pub use ureq_impl::UreqTransport;

/// Blocking HTTP transport.
///
/// Implementations perform exactly one round-trip per call and must return
/// non-2xx responses as `Ok` so the decoder can interpret them. Failures that
/// leave no response (DNS, connect, TLS, timeout) map to
/// `ApiError::Transport`. No retries.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;

    /// Perform a GET request with query parameters.
    fn get(
        &self,
        url: &str,
        query_params: &[(&str, String)],
        headers: &Headers,
    ) -> Result<HttpResponse, ApiError> {
        self.send(&HttpRequest::get(url, query_params, headers))
    }

    /// Perform a POST request with `body` serialized as JSON.
    fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        headers: &Headers,
    ) -> Result<HttpResponse, ApiError>
    where
        Self: Sized,
    {
        self.send(&HttpRequest::post_json(url, body, headers)?)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}
