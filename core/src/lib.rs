//! Blocking client core for the JPush REST API v3.
//!
//! # Overview
//! Covers push, push validation, device query and device update. Every call
//! follows the same path: build an `HttpRequest` carrying the client's fixed
//! headers, hand it to a `Transport`, and decode the `HttpResponse` through
//! one shared decoder into a typed result or an `ApiError`.
//!
//! # Design
//! - `JPushClient` is immutable after construction except for its debug
//!   switch, so one instance can serve many threads.
//! - Operations are split into `build_*` / `parse_*` halves around the
//!   transport call, keeping request construction and decoding testable
//!   without a network.
//! - `Transport` is the I/O seam. `UreqTransport` is the default;
//!   `DebugTransport` adds request/response logging without touching results.
//! - There is no retry or backoff. Each call is one round-trip.

pub mod auth;
pub mod client;
pub mod device;
pub mod error;
pub mod http;
pub mod push;
pub mod response;
pub mod transport;

pub use auth::{basic_auth, Credentials};
pub use client::{Endpoints, JPushClient};
pub use device::{DeviceInfoResult, DeviceUpdate, TagUpdate};
pub use error::ApiError;
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse, RateLimit};
pub use push::{
    AndroidNotification, Audience, AudienceTargets, DevicePlatform, IosNotification, Message,
    Notification, Platform, PushOptions, PushPayload, PushResult,
};
pub use response::{Acknowledgement, ErrorDetail};
pub use transport::{DebugTransport, Transport, UreqTransport};
