//! The push service client.
//!
//! # Design
//! `JPushClient` owns its credentials, the header set derived from them, the
//! endpoint URLs and a transport. None of these change after construction
//! apart from the debug switch, so a client can sit behind an `Arc` and be
//! used from many threads at once.
//!
//! Each operation comes in three forms: `build_*` produces the
//! `HttpRequest`, `parse_*` consumes the `HttpResponse`, and the plain method
//! (`push`, `query_device`, ...) runs build, send and parse in one call. The
//! split halves let callers drive the round-trip themselves and keep the
//! request/response logic testable without a network.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::auth::{default_headers, Credentials};
use crate::device::{DeviceInfoResult, DeviceUpdate};
use crate::error::ApiError;
use crate::http::{Headers, HttpRequest, HttpResponse};
use crate::push::{PushPayload, PushResult};
use crate::response::{acknowledge, decode, Acknowledgement};
use crate::transport::{DebugTransport, Transport, UreqTransport};

pub const DEFAULT_PUSH_BASE: &str = "https://api.jpush.cn/v3";
pub const DEFAULT_DEVICE_BASE: &str = "https://device.jpush.cn/v3";

/// Everything except RFC 3986 unreserved characters is escaped, so an id is
/// always exactly one path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Base URLs of the push and device APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    push_base: String,
    device_base: String,
}

impl Endpoints {
    pub fn new(push_base: &str, device_base: &str) -> Self {
        Self {
            push_base: push_base.trim_end_matches('/').to_string(),
            device_base: device_base.trim_end_matches('/').to_string(),
        }
    }

    /// Serve both APIs from one base URL, as the mock server does.
    pub fn single(base: &str) -> Self {
        Self::new(base, base)
    }

    pub fn push_url(&self) -> String {
        format!("{}/push", self.push_base)
    }

    pub fn push_validate_url(&self) -> String {
        format!("{}/push/validate", self.push_base)
    }

    pub fn device_url(&self, registration_id: &str) -> String {
        let segment = utf8_percent_encode(registration_id, PATH_SEGMENT);
        format!("{}/devices/{segment}", self.device_base)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_PUSH_BASE, DEFAULT_DEVICE_BASE)
    }
}

/// Client for the push, push-validate and device APIs.
pub struct JPushClient<T: Transport = UreqTransport> {
    credentials: Credentials,
    headers: Headers,
    endpoints: Endpoints,
    transport: DebugTransport<T>,
}

impl JPushClient<UreqTransport> {
    /// Client for the public service using the default blocking transport.
    pub fn new(app_key: &str, master_secret: &str) -> Self {
        Self::with_transport(Credentials::new(app_key, master_secret), UreqTransport::new())
    }

    /// Client whose credentials come from the environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::with_transport(
            Credentials::from_env()?,
            UreqTransport::new(),
        ))
    }
}

impl<T: Transport> JPushClient<T> {
    pub fn with_transport(credentials: Credentials, transport: T) -> Self {
        let headers = default_headers(&credentials);
        Self {
            credentials,
            headers,
            endpoints: Endpoints::default(),
            transport: DebugTransport::new(transport),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Log every request and response while enabled. Results are unaffected.
    pub fn set_debug(&self, debug: bool) {
        self.transport.set_enabled(debug);
    }

    pub fn is_debug(&self) -> bool {
        self.transport.is_enabled()
    }

    pub fn app_key(&self) -> &str {
        self.credentials.app_key()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn transport(&self) -> &T {
        self.transport.inner()
    }

    // --- push ---

    pub fn push(&self, payload: &PushPayload) -> Result<PushResult, ApiError> {
        let url = self.endpoints.push_url();
        let response = self.transport.post_json(&url, payload, &self.headers)?;
        self.parse_push(response)
    }

    /// Run a push through the service's checks without delivering it.
    pub fn push_validate(&self, payload: &PushPayload) -> Result<PushResult, ApiError> {
        let url = self.endpoints.push_validate_url();
        let response = self.transport.post_json(&url, payload, &self.headers)?;
        self.parse_push(response)
    }

    pub fn build_push(&self, payload: &PushPayload) -> Result<HttpRequest, ApiError> {
        self.push_request(&self.endpoints.push_url(), payload)
    }

    pub fn build_push_validate(&self, payload: &PushPayload) -> Result<HttpRequest, ApiError> {
        self.push_request(&self.endpoints.push_validate_url(), payload)
    }

    pub fn parse_push(&self, response: HttpResponse) -> Result<PushResult, ApiError> {
        let mut result: PushResult = decode(&response)?;
        result.rate_limit = response.rate_limit();
        Ok(result)
    }

    fn push_request(&self, url: &str, payload: &PushPayload) -> Result<HttpRequest, ApiError> {
        HttpRequest::post_json(url, payload, &self.headers)
    }

    // --- device ---

    pub fn query_device(&self, registration_id: &str) -> Result<DeviceInfoResult, ApiError> {
        let url = self.endpoints.device_url(registration_id);
        self.parse_query_device(self.transport.get(&url, &[], &self.headers)?)
    }

    pub fn update_device(
        &self,
        registration_id: &str,
        update: &DeviceUpdate,
    ) -> Result<Acknowledgement, ApiError> {
        let url = self.endpoints.device_url(registration_id);
        self.parse_update_device(self.transport.post_json(&url, update, &self.headers)?)
    }

    pub fn build_query_device(&self, registration_id: &str) -> HttpRequest {
        HttpRequest::get(&self.endpoints.device_url(registration_id), &[], &self.headers)
    }

    pub fn build_update_device(
        &self,
        registration_id: &str,
        update: &DeviceUpdate,
    ) -> Result<HttpRequest, ApiError> {
        HttpRequest::post_json(&self.endpoints.device_url(registration_id), update, &self.headers)
    }

    pub fn parse_query_device(&self, response: HttpResponse) -> Result<DeviceInfoResult, ApiError> {
        decode(&response)
    }

    pub fn parse_update_device(&self, response: HttpResponse) -> Result<Acknowledgement, ApiError> {
        acknowledge(&response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::http::HttpMethod;
    use crate::push::{Audience, Platform};

    /// Replays one canned response and remembers the requests it saw.
    struct Canned {
        response: HttpResponse,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(status: u16, body: &str) -> Self {
            Self {
                response: HttpResponse::new(status, body),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last(&self) -> HttpRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for Canned {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.response.clone())
        }
    }

    fn client_with(transport: Canned) -> JPushClient<Canned> {
        JPushClient::with_transport(Credentials::new("abc", "def"), transport)
    }

    fn payload() -> PushPayload {
        PushPayload::new(Platform::All, Audience::registration_ids(["reg123"]))
    }

    #[test]
    fn client_headers_carry_basic_auth() {
        let client = JPushClient::new("abc", "def");
        assert_eq!(client.headers().get("Authorization"), Some("Basic YWJjOmRlZg=="));
        assert_eq!(client.app_key(), "abc");
        assert!(!client.is_debug());
    }

    #[test]
    fn build_push_targets_push_endpoint() {
        let client = client_with(Canned::new(200, "{}"));
        let req = client.build_push(&payload()).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://api.jpush.cn/v3/push");
        assert_eq!(req.header("Authorization"), Some("Basic YWJjOmRlZg=="));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn validate_differs_from_push_only_in_url() {
        let client = client_with(Canned::new(200, "{}"));
        let push = client.build_push(&payload()).unwrap();
        let validate = client.build_push_validate(&payload()).unwrap();
        assert_eq!(validate.url, "https://api.jpush.cn/v3/push/validate");
        assert_eq!(push.body, validate.body);
        assert_eq!(push.headers, validate.headers);
        assert_eq!(push.method, validate.method);
    }

    #[test]
    fn build_query_device_templates_registration_id() {
        let client = client_with(Canned::new(200, "{}"));
        let req = client.build_query_device("reg123");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://device.jpush.cn/v3/devices/reg123");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_update_device_posts_partial_body() {
        let client = client_with(Canned::new(200, ""));
        let req = client
            .build_update_device("reg123", &DeviceUpdate::new().alias("bob"))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://device.jpush.cn/v3/devices/reg123");
        assert_eq!(req.body.as_deref(), Some(r#"{"alias":"bob"}"#));
    }

    #[test]
    fn registration_id_is_one_escaped_path_segment() {
        let client = client_with(Canned::new(200, "{}"));
        assert!(client.build_query_device("a#b").url.ends_with("/devices/a%23b"));
        assert!(client.build_query_device("a?x=1").url.ends_with("/devices/a%3Fx%3D1"));
        assert!(client.build_query_device("bad id").url.ends_with("/devices/bad%20id"));
        assert!(client.build_query_device("../push").url.ends_with("/devices/..%2Fpush"));
        assert!(client.build_query_device("100%").url.ends_with("/devices/100%25"));
        // unreserved characters stay readable
        assert!(client.build_query_device("1a-b_c.d~e").url.ends_with("/devices/1a-b_c.d~e"));

        let req = client
            .build_update_device("a#b", &DeviceUpdate::new().alias("x"))
            .unwrap();
        assert!(req.url.ends_with("/devices/a%23b"));
    }

    #[test]
    fn one_shot_calls_send_the_built_requests() {
        let client = client_with(Canned::new(200, r#"{"msg_id":"1"}"#));
        let update = DeviceUpdate::new().add_tags(["vip"]);

        client.push(&payload()).unwrap();
        assert_eq!(client.transport().last(), client.build_push(&payload()).unwrap());
        client.push_validate(&payload()).unwrap();
        assert_eq!(
            client.transport().last(),
            client.build_push_validate(&payload()).unwrap()
        );
        client.query_device("a b").unwrap();
        assert_eq!(client.transport().last(), client.build_query_device("a b"));
        client.update_device("a b", &update).unwrap();
        assert_eq!(
            client.transport().last(),
            client.build_update_device("a b", &update).unwrap()
        );
    }

    #[test]
    fn endpoints_strip_trailing_slash() {
        let client = client_with(Canned::new(200, "{}"))
            .with_endpoints(Endpoints::single("http://localhost:3000/v3/"));
        let req = client.build_query_device("r1");
        assert_eq!(req.url, "http://localhost:3000/v3/devices/r1");
    }

    #[test]
    fn query_device_decodes_info() {
        let client = client_with(Canned::new(200, r#"{"tags":["vip"],"alias":"bob"}"#));
        let info = client.query_device("reg123").unwrap();
        assert_eq!(info.tags, vec!["vip".to_string()]);
        assert_eq!(info.alias.as_deref(), Some("bob"));
        assert!(client.transport().last().url.contains("reg123"));
    }

    #[test]
    fn push_reports_remote_error() {
        let client = client_with(Canned::new(
            400,
            r#"{"error":{"code":1011,"message":"Missing senders"}}"#,
        ));
        match client.push(&payload()).unwrap_err() {
            ApiError::Remote { code, message, .. } => {
                assert_eq!(code, 1011);
                assert_eq!(message, "Missing senders");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn push_attaches_rate_limit() {
        let mut response = HttpResponse::new(200, r#"{"sendno":"7","msg_id":"42"}"#);
        response.headers = vec![
            ("X-Rate-Limit-Limit".into(), "600".into()),
            ("X-Rate-Limit-Remaining".into(), "10".into()),
            ("X-Rate-Limit-Reset".into(), "30".into()),
        ];
        let client = client_with(Canned::new(200, "{}"));
        let result = client.parse_push(response).unwrap();
        assert_eq!(result.msg_id, "42");
        assert_eq!(result.sendno.as_deref(), Some("7"));
        assert_eq!(result.rate_limit.map(|r| r.remaining), Some(10));
    }

    #[test]
    fn update_device_returns_acknowledgement() {
        let client = client_with(Canned::new(200, ""));
        let ack = client
            .update_device("reg123", &DeviceUpdate::new().add_tags(["vip"]))
            .unwrap();
        assert_eq!(ack.status, 200);
    }

    #[test]
    fn failed_call_leaves_client_usable() {
        let client = client_with(Canned::new(500, "oops"));
        assert!(client.query_device("a").unwrap_err().is_malformed());
        assert!(client.query_device("b").unwrap_err().is_malformed());
        assert_eq!(client.transport().seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn debug_mode_does_not_change_results() {
        let client = client_with(Canned::new(200, r#"{"msg_id":"1"}"#));
        let quiet = client.push(&payload()).unwrap();
        client.set_debug(true);
        let loud = client.push(&payload()).unwrap();
        assert!(client.is_debug());
        assert_eq!(quiet, loud);
    }
}
