use serde_json::Value;

use iterable_core::{IntegrationResult, IterableSettings};
use iterable_mapper::VendorPayload;

use crate::routing::{DispatchPlan, Endpoint};

/// Client identifier sent as `User-Agent` on every request.
pub const CLIENT_USER_AGENT: &str = concat!("iterable-relay/", env!("CARGO_PKG_VERSION"));

pub const API_KEY_HEADER: &str = "Api-Key";

/// An outbound request, complete before any I/O happens.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorRequest {
    pub method: &'static str,
    pub endpoint: Endpoint,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

impl VendorRequest {
    pub fn new(
        settings: &IterableSettings,
        endpoint: Endpoint,
        payload: &VendorPayload,
    ) -> IntegrationResult<Self> {
        let url = format!("{}{}", settings.endpoint.trim_end_matches('/'), endpoint.path());
        Ok(Self {
            method: DispatchPlan::METHOD,
            endpoint,
            url,
            headers: vec![
                ("User-Agent", CLIENT_USER_AGENT.to_string()),
                (API_KEY_HEADER, settings.api_key.clone()),
                ("Content-Type", "application/json".to_string()),
            ],
            body: payload.to_json()?,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_bytes(&self) -> IntegrationResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.body)?)
    }
}
