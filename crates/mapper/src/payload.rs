//! Request bodies accepted by the Iterable API, one struct per endpoint shape.

use serde::Serialize;
use serde_json::{Map, Value};

use iterable_core::{IntegrationError, IntegrationResult, NormalizedEvent};

use crate::{commerce, identify, track};

pub type DataFields = Map<String, Value>;

/// Body for `/users/update`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub data_fields: DataFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_nested_objects: Option<bool>,
}

/// Body for `/events/track`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTrack {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub event_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    pub data_fields: DataFields,
}

/// Identity block nested in commerce bodies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommerceUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One line item in a cart or purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommerceItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Value>,
    pub data_fields: DataFields,
}

/// Body for `/commerce/updateCart`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartUpdate {
    pub user: CommerceUser,
    pub items: Vec<CommerceItem>,
}

/// Body for `/commerce/trackPurchase`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    pub total: f64,
    pub user: CommerceUser,
    pub data_fields: DataFields,
    pub items: Vec<CommerceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<Value>,
}

/// Any body this destination sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VendorPayload {
    UserUpdate(UserUpdate),
    EventTrack(EventTrack),
    CartUpdate(CartUpdate),
    Purchase(Purchase),
}

impl VendorPayload {
    pub fn to_json(&self) -> IntegrationResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Which transform produces the body for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Identify,
    Track,
    ProductMutation,
    Purchase,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Identify => "identify",
            PayloadKind::Track => "track",
            PayloadKind::ProductMutation => "product_mutation",
            PayloadKind::Purchase => "purchase",
        }
    }

    /// Run the transform for this kind.
    ///
    /// Identify needs an identify event; the other kinds need a track event.
    /// Page and screen views must be converted to track events first.
    pub fn map(self, event: &NormalizedEvent) -> IntegrationResult<VendorPayload> {
        match (self, event) {
            (PayloadKind::Identify, NormalizedEvent::Identify(e)) => {
                Ok(VendorPayload::UserUpdate(identify::map_identify(e)))
            }
            (PayloadKind::Track, NormalizedEvent::Track(e)) => {
                Ok(VendorPayload::EventTrack(track::map_track(e)))
            }
            (PayloadKind::ProductMutation, NormalizedEvent::Track(e)) => {
                Ok(VendorPayload::CartUpdate(commerce::map_product_mutation(e)))
            }
            (PayloadKind::Purchase, NormalizedEvent::Track(e)) => {
                Ok(VendorPayload::Purchase(commerce::map_purchase(e)))
            }
            (kind, event) => Err(IntegrationError::Validation(format!(
                "{} payload cannot be built from a {} event",
                kind.as_str(),
                event.kind()
            ))),
        }
    }
}
