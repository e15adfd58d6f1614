//! Normalized analytics events as they arrive from the common event schema.
//!
//! Every event variant shares [`EventCommon`]; the variant-specific payload
//! (traits, properties, page naming) lives on the variant struct. Accessors
//! follow the schema's lookup rules so the mapper never digs into raw JSON for
//! identity fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::time::parse_instant;

pub type Object = Map<String, Value>;

/// Top-level event, tagged by its `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NormalizedEvent {
    Identify(Identify),
    Track(Track),
    Page(Page),
    Screen(Page),
    Alias(Alias),
}

/// Fields carried by every event variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCommon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Kept raw so that loosely formatted timestamps still parse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub context: Object,
    #[serde(default)]
    pub integrations: Object,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Identify {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub traits: Object,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Track {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub properties: Object,
}

/// Page and screen views share one shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub properties: Object,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alias {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_id: Option<String>,
}

impl EventCommon {
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|s| !s.is_empty())
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_ref().and_then(parse_instant)
    }

    /// Per-destination override block under `integrations.<destination>`.
    pub fn integration_options(&self, destination: &str) -> Option<&Object> {
        self.integrations.get(destination).and_then(Value::as_object)
    }

    /// Email fallbacks shared by every variant: `context.traits.email`, then a
    /// `userId` that is itself an address.
    fn fallback_email(&self) -> Option<&str> {
        self.context
            .get("traits")
            .and_then(|traits| non_empty_str(traits.get("email")))
            .or_else(|| self.user_id().filter(|id| id.contains('@')))
    }
}

impl Identify {
    pub fn email(&self) -> Option<&str> {
        non_empty_str(self.traits.get("email")).or_else(|| self.common.fallback_email())
    }

    /// Account creation instant from the `created` or `createdAt` trait.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        ["created", "createdAt"]
            .iter()
            .filter_map(|key| self.traits.get(*key))
            .find_map(parse_instant)
    }
}

impl Track {
    pub fn email(&self) -> Option<&str> {
        non_empty_str(self.properties.get("email")).or_else(|| self.common.fallback_email())
    }

    /// Line items from `properties.products`, else `properties.cart`.
    ///
    /// Only JSON arrays count as a cart; scalar or object values under those
    /// keys yield no products. Non-object entries are skipped.
    pub fn products(&self) -> Vec<&Object> {
        ["products", "cart"]
            .iter()
            .find_map(|key| self.properties.get(*key).and_then(Value::as_array))
            .map(|items| items.iter().filter_map(Value::as_object).collect())
            .unwrap_or_default()
    }

    pub fn total(&self) -> Option<f64> {
        self.properties.get("total").and_then(coerce_number)
    }
}

impl Page {
    pub fn email(&self) -> Option<&str> {
        non_empty_str(self.properties.get("email")).or_else(|| self.common.fallback_email())
    }

    /// `<category> <name>` when both are present, otherwise whichever exists.
    pub fn full_name(&self) -> Option<String> {
        let name = self.name.as_deref().filter(|s| !s.is_empty());
        let category = self.category.as_deref().filter(|s| !s.is_empty());
        match (category, name) {
            (Some(c), Some(n)) => Some(format!("{c} {n}")),
            (None, Some(n)) => Some(n.to_string()),
            (Some(c), None) => Some(c.to_string()),
            (None, None) => None,
        }
    }

    /// Re-express this view as a track event with the given name.
    ///
    /// The view's `name`, `category` and the context page fields are folded
    /// into the properties; explicit properties win on conflicts.
    pub fn to_track(&self, event: impl Into<String>) -> Track {
        let mut properties = Object::new();
        if let Some(page) = self.common.context.get("page").and_then(Value::as_object) {
            for key in ["path", "referrer", "search", "title", "url"] {
                if let Some(value) = page.get(key).filter(|v| !v.is_null()) {
                    properties.insert(key.to_string(), value.clone());
                }
            }
        }
        if let Some(name) = &self.name {
            properties.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(category) = &self.category {
            properties.insert("category".to_string(), Value::String(category.clone()));
        }
        for (key, value) in &self.properties {
            properties.insert(key.clone(), value.clone());
        }
        Track {
            common: self.common.clone(),
            event: event.into(),
            properties,
        }
    }
}

impl NormalizedEvent {
    pub fn common(&self) -> &EventCommon {
        match self {
            NormalizedEvent::Identify(e) => &e.common,
            NormalizedEvent::Track(e) => &e.common,
            NormalizedEvent::Page(e) | NormalizedEvent::Screen(e) => &e.common,
            NormalizedEvent::Alias(e) => &e.common,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NormalizedEvent::Identify(_) => "identify",
            NormalizedEvent::Track(_) => "track",
            NormalizedEvent::Page(_) => "page",
            NormalizedEvent::Screen(_) => "screen",
            NormalizedEvent::Alias(_) => "alias",
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.common().user_id()
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            NormalizedEvent::Identify(e) => e.email(),
            NormalizedEvent::Track(e) => e.email(),
            NormalizedEvent::Page(e) | NormalizedEvent::Screen(e) => e.email(),
            NormalizedEvent::Alias(e) => e.common.fallback_email(),
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Read a JSON number, accepting numeric strings such as `"5.50"`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
