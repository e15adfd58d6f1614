//! Cart and purchase bodies.
//!
//! Line items keep a fixed set of commerce fields at the top level; every
//! other item property is moved under the item's `dataFields`.

use serde_json::{Number, Value};

use iterable_core::event::{coerce_number, Object, Track};
use iterable_core::time::unix_seconds;

use crate::dates::{drop_nulls, rewrite_object_dates};
use crate::payload::{CartUpdate, CommerceItem, CommerceUser, DataFields, Purchase};

/// Item keys lifted to the top level of a [`CommerceItem`].
const ITEM_FIELDS: [&str; 8] = [
    "id",
    "productId",
    "product_id",
    "sku",
    "name",
    "category",
    "price",
    "quantity",
];

/// Track properties that never end up in a purchase's `dataFields`.
const PURCHASE_RESERVED: [&str; 6] = [
    "total",
    "products",
    "cart",
    "revenue",
    "templateId",
    "campaignId",
];

/// Map an Added/Removed Product call carrying a cart onto `/commerce/updateCart`.
pub fn map_product_mutation(track: &Track) -> CartUpdate {
    CartUpdate {
        user: commerce_user(track),
        items: format_products(&track.products()),
    }
}

/// Map a completed order onto `/commerce/trackPurchase`.
///
/// Without an explicit `total`, the total is the sum of `price * quantity`
/// over the line items; items missing either contribute nothing.
pub fn map_purchase(track: &Track) -> Purchase {
    let products = track.products();
    let total = track.total().unwrap_or_else(|| line_item_total(&products));

    let mut data_fields: DataFields = track
        .properties
        .iter()
        .filter(|(key, _)| !PURCHASE_RESERVED.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    drop_nulls(&mut data_fields);
    rewrite_object_dates(&mut data_fields);

    Purchase {
        created_at: track.common.timestamp().as_ref().map(unix_seconds),
        total,
        user: commerce_user(track),
        data_fields,
        items: format_products(&products),
        template_id: present(track.properties.get("templateId")),
        campaign_id: present(track.properties.get("campaignId")),
    }
}

/// Convert line items into the vendor's item shape.
pub fn format_products(products: &[&Object]) -> Vec<CommerceItem> {
    products.iter().map(|item| format_product(item)).collect()
}

fn format_product(item: &Object) -> CommerceItem {
    let id = ["id", "productId", "product_id"]
        .iter()
        .find_map(|key| text(item.get(*key)));

    let categories = match item.get("category") {
        Some(Value::Array(values)) => values.iter().filter_map(|v| text(Some(v))).collect(),
        other => text(other).into_iter().collect(),
    };

    let mut data_fields: DataFields = item
        .iter()
        .filter(|(key, _)| !ITEM_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    drop_nulls(&mut data_fields);
    rewrite_object_dates(&mut data_fields);

    CommerceItem {
        id,
        sku: text(item.get("sku")),
        name: text(item.get("name")),
        categories,
        price: number(item.get("price")),
        quantity: number(item.get("quantity")),
        data_fields,
    }
}

fn line_item_total(products: &[&Object]) -> f64 {
    products
        .iter()
        .map(|item| {
            let price = item.get("price").and_then(coerce_number).unwrap_or(0.0);
            let quantity = item.get("quantity").and_then(coerce_number).unwrap_or(0.0);
            price * quantity
        })
        .sum()
}

fn commerce_user(track: &Track) -> CommerceUser {
    CommerceUser {
        user_id: track.common.user_id().map(str::to_string),
        email: track.email().map(str::to_string),
    }
}

fn present(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

/// Strings pass through; numbers and booleans are rendered as text.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers pass through unchanged; numeric strings become numbers.
fn number(value: Option<&Value>) -> Option<Value> {
    match value? {
        Value::Number(n) => Some(Value::Number(n.clone())),
        other => coerce_number(other)
            .and_then(Number::from_f64)
            .map(Value::Number),
    }
}
