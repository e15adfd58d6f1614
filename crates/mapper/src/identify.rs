use chrono::SecondsFormat;
use serde_json::Value;

use iterable_core::event::{Identify, Object};
use iterable_core::time::format_vendor_date;
use iterable_core::DESTINATION_NAME;

use crate::dates::{drop_nulls, rewrite_object_dates};
use crate::payload::{DataFields, UserUpdate};

/// Context keys copied into the user's data fields.
const CONTEXT_FIELDS: [&str; 8] = [
    "app",
    "device",
    "ip",
    "locale",
    "location",
    "page",
    "timeZone",
    "userAgent",
];

/// Map an identify call onto a `/users/update` body.
///
/// Traits win over context values with the same key. The vendor rejects `id`
/// inside data fields, so it is removed.
pub fn map_identify(identify: &Identify) -> UserUpdate {
    let mut data_fields = context_fields(&identify.common.context);
    for (key, value) in &identify.traits {
        data_fields.insert(key.clone(), value.clone());
    }

    drop_nulls(&mut data_fields);

    if let Some(phone) = data_fields.remove("phone") {
        data_fields.entry("phoneNumber").or_insert(phone);
    }
    data_fields.remove("id");

    let created = identify.created();
    if created.is_some() {
        data_fields.remove("created");
        data_fields.remove("createdAt");
    }

    rewrite_object_dates(&mut data_fields);

    // Added after the date rewrite: `met` stays ISO-8601.
    if let Some(created) = created {
        data_fields.insert(
            "met".to_string(),
            Value::String(created.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }
    if let Some(timestamp) = identify.common.timestamp() {
        data_fields.insert(
            "profileUpdatedAt".to_string(),
            Value::String(format_vendor_date(&timestamp)),
        );
    }

    let merge_nested_objects = identify
        .common
        .integration_options(DESTINATION_NAME)
        .and_then(|options| options.get("mergeNestedObjects"))
        .and_then(Value::as_bool);

    UserUpdate {
        email: identify.email().map(str::to_string),
        user_id: identify.common.user_id().map(str::to_string),
        data_fields,
        merge_nested_objects,
    }
}

fn context_fields(context: &Object) -> DataFields {
    let mut fields = DataFields::new();
    for key in CONTEXT_FIELDS {
        let value = match key {
            "timeZone" => present(context, "timeZone").or_else(|| present(context, "timezone")),
            _ => context.get(key),
        };
        if let Some(value) = value {
            fields.insert(key.to_string(), value.clone());
        }
    }
    fields
}

fn present<'a>(context: &'a Object, key: &str) -> Option<&'a Value> {
    context.get(key).filter(|v| !v.is_null())
}
