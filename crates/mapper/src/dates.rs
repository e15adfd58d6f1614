use serde_json::Value;

use iterable_core::time::{format_vendor_date, parse_iso_instant};

/// Rewrite every ISO-8601 string found in `value`, at any depth, into the
/// vendor date format. Other values are left untouched.
pub fn rewrite_dates(value: &mut Value) {
    match value {
        Value::String(s) => {
            if let Some(instant) = parse_iso_instant(s) {
                *s = format_vendor_date(&instant);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_dates),
        Value::Object(map) => map.values_mut().for_each(rewrite_dates),
        _ => {}
    }
}

/// Same as [`rewrite_dates`] for a bare object.
pub fn rewrite_object_dates(map: &mut serde_json::Map<String, Value>) {
    map.values_mut().for_each(rewrite_dates);
}

/// Drop `null` entries from the top level of an object.
pub fn drop_nulls(map: &mut serde_json::Map<String, Value>) {
    map.retain(|_, v| !v.is_null());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_rewrite() {
        let mut value = json!({
            "birthday": "1990-04-02",
            "plan": { "renewsAt": "2016-02-01T10:00:00.000Z", "seats": 4 },
            "history": ["2015-01-01T00:00:00Z", "free text"],
            "phone": "555-1234"
        });
        rewrite_dates(&mut value);
        assert_eq!(value["birthday"], "1990-04-02 00:00:00 +00:00");
        assert_eq!(value["plan"]["renewsAt"], "2016-02-01 10:00:00 +00:00");
        assert_eq!(value["plan"]["seats"], 4);
        assert_eq!(value["history"][0], "2015-01-01 00:00:00 +00:00");
        assert_eq!(value["history"][1], "free text");
        assert_eq!(value["phone"], "555-1234");
    }

    #[test]
    fn test_drop_nulls() {
        let mut map = json!({ "a": null, "b": 1, "c": { "d": null } })
            .as_object()
            .cloned()
            .unwrap();
        drop_nulls(&mut map);
        assert!(!map.contains_key("a"));
        assert_eq!(map["b"], 1);
        assert!(map["c"].get("d").is_some());
    }
}
