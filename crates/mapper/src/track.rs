use iterable_core::event::Track;
use iterable_core::time::unix_seconds;

use crate::dates::rewrite_object_dates;
use crate::payload::EventTrack;

/// Map a non-commerce track call onto an `/events/track` body.
///
/// `revenue` is renamed to `amount`; date strings anywhere in the properties
/// are rewritten to the vendor format.
pub fn map_track(track: &Track) -> EventTrack {
    let mut data_fields = track.properties.clone();
    if let Some(revenue) = data_fields.remove("revenue") {
        if !revenue.is_null() {
            data_fields.insert("amount".to_string(), revenue);
        }
    }
    rewrite_object_dates(&mut data_fields);

    EventTrack {
        email: track.email().map(str::to_string),
        user_id: track.common.user_id().map(str::to_string),
        event_name: track.event.clone(),
        created_at: track.common.timestamp().as_ref().map(unix_seconds),
        data_fields,
    }
}
