//! Pure transforms from normalized events into Iterable request bodies.
//!
//! # Modules
//!
//! - [`payload`]: Typed vendor payloads and the [`PayloadKind`] selector
//! - [`identify`]: `/users/update` bodies
//! - [`track`]: `/events/track` bodies
//! - [`commerce`]: cart and purchase bodies, line item formatting
//! - [`dates`]: recursive rewrite of ISO dates into the vendor format

pub mod commerce;
pub mod dates;
pub mod identify;
pub mod payload;
pub mod track;

pub use commerce::{format_products, map_product_mutation, map_purchase};
pub use identify::map_identify;
pub use payload::{PayloadKind, VendorPayload};
pub use track::map_track;
