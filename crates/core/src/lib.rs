//! Shared building blocks for the Iterable destination: the normalized event
//! model, configuration, the error taxonomy and the vendor date format.

pub mod config;
pub mod error;
pub mod event;
pub mod time;

/// Key of this destination inside an event's `integrations` block.
pub const DESTINATION_NAME: &str = "Iterable";

pub use config::{AppConfig, HttpSettings, IterableSettings};
pub use error::{IntegrationError, IntegrationResult};
pub use event::{Alias, Identify, NormalizedEvent, Page, Track};
