//! Endpoint selection and request dispatch for the Iterable destination.
//!
//! # Modules
//!
//! - [`routing`]: Event-name decision table and [`DispatchPlan`]
//! - [`request`]: Fully built outbound requests
//! - [`pages`]: Page/screen forwarding switches
//! - [`runtime`]: HTTP runtime collaborator with retries
//! - [`destination`]: The [`Iterable`] destination: validation and dispatch

pub mod destination;
pub mod pages;
pub mod request;
pub mod routing;
pub mod runtime;

pub use destination::{DispatchOutcome, Iterable, Planned};
pub use request::VendorRequest;
pub use routing::{DispatchPlan, Endpoint};
pub use runtime::{HttpIntegrationRuntime, HttpRuntime, RetryPolicy, VendorResponse};
