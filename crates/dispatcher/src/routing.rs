//! Endpoint selection policy.
//!
//! Track events are routed through [`ROUTES`], a table keyed by event name.
//! Cart mutations only reach the commerce endpoint when the event carries a
//! non-empty products array; purchases always do.

use iterable_core::event::Track;
use iterable_mapper::PayloadKind;

/// Vendor endpoints, relative to the configured base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    UsersUpdate,
    EventsTrack,
    CommerceUpdateCart,
    CommerceTrackPurchase,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::UsersUpdate => "/users/update",
            Endpoint::EventsTrack => "/events/track",
            Endpoint::CommerceUpdateCart => "/commerce/updateCart",
            Endpoint::CommerceTrackPurchase => "/commerce/trackPurchase",
        }
    }
}

/// One row of the track decision table.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub events: &'static [&'static str],
    /// Fall back to the generic track endpoint when no products are present.
    pub requires_cart: bool,
    pub endpoint: Endpoint,
    pub kind: PayloadKind,
}

pub const ROUTES: &[Route] = &[
    Route {
        events: &["Added Product", "Product Added"],
        requires_cart: true,
        endpoint: Endpoint::CommerceUpdateCart,
        kind: PayloadKind::ProductMutation,
    },
    Route {
        events: &["Removed Product", "Product Removed"],
        requires_cart: true,
        endpoint: Endpoint::CommerceUpdateCart,
        kind: PayloadKind::ProductMutation,
    },
    Route {
        events: &["Completed Order", "Order Completed"],
        requires_cart: false,
        endpoint: Endpoint::CommerceTrackPurchase,
        kind: PayloadKind::Purchase,
    },
];

/// Endpoint and transform chosen for one call. Every request is a JSON POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPlan {
    pub endpoint: Endpoint,
    pub kind: PayloadKind,
}

impl DispatchPlan {
    pub const METHOD: &'static str = "POST";

    const GENERIC_TRACK: DispatchPlan = DispatchPlan {
        endpoint: Endpoint::EventsTrack,
        kind: PayloadKind::Track,
    };
}

pub fn plan_identify() -> DispatchPlan {
    DispatchPlan {
        endpoint: Endpoint::UsersUpdate,
        kind: PayloadKind::Identify,
    }
}

pub fn plan_track(track: &Track) -> DispatchPlan {
    let route = ROUTES
        .iter()
        .find(|route| route.events.contains(&track.event.as_str()));

    match route {
        Some(route) if !route.requires_cart || !track.products().is_empty() => DispatchPlan {
            endpoint: route.endpoint,
            kind: route.kind,
        },
        _ => DispatchPlan::GENERIC_TRACK,
    }
}
