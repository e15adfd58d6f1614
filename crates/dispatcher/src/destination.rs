//! The Iterable destination.
//!
//! Each call validates its preconditions, picks an endpoint, runs the mapper
//! and hands exactly one built request to the runtime. Nothing is retried or
//! cached here.

use std::borrow::Cow;

use tracing::debug;
use uuid::Uuid;

use iterable_core::event::{Alias, Identify, Page, Track};
use iterable_core::{IntegrationError, IntegrationResult, IterableSettings, NormalizedEvent};

use crate::pages::{view_event_name, ViewKind};
use crate::request::VendorRequest;
use crate::routing::{plan_identify, plan_track};
use crate::runtime::{HttpIntegrationRuntime, VendorResponse};

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent(VendorResponse),
    Skipped { reason: String },
}

/// Pure result of planning a call: the request to send, or why nothing is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Planned {
    Send(VendorRequest),
    Skip(&'static str),
}

pub struct Iterable<R> {
    settings: IterableSettings,
    runtime: R,
}

impl<R: HttpIntegrationRuntime> Iterable<R> {
    pub fn new(settings: IterableSettings, runtime: R) -> Self {
        Self { settings, runtime }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Preconditions checked before any request is built: a non-empty API key
    /// and a non-empty `userId` or email on the event.
    pub fn validate(&self, event: &NormalizedEvent) -> IntegrationResult<()> {
        if self.settings.api_key.trim().is_empty() {
            return Err(IntegrationError::Configuration(
                "apiKey is required".to_string(),
            ));
        }
        if event.user_id().is_none() && event.email().is_none() {
            return Err(IntegrationError::Validation(format!(
                "{} event requires a userId or an email",
                event.kind()
            )));
        }
        Ok(())
    }

    /// Validate, route and map an event without sending anything.
    pub fn plan(&self, event: &NormalizedEvent) -> IntegrationResult<Planned> {
        self.validate(event)?;

        let routed = match event {
            NormalizedEvent::Page(view) => match self.view_as_track(view, ViewKind::Page) {
                Some(track) => Cow::Owned(track),
                None => return Ok(Planned::Skip("no page forwarding switch matched")),
            },
            NormalizedEvent::Screen(view) => match self.view_as_track(view, ViewKind::Screen) {
                Some(track) => Cow::Owned(track),
                None => return Ok(Planned::Skip("no screen forwarding switch matched")),
            },
            NormalizedEvent::Alias(_) => return Ok(Planned::Skip("alias is not supported")),
            other => Cow::Borrowed(other),
        };

        let plan = match &*routed {
            NormalizedEvent::Track(track) => plan_track(track),
            _ => plan_identify(),
        };
        let payload = plan.kind.map(&routed)?;
        let request = VendorRequest::new(&self.settings, plan.endpoint, &payload)?;
        Ok(Planned::Send(request))
    }

    /// Send one event through the runtime.
    pub async fn dispatch(&self, event: &NormalizedEvent) -> IntegrationResult<DispatchOutcome> {
        let request_id = Uuid::new_v4();
        match self.plan(event)? {
            Planned::Skip(reason) => {
                debug!(%request_id, kind = event.kind(), reason, "event skipped");
                Ok(DispatchOutcome::Skipped {
                    reason: reason.to_string(),
                })
            }
            Planned::Send(request) => {
                debug!(
                    %request_id,
                    kind = event.kind(),
                    endpoint = request.endpoint.path(),
                    "dispatching event"
                );
                let response = self.runtime.send(&request).await?;
                Ok(DispatchOutcome::Sent(response))
            }
        }
    }

    pub async fn identify(&self, identify: &Identify) -> IntegrationResult<DispatchOutcome> {
        self.dispatch(&NormalizedEvent::Identify(identify.clone())).await
    }

    pub async fn track(&self, track: &Track) -> IntegrationResult<DispatchOutcome> {
        self.dispatch(&NormalizedEvent::Track(track.clone())).await
    }

    pub async fn page(&self, page: &Page) -> IntegrationResult<DispatchOutcome> {
        self.dispatch(&NormalizedEvent::Page(page.clone())).await
    }

    pub async fn screen(&self, screen: &Page) -> IntegrationResult<DispatchOutcome> {
        self.dispatch(&NormalizedEvent::Screen(screen.clone())).await
    }

    pub async fn alias(&self, alias: &Alias) -> IntegrationResult<DispatchOutcome> {
        self.dispatch(&NormalizedEvent::Alias(alias.clone())).await
    }

    fn view_as_track(&self, view: &Page, kind: ViewKind) -> Option<NormalizedEvent> {
        let name = view_event_name(&self.settings, view, kind)?;
        Some(NormalizedEvent::Track(view.to_track(name)))
    }
}
