//! Fan-out of events to every route whose filter accepts them.
//!
//! Each accepting (route, destination) pair is delivered independently: one
//! destination failing never blocks another, and failures are reported to the
//! diagnostic sink rather than returned. Nothing is retried.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::event::Event;
use crate::filters::{Filter, Verdict};
use crate::formats::RenderContext;
use crate::transports::{Delivery, DeliveryError, Transport};

/// A filter and the destinations it feeds.
#[derive(Clone)]
pub struct Route {
    /// Filter name from configuration.
    pub filter_name: String,
    /// The filter.
    pub filter: Arc<dyn Filter>,
    /// Destinations receiving accepted events.
    pub destinations: Vec<Arc<dyn Transport>>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let destinations: Vec<&str> = self.destinations.iter().map(|d| d.name()).collect();
        f.debug_struct("Route")
            .field("filter_name", &self.filter_name)
            .field("destinations", &destinations)
            .finish()
    }
}

/// Outcome of one (route, destination) delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Filter that accepted the event.
    pub filter: String,
    /// Destination name.
    pub destination: String,
    /// Whether the route's filter flagged the event as urgent.
    pub urgent: bool,
    /// What happened.
    pub outcome: Result<Delivery, DeliveryError>,
}

/// Decrements the in-flight counter when a delivery task ends, even by panic.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Planned {
    filter: String,
    transport: Arc<dyn Transport>,
    ctx: RenderContext,
}

/// Routes events to destinations.
pub struct Dispatcher {
    routes: Vec<Route>,
    diagnostics: Arc<dyn DiagnosticSink>,
    in_flight: Arc<AtomicUsize>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Dispatcher over `routes`, reporting failures to `diagnostics`.
    pub fn new(routes: Vec<Route>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            routes,
            diagnostics,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Configured routes.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Deliveries currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Every distinct destination, in first-seen order.
    pub fn transports(&self) -> Vec<Arc<dyn Transport>> {
        let mut seen: Vec<Arc<dyn Transport>> = Vec::new();
        for transport in self.routes.iter().flat_map(|r| r.destinations.iter()) {
            if !seen.iter().any(|t| Arc::ptr_eq(t, transport)) {
                seen.push(Arc::clone(transport));
            }
        }
        seen
    }

    fn plan(&self, event: &Event) -> Vec<Planned> {
        let mut planned = Vec::new();
        for route in &self.routes {
            let verdict = route.filter.evaluate(event);
            if verdict == Verdict::Reject {
                continue;
            }
            for transport in &route.destinations {
                planned.push(Planned {
                    filter: route.filter_name.clone(),
                    transport: Arc::clone(transport),
                    ctx: RenderContext::new(transport.name(), transport.kind())
                        .urgent(verdict == Verdict::Urgent),
                });
            }
        }
        planned
    }

    async fn run_one(
        planned: Planned,
        event: Arc<Event>,
        diagnostics: &dyn DiagnosticSink,
    ) -> DeliveryReport {
        let destination = planned.transport.name().to_owned();
        let outcome = planned.transport.deliver(&planned.ctx, event).await;
        match &outcome {
            Ok(delivery) => {
                debug!(destination = %destination, filter = %planned.filter, ?delivery, "delivered");
            }
            Err(e) => diagnostics.emit(Diagnostic::DestinationDelivery {
                destination: destination.clone(),
                source: e.clone(),
            }),
        }
        DeliveryReport {
            filter: planned.filter,
            destination,
            urgent: planned.ctx.urgent,
            outcome,
        }
    }

    /// Schedule delivery to every accepting route and return immediately.
    ///
    /// Returns the number of deliveries scheduled. Must be called from within
    /// a Tokio runtime.
    pub fn dispatch(&self, event: Arc<Event>) -> usize {
        let planned = self.plan(&event);
        let count = planned.len();
        for entry in planned {
            let guard = InFlight::enter(&self.in_flight);
            let diagnostics = Arc::clone(&self.diagnostics);
            let event = Arc::clone(&event);
            tokio::spawn(async move {
                let _guard = guard;
                Self::run_one(entry, event, diagnostics.as_ref()).await;
            });
        }
        count
    }

    /// Deliver to every accepting route and wait for all of them.
    pub async fn deliver_all(&self, event: Arc<Event>) -> Vec<DeliveryReport> {
        let mut reports = Vec::new();
        for entry in self.plan(&event) {
            let _guard = InFlight::enter(&self.in_flight);
            reports.push(Self::run_one(entry, Arc::clone(&event), self.diagnostics.as_ref()).await);
        }
        reports
    }

    /// Start background tasks of destinations that have one.
    pub fn start_background(&self, shutdown_rx: &watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        self.transports()
            .into_iter()
            .filter_map(|t| t.spawn_background(shutdown_rx.clone()))
            .collect()
    }

    /// Wait for in-flight deliveries, then flush queued destinations, all
    /// within `grace`. Returns `true` when everything finished in time.
    pub async fn drain(&self, grace: Duration) -> bool {
        let deadline = tokio::time::Instant::now()
            .checked_add(grace)
            .unwrap_or_else(tokio::time::Instant::now);

        let pending = self.in_flight();
        if pending > 0 {
            info!(pending, grace_secs = grace.as_secs(), "waiting for in-flight deliveries");
        }
        while self.in_flight() > 0 {
            if tokio::time::Instant::now() >= deadline {
                warn!(
                    remaining = self.in_flight(),
                    "shutdown grace exceeded, abandoning in-flight deliveries"
                );
                return false;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        for transport in self.transports() {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, transport.flush()).await {
                Ok(0) => {}
                Ok(sent) => info!(destination = transport.name(), sent, "flushed queued deliveries"),
                Err(_) => {
                    warn!(destination = transport.name(), "shutdown grace exceeded while flushing");
                    return false;
                }
            }
        }
        true
    }
}
