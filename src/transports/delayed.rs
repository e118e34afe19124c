//! Delayed delivery for account registrations.
//!
//! Fresh accounts are rendered on arrival and queued with their arrival time. A timer task wakes every
//! `flush_interval` and delivers entries older than `delay`, so that whatever
//! the account did right after registering is visible when moderators look.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{Delivery, DeliveryError, DirectTransport, Transport, TransportKind};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::event::Event;
use crate::formats::{Payload, RenderContext};

/// Default hold time before a registration is posted.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(30 * 60);

/// Default timer period.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

struct Pending {
    queued_at: Instant,
    payload: Payload,
}

/// Queue in front of a [`DirectTransport`].
pub struct DelayedTransport {
    inner: DirectTransport,
    delay: Duration,
    flush_interval: Duration,
    queue: Mutex<VecDeque<Pending>>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for DelayedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayedTransport")
            .field("inner", &self.inner)
            .field("delay", &self.delay)
            .field("flush_interval", &self.flush_interval)
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl DelayedTransport {
    /// Wrap `inner`, holding entries for `delay` and checking every
    /// `flush_interval`. Failures found while flushing go to `diagnostics`.
    pub fn new(
        inner: DirectTransport,
        delay: Duration,
        flush_interval: Duration,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            inner,
            delay,
            flush_interval,
            queue: Mutex::new(VecDeque::new()),
            diagnostics,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Pending>> {
        match self.queue.lock() {
            Ok(queue) => queue,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Number of queued entries.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Remove entries that have waited at least `delay` as of `now`.
    fn take_due(&self, now: Instant) -> Vec<Pending> {
        let mut queue = self.lock();
        let mut due = Vec::new();
        while queue
            .front()
            .is_some_and(|p| now.saturating_duration_since(p.queued_at) >= self.delay)
        {
            if let Some(pending) = queue.pop_front() {
                due.push(pending);
            }
        }
        due
    }

    fn take_all(&self) -> Vec<Pending> {
        self.lock().drain(..).collect()
    }

    async fn send_batch(&self, batch: Vec<Pending>) -> usize {
        let mut sent: usize = 0;
        for pending in batch {
            match self.inner.send_payload(&pending.payload).await {
                Ok(()) => sent = sent.saturating_add(1),
                Err(source) => self.diagnostics.emit(Diagnostic::DestinationDelivery {
                    destination: self.inner.name().to_owned(),
                    source,
                }),
            }
        }
        sent
    }

    /// Deliver entries whose delay has passed. Returns the number sent.
    pub async fn flush_due(&self) -> usize {
        let due = self.take_due(Instant::now());
        if due.is_empty() {
            return 0;
        }
        debug!(destination = self.inner.name(), count = due.len(), "flushing delayed entries");
        self.send_batch(due).await
    }

    /// Timer loop. Exits when the shutdown signal is received or the watch
    /// channel closes; whatever is still queued is left for [`Transport::flush`].
    pub async fn run(self: Arc<Self>, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            destination = self.inner.name(),
            delay_secs = self.delay.as_secs(),
            "delayed transport started"
        );
        let mut interval = tokio::time::interval(self.flush_interval);
        // Skip the first immediate tick.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.flush_due().await;
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        info!(destination = self.inner.name(), pending = self.pending(), "delayed transport stopped");
    }
}

#[async_trait]
impl Transport for DelayedTransport {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> TransportKind {
        self.inner.kind()
    }

    async fn deliver(
        &self,
        ctx: &RenderContext,
        event: Arc<Event>,
    ) -> Result<Delivery, DeliveryError> {
        let Some(payload) = self.inner.render(ctx, &event) else {
            return Ok(Delivery::Skipped);
        };
        self.lock().push_back(Pending {
            queued_at: Instant::now(),
            payload,
        });
        Ok(Delivery::Queued)
    }

    async fn flush(&self) -> usize {
        let all = self.take_all();
        self.send_batch(all).await
    }

    fn spawn_background(
        self: Arc<Self>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Option<JoinHandle<()>> {
        Some(tokio::spawn(self.run(shutdown_rx)))
    }
}
