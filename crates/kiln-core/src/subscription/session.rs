//! One long-lived listener per endpoint URL

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::models::ResolvedSubscription;
use crate::repository::Repositories;

use super::handler::{ingest_log, ArmedSubscription};
use super::transport::{LogFilter, LogTransport};

/// Why a listen pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Cancelled,
    StreamClosed,
}

/// Listener for every subscription that shares one endpoint.
///
/// A session never ends on its own: a failed connection or a closed stream
/// is followed by a fixed delay and a fresh connection, for as long as the
/// cancellation token is not triggered.
pub struct Session {
    url: String,
    subscriptions: Vec<ResolvedSubscription>,
    repos: Arc<dyn Repositories>,
    transport: Arc<dyn LogTransport>,
    reconnect_delay: Duration,
    handler_slots: Arc<Semaphore>,
}

impl Session {
    pub fn new(
        url: String,
        subscriptions: Vec<ResolvedSubscription>,
        repos: Arc<dyn Repositories>,
        transport: Arc<dyn LogTransport>,
        reconnect_delay: Duration,
        max_in_flight_handlers: usize,
    ) -> Self {
        Self {
            url,
            subscriptions,
            repos,
            transport,
            reconnect_delay,
            handler_slots: Arc::new(Semaphore::new(max_in_flight_handlers.max(1))),
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        let armed = self.arm();
        if armed.is_empty() {
            warn!(url = %self.url, "no watchable subscriptions, session not started");
            return;
        }
        let filters: Vec<LogFilter> = armed.iter().map(|s| s.filter).collect();

        loop {
            match self.listen(&armed, &filters, &cancel).await {
                Ok(Exit::Cancelled) => break,
                Ok(Exit::StreamClosed) => warn!(url = %self.url, "log stream closed"),
                Err(e) => error!(url = %self.url, error = %e, "session error"),
            }

            info!(
                url = %self.url,
                delay_secs = self.reconnect_delay.as_secs(),
                "reconnecting"
            );
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        info!(url = %self.url, "session stopped");
    }

    /// Resolve every subscription, logging and skipping the ones that cannot be watched
    fn arm(&self) -> Vec<Arc<ArmedSubscription>> {
        let mut armed = Vec::with_capacity(self.subscriptions.len());
        for resolved in &self.subscriptions {
            let label = resolved.label();
            match ArmedSubscription::arm(resolved.clone()) {
                Ok(subscription) => {
                    info!(url = %self.url, subscription = %label, "armed");
                    armed.push(Arc::new(subscription));
                }
                Err(e) => warn!(url = %self.url, subscription = %label, error = %e, "skipping"),
            }
        }
        armed
    }

    /// Connect once and dispatch logs until the stream ends or the session is cancelled
    async fn listen(
        &self,
        armed: &[Arc<ArmedSubscription>],
        filters: &[LogFilter],
        cancel: &CancellationToken,
    ) -> Result<Exit> {
        let mut stream = tokio::select! {
            _ = cancel.cancelled() => return Ok(Exit::Cancelled),
            stream = self.transport.subscribe(&self.url, filters) => stream?,
        };
        info!(url = %self.url, subscriptions = filters.len(), "listening");

        let mut handlers = JoinSet::new();
        let exit = loop {
            while let Some(finished) = handlers.try_join_next() {
                if let Err(e) = finished {
                    error!(url = %self.url, error = %e, "log handler panicked");
                }
            }

            let permit = tokio::select! {
                _ = cancel.cancelled() => break Ok(Exit::Cancelled),
                permit = self.handler_slots.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break Err(Error::Connection("handler pool closed".into())),
                },
            };

            let tagged = tokio::select! {
                _ = cancel.cancelled() => break Ok(Exit::Cancelled),
                next = stream.next() => match next {
                    Some(tagged) => tagged,
                    None => break Ok(Exit::StreamClosed),
                },
            };

            let Some(subscription) = armed.get(tagged.filter).cloned() else {
                warn!(url = %self.url, filter = tagged.filter, "log for unknown filter");
                continue;
            };

            let repos = self.repos.clone();
            handlers.spawn(async move {
                let _permit = permit;
                if let Err(e) = ingest_log(repos.event_logs(), &subscription, &tagged.log).await {
                    error!(
                        subscription = %subscription.label(),
                        error = %e,
                        "failed to record event"
                    );
                }
            });
        };

        drop(stream);
        while let Some(finished) = handlers.join_next().await {
            if let Err(e) = finished {
                error!(url = %self.url, error = %e, "log handler panicked");
            }
        }

        exit
    }
}
