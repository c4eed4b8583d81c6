use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::models::{is_streaming_url, ResolvedSubscription};
use crate::repository::Repositories;

use super::session::Session;
use super::transport::LogTransport;

/// Tuning knobs for the subscription sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionConfig {
    /// Fixed pause between a dropped connection and the next attempt
    pub reconnect_delay: Duration,
    /// Upper bound on concurrently running log handlers per session
    pub max_in_flight_handlers: usize,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(15),
            max_in_flight_handlers: 64,
        }
    }
}

/// Turns the active subscriptions into one session per endpoint
pub struct SubscriptionManager {
    repos: Arc<dyn Repositories>,
    transport: Arc<dyn LogTransport>,
    config: SubscriptionConfig,
}

impl SubscriptionManager {
    pub fn new(
        repos: Arc<dyn Repositories>,
        transport: Arc<dyn LogTransport>,
        config: SubscriptionConfig,
    ) -> Self {
        Self {
            repos,
            transport,
            config,
        }
    }

    /// Load the active subscriptions once and run a session per endpoint
    /// until `cancel` fires.
    ///
    /// Returns immediately, without error, when nothing is watchable.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let active = self.repos.subscriptions().list_active_resolved().await?;
        let total = active.len();
        let endpoints = partition_by_endpoint(active);

        if endpoints.is_empty() {
            warn!(
                active = total,
                "no subscriptions with a confirmed address on a ws:// or wss:// endpoint"
            );
            return Ok(());
        }

        let mut sessions = JoinSet::new();
        for (url, subscriptions) in endpoints {
            info!(url = %url, subscriptions = subscriptions.len(), "starting session");
            let session = Session::new(
                url,
                subscriptions,
                self.repos.clone(),
                self.transport.clone(),
                self.config.reconnect_delay,
                self.config.max_in_flight_handlers,
            );
            sessions.spawn(session.run(cancel.child_token()));
        }

        while let Some(finished) = sessions.join_next().await {
            if let Err(e) = finished {
                error!(error = %e, "session task panicked");
            }
        }
        info!("all sessions stopped");
        Ok(())
    }
}

/// Group watchable subscriptions by endpoint URL.
///
/// Subscriptions without a confirmed address, or whose network URL is not a
/// streaming (`ws://`/`wss://`) endpoint, are left out.
pub fn partition_by_endpoint(
    subscriptions: Vec<ResolvedSubscription>,
) -> BTreeMap<String, Vec<ResolvedSubscription>> {
    let mut endpoints: BTreeMap<String, Vec<ResolvedSubscription>> = BTreeMap::new();
    for subscription in subscriptions {
        if subscription.address.is_none() {
            debug!(subscription = %subscription.label(), "no deployed address, skipping");
            continue;
        }
        if !is_streaming_url(&subscription.rpc_url) {
            warn!(
                subscription = %subscription.label(),
                url = %subscription.rpc_url,
                "not a ws:// or wss:// endpoint, skipping"
            );
            continue;
        }
        endpoints
            .entry(subscription.rpc_url.clone())
            .or_default()
            .push(subscription);
    }
    endpoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeploymentId, SubscriptionId};

    fn sub(id: i64, url: &str, address: Option<&str>) -> ResolvedSubscription {
        ResolvedSubscription {
            subscription_id: SubscriptionId(id),
            event_name: "Transfer".into(),
            deployment_id: DeploymentId(id),
            address: address.map(str::to_string),
            network_name: "net".into(),
            rpc_url: url.into(),
            base_contract_name: "Token".into(),
            version_label: "v1".into(),
            abi: "[]".into(),
        }
    }

    #[test]
    fn test_partition_groups_by_url() {
        let addr = Some("0x00000000000000000000000000000000000000aa");
        let endpoints = partition_by_endpoint(vec![
            sub(1, "wss://a.example", addr),
            sub(2, "ws://b.example", addr),
            sub(3, "wss://a.example", addr),
        ]);
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints["wss://a.example"].len(), 2);
        assert_eq!(endpoints["ws://b.example"].len(), 1);
    }

    #[test]
    fn test_partition_discards_unwatchable() {
        let addr = Some("0x00000000000000000000000000000000000000aa");
        let endpoints = partition_by_endpoint(vec![
            sub(1, "https://rpc.example", addr),
            sub(2, "wss://a.example", None),
        ]);
        assert!(endpoints.is_empty());
    }

    #[test]
    fn test_config_defaults() {
        let config = SubscriptionConfig::default();
        assert_eq!(config.reconnect_delay, Duration::from_secs(15));
        assert_eq!(config.max_in_flight_handlers, 64);
    }
}
