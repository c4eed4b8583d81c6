//! Streaming log transport
//!
//! [`LogTransport`] is the seam between a session and the chain: it opens one
//! connection to an endpoint and registers one log filter per armed
//! subscription, yielding every matching log tagged with the index of the
//! filter that produced it.

use alloy::primitives::{Address, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::{Filter, Log};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::error::{Error, Result};

/// Contract address and event topic of one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    pub topic: B256,
}

/// A raw log together with the index of the filter it matched
#[derive(Debug, Clone)]
pub struct TaggedLog {
    pub filter: usize,
    pub log: Log,
}

/// Live log stream over one connection.
///
/// Dropping it closes the connection.
pub struct LogStream {
    logs: BoxStream<'static, TaggedLog>,
    _connection: Option<DynProvider>,
}

impl LogStream {
    pub fn new(logs: BoxStream<'static, TaggedLog>) -> Self {
        Self {
            logs,
            _connection: None,
        }
    }

    /// Keep `connection` alive for as long as the stream is
    pub fn with_connection(logs: BoxStream<'static, TaggedLog>, connection: DynProvider) -> Self {
        Self {
            logs,
            _connection: Some(connection),
        }
    }

    /// Next log, or `None` once the connection has ended
    pub async fn next(&mut self) -> Option<TaggedLog> {
        self.logs.next().await
    }
}

#[async_trait]
pub trait LogTransport: Send + Sync {
    /// Connect to `url` and register every filter on the one connection
    async fn subscribe(&self, url: &str, filters: &[LogFilter]) -> Result<LogStream>;
}

/// WebSocket transport backed by an alloy pubsub provider
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

#[async_trait]
impl LogTransport for WsTransport {
    async fn subscribe(&self, url: &str, filters: &[LogFilter]) -> Result<LogStream> {
        let provider = ProviderBuilder::new()
            .connect_ws(WsConnect::new(url))
            .await
            .map_err(|e| Error::Connection(format!("{}: {}", url, e)))?
            .erased();

        let mut streams = Vec::with_capacity(filters.len());
        for (index, filter) in filters.iter().enumerate() {
            let rpc_filter = Filter::new()
                .address(filter.address)
                .event_signature(filter.topic);
            let subscription = provider
                .subscribe_logs(&rpc_filter)
                .await
                .map_err(|e| Error::Connection(format!("{}: eth_subscribe failed: {}", url, e)))?;
            streams.push(
                subscription
                    .into_stream()
                    .map(move |log| TaggedLog { filter: index, log })
                    .boxed(),
            );
        }

        Ok(LogStream::with_connection(
            stream::select_all(streams).boxed(),
            provider,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_stream_ends_with_source() {
        let tagged = TaggedLog {
            filter: 3,
            log: Log::default(),
        };
        let mut stream = LogStream::new(stream::iter(vec![tagged]).boxed());
        assert_eq!(stream.next().await.map(|t| t.filter), Some(3));
        assert!(stream.next().await.is_none());
    }
}
