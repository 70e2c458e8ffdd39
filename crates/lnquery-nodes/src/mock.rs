//! Simulated data source with fixed sample data.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lnquery_core::{Channel, Error, Result};
use serde_json::json;

use crate::{ChannelDataSource, DataSourceKind, NodeAlias};

/// Sample counterparties: (pubkey, alias).
pub const SAMPLE_PEERS: &[(&str, &str)] = &[
    (
        "03864ef025fde8fb587d989186ce6a4a186895ee44a926bfc370e2c366597a3f8f",
        "ACINQ",
    ),
    (
        "035e4ff418fc8b5554c5d9eea66396c227bd429a3251c8cbc711002ba215bfc226",
        "WalletOfSatoshi.com",
    ),
    (
        "033d8656219478701227199cbd6f670335c8d408a92ae88b962c49d4dc0e83e025",
        "bfx-lnd0",
    ),
];

/// Data source that answers from memory.
///
/// The default instance holds three channels (two active, one inactive).
/// Builders swap in other channels or inject failures for tests.
#[derive(Debug, Default)]
pub struct MockDataSource {
    response: serde_json::Value,
    aliases: HashMap<String, String>,
    failing_pubkeys: HashSet<String>,
    listing_error: Option<String>,
    list_calls: AtomicUsize,
    node_info_calls: AtomicUsize,
}

impl MockDataSource {
    /// The fixed sample node.
    pub fn new() -> Self {
        let channels = vec![
            json!({
                "active": true,
                "remote_pubkey": SAMPLE_PEERS[0].0,
                "channel_point": "a1f5c1b3e0d2c4f6a8b0d2e4f6a8c0e2a4c6e8f0b2d4f6a8c0e2a4c6e8f0b2d4:0",
                "chan_id": "850111604344029185",
                "capacity": "5000000",
                "local_balance": "2500000",
                "remote_balance": "2490000",
                "private": false,
                "initiator": true
            }),
            json!({
                "active": true,
                "remote_pubkey": SAMPLE_PEERS[1].0,
                "channel_point": "b2e6d2c4f1e3d5a7b9c1e3f5a7b9d1f3b5d7f9a1c3e5a7b9d1f3b5d7f9a1c3e5:1",
                "chan_id": "850222604344029186",
                "capacity": "2000000",
                "local_balance": "150000",
                "remote_balance": "1840000",
                "private": false,
                "initiator": false
            }),
            json!({
                "active": false,
                "remote_pubkey": SAMPLE_PEERS[2].0,
                "channel_point": "c3f7e3d5a2f4e6b8c0d2f4a6b8c0e2a4c6e8a0b2d4f6b8c0e2a4c6e8a0b2d4f6:0",
                "chan_id": "850333604344029187",
                "capacity": "1000000",
                "local_balance": "900000",
                "remote_balance": "90000",
                "private": true,
                "initiator": true
            }),
        ];

        Self {
            response: json!({ "channels": channels }),
            aliases: SAMPLE_PEERS
                .iter()
                .map(|(pubkey, alias)| ((*pubkey).to_string(), (*alias).to_string()))
                .collect(),
            ..Default::default()
        }
    }

    /// Serve the given channels instead of the sample set.
    pub fn with_channels(channels: &[Channel]) -> Self {
        let channels = serde_json::to_value(channels).unwrap_or_default();
        Self::with_response(json!({ "channels": channels }))
    }

    /// Serve an arbitrary raw `listchannels` response.
    pub fn with_response(response: serde_json::Value) -> Self {
        Self {
            response,
            ..Default::default()
        }
    }

    /// Register an alias for a pubkey.
    #[must_use]
    pub fn with_alias(mut self, pubkey: impl Into<String>, alias: impl Into<String>) -> Self {
        self.aliases.insert(pubkey.into(), alias.into());
        self
    }

    /// Make node lookups for `pubkey` fail.
    #[must_use]
    pub fn failing_alias(mut self, pubkey: impl Into<String>) -> Self {
        self.failing_pubkeys.insert(pubkey.into());
        self
    }

    /// Make channel listing fail with `message`.
    #[must_use]
    pub fn failing_listing(mut self, message: impl Into<String>) -> Self {
        self.listing_error = Some(message.into());
        self
    }

    /// Number of `list_channels` calls so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_node_info` calls so far.
    pub fn node_info_calls(&self) -> usize {
        self.node_info_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelDataSource for MockDataSource {
    fn kind(&self) -> DataSourceKind {
        DataSourceKind::Mock
    }

    async fn list_channels(&self) -> Result<serde_json::Value> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        match &self.listing_error {
            Some(message) => Err(Error::Connection(message.clone())),
            None => Ok(self.response.clone()),
        }
    }

    async fn get_node_info(&self, pubkey: &str) -> Result<NodeAlias> {
        self.node_info_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_pubkeys.contains(pubkey) {
            return Err(Error::Node(format!("unable to find node {pubkey}")));
        }

        let alias = self.aliases.get(pubkey).cloned().unwrap_or_else(|| {
            // Unregistered peers get a stable alias derived from their key.
            format!("node-{}", pubkey.chars().take(8).collect::<String>())
        });

        Ok(NodeAlias { alias })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_data() -> anyhow::Result<()> {
        let source = MockDataSource::new();
        let response = source.list_channels().await?;
        let channels = response["channels"].as_array().unwrap();

        assert_eq!(channels.len(), 3);
        let active = channels.iter().filter(|c| c["active"] == true).count();
        assert_eq!(active, 2);

        let info = source.get_node_info(SAMPLE_PEERS[0].0).await?;
        assert_eq!(info.alias, "ACINQ");

        assert_eq!(source.list_calls(), 1);
        assert_eq!(source.node_info_calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let source = MockDataSource::new()
            .failing_alias(SAMPLE_PEERS[1].0)
            .failing_listing("connection refused");

        assert!(matches!(
            source.list_channels().await,
            Err(Error::Connection(_))
        ));
        assert!(source.get_node_info(SAMPLE_PEERS[1].0).await.is_err());
        assert!(source.get_node_info(SAMPLE_PEERS[0].0).await.is_ok());
    }

    #[tokio::test]
    async fn test_custom_channels() -> anyhow::Result<()> {
        let source = MockDataSource::with_channels(&[
            Channel::new(100, 50, 50, true).with_remote_pubkey("02ff"),
        ]);
        let response = source.list_channels().await?;

        let channel = Channel::from_json(&response["channels"][0]).unwrap();
        assert_eq!(channel.capacity, 100);
        assert_eq!(source.get_node_info("02ff").await?.alias, "node-02ff");
        Ok(())
    }
}
