//! Channel acquisition, enrichment and aggregation.

use std::sync::Arc;

use futures::future::join_all;
use lnquery_core::{Channel, ChannelSummary, EnrichedChannel, HealthCriteria, Result};
use lnquery_nodes::ChannelDataSource;

use crate::health::{ChannelAssessment, assess_channel};

/// Everything a channel query needs to answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelData {
    /// Enriched channels, in the order the node listed them.
    pub channels: Vec<EnrichedChannel>,
    /// Scoring for each entry of `channels`, index for index.
    pub assessments: Vec<ChannelAssessment>,
    /// Aggregate figures.
    pub summary: ChannelSummary,
}

/// Fetches channels from a data source and turns them into [`ChannelData`].
#[derive(Clone)]
pub struct ChannelPipeline {
    source: Arc<dyn ChannelDataSource>,
    criteria: HealthCriteria,
}

impl ChannelPipeline {
    /// Create a pipeline over `source` scoring with `criteria`.
    pub fn new(source: Arc<dyn ChannelDataSource>, criteria: HealthCriteria) -> Self {
        Self { source, criteria }
    }

    /// Health band in use.
    pub const fn criteria(&self) -> &HealthCriteria {
        &self.criteria
    }

    /// Fetch, enrich and summarize.
    pub async fn get_channel_data(&self) -> Result<ChannelData> {
        let raw = self.fetch_raw_channel_data().await?;
        let channels = self.enrich_channels_with_metadata(raw).await;
        let assessments = assess_channels(&channels, &self.criteria);
        let summary = summarize(&channels, &assessments);

        tracing::debug!(
            "summarized {} channels: {} healthy, {} unhealthy",
            channels.len(),
            summary.healthy_channels,
            summary.unhealthy_channels
        );

        Ok(ChannelData {
            channels,
            assessments,
            summary,
        })
    }

    /// List channels from the source.
    ///
    /// Only transport failures are errors; a malformed response reads as no channels.
    pub async fn fetch_raw_channel_data(&self) -> Result<Vec<Channel>> {
        tracing::debug!("listing channels from {} source", self.source.kind());
        let response = self.source.list_channels().await?;
        Ok(normalize_channels(&response))
    }

    /// Attach counterparty aliases. An empty list makes no lookups.
    pub async fn enrich_channels_with_metadata(&self, channels: Vec<Channel>) -> Vec<EnrichedChannel> {
        if channels.is_empty() {
            return Vec::new();
        }
        self.add_node_aliases(channels).await
    }

    /// Resolve every counterparty alias concurrently.
    ///
    /// Each lookup fails on its own: the affected channel gets a placeholder
    /// alias and an `_error` marker while the others resolve normally. The
    /// output always has the input's length and order.
    pub async fn add_node_aliases(&self, channels: Vec<Channel>) -> Vec<EnrichedChannel> {
        let lookups = channels.into_iter().map(|channel| self.resolve_alias(channel));
        let enriched = join_all(lookups).await;

        let failed = enriched.iter().filter(|c| c.error.is_some()).count();
        if failed > 0 {
            tracing::warn!("{failed} of {} alias lookups failed", enriched.len());
        }
        enriched
    }

    async fn resolve_alias(&self, channel: Channel) -> EnrichedChannel {
        let Some(pubkey) = channel.remote_pubkey.clone() else {
            return EnrichedChannel::resolved(channel, EnrichedChannel::ALIAS_UNKNOWN);
        };

        match self.source.get_node_info(&pubkey).await {
            Ok(info) if info.alias.trim().is_empty() => {
                EnrichedChannel::resolved(channel, short_pubkey(&pubkey))
            }
            Ok(info) => EnrichedChannel::resolved(channel, info.alias),
            Err(e) => {
                tracing::warn!("alias lookup for {} failed: {e}", short_pubkey(&pubkey));
                EnrichedChannel::alias_failed(channel, e.sanitized())
            }
        }
    }
}

/// Read the channel array out of a `listchannels` response.
///
/// Accepts `{ "channels": [...] }` or a bare array. A null, missing or
/// non-array field gives an empty list; entries that are not objects are skipped.
pub fn normalize_channels(response: &serde_json::Value) -> Vec<Channel> {
    let Some(entries) = response
        .as_array()
        .or_else(|| response.get("channels").and_then(serde_json::Value::as_array))
    else {
        tracing::debug!("listchannels response carries no channel array");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let channel = Channel::from_json(entry);
            if channel.is_none() {
                tracing::warn!("skipping malformed channel entry: {entry}");
            }
            channel
        })
        .collect()
}

/// Score each channel.
pub fn assess_channels(
    channels: &[EnrichedChannel],
    criteria: &HealthCriteria,
) -> Vec<ChannelAssessment> {
    channels
        .iter()
        .map(|c| assess_channel(&c.channel, criteria))
        .collect()
}

/// Aggregate a channel list. Pure; an empty list yields all zeros.
pub fn calculate_channel_summary(
    channels: &[EnrichedChannel],
    criteria: &HealthCriteria,
) -> ChannelSummary {
    summarize(channels, &assess_channels(channels, criteria))
}

fn summarize(channels: &[EnrichedChannel], assessments: &[ChannelAssessment]) -> ChannelSummary {
    let mut summary = ChannelSummary::default();

    for (enriched, assessment) in channels.iter().zip(assessments) {
        let channel = &enriched.channel;
        summary.total_capacity = summary.total_capacity.saturating_add(channel.capacity);
        summary.total_local_balance = summary
            .total_local_balance
            .saturating_add(channel.local_balance);
        summary.total_remote_balance = summary
            .total_remote_balance
            .saturating_add(channel.remote_balance);

        if channel.active {
            summary.active_channels += 1;
        } else {
            summary.inactive_channels += 1;
        }

        if assessment.is_healthy() {
            summary.healthy_channels += 1;
        } else {
            summary.unhealthy_channels += 1;
        }
    }

    let count = summary.active_channels + summary.inactive_channels;
    if count > 0 {
        summary.average_capacity = summary.total_capacity / count as u64;
    }

    summary
}

fn short_pubkey(pubkey: &str) -> String {
    let head: String = pubkey.chars().take(12).collect();
    if head.len() < pubkey.len() {
        format!("{head}…")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lnquery_nodes::MockDataSource;
    use serde_json::json;

    fn enriched(capacity: u64, local: u64, active: bool) -> EnrichedChannel {
        EnrichedChannel::resolved(
            Channel::new(capacity, local, capacity.saturating_sub(local), active),
            "peer",
        )
    }

    fn pipeline(source: MockDataSource) -> (Arc<MockDataSource>, ChannelPipeline) {
        let source = Arc::new(source);
        let pipeline = ChannelPipeline::new(source.clone(), HealthCriteria::default());
        (source, pipeline)
    }

    #[test]
    fn test_normalize_malformed_responses() {
        assert!(normalize_channels(&json!({})).is_empty());
        assert!(normalize_channels(&json!({ "channels": null })).is_empty());
        assert!(normalize_channels(&json!({ "channels": "nope" })).is_empty());
        assert!(normalize_channels(&json!({ "channels": { "a": 1 } })).is_empty());
        assert!(normalize_channels(&json!(null)).is_empty());

        let mixed = json!({ "channels": [ { "capacity": "10" }, 42, null ] });
        let channels = normalize_channels(&mixed);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].capacity, 10);

        let bare = json!([ { "capacity": 5 } ]);
        assert_eq!(normalize_channels(&bare).len(), 1);
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = calculate_channel_summary(&[], &HealthCriteria::default());
        assert_eq!(summary, ChannelSummary::default());
        assert_eq!(summary.average_capacity, 0);
    }

    #[test]
    fn test_summary_figures() {
        let channels = vec![
            enriched(1_000_000, 500_000, true),
            enriched(1_000_000, 50_000, true),
            enriched(2_000_000, 1_000_000, false),
        ];
        let summary = calculate_channel_summary(&channels, &HealthCriteria::default());

        assert_eq!(summary.total_capacity, 4_000_000);
        assert_eq!(summary.total_local_balance, 1_550_000);
        assert_eq!(summary.total_remote_balance, 2_450_000);
        assert_eq!(summary.active_channels, 2);
        assert_eq!(summary.inactive_channels, 1);
        assert_eq!(summary.average_capacity, 1_333_333);
        assert_eq!(summary.healthy_channels, 1);
        assert_eq!(summary.unhealthy_channels, 2);
    }

    #[test]
    fn test_summary_is_idempotent() {
        let channels = vec![
            enriched(0, 0, true),
            enriched(700, 350, true),
            enriched(300, 299, false),
        ];
        let criteria = HealthCriteria::new(0.2, 0.8).unwrap();
        let first = calculate_channel_summary(&channels, &criteria);
        let second = calculate_channel_summary(&channels, &criteria);
        assert_eq!(first, second);
        assert_eq!(first.unhealthy_channels, 2);
    }

    #[tokio::test]
    async fn test_empty_enrichment_makes_no_calls() {
        let (source, pipeline) = pipeline(MockDataSource::with_channels(&[]));

        let data = pipeline.get_channel_data().await.unwrap();
        assert!(data.channels.is_empty());
        assert_eq!(data.summary, ChannelSummary::default());
        assert_eq!(source.list_calls(), 1);
        assert_eq!(source.node_info_calls(), 0);
    }

    #[tokio::test]
    async fn test_partial_alias_failure() -> anyhow::Result<()> {
        let channels: Vec<Channel> = (0..5)
            .map(|i| Channel::new(1_000, 500, 500, true).with_remote_pubkey(format!("02{i:02}")))
            .collect();
        let source = MockDataSource::with_channels(&channels)
            .with_alias("0201", "bob")
            .failing_alias("0200")
            .failing_alias("0203");
        let (source, pipeline) = pipeline(source);

        let enriched = pipeline.enrich_channels_with_metadata(channels.clone()).await;

        assert_eq!(enriched.len(), 5);
        assert_eq!(source.node_info_calls(), 5);
        for (i, channel) in enriched.iter().enumerate() {
            assert_eq!(channel.channel, channels[i]);
        }

        let failed: Vec<_> = enriched.iter().filter(|c| c.error.is_some()).collect();
        assert_eq!(failed.len(), 2);
        for channel in failed {
            assert_eq!(channel.remote_alias, EnrichedChannel::ALIAS_ERROR_PLACEHOLDER);
            let error = channel.error.as_ref().unwrap();
            assert_eq!(error.kind, lnquery_core::EnrichmentErrorKind::AliasRetrievalFailed);
            assert!(!error.message.is_empty());
        }
        assert_eq!(enriched[1].remote_alias, "bob");
        assert_eq!(enriched[2].remote_alias, "node-0202");
        Ok(())
    }

    #[tokio::test]
    async fn test_channel_without_pubkey_skips_lookup() {
        let (source, pipeline) = pipeline(MockDataSource::default());

        let enriched = pipeline
            .add_node_aliases(vec![Channel::new(10, 5, 5, true)])
            .await;

        assert_eq!(enriched[0].remote_alias, EnrichedChannel::ALIAS_UNKNOWN);
        assert!(enriched[0].error.is_none());
        assert_eq!(source.node_info_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_alias_falls_back_to_pubkey() {
        let pubkey = "03864ef025fde8fb587d989186ce6a4a186895ee44a926bfc370e2c366597a3f8f";
        let source = MockDataSource::default().with_alias(pubkey, "  ");
        let (_, pipeline) = pipeline(source);

        let enriched = pipeline
            .add_node_aliases(vec![Channel::new(10, 5, 5, true).with_remote_pubkey(pubkey)])
            .await;
        assert_eq!(enriched[0].remote_alias, "03864ef025fd…");
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let (_, pipeline) = pipeline(MockDataSource::new().failing_listing("connection refused"));
        assert!(pipeline.get_channel_data().await.is_err());
    }
}
