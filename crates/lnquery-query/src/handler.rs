//! Query orchestration.

use std::sync::Arc;

use lnquery_core::{Error, HealthCriteria, Result};
use lnquery_nodes::ChannelDataSource;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::format::{
    FormattedResponse, format_channel_health, format_channel_list, format_channel_liquidity,
    format_unknown,
};
use crate::intent::{Intent, IntentClassifier, IntentKind};
use crate::pipeline::ChannelPipeline;

/// Kind of a [`QueryResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Channel listing.
    ChannelList,
    /// Health report.
    ChannelHealth,
    /// Liquidity report.
    ChannelLiquidity,
    /// Unrecognized query.
    Unknown,
    /// The query failed.
    Error,
}

impl From<IntentKind> for QueryType {
    fn from(kind: IntentKind) -> Self {
        match kind {
            IntentKind::ChannelList => Self::ChannelList,
            IntentKind::ChannelHealth => Self::ChannelHealth,
            IntentKind::ChannelLiquidity => Self::ChannelLiquidity,
            IntentKind::Unknown => Self::Unknown,
        }
    }
}

/// User-safe description of a failed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryError {
    /// Sanitized failure reason.
    pub message: String,
}

/// The answer to one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// What kind of answer this is.
    #[serde(rename = "type")]
    pub kind: QueryType,
    /// Human-readable answer.
    pub response: String,
    /// Structured data behind the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Present only for failed queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
}

impl QueryResult {
    fn answered(kind: IntentKind, formatted: FormattedResponse) -> Self {
        Self {
            kind: kind.into(),
            response: formatted.response,
            data: Some(formatted.data),
            error: None,
        }
    }

    fn failed(error: &Error) -> Self {
        let message = error.sanitized();
        Self {
            kind: QueryType::Error,
            response: format!("Sorry, I couldn't retrieve your channel information: {message}"),
            data: None,
            error: Some(QueryError { message }),
        }
    }

    /// Whether the query failed.
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, QueryType::Error)
    }
}

/// Answers free-text questions about the node's channels.
#[derive(Clone)]
pub struct ChannelQueryHandler {
    pipeline: ChannelPipeline,
    classifier: IntentClassifier,
}

impl ChannelQueryHandler {
    /// Create a handler with the default health band.
    pub fn new(source: Arc<dyn ChannelDataSource>) -> Self {
        Self {
            pipeline: ChannelPipeline::new(source, HealthCriteria::default()),
            classifier: IntentClassifier::default(),
        }
    }

    /// Create a handler with a custom health band.
    pub fn with_criteria(
        source: Arc<dyn ChannelDataSource>,
        criteria: HealthCriteria,
    ) -> Result<Self> {
        criteria.validate()?;
        Ok(Self {
            pipeline: ChannelPipeline::new(source, criteria),
            classifier: IntentClassifier::default(),
        })
    }

    /// Replace the intent rules.
    #[must_use]
    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Health band in use.
    pub const fn criteria(&self) -> &HealthCriteria {
        self.pipeline.criteria()
    }

    /// Answer a query. Never fails; failures come back as [`QueryType::Error`].
    pub async fn handle_query(&self, query: &str) -> QueryResult {
        let intent = self.classifier.classify(query);
        let span = tracing::info_span!(
            "query",
            request_id = %Uuid::new_v4(),
            intent = %intent.kind
        );

        async move {
            tracing::debug!("handling query {:?}", intent.query);
            match self.answer(&intent).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("query failed: {e}");
                    QueryResult::failed(&e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn answer(&self, intent: &Intent) -> Result<QueryResult> {
        if !intent.kind.needs_channel_data() {
            return Ok(QueryResult::answered(intent.kind, format_unknown()));
        }

        let data = self.pipeline.get_channel_data().await?;

        let formatted = match intent.kind {
            IntentKind::ChannelList => format_channel_list(&data),
            IntentKind::ChannelHealth => format_channel_health(&data, self.criteria()),
            IntentKind::ChannelLiquidity => format_channel_liquidity(&data),
            IntentKind::Unknown => format_unknown(),
        };

        Ok(QueryResult::answered(intent.kind, formatted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lnquery_core::Channel;
    use lnquery_nodes::MockDataSource;

    fn handler(source: MockDataSource) -> (Arc<MockDataSource>, ChannelQueryHandler) {
        let source = Arc::new(source);
        (source.clone(), ChannelQueryHandler::new(source))
    }

    #[tokio::test]
    async fn test_list_sample_channels() {
        let (_, handler) = handler(MockDataSource::new());

        let result = handler.handle_query("list my channels").await;

        assert_eq!(result.kind, QueryType::ChannelList);
        let data = result.data.unwrap();
        assert_eq!(data["summary"]["activeChannels"], 2);
        assert_eq!(data["summary"]["inactiveChannels"], 1);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_skips_data_source() {
        let (source, handler) = handler(MockDataSource::new());

        let result = handler.handle_query("what is the meaning of life").await;

        assert_eq!(result.kind, QueryType::Unknown);
        assert!(result.response.contains("didn't understand"));
        assert_eq!(source.list_calls(), 0);
        assert_eq!(source.node_info_calls(), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_becomes_error_result() {
        let (_, handler) = handler(
            MockDataSource::new().failing_listing("cannot read /root/.lnd/data/admin.macaroon"),
        );

        let result = handler.handle_query("how healthy are my channels").await;

        assert!(result.is_error());
        assert!(result.data.is_none());
        let message = result.error.unwrap().message;
        assert_eq!(message, "connection error: cannot read [path]");
        assert!(result.response.contains(&message));
        assert!(!result.response.contains("/root"));
    }

    #[tokio::test]
    async fn test_non_ascii_failure_becomes_error_result() {
        let (_, handler) = handler(MockDataSource::new().failing_listing("accès refusé"));

        let result = handler.handle_query("list my channels").await;

        assert_eq!(result.kind, QueryType::Error);
        assert_eq!(
            result.error.unwrap().message,
            "connection error: accès refusé"
        );
    }

    #[tokio::test]
    async fn test_custom_classifier() {
        use crate::intent::IntentRule;

        let (source, handler) = handler(MockDataSource::new());
        let handler = handler.with_classifier(IntentClassifier::with_rules(vec![IntentRule::new(
            IntentKind::ChannelHealth,
            ["wie geht"],
        )]));

        let result = handler.handle_query("Wie geht es meinen Kanälen?").await;
        assert_eq!(result.kind, QueryType::ChannelHealth);

        let result = handler.handle_query("list my channels").await;
        assert_eq!(result.kind, QueryType::Unknown);
        assert_eq!(source.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_rejects_invalid_criteria() {
        let source: Arc<dyn ChannelDataSource> = Arc::new(MockDataSource::new());
        let criteria = HealthCriteria {
            min_local_ratio: 0.9,
            max_local_ratio: 0.1,
        };
        assert!(ChannelQueryHandler::with_criteria(source, criteria).is_err());
    }

    #[tokio::test]
    async fn test_result_wire_shape() -> anyhow::Result<()> {
        let (_, single) = handler(MockDataSource::with_channels(&[Channel::new(
            100, 50, 50, true,
        )]));

        let value = serde_json::to_value(single.handle_query("channel liquidity").await)?;
        assert_eq!(value["type"], "channel_liquidity");
        assert!(value.get("error").is_none());

        let (_, failing) = handler(MockDataSource::new().failing_listing("refused"));
        let value = serde_json::to_value(failing.handle_query("list channels").await)?;
        assert_eq!(value["type"], "error");
        assert_eq!(value["error"]["message"], "connection error: refused");
        assert!(value.get("data").is_none());
        Ok(())
    }
}
