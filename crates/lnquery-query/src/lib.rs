//! Natural-language channel query pipeline for lnquery.
//!
//! A query is classified into an [`Intent`], channel data is fetched from a
//! [`lnquery_nodes::ChannelDataSource`], enriched with counterparty aliases,
//! scored against [`lnquery_core::HealthCriteria`], and rendered into a
//! [`QueryResult`].

mod format;
mod handler;
mod health;
mod intent;
mod pipeline;
mod tool;

pub use format::{
    FormattedResponse, UNKNOWN_RESPONSE, format_channel_health, format_channel_list,
    format_channel_liquidity, format_sats, format_unknown,
};
pub use handler::{ChannelQueryHandler, QueryError, QueryResult, QueryType};
pub use health::{
    ChannelAssessment, HealthStatus, LiquidityBucket, assess_channel, is_healthy, local_ratio,
};
pub use intent::{Intent, IntentClassifier, IntentKind, IntentRule, parse_intent};
pub use pipeline::{
    ChannelData, ChannelPipeline, assess_channels, calculate_channel_summary, normalize_channels,
};
pub use tool::{ChannelQueryTool, TOOL_NAME, ToolDescriptor, ToolInput, ToolOutput};
