//! The data source capability.

use async_trait::async_trait;
use lnquery_core::Result;
use serde::{Deserialize, Serialize};

/// Public information about a node in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAlias {
    /// Display name the node advertises.
    pub alias: String,
}

/// Which variant backs a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    /// Built-in sample node.
    Mock,
    /// A running lnd.
    Lnd,
}

impl std::fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mock => write!(f, "mock"),
            Self::Lnd => write!(f, "LND"),
        }
    }
}

/// Channel listing and node lookup against a Lightning node.
#[async_trait]
pub trait ChannelDataSource: Send + Sync {
    /// Which variant this is.
    fn kind(&self) -> DataSourceKind;

    /// Raw `listchannels` response. Callers normalize the `channels` field.
    async fn list_channels(&self) -> Result<serde_json::Value>;

    /// Look up a node by public key.
    async fn get_node_info(&self, pubkey: &str) -> Result<NodeAlias>;
}
