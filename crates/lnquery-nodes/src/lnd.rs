//! LND data source.

use async_trait::async_trait;
use lnquery_core::{Config, Error, Result};
use lnquery_docker::ContainerManager;

use crate::{ChannelDataSource, DataSourceKind, NodeAlias};

/// An authenticated path to a running lnd.
///
/// Opaque outside this crate: it can only be created by [`NodeSession::establish`]
/// and only [`LndDataSource`] knows how to use it.
#[derive(Clone)]
pub struct NodeSession {
    manager: ContainerManager,
    container_id: String,
    lncli_flags: Vec<String>,
}

// lncli flags carry credential paths and stay out of logs.
impl std::fmt::Debug for NodeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeSession")
            .field("container_id", &self.container_id)
            .finish_non_exhaustive()
    }
}

impl NodeSession {
    /// Reach Docker, find the lnd container and check that lnd answers.
    pub async fn establish(config: &Config) -> Result<Self> {
        let node = &config.node;

        let manager = ContainerManager::connect(config.docker_socket.as_deref())
            .map_err(|e| Error::Connection(format!("docker unavailable: {e}")))?;
        manager
            .ping()
            .await
            .map_err(|e| Error::Connection(format!("docker unavailable: {e}")))?;

        let state = manager
            .container_state(&node.container)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        if !state.running {
            return Err(Error::Connection(format!(
                "lnd container {} is not running",
                node.container
            )));
        }

        let session = Self {
            manager,
            container_id: state.id,
            lncli_flags: vec![
                format!("--network={}", node.network),
                format!("--rpcserver={}", node.rpc_server()),
                format!("--tlscertpath={}", node.tls_cert_path),
                format!("--macaroonpath={}", node.macaroon_path),
            ],
        };

        // getinfo fails fast on bad credentials or a locked wallet.
        let info = session
            .lncli(&["getinfo"])
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        tracing::info!(
            "connected to lnd {} ({})",
            info["alias"].as_str().unwrap_or("unknown"),
            info["version"].as_str().unwrap_or("unknown")
        );

        Ok(session)
    }

    async fn lncli(&self, args: &[&str]) -> Result<serde_json::Value> {
        let mut cmd = vec!["lncli"];
        cmd.extend(self.lncli_flags.iter().map(String::as_str));
        cmd.extend_from_slice(args);

        let output = self.manager.exec_command(&self.container_id, cmd).await?;

        serde_json::from_str(&output).map_err(|e| {
            Error::Node(format!(
                "Failed to parse lncli {} output: {e}",
                args.first().copied().unwrap_or_default()
            ))
        })
    }
}

/// Data source backed by a live lnd.
#[derive(Debug, Clone)]
pub struct LndDataSource {
    session: NodeSession,
}

impl LndDataSource {
    /// Wrap an established session.
    pub const fn new(session: NodeSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl ChannelDataSource for LndDataSource {
    fn kind(&self) -> DataSourceKind {
        DataSourceKind::Lnd
    }

    async fn list_channels(&self) -> Result<serde_json::Value> {
        self.session.lncli(&["listchannels"]).await
    }

    async fn get_node_info(&self, pubkey: &str) -> Result<NodeAlias> {
        let json = self
            .session
            .lncli(&["getnodeinfo", "--pub_key", pubkey])
            .await?;

        let alias = json["node"]["alias"]
            .as_str()
            .ok_or_else(|| Error::Node(format!("No alias in getnodeinfo response for {pubkey}")))?
            .to_string();

        Ok(NodeAlias { alias })
    }
}
