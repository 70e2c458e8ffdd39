//! Lightning node data sources for lnquery.
//!
//! This crate provides the [`ChannelDataSource`] capability with a live LND
//! variant and a simulated one, selected once from configuration.

mod lnd;
mod mock;
mod source;

use std::sync::Arc;

use lnquery_core::{Config, Result};

pub use lnd::{LndDataSource, NodeSession};
pub use mock::{MockDataSource, SAMPLE_PEERS};
pub use source::{ChannelDataSource, DataSourceKind, NodeAlias};

/// Build the data source the configuration asks for.
pub async fn connect_data_source(config: &Config) -> Result<Arc<dyn ChannelDataSource>> {
    if config.use_mock_data {
        tracing::info!("using mock channel data");
        return Ok(Arc::new(MockDataSource::new()));
    }

    let session = NodeSession::establish(config).await?;
    Ok(Arc::new(LndDataSource::new(session)))
}
