//! Docker plumbing for lnquery.
//!
//! The live data source talks to lnd by running `lncli` inside the node's
//! container; this crate owns the container lookup and exec calls.

mod container;

pub use container::{ContainerManager, ContainerState};
