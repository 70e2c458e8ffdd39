//! Health and liquidity scoring.
//!
//! A channel is healthy when it is active and its local balance ratio
//! (`local_balance / capacity`) lies inside the configured band. Everything
//! here is pure; the formatter only reads the results.

use lnquery_core::{Channel, HealthCriteria};
use serde::Serialize;

/// Why a channel is or is not healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Active and inside the band.
    Healthy,
    /// Not currently usable.
    Inactive,
    /// Reports zero capacity.
    NoCapacity,
    /// Local ratio below the band.
    LowLocalBalance,
    /// Local ratio above the band.
    HighLocalBalance,
}

impl HealthStatus {
    /// Whether this status counts as healthy.
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Short human-readable reason.
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Inactive => "channel is inactive",
            Self::NoCapacity => "channel reports no capacity",
            Self::LowLocalBalance => "too little local balance to send",
            Self::HighLocalBalance => "too little remote balance to receive",
        }
    }
}

/// Which way a channel's liquidity leans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityBucket {
    /// Local ratio inside the band.
    Balanced,
    /// Most funds on our side.
    OutboundHeavy,
    /// Most funds on the counterparty's side.
    InboundHeavy,
    /// No capacity to compute a ratio from.
    Unknown,
}

impl LiquidityBucket {
    /// Short label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::OutboundHeavy => "mostly outbound",
            Self::InboundHeavy => "mostly inbound",
            Self::Unknown => "unknown",
        }
    }
}

/// Scoring result for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAssessment {
    /// `local_balance / capacity`, absent for zero capacity.
    pub local_ratio: Option<f64>,
    /// Health verdict.
    pub status: HealthStatus,
    /// Liquidity lean.
    pub liquidity: LiquidityBucket,
}

impl ChannelAssessment {
    /// Whether the channel counts as healthy.
    pub const fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }
}

/// `local_balance / capacity`, or `None` when capacity is zero.
#[allow(clippy::cast_precision_loss)]
pub fn local_ratio(channel: &Channel) -> Option<f64> {
    (channel.capacity > 0).then(|| channel.local_balance as f64 / channel.capacity as f64)
}

/// Score one channel against the criteria.
pub fn assess_channel(channel: &Channel, criteria: &HealthCriteria) -> ChannelAssessment {
    let ratio = local_ratio(channel);

    let liquidity = match ratio {
        None => LiquidityBucket::Unknown,
        Some(r) if criteria.contains(r) => LiquidityBucket::Balanced,
        Some(r) if r < criteria.min_local_ratio => LiquidityBucket::InboundHeavy,
        Some(_) => LiquidityBucket::OutboundHeavy,
    };

    let status = if !channel.active {
        HealthStatus::Inactive
    } else {
        match liquidity {
            LiquidityBucket::Unknown => HealthStatus::NoCapacity,
            LiquidityBucket::InboundHeavy => HealthStatus::LowLocalBalance,
            LiquidityBucket::OutboundHeavy => HealthStatus::HighLocalBalance,
            LiquidityBucket::Balanced => HealthStatus::Healthy,
        }
    };

    ChannelAssessment {
        local_ratio: ratio,
        status,
        liquidity,
    }
}

/// Whether a channel is healthy under the criteria.
pub fn is_healthy(channel: &Channel, criteria: &HealthCriteria) -> bool {
    assess_channel(channel, criteria).is_healthy()
}
