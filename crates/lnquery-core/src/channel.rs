//! Channel records and the aggregates derived from them.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A payment channel as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Funding outpoint (`txid:index`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_point: Option<String>,
    /// Short channel id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chan_id: Option<String>,
    /// Channel capacity (satoshis).
    pub capacity: u64,
    /// Our side of the channel (satoshis).
    pub local_balance: u64,
    /// Counterparty's side of the channel (satoshis).
    pub remote_balance: u64,
    /// Whether the channel is currently usable.
    pub active: bool,
    /// Counterparty public key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_pubkey: Option<String>,
    /// Unannounced channel.
    #[serde(default)]
    pub private: bool,
    /// We opened the channel.
    #[serde(default)]
    pub initiator: bool,
}

impl Channel {
    /// Create a channel with the given balances and no metadata.
    pub fn new(capacity: u64, local_balance: u64, remote_balance: u64, active: bool) -> Self {
        Self {
            channel_point: None,
            chan_id: None,
            capacity,
            local_balance,
            remote_balance,
            active,
            remote_pubkey: None,
            private: false,
            initiator: false,
        }
    }

    /// Set the counterparty public key.
    pub fn with_remote_pubkey(mut self, pubkey: impl Into<String>) -> Self {
        self.remote_pubkey = Some(pubkey.into());
        self
    }

    /// Set the funding outpoint.
    pub fn with_channel_point(mut self, channel_point: impl Into<String>) -> Self {
        self.channel_point = Some(channel_point.into());
        self
    }

    /// Build a channel from one entry of a `listchannels` response.
    ///
    /// LND encodes 64-bit integers as JSON strings, so numeric fields are
    /// accepted either as numbers or decimal strings. Missing or unparsable
    /// numbers read as zero. Returns `None` when the entry is not an object.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }

        let remote_pubkey = value["remote_pubkey"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        Some(Self {
            channel_point: json_string(&value["channel_point"]),
            chan_id: json_string(&value["chan_id"]),
            capacity: json_sats(&value["capacity"]),
            local_balance: json_sats(&value["local_balance"]),
            remote_balance: json_sats(&value["remote_balance"]),
            active: value["active"].as_bool().unwrap_or(false),
            remote_pubkey,
            private: value["private"].as_bool().unwrap_or(false),
            initiator: value["initiator"].as_bool().unwrap_or(false),
        })
    }
}

fn json_sats(value: &serde_json::Value) -> u64 {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<u64>().ok()))
        .unwrap_or(0)
}

fn json_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Why enrichment could not complete for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentErrorKind {
    /// The counterparty's node info lookup failed.
    AliasRetrievalFailed,
}

/// Diagnostic attached to a channel whose enrichment failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentError {
    /// Error kind.
    #[serde(rename = "type")]
    pub kind: EnrichmentErrorKind,
    /// Sanitized description of the underlying failure.
    pub message: String,
}

/// A channel annotated with its counterparty's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedChannel {
    /// The channel as reported by the node.
    #[serde(flatten)]
    pub channel: Channel,
    /// Counterparty alias.
    pub remote_alias: String,
    /// Set only when alias resolution failed.
    #[serde(rename = "_error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EnrichmentError>,
}

impl EnrichedChannel {
    /// Alias placeholder used when the lookup failed.
    pub const ALIAS_ERROR_PLACEHOLDER: &'static str = "Unknown (Error retrieving)";
    /// Alias used for channels that carry no counterparty public key.
    pub const ALIAS_UNKNOWN: &'static str = "Unknown";

    /// A channel whose alias resolved.
    pub fn resolved(channel: Channel, alias: impl Into<String>) -> Self {
        Self {
            channel,
            remote_alias: alias.into(),
            error: None,
        }
    }

    /// A channel whose alias lookup failed with the given (already sanitized) reason.
    pub fn alias_failed(channel: Channel, message: impl Into<String>) -> Self {
        Self {
            channel,
            remote_alias: Self::ALIAS_ERROR_PLACEHOLDER.to_string(),
            error: Some(EnrichmentError {
                kind: EnrichmentErrorKind::AliasRetrievalFailed,
                message: message.into(),
            }),
        }
    }
}

/// Acceptable band for a channel's local balance ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthCriteria {
    /// Lowest acceptable `local_balance / capacity`.
    pub min_local_ratio: f64,
    /// Highest acceptable `local_balance / capacity`.
    pub max_local_ratio: f64,
}

impl Default for HealthCriteria {
    fn default() -> Self {
        Self {
            min_local_ratio: 0.1,
            max_local_ratio: 0.9,
        }
    }
}

impl HealthCriteria {
    /// Create validated criteria.
    pub fn new(min_local_ratio: f64, max_local_ratio: f64) -> Result<Self> {
        let criteria = Self {
            min_local_ratio,
            max_local_ratio,
        };
        criteria.validate()?;
        Ok(criteria)
    }

    /// Check both bounds lie in `[0, 1]` and are ordered.
    pub fn validate(&self) -> Result<()> {
        let in_unit = |r: f64| (0.0..=1.0).contains(&r);

        if !in_unit(self.min_local_ratio) || !in_unit(self.max_local_ratio) {
            return Err(Error::Config(format!(
                "health ratios must be within [0, 1], got {}..{}",
                self.min_local_ratio, self.max_local_ratio
            )));
        }
        if self.min_local_ratio > self.max_local_ratio {
            return Err(Error::Config(format!(
                "minLocalRatio {} exceeds maxLocalRatio {}",
                self.min_local_ratio, self.max_local_ratio
            )));
        }
        Ok(())
    }

    /// Whether a ratio falls inside the band (inclusive).
    pub fn contains(&self, ratio: f64) -> bool {
        ratio >= self.min_local_ratio && ratio <= self.max_local_ratio
    }
}

/// Aggregate figures over a channel list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    /// Sum of capacities.
    pub total_capacity: u64,
    /// Sum of local balances.
    pub total_local_balance: u64,
    /// Sum of remote balances.
    pub total_remote_balance: u64,
    /// Channels currently active.
    pub active_channels: usize,
    /// Channels currently inactive.
    pub inactive_channels: usize,
    /// Mean capacity, zero when there are no channels.
    pub average_capacity: u64,
    /// Channels inside the health band.
    pub healthy_channels: usize,
    /// Channels outside the health band or inactive.
    pub unhealthy_channels: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_from_lnd_json() {
        let entry = json!({
            "active": true,
            "remote_pubkey": "02abc",
            "channel_point": "deadbeef:0",
            "chan_id": "123456789",
            "capacity": "1000000",
            "local_balance": "400000",
            "remote_balance": 590000,
            "initiator": true
        });

        let channel = Channel::from_json(&entry).unwrap();
        assert_eq!(channel.capacity, 1_000_000);
        assert_eq!(channel.local_balance, 400_000);
        assert_eq!(channel.remote_balance, 590_000);
        assert!(channel.active);
        assert!(channel.initiator);
        assert!(!channel.private);
        assert_eq!(channel.remote_pubkey.as_deref(), Some("02abc"));
        assert_eq!(channel.channel_point.as_deref(), Some("deadbeef:0"));
    }

    #[test]
    fn test_channel_from_sparse_json() {
        let channel = Channel::from_json(&json!({ "capacity": "garbage" })).unwrap();
        assert_eq!(channel.capacity, 0);
        assert_eq!(channel.local_balance, 0);
        assert!(!channel.active);
        assert!(channel.remote_pubkey.is_none());

        assert!(Channel::from_json(&json!("not a channel")).is_none());
        assert!(Channel::from_json(&json!(null)).is_none());
    }

    #[test]
    fn test_enriched_channel_serialization() {
        let channel = Channel::new(100, 50, 50, true)
            .with_remote_pubkey("02abc")
            .with_channel_point("deadbeef:1");
        let failed = EnrichedChannel::alias_failed(channel.clone(), "timeout");
        let value = serde_json::to_value(&failed).unwrap();

        assert_eq!(value["remote_alias"], "Unknown (Error retrieving)");
        assert_eq!(value["_error"]["type"], "alias_retrieval_failed");
        assert_eq!(value["_error"]["message"], "timeout");
        assert_eq!(value["capacity"], 100);
        assert_eq!(value["channel_point"], "deadbeef:1");
        assert!(value.get("chan_id").is_none());

        let ok = serde_json::to_value(EnrichedChannel::resolved(channel, "carol")).unwrap();
        assert_eq!(ok["remote_alias"], "carol");
        assert!(ok.get("_error").is_none());
    }

    #[test]
    fn test_health_criteria_validation() {
        assert!(HealthCriteria::new(0.3, 0.7).is_ok());
        assert!(HealthCriteria::new(0.5, 0.5).is_ok());
        assert!(HealthCriteria::new(0.8, 0.2).is_err());
        assert!(HealthCriteria::new(-0.1, 0.5).is_err());
        assert!(HealthCriteria::new(0.1, 1.5).is_err());
        assert!(HealthCriteria::new(f64::NAN, 0.5).is_err());
    }

    #[test]
    fn test_health_criteria_bounds_inclusive() {
        let criteria = HealthCriteria::default();
        assert!(criteria.contains(0.1));
        assert!(criteria.contains(0.9));
        assert!(!criteria.contains(0.05));
        assert!(!criteria.contains(0.95));
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let value = serde_json::to_value(ChannelSummary::default()).unwrap();
        assert_eq!(value["activeChannels"], 0);
        assert_eq!(value["averageCapacity"], 0);
        assert_eq!(value["unhealthyChannels"], 0);
    }
}
