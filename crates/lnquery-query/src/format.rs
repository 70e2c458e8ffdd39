//! Natural-language rendering of channel data.
//!
//! Renderers only present what the pipeline computed; health and liquidity
//! verdicts come from [`ChannelData::assessments`], never from here.

use std::fmt::Write as _;

use lnquery_core::{ChannelSummary, HealthCriteria};
use serde_json::json;

use crate::pipeline::ChannelData;

/// A rendered answer plus the structured data behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedResponse {
    /// Human-readable answer.
    pub response: String,
    /// Structured payload for the caller.
    pub data: serde_json::Value,
}

const NO_CHANNELS: &str = "You don't have any channels yet.";

/// Answer for a query nobody could classify.
pub const UNKNOWN_RESPONSE: &str = "I didn't understand your question. \
I can answer questions like \"list my channels\", \"how healthy are my channels\" \
or \"what is my channel liquidity\".";

/// Render a channel listing.
pub fn format_channel_list(data: &ChannelData) -> FormattedResponse {
    let summary = &data.summary;

    let response = if data.channels.is_empty() {
        NO_CHANNELS.to_string()
    } else {
        let mut out = format!(
            "You have {} ({} active, {} inactive) with a total capacity of {}.\n",
            plural(data.channels.len(), "channel"),
            summary.active_channels,
            summary.inactive_channels,
            format_sats(summary.total_capacity)
        );

        for (i, enriched) in data.channels.iter().enumerate() {
            let channel = &enriched.channel;
            let _ = write!(
                out,
                "\n{}. {}: {} capacity, {} local / {} remote ({})",
                i + 1,
                enriched.remote_alias,
                format_sats(channel.capacity),
                format_sats(channel.local_balance),
                format_sats(channel.remote_balance),
                if channel.active { "active" } else { "inactive" }
            );
        }

        let _ = write!(
            out,
            "\n\nLocal balance: {}, remote balance: {}, average capacity: {}.",
            format_sats(summary.total_local_balance),
            format_sats(summary.total_remote_balance),
            format_sats(summary.average_capacity)
        );
        out
    };

    FormattedResponse {
        response,
        data: json!({
            "channels": data.channels,
            "summary": data.summary,
        }),
    }
}

/// Render a health report.
pub fn format_channel_health(data: &ChannelData, criteria: &HealthCriteria) -> FormattedResponse {
    let summary = &data.summary;

    let healthy: Vec<&str> = data
        .channels
        .iter()
        .zip(&data.assessments)
        .filter(|(_, a)| a.is_healthy())
        .map(|(c, _)| c.remote_alias.as_str())
        .collect();

    let unhealthy: Vec<serde_json::Value> = data
        .channels
        .iter()
        .zip(&data.assessments)
        .filter(|(_, a)| !a.is_healthy())
        .map(|(c, a)| {
            json!({
                "alias": c.remote_alias,
                "status": a.status,
                "reason": a.status.describe(),
                "localRatio": a.local_ratio,
            })
        })
        .collect();

    let response = if data.channels.is_empty() {
        NO_CHANNELS.to_string()
    } else {
        let mut out = format!(
            "{} of your {} healthy (active, with {}–{} of capacity on your side).",
            summary.healthy_channels,
            plural_verb(data.channels.len(), "channel"),
            format_percent(criteria.min_local_ratio),
            format_percent(criteria.max_local_ratio)
        );

        if summary.unhealthy_channels == 0 {
            out.push_str("\n\nAll your channels look healthy.");
        } else {
            out.push_str("\n\nNeeds attention:");
            for (enriched, assessment) in data
                .channels
                .iter()
                .zip(&data.assessments)
                .filter(|(_, a)| !a.is_healthy())
            {
                let _ = write!(out, "\n- {}: {}", enriched.remote_alias, assessment.status.describe());
                if let Some(ratio) = assessment.local_ratio {
                    let _ = write!(out, " ({} local)", format_percent(ratio));
                }
            }
        }
        out
    };

    FormattedResponse {
        response,
        data: json!({
            "channels": data.channels,
            "summary": data.summary,
            "criteria": criteria,
            "healthyChannels": healthy,
            "unhealthyChannels": unhealthy,
        }),
    }
}

/// Render a liquidity report.
pub fn format_channel_liquidity(data: &ChannelData) -> FormattedResponse {
    let summary = &data.summary;

    let liquidity: Vec<serde_json::Value> = data
        .channels
        .iter()
        .zip(&data.assessments)
        .map(|(c, a)| {
            json!({
                "alias": c.remote_alias,
                "localRatio": a.local_ratio,
                "bucket": a.liquidity,
            })
        })
        .collect();

    let response = if data.channels.is_empty() {
        NO_CHANNELS.to_string()
    } else {
        let mut out = format!(
            "Across {} you can send up to {} and receive up to {}",
            plural(data.channels.len(), "channel"),
            format_sats(summary.total_local_balance),
            format_sats(summary.total_remote_balance)
        );
        match overall_local_ratio(summary) {
            Some(ratio) => {
                let _ = write!(out, " ({} of capacity is on your side).", format_percent(ratio));
            }
            None => out.push('.'),
        }

        for (enriched, assessment) in data.channels.iter().zip(&data.assessments) {
            let _ = write!(out, "\n- {}: ", enriched.remote_alias);
            match assessment.local_ratio {
                Some(ratio) => {
                    let _ = write!(
                        out,
                        "{} local, {}",
                        format_percent(ratio),
                        assessment.liquidity.label()
                    );
                }
                None => out.push_str("no capacity"),
            }
        }
        out
    };

    FormattedResponse {
        response,
        data: json!({
            "channels": data.channels,
            "summary": data.summary,
            "liquidity": liquidity,
        }),
    }
}

/// Render the fallback for unrecognized queries.
pub fn format_unknown() -> FormattedResponse {
    FormattedResponse {
        response: UNKNOWN_RESPONSE.to_string(),
        data: json!({}),
    }
}

#[allow(clippy::cast_precision_loss)]
fn overall_local_ratio(summary: &ChannelSummary) -> Option<f64> {
    (summary.total_capacity > 0)
        .then(|| summary.total_local_balance as f64 / summary.total_capacity as f64)
}

/// `1234567` → `"1,234,567 sats"`.
pub fn format_sats(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped} sats")
}

fn format_percent(ratio: f64) -> String {
    let percent = ratio * 100.0;
    if (percent - percent.round()).abs() < 1e-9 {
        format!("{percent:.0}%")
    } else {
        format!("{percent:.1}%")
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn plural_verb(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun} is")
    } else {
        format!("{count} {noun}s are")
    }
}
