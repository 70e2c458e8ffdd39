//! Rule-based intent classification.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// What a query is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// Enumerate channels.
    ChannelList,
    /// Judge channel health.
    ChannelHealth,
    /// Describe how liquidity is split.
    ChannelLiquidity,
    /// Nothing recognized.
    Unknown,
}

impl IntentKind {
    /// Wire name of the intent.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ChannelList => "channel_list",
            Self::ChannelHealth => "channel_health",
            Self::ChannelLiquidity => "channel_liquidity",
            Self::Unknown => "unknown",
        }
    }

    /// Whether answering needs channel data from the node.
    pub const fn needs_channel_data(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Classification.
    #[serde(rename = "type")]
    pub kind: IntentKind,
    /// The query as the caller wrote it.
    pub query: String,
}

/// One classification rule: the intent wins if any phrase occurs in the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRule {
    /// Intent produced on match.
    pub kind: IntentKind,
    /// Lower-case phrases, matched as substrings.
    pub phrases: Vec<String>,
}

impl IntentRule {
    /// Create a rule. Phrases are lower-cased and empty ones dropped.
    pub fn new<I, S>(kind: IntentKind, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { kind, phrases }
    }

    fn matches(&self, lowered_query: &str) -> bool {
        self.phrases.iter().any(|p| lowered_query.contains(p.as_str()))
    }
}

const LIQUIDITY_PHRASES: &[&str] = &[
    "liquid",
    "balance",
    "inbound",
    "outbound",
    "how much can i send",
    "how much can i receive",
    "spendable",
];

const HEALTH_PHRASES: &[&str] = &[
    "health",
    "status",
    "how are my channels",
    "doing",
    "problem",
    "issue",
    "working",
    "broken",
];

const LIST_PHRASES: &[&str] = &["channel", "list my", "show my", "peers"];

/// Ordered first-match-wins classifier.
///
/// Rules are tried in order, so more specific intents must come before more
/// general ones. A query matching no rule is [`IntentKind::Unknown`].
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self {
            rules: vec![
                IntentRule::new(IntentKind::ChannelLiquidity, LIQUIDITY_PHRASES),
                IntentRule::new(IntentKind::ChannelHealth, HEALTH_PHRASES),
                IntentRule::new(IntentKind::ChannelList, LIST_PHRASES),
            ],
        }
    }
}

impl IntentClassifier {
    /// Use custom rules, tried in the given order.
    pub fn with_rules(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Classify a query. Never fails.
    pub fn classify(&self, query: &str) -> Intent {
        let lowered = query.to_lowercase();

        let kind = self
            .rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map_or(IntentKind::Unknown, |rule| rule.kind);

        Intent {
            kind,
            query: query.to_string(),
        }
    }
}

static DEFAULT_CLASSIFIER: LazyLock<IntentClassifier> = LazyLock::new(IntentClassifier::default);

/// Classify a query with the built-in rules.
pub fn parse_intent(query: &str) -> Intent {
    DEFAULT_CLASSIFIER.classify(query)
}
