//! Error types for lnquery.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lnquery.
#[derive(Debug, Error)]
pub enum Error {
    /// Could not establish a session with the Lightning node.
    #[error("connection error: {0}")]
    Connection(String),

    /// Docker error.
    #[error("docker error: {0}")]
    Docker(String),

    /// The node answered, but not with something usable.
    #[error("node error: {0}")]
    Node(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Caller supplied malformed input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// The error rendered through [`sanitize_error_message`].
    pub fn sanitized(&self) -> String {
        sanitize_error_message(&self.to_string())
    }
}

const MAX_SANITIZED_LEN: usize = 200;
const MIN_SECRET_HEX_LEN: usize = 32;
const SECRET_KEYS: &[&str] = &[
    "macaroon", "password", "passwd", "token", "secret", "apikey", "api_key",
];
const LEADING_PUNCT: &[char] = &['"', '\'', '(', '[', '`'];
const TRAILING_PUNCT: &[char] = &['"', '\'', ')', ']', '`', ',', ';', ':', '.'];

/// Reduce an arbitrary error message to something safe to show a user.
///
/// Only the first line survives, filesystem paths become `[path]`, long hex
/// runs and `secret=value` pairs become `[redacted]`, and the result is capped
/// at 200 characters.
pub fn sanitize_error_message(message: &str) -> String {
    let first_line = message.lines().next().unwrap_or_default();

    let cleaned = first_line
        .split_whitespace()
        .map(redact_token)
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.is_empty() {
        return "unknown error".to_string();
    }

    if cleaned.chars().count() > MAX_SANITIZED_LEN {
        let truncated: String = cleaned.chars().take(MAX_SANITIZED_LEN).collect();
        format!("{truncated}…")
    } else {
        cleaned
    }
}

fn redact_token(token: &str) -> String {
    let rest = token.trim_start_matches(LEADING_PUNCT);
    let prefix = &token[..token.len() - rest.len()];
    let body = rest.trim_end_matches(TRAILING_PUNCT);
    let suffix = &rest[body.len()..];

    let redacted = if let Some((key, value)) = body.split_once('=') {
        if is_secret_key(key) {
            format!("{key}=[redacted]")
        } else if is_path(value) {
            format!("{key}=[path]")
        } else if is_secret_hex(value) {
            format!("{key}=[redacted]")
        } else {
            body.to_string()
        }
    } else if is_path(body) {
        "[path]".to_string()
    } else if is_secret_hex(body) {
        "[redacted]".to_string()
    } else {
        body.to_string()
    };

    format!("{prefix}{redacted}{suffix}")
}

/// Whole-key match, also accepting a prefixed form like `admin_macaroon`.
fn is_secret_key(key: &str) -> bool {
    let lowered = key.trim_start_matches('-').to_lowercase();
    SECRET_KEYS.iter().any(|k| {
        lowered == *k
            || lowered
                .strip_suffix(k)
                .is_some_and(|head| head.ends_with(['_', '-', '.']))
    })
}

fn is_path(s: &str) -> bool {
    let bytes = s.as_bytes();
    let windows_drive = bytes.len() > 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/');

    (s.starts_with('/') && s.len() > 1) || s.starts_with("~/") || s.starts_with("./") || windows_drive
}

fn is_secret_hex(s: &str) -> bool {
    s.len() >= MIN_SECRET_HEX_LEN && s.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_plain_messages() {
        assert_eq!(
            sanitize_error_message("connection refused"),
            "connection refused"
        );
    }

    #[test]
    fn test_drops_everything_after_first_line() {
        let msg = "node unreachable\n   at lnd::connect (src/lnd.rs:42)\n   at main";
        assert_eq!(sanitize_error_message(msg), "node unreachable");
    }

    #[test]
    fn test_redacts_paths() {
        let msg = "failed to read /home/lnd/.lnd/tls.cert: permission denied";
        assert_eq!(
            sanitize_error_message(msg),
            "failed to read [path]: permission denied"
        );

        let msg = r"cannot open C:\Users\bob\admin.macaroon";
        assert_eq!(sanitize_error_message(msg), "cannot open [path]");
    }

    #[test]
    fn test_redacts_credentials() {
        let msg = "bad header macaroon=0201036c6e6402f801030a10";
        assert_eq!(sanitize_error_message(msg), "bad header macaroon=[redacted]");

        let hex = "a".repeat(64);
        let msg = format!("rejected credential {hex}");
        assert_eq!(sanitize_error_message(&msg), "rejected credential [redacted]");
    }

    #[test]
    fn test_flag_with_path_value() {
        let msg = "lncli --tlscertpath=/home/lnd/.lnd/tls.cert failed";
        assert_eq!(
            sanitize_error_message(msg),
            "lncli --tlscertpath=[path] failed"
        );
    }

    #[test]
    fn test_truncates_long_messages() {
        let msg = "word ".repeat(100);
        let sanitized = sanitize_error_message(&msg);
        assert!(sanitized.ends_with('…'));
        assert_eq!(sanitized.chars().count(), MAX_SANITIZED_LEN + 1);
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(sanitize_error_message(""), "unknown error");
        assert_eq!(sanitize_error_message("   \n trace"), "unknown error");
    }

    #[test]
    fn test_non_ascii_tokens() {
        assert_eq!(sanitize_error_message("accès refusé"), "accès refusé");
        assert_eq!(
            sanitize_error_message("connexion refusée: «nœud» injoignable…"),
            "connexion refusée: «nœud» injoignable…"
        );
        assert_eq!(sanitize_error_message("ノードに接続できません"), "ノードに接続できません");
    }

    #[test]
    fn test_punctuated_multibyte_tokens() {
        assert_eq!(sanitize_error_message("(refusé), 'échec'."), "(refusé), 'échec'.");
        assert_eq!(
            sanitize_error_message("\"/home/zoë/.lnd/tls.cert\": introuvable"),
            "\"[path]\": introuvable"
        );
        assert_eq!(sanitize_error_message("macaroon=clé_secrète;"), "macaroon=[redacted];");
    }

    #[test]
    fn test_punctuation_only_tokens() {
        assert_eq!(sanitize_error_message("failed: ... ;; \"\" ()"), "failed: ... ;; \"\" ()");
        assert_eq!(sanitize_error_message("'"), "'");
    }

    #[test]
    fn test_secret_keys_match_whole_words() {
        assert_eq!(
            sanitize_error_message("getnodeinfo --pub_key=02abc failed"),
            "getnodeinfo --pub_key=02abc failed"
        );
        assert_eq!(sanitize_error_message("bypass=on"), "bypass=on");
        assert_eq!(
            sanitize_error_message("auth_token=abc admin_macaroon=0201 password=hunter2"),
            "auth_token=[redacted] admin_macaroon=[redacted] password=[redacted]"
        );
    }

    #[test]
    fn test_error_sanitized() {
        let err = Error::Connection("cannot read /etc/lnd/admin.macaroon".into());
        assert_eq!(err.sanitized(), "connection error: cannot read [path]");
    }
}
