//! Resolved backend connection settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default cache time-to-live in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Default Proxmox node name
pub const DEFAULT_PROXMOX_NODE: &str = "pve";

/// Remote API family a source polls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendFamily {
    /// Session-token authenticated media server
    Plex,
    /// API-token authenticated hypervisor
    Proxmox,
}

impl fmt::Display for BackendFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendFamily::Plex => write!(f, "plex"),
            BackendFamily::Proxmox => write!(f, "proxmox"),
        }
    }
}

/// What the cache does when a fetch fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the last good value and its timestamp untouched
    #[default]
    #[serde(alias = "retain_last_good")]
    Retain,
    /// Overwrite the entry with the sentinel and restart the TTL window
    #[serde(alias = "accept_on_failure")]
    Accept,
}

/// How a source records history for charting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// Push every numeric read into the bounded ring buffer
    #[default]
    Rolling,
    /// Expose only the latest cached value as a one-element history
    LatestOnly,
}

/// Authentication material for a backend
#[derive(Clone, PartialEq, Default)]
pub enum Credentials {
    /// No credentials configured
    #[default]
    None,
    /// Static session token sent as a header
    SessionToken { token: String },
    /// API token composed as `principal!token_id=secret`
    ApiToken {
        username: Option<String>,
        token_id: String,
        secret: String,
    },
}

// Secrets stay out of debug logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => write!(f, "None"),
            Credentials::SessionToken { .. } => f
                .debug_struct("SessionToken")
                .field("token", &"<redacted>")
                .finish(),
            Credentials::ApiToken {
                username, token_id, ..
            } => f
                .debug_struct("ApiToken")
                .field("username", username)
                .field("token_id", token_id)
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

/// Connection settings for one metric source instance
///
/// Resolved once when the source is constructed and never reloaded.
/// An empty `base_url` means the backend is not configured and every
/// fetch short-circuits to unavailable.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub family: BackendFamily,
    /// Absolute API root, without trailing slash
    pub base_url: String,
    pub credentials: Credentials,
    pub verify_tls: bool,
    pub cache_ttl_secs: u64,
    /// Node name (Proxmox only)
    pub node: String,
    /// Guest id for per-VM sources (Proxmox only)
    pub vm_id: u32,
    pub failure_policy: FailurePolicy,
    pub history: HistoryMode,
}

impl BackendConfig {
    /// Fully-default configuration for a family
    pub fn unconfigured(family: BackendFamily) -> Self {
        let node = match family {
            BackendFamily::Plex => String::new(),
            BackendFamily::Proxmox => DEFAULT_PROXMOX_NODE.to_string(),
        };
        Self {
            family,
            base_url: String::new(),
            credentials: Credentials::None,
            verify_tls: true,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            node,
            vm_id: 0,
            failure_policy: FailurePolicy::default(),
            history: HistoryMode::default(),
        }
    }

    /// Cache freshness window
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_policy_aliases() {
        let accept: FailurePolicy = serde_json::from_str("\"accept_on_failure\"").unwrap();
        assert_eq!(accept, FailurePolicy::Accept);
        let retain: FailurePolicy = serde_json::from_str("\"retain\"").unwrap();
        assert_eq!(retain, FailurePolicy::Retain);
    }

    #[test]
    fn test_unconfigured_defaults() {
        let config = BackendConfig::unconfigured(BackendFamily::Proxmox);
        assert!(!config.is_configured());
        assert_eq!(config.node, "pve");
        assert_eq!(config.ttl(), Duration::from_secs(30));
        assert_eq!(config.failure_policy, FailurePolicy::Retain);
        assert!(config.verify_tls);
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::ApiToken {
            username: Some("root@pam".to_string()),
            token_id: "dash".to_string(),
            secret: "hunter2".to_string(),
        };
        let printed = format!("{:?}", creds);
        assert!(printed.contains("dash"));
        assert!(!printed.contains("hunter2"));
    }
}
