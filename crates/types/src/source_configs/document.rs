//! Shape of the shared configuration document.
//!
//! ```yaml
//! CUSTOM:
//!   PLEX:
//!     url: http://plex.lan:32400
//!     token: abc
//!   PROXMOX:
//!     host: https://pve.lan:8006
//!     username: root@pam
//!     token_id: dashboard
//!     token_secret: 0000-1111
//!     verify_ssl: false
//! ```

use serde::{Deserialize, Serialize};

use super::backend::{BackendFamily, FailurePolicy, HistoryMode};

/// One backend section, also used for per-instance overrides
///
/// Every field is optional so that a section and an override set can be
/// merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendSection {
    #[serde(default, alias = "host")]
    pub url: Option<String>,
    /// Session token (Plex)
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default)]
    pub token_secret: Option<String>,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub vm_id: Option<u32>,
    #[serde(default, alias = "verify_ssl")]
    pub verify_tls: Option<bool>,
    #[serde(default)]
    pub cache_ttl: Option<u64>,
    #[serde(default)]
    pub on_failure: Option<FailurePolicy>,
    #[serde(default)]
    pub history: Option<HistoryMode>,
}

/// The `CUSTOM` integrations section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomSection {
    #[serde(default, rename = "PLEX")]
    pub plex: Option<BackendSection>,
    #[serde(default, rename = "PROXMOX")]
    pub proxmox: Option<BackendSection>,
}

impl CustomSection {
    pub fn backend(&self, family: BackendFamily) -> Option<&BackendSection> {
        match family {
            BackendFamily::Plex => self.plex.as_ref(),
            BackendFamily::Proxmox => self.proxmox.as_ref(),
        }
    }
}

/// Root of the configuration document; unknown keys are ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocumentData {
    #[serde(default, rename = "CUSTOM")]
    pub custom: Option<CustomSection>,
}

impl ConfigDocumentData {
    pub fn backend(&self, family: BackendFamily) -> Option<&BackendSection> {
        self.custom.as_ref().and_then(|c| c.backend(family))
    }
}
