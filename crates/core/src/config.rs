//! Shared configuration document and backend settings resolution
//!
//! The document is read once; each source then gets its own resolved
//! [`BackendConfig`] with per-instance overrides applied on top of the
//! backend's global section.

use log::{debug, info, warn};
use remote_sens_types::{
    BackendConfig, BackendFamily, BackendSection, ConfigDocumentData, Credentials,
};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and the user config dir
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Path suffix of the Proxmox REST API root
const PROXMOX_API_ROOT: &str = "/api2/json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Parsed shared configuration document
#[derive(Debug, Clone, Default)]
pub struct ConfigDocument {
    data: ConfigDocumentData,
    path: Option<PathBuf>,
}

impl ConfigDocument {
    /// Document with no sections; every backend resolves to defaults
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // An empty file is a valid, empty configuration
        if content.trim().is_empty() {
            return Ok(Self::empty());
        }
        let data: ConfigDocumentData = serde_yaml::from_str(content)?;
        Ok(Self { data, path: None })
    }

    /// Load a document, failing on I/O or parse errors
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut document = Self::from_yaml_str(&content)?;
        document.path = Some(path.to_path_buf());
        Ok(document)
    }

    /// Load a document, degrading to an empty one on any failure
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No configuration at {}, using defaults", path.display());
            return Self::empty();
        }
        match Self::try_load(path) {
            Ok(document) => {
                debug!("Loaded configuration from {}", path.display());
                document
            }
            Err(e) => {
                warn!("Ignoring configuration: {}", e);
                Self::empty()
            }
        }
    }

    /// Load from [`ConfigDocument::default_path`], or empty when none exists
    pub fn load_default() -> Self {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Self::empty(),
        }
    }

    /// `config.yaml` in the working directory, else in the user config dir
    pub fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        directories::ProjectDirs::from("com", "remote-sens", "remote-sens")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Where this document was read from, if anywhere
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Global section for a backend (empty if absent)
    pub fn section(&self, family: BackendFamily) -> BackendSection {
        self.data.backend(family).cloned().unwrap_or_default()
    }

    /// Resolve the settings for one source instance; overrides win
    pub fn resolve(&self, family: BackendFamily, overrides: &BackendSection) -> BackendConfig {
        resolve_section(family, &self.section(family), overrides)
    }
}

/// First non-blank string, override before base
fn pick(over: &Option<String>, base: &Option<String>) -> Option<String> {
    [over, base]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Merge a global backend section with instance overrides
pub fn resolve_section(
    family: BackendFamily,
    base: &BackendSection,
    over: &BackendSection,
) -> BackendConfig {
    let defaults = BackendConfig::unconfigured(family);

    let root = pick(&over.url, &base.url)
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_default();
    let base_url = match family {
        BackendFamily::Plex => root,
        BackendFamily::Proxmox if root.is_empty() => root,
        BackendFamily::Proxmox => format!("{}{}", root, PROXMOX_API_ROOT),
    };

    let credentials = match family {
        BackendFamily::Plex => pick(&over.token, &base.token)
            .map(|token| Credentials::SessionToken { token })
            .unwrap_or_default(),
        BackendFamily::Proxmox => match (
            pick(&over.token_id, &base.token_id),
            pick(&over.token_secret, &base.token_secret),
        ) {
            (Some(token_id), Some(secret)) => Credentials::ApiToken {
                username: pick(&over.username, &base.username),
                token_id,
                secret,
            },
            _ => Credentials::None,
        },
    };

    let node = pick(&over.node, &base.node).unwrap_or_else(|| defaults.node.clone());

    BackendConfig {
        family,
        base_url,
        credentials,
        verify_tls: over.verify_tls.or(base.verify_tls).unwrap_or(defaults.verify_tls),
        cache_ttl_secs: over
            .cache_ttl
            .or(base.cache_ttl)
            .unwrap_or(defaults.cache_ttl_secs),
        node,
        vm_id: over.vm_id.or(base.vm_id).unwrap_or(defaults.vm_id),
        failure_policy: over
            .on_failure
            .or(base.on_failure)
            .unwrap_or(defaults.failure_policy),
        history: over.history.or(base.history).unwrap_or(defaults.history),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote_sens_types::{FailurePolicy, HistoryMode};
    use std::io::Write;

    const SAMPLE: &str = r#"
CUSTOM:
  PLEX:
    url: "http://plex.lan:32400/"
    token: abc
    cache_ttl: 60
  PROXMOX:
    host: "https://pve.lan:8006"
    username: root@pam
    token_id: dashboard
    token_secret: 0000-1111
    node: pve2
    verify_ssl: false
    on_failure: accept
OTHER:
  ignored: true
"#;

    #[test]
    fn test_resolve_plex_section() {
        let doc = ConfigDocument::from_yaml_str(SAMPLE).unwrap();
        let config = doc.resolve(BackendFamily::Plex, &BackendSection::default());

        assert_eq!(config.base_url, "http://plex.lan:32400");
        assert_eq!(
            config.credentials,
            Credentials::SessionToken {
                token: "abc".to_string()
            }
        );
        assert_eq!(config.cache_ttl_secs, 60);
        assert!(config.verify_tls);
        assert_eq!(config.failure_policy, FailurePolicy::Retain);
    }

    #[test]
    fn test_resolve_proxmox_section() {
        let doc = ConfigDocument::from_yaml_str(SAMPLE).unwrap();
        let config = doc.resolve(BackendFamily::Proxmox, &BackendSection::default());

        assert_eq!(config.base_url, "https://pve.lan:8006/api2/json");
        assert_eq!(config.node, "pve2");
        assert!(!config.verify_tls);
        assert_eq!(config.cache_ttl_secs, 30);
        assert_eq!(config.failure_policy, FailurePolicy::Accept);
        assert!(matches!(
            config.credentials,
            Credentials::ApiToken { ref token_id, .. } if token_id == "dashboard"
        ));
    }

    #[test]
    fn test_overrides_win() {
        let doc = ConfigDocument::from_yaml_str(SAMPLE).unwrap();
        let overrides = BackendSection {
            node: Some("edge".to_string()),
            vm_id: Some(101),
            cache_ttl: Some(5),
            history: Some(HistoryMode::LatestOnly),
            // Blank overrides fall through to the global section
            url: Some("   ".to_string()),
            ..Default::default()
        };
        let config = doc.resolve(BackendFamily::Proxmox, &overrides);

        assert_eq!(config.node, "edge");
        assert_eq!(config.vm_id, 101);
        assert_eq!(config.cache_ttl_secs, 5);
        assert_eq!(config.history, HistoryMode::LatestOnly);
        assert_eq!(config.base_url, "https://pve.lan:8006/api2/json");
    }

    #[test]
    fn test_missing_secret_means_no_credentials() {
        let doc = ConfigDocument::from_yaml_str(
            "CUSTOM:\n  PROXMOX:\n    host: https://pve\n    token_id: dash\n",
        )
        .unwrap();
        let config = doc.resolve(BackendFamily::Proxmox, &BackendSection::default());
        assert_eq!(config.credentials, Credentials::None);
    }

    #[test]
    fn test_empty_document_resolves_to_defaults() {
        let doc = ConfigDocument::from_yaml_str("").unwrap();
        let config = doc.resolve(BackendFamily::Proxmox, &BackendSection::default());
        assert_eq!(config, BackendConfig::unconfigured(BackendFamily::Proxmox));

        let doc = ConfigDocument::from_yaml_str("CUSTOM:\n").unwrap();
        let config = doc.resolve(BackendFamily::Plex, &BackendSection::default());
        assert!(!config.is_configured());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let doc = ConfigDocument::load(&dir.path().join("nope.yaml"));
        assert!(doc.path().is_none());
        assert!(!doc
            .resolve(BackendFamily::Plex, &BackendSection::default())
            .is_configured());
    }

    #[test]
    fn test_unparseable_file_is_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CUSTOM: [this is: not: valid").unwrap();

        assert!(ConfigDocument::try_load(file.path()).is_err());
        let doc = ConfigDocument::load(file.path());
        assert!(!doc
            .resolve(BackendFamily::Proxmox, &BackendSection::default())
            .is_configured());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let doc = ConfigDocument::load(file.path());
        assert_eq!(doc.path(), Some(file.path()));
        assert!(doc
            .resolve(BackendFamily::Plex, &BackendSection::default())
            .is_configured());
    }
}
