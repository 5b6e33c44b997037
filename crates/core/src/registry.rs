//! Registry for metric source factories

use crate::config::ConfigDocument;
use crate::metric_source::BoxedMetricSource;
use anyhow::{anyhow, Result};
use log::info;
use once_cell::sync::Lazy;
use remote_sens_types::{BackendConfig, BackendFamily, BackendSection};
use std::collections::HashMap;
use std::sync::RwLock;

/// Function that creates a metric source from resolved settings
pub type SourceFactory = fn(&BackendConfig) -> BoxedMetricSource;

/// Listing information for a registered source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    pub family: BackendFamily,
}

struct Registration {
    info: SourceInfo,
    factory: SourceFactory,
}

/// Registry for metric sources
///
/// Built-in sources register at startup; hosts then create instances by ID.
pub struct Registry {
    sources: HashMap<String, Registration>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Register a metric source
    pub fn register_source(
        &mut self,
        id: &str,
        name: &str,
        family: BackendFamily,
        factory: SourceFactory,
    ) {
        let info = SourceInfo {
            id: id.to_string(),
            name: name.to_string(),
            family,
        };
        self.sources
            .insert(id.to_string(), Registration { info, factory });
    }

    /// Create a metric source by ID with explicit settings
    pub fn create_source(&self, id: &str, config: &BackendConfig) -> Result<BoxedMetricSource> {
        let registration = self
            .sources
            .get(id)
            .ok_or_else(|| anyhow!("Unknown source: {}", id))?;
        if registration.info.family != config.family {
            return Err(anyhow!(
                "Source {} polls {}, got {} settings",
                id,
                registration.info.family,
                config.family
            ));
        }
        Ok((registration.factory)(config))
    }

    /// Create a metric source by ID, resolving its settings from a document
    pub fn create_from_document(
        &self,
        id: &str,
        document: &ConfigDocument,
        overrides: &BackendSection,
    ) -> Result<BoxedMetricSource> {
        let family = self
            .source_info(id)
            .map(|i| i.family)
            .ok_or_else(|| anyhow!("Unknown source: {}", id))?;
        let config = document.resolve(family, overrides);
        info!(
            "Creating source {} (configured: {}, ttl: {}s)",
            id,
            config.is_configured(),
            config.cache_ttl_secs
        );
        self.create_source(id, &config)
    }

    pub fn source_info(&self, id: &str) -> Option<&SourceInfo> {
        self.sources.get(id).map(|r| &r.info)
    }

    /// List all registered sources, sorted by ID
    pub fn list_sources(&self) -> Vec<SourceInfo> {
        let mut sources: Vec<SourceInfo> =
            self.sources.values().map(|r| r.info.clone()).collect();
        sources.sort_by(|a, b| a.id.cmp(&b.id));
        sources
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global registry instance
static GLOBAL_REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::new()));

/// Get the global registry
pub fn global_registry() -> &'static RwLock<Registry> {
    &GLOBAL_REGISTRY
}
