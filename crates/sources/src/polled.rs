//! Generic cache-guarded metric source
//!
//! Every Plex and Proxmox sensor is a `PolledSource`: a metric key, a
//! sampler that turns backend payloads into one raw number, and a
//! `MetricKind` that decides how that number is shown.

use crate::format::{MetricKind, NO_VALUE_TEXT};
use log::debug;
use remote_sens_core::{
    BackendConfig, BoxedTransport, Clock, HistoryBuffer, HistoryMode, HttpTransport,
    MetricSource, SourceMetadata, Transport, TtlCache, Unavailable, HISTORY_WINDOW,
};
use std::sync::Arc;

/// Fetch-and-transform step run on a cache miss
pub type Sampler = Box<dyn Fn(&dyn Transport) -> Result<f64, Unavailable> + Send + Sync>;

pub struct PolledSource {
    metadata: SourceMetadata,
    key: String,
    kind: MetricKind,
    sampler: Sampler,
    configured: bool,
    transport: BoxedTransport,

    cache: TtlCache,
    history: HistoryBuffer,
    history_mode: HistoryMode,
}

impl PolledSource {
    /// Create a source talking HTTP to the configured backend
    pub fn new(
        metadata: SourceMetadata,
        key: String,
        kind: MetricKind,
        config: &BackendConfig,
        sampler: Sampler,
    ) -> Self {
        let transport = Box::new(HttpTransport::new(config));
        Self::with_transport(metadata, key, kind, config, transport, sampler)
    }

    pub fn with_transport(
        metadata: SourceMetadata,
        key: String,
        kind: MetricKind,
        config: &BackendConfig,
        transport: BoxedTransport,
        sampler: Sampler,
    ) -> Self {
        Self {
            metadata,
            key,
            kind,
            sampler,
            configured: config.is_configured(),
            transport,
            cache: TtlCache::new(config.ttl(), config.failure_policy),
            history: HistoryBuffer::new(),
            history_mode: config.history,
        }
    }

    /// Swap the cache clock; the cache must still be empty
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cache = TtlCache::with_clock(self.cache.ttl(), self.cache.policy(), clock);
        self
    }

    /// Raw cached value in the backend's unit, without fetching
    pub fn cached_raw(&self) -> Option<f64> {
        self.cache.cached(&self.key)
    }
}

impl MetricSource for PolledSource {
    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    fn as_numeric(&mut self) -> Option<f64> {
        let configured = self.configured;
        let transport = self.transport.as_ref();
        let sampler = &self.sampler;

        let raw = self.cache.get_or_compute(&self.key, || {
            if !configured {
                return Err(Unavailable::NotConfigured);
            }
            sampler(transport)
        })?;

        let value = self.kind.numeric(raw);
        if self.history_mode == HistoryMode::Rolling {
            self.history.push(value);
        }
        Some(value)
    }

    fn as_string(&self) -> String {
        match self.cached_raw() {
            Some(raw) => self.kind.format(raw),
            None => {
                debug!("{} has no value yet", self.key);
                NO_VALUE_TEXT.to_string()
            }
        }
    }

    fn history(&self) -> Vec<f64> {
        match self.history_mode {
            HistoryMode::Rolling => self.history.recent(HISTORY_WINDOW),
            HistoryMode::LatestOnly => self
                .cached_raw()
                .map(|raw| vec![self.kind.numeric(raw)])
                .unwrap_or_default(),
        }
    }

    fn is_available(&self) -> bool {
        self.configured
    }
}
