//! Plex Media Server sensors

use crate::format::MetricKind;
use crate::payload::{field, key_string, number};
use crate::polled::{PolledSource, Sampler};
use log::warn;
use remote_sens_core::{
    BackendConfig, BackendFamily, BoxedMetricSource, SourceMetadata, Transport, Unavailable,
};
use serde_json::Value;

const SESSIONS_PATH: &str = "/status/sessions";
const SECTIONS_PATH: &str = "/library/sections";

/// Plex item type filters for `/library/sections/{key}/all`
const EPISODE_TYPE: u32 = 4;
const ALBUM_TYPE: u32 = 8;
const TRACK_TYPE: u32 = 10;

/// Quantities reported by a Plex server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlexMetric {
    Streams,
    Movies,
    Shows,
    Episodes,
    Albums,
    Songs,
}

impl PlexMetric {
    pub const ALL: [PlexMetric; 6] = [
        PlexMetric::Streams,
        PlexMetric::Movies,
        PlexMetric::Shows,
        PlexMetric::Episodes,
        PlexMetric::Albums,
        PlexMetric::Songs,
    ];

    pub fn source_id(&self) -> &'static str {
        match self {
            PlexMetric::Streams => "plex_streams",
            PlexMetric::Movies => "plex_movies",
            PlexMetric::Shows => "plex_shows",
            PlexMetric::Episodes => "plex_episodes",
            PlexMetric::Albums => "plex_albums",
            PlexMetric::Songs => "plex_songs",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlexMetric::Streams => "Plex Streams",
            PlexMetric::Movies => "Plex Movies",
            PlexMetric::Shows => "Plex TV Shows",
            PlexMetric::Episodes => "Plex Episodes",
            PlexMetric::Albums => "Plex Albums",
            PlexMetric::Songs => "Plex Songs",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            PlexMetric::Streams => "Number of active playback sessions",
            PlexMetric::Movies => "Items across all movie libraries",
            PlexMetric::Shows => "Shows across all TV libraries",
            PlexMetric::Episodes => "Episodes across all TV libraries",
            PlexMetric::Albums => "Albums across all music libraries",
            PlexMetric::Songs => "Tracks across all music libraries",
        }
    }

    /// Cache key; one per metric since a source talks to a single server
    pub fn cache_key(&self) -> &'static str {
        match self {
            PlexMetric::Streams => "streams",
            PlexMetric::Movies => "plex_movies",
            PlexMetric::Shows => "plex_shows",
            PlexMetric::Episodes => "plex_eps",
            PlexMetric::Albums => "plex_alb",
            PlexMetric::Songs => "plex_sng",
        }
    }

    pub fn kind(&self) -> MetricKind {
        let (singular, plural) = match self {
            PlexMetric::Streams => ("stream", "streams"),
            PlexMetric::Movies => ("movie", "movies"),
            PlexMetric::Shows => ("show", "shows"),
            PlexMetric::Episodes => ("episode", "episodes"),
            PlexMetric::Albums => ("album", "albums"),
            PlexMetric::Songs => ("song", "songs"),
        };
        MetricKind::Count { singular, plural }
    }

    /// Library section type and optional item type filter
    fn library_query(&self) -> Option<(&'static str, Option<u32>)> {
        match self {
            PlexMetric::Streams => None,
            PlexMetric::Movies => Some(("movie", None)),
            PlexMetric::Shows => Some(("show", None)),
            PlexMetric::Episodes => Some(("show", Some(EPISODE_TYPE))),
            PlexMetric::Albums => Some(("artist", Some(ALBUM_TYPE))),
            PlexMetric::Songs => Some(("artist", Some(TRACK_TYPE))),
        }
    }

    /// Fetch and reduce the payloads behind this metric
    pub fn sample(&self, transport: &dyn Transport) -> Result<f64, Unavailable> {
        match self.library_query() {
            None => Ok(container_size(&transport.fetch(SESSIONS_PATH)?)),
            Some((section_type, item_type)) => {
                count_library(transport, section_type, item_type)
            }
        }
    }
}

fn container_size(payload: &Value) -> f64 {
    number(field(payload, &["MediaContainer", "size"]))
}

/// Keys of the library sections with the given type
fn section_keys(sections: &Value, section_type: &str) -> Vec<String> {
    field(sections, &["MediaContainer", "Directory"])
        .and_then(Value::as_array)
        .map(|dirs| {
            dirs.iter()
                .filter(|d| d.get("type").and_then(Value::as_str) == Some(section_type))
                .filter_map(|d| key_string(d.get("key")))
                .collect()
        })
        .unwrap_or_default()
}

/// Sum item counts over matching sections
///
/// Failing to list sections makes the whole count unavailable; a single
/// section that fails to answer counts as zero.
fn count_library(
    transport: &dyn Transport,
    section_type: &str,
    item_type: Option<u32>,
) -> Result<f64, Unavailable> {
    let sections = transport.fetch(SECTIONS_PATH)?;

    let total = section_keys(&sections, section_type)
        .iter()
        .map(|key| {
            let path = match item_type {
                Some(t) => format!("{}/{}/all?type={}", SECTIONS_PATH, key, t),
                None => format!("{}/{}/all", SECTIONS_PATH, key),
            };
            match transport.fetch(&path) {
                Ok(payload) => container_size(&payload),
                Err(e) => {
                    warn!("Plex section {} skipped: {}", key, e);
                    0.0
                }
            }
        })
        .sum();
    Ok(total)
}

/// Build the Plex source for `metric`
pub fn plex_source(metric: PlexMetric, config: &BackendConfig) -> PolledSource {
    PolledSource::new(
        metadata(metric, config),
        metric.cache_key().to_string(),
        metric.kind(),
        config,
        sampler(metric),
    )
}

pub(crate) fn metadata(metric: PlexMetric, config: &BackendConfig) -> SourceMetadata {
    SourceMetadata {
        id: metric.source_id().to_string(),
        name: metric.name().to_string(),
        description: metric.description().to_string(),
        family: BackendFamily::Plex,
        default_interval: config.ttl(),
    }
}

pub(crate) fn sampler(metric: PlexMetric) -> Sampler {
    Box::new(move |transport: &dyn Transport| metric.sample(transport))
}

pub(crate) fn boxed(metric: PlexMetric, config: &BackendConfig) -> BoxedMetricSource {
    Box::new(plex_source(metric, config))
}
