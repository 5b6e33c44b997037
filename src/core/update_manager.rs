//! Update manager for scheduling and coordinating source polls

use log::{debug, error, trace, warn};
use remote_sens_core::BoxedMetricSource;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::RwLock;
use tokio::time::Instant;

/// A source shared between the manager and its poll tasks
///
/// The mutex covers the whole check-fetch-update sequence of one source,
/// so polls of the same source never interleave.
type SharedSource = Arc<Mutex<BoxedMetricSource>>;

/// Snapshot of one source after a poll
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub id: String,
    pub value: Option<f64>,
    pub text: String,
    pub history: Vec<f64>,
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let history: Vec<String> = self.history.iter().map(|v| format!("{:.2}", v)).collect();
        write!(f, "{}: {} [{}]", self.id, self.text, history.join(", "))
    }
}

/// Tracks poll timing for a source
struct SourceUpdateState {
    source: SharedSource,
    /// None until the first poll
    last_update: Option<Instant>,
    interval: Duration,
    /// Set while a poll task owns the source
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when a poll task ends, panics included
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Manages periodic polling of metric sources
pub struct UpdateManager {
    sources: Arc<RwLock<HashMap<String, SourceUpdateState>>>,
}

impl UpdateManager {
    /// Create a new update manager
    pub fn new() -> Self {
        Self {
            sources: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add a source to be polled
    ///
    /// Without an explicit interval the source's own default (its cache
    /// TTL) is used.
    pub async fn add_source(
        &self,
        id: &str,
        source: BoxedMetricSource,
        interval: Option<Duration>,
    ) {
        let interval = interval.unwrap_or(source.metadata().default_interval);

        let mut sources = self.sources.write().await;
        sources.insert(
            id.to_string(),
            SourceUpdateState {
                source: Arc::new(Mutex::new(source)),
                last_update: None,
                interval,
                in_flight: Arc::new(AtomicBool::new(false)),
            },
        );
    }

    /// Start the poll loop
    ///
    /// This runs indefinitely. Each due source is polled on the blocking
    /// pool and its reading is handed to `on_reading` as soon as that poll
    /// finishes, so a hung backend only delays its own readings.
    pub async fn run<F>(&self, base_interval: Duration, on_reading: F)
    where
        F: Fn(Reading),
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut interval = tokio::time::interval(base_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let dispatched = self.dispatch_due(&tx).await;
                    trace!("Dispatched {} polls", dispatched);
                }
                Some(reading) = rx.recv() => on_reading(reading),
            }
        }
    }

    /// Start a poll for every due source that is not still being polled
    ///
    /// Readings arrive on `tx`. Returns the number of polls started.
    pub async fn dispatch_due(&self, tx: &UnboundedSender<Reading>) -> usize {
        let now = Instant::now();
        let mut sources = self.sources.write().await;
        let mut dispatched = 0;

        for (id, state) in sources.iter_mut() {
            let due = match state.last_update {
                Some(last) => now.duration_since(last) >= state.interval,
                None => true,
            };
            if !due {
                continue;
            }
            if state.in_flight.swap(true, Ordering::AcqRel) {
                trace!("{} is still polling, skipped", id);
                continue;
            }
            state.last_update = Some(now);

            let guard = InFlightGuard(state.in_flight.clone());
            let source = state.source.clone();
            let id = id.clone();
            let tx = tx.clone();
            // Sources use a blocking HTTP client, keep them off the async workers
            tokio::task::spawn_blocking(move || {
                let _guard = guard;
                let reading = poll(&id, &source);
                if tx.send(reading).is_err() {
                    debug!("Poll loop stopped, reading for {} dropped", id);
                }
            });
            dispatched += 1;
        }

        dispatched
    }

    /// Poll every source once and wait for all readings
    pub async fn poll_all(&self) -> Vec<Reading> {
        let sources = self.sources.read().await;
        let mut tasks = Vec::with_capacity(sources.len());

        for (id, state) in sources.iter() {
            let source = state.source.clone();
            let id_for_task = id.clone();
            let task = tokio::task::spawn_blocking(move || poll(&id_for_task, &source));
            tasks.push((id.clone(), task));
        }

        drop(sources); // Release read lock before awaiting tasks

        let mut readings = Vec::with_capacity(tasks.len());
        for (id, task) in tasks {
            match task.await {
                Ok(reading) => readings.push(reading),
                Err(e) => error!("Poll task failed for {}: {}", id, e),
            }
        }
        readings.sort_by(|a, b| a.id.cmp(&b.id));
        readings
    }
}

impl Default for UpdateManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll one source and capture all three views
fn poll(id: &str, source: &SharedSource) -> Reading {
    let mut guard = source.lock().unwrap_or_else(|poisoned| {
        warn!("Source {} lock was poisoned, recovering", id);
        poisoned.into_inner()
    });
    let value = guard.as_numeric();
    Reading {
        id: id.to_string(),
        value,
        text: guard.as_string(),
        history: guard.history(),
    }
}
