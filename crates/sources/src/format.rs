//! Value kinds and their text formatting

use remote_sens_core::constants::{SECONDS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MINUTE};
use remote_sens_core::BYTES_PER_MB;

/// Shown by `as_string` before any value has been recorded
pub const NO_VALUE_TEXT: &str = "--";

/// How a cached raw value is projected to a number and rendered as text
///
/// The cache always holds the backend's own unit (seconds, bytes, ...);
/// the kind converts on the way out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricKind {
    /// Whole items, e.g. "3 streams"
    Count {
        singular: &'static str,
        plural: &'static str,
    },
    /// Percentage with one decimal, e.g. "12.5 %"
    Percentage,
    /// Seconds cached, hours numeric, "Xd Yh Zm" text
    Duration,
    /// Bytes cached, megabytes numeric, "X.Y MB" text
    Traffic,
}

impl MetricKind {
    /// Project a raw cached value to the numeric view
    pub fn numeric(&self, raw: f64) -> f64 {
        match self {
            MetricKind::Count { .. } | MetricKind::Percentage => raw,
            MetricKind::Duration => raw / SECONDS_PER_HOUR as f64,
            MetricKind::Traffic => raw / BYTES_PER_MB,
        }
    }

    /// Render a raw cached value
    pub fn format(&self, raw: f64) -> String {
        match self {
            MetricKind::Count { singular, plural } => format_count(raw, singular, plural),
            MetricKind::Percentage => format_percentage(raw),
            MetricKind::Duration => format_duration(raw),
            MetricKind::Traffic => format_megabytes(self.numeric(raw)),
        }
    }
}

pub fn format_count(value: f64, singular: &str, plural: &str) -> String {
    let count = value.max(0.0) as u64;
    let noun = if count == 1 { singular } else { plural };
    format!("{} {}", count, noun)
}

pub fn format_percentage(value: f64) -> String {
    format!("{:.1} %", value)
}

/// Break a number of seconds into days, hours and minutes
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let days = total / SECONDS_PER_DAY;
    let hours = (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    format!("{}d {}h {}m", days, hours, minutes)
}

pub fn format_megabytes(megabytes: f64) -> String {
    format!("{:.1} MB", megabytes)
}
