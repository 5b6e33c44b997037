//! remote-sens-types: Shared data types for remote-sens metric sources.
//!
//! This crate contains pure data types (backend settings, failure policies,
//! the configuration document shape) that are shared across all remote-sens
//! crates. These types have no network dependencies, making them suitable
//! as a foundation layer.

pub mod source_configs;

// Re-export commonly used types at the crate root for convenience
pub use source_configs::{
    BackendConfig, BackendFamily, BackendSection, ConfigDocumentData, Credentials, CustomSection,
    FailurePolicy, HistoryMode,
};
