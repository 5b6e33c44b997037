//! Source configuration types for all remote backends.

pub mod backend;
pub mod document;

pub use backend::{
    BackendConfig, BackendFamily, Credentials, FailurePolicy, HistoryMode,
    DEFAULT_CACHE_TTL_SECS, DEFAULT_PROXMOX_NODE,
};
pub use document::{BackendSection, ConfigDocumentData, CustomSection};
