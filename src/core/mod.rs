//! Host-side plumbing: polling sources on a schedule

mod update_manager;

pub use update_manager::{Reading, UpdateManager};
