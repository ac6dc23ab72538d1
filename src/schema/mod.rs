//! Schema module - Configuration, variant layouts and persisted state for populations.

mod config;
mod snapshot;
mod variant;

pub use config::*;
pub use snapshot::*;
pub use variant::*;
