//! Core library for the `gpsmap` location viewer.
//!
//! This crate defines:
//! - Configuration handling
//! - The location record model and the API source abstraction
//! - Calendar-day filtering, centroid and per-user color assignment
//! - Explicit view state driven by token-tagged fetches
//! - SVG map rendering
//!
//! It is used by `gpsmap-cli`, but can also be reused by other binaries or services.

pub mod centroid;
pub mod color;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod render;
pub mod snapshot;
pub mod source;
pub mod state;
pub mod viewer;

#[cfg(test)]
mod test_support;

pub use color::{ColorTable, MarkerColor};
pub use config::Config;
pub use error::RecordError;
pub use model::{Coordinates, LocationRecord};
pub use snapshot::{Marker, Snapshot};
pub use source::LocationSource;
pub use state::{Action, RequestToken, ViewState, ViewStatus};
pub use viewer::Viewer;
