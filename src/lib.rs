//! Client side of the lost & found visual search: photo ingestion, the search
//! workflow, and rendering of ranked matches.

pub mod client;
pub mod config;
pub mod controller;
pub mod ingest;
pub mod models;
pub mod render;
pub mod surface;

pub use client::{HttpSearchClient, SearchBackend, SearchError};
pub use controller::{IngestOutcome, SearchController, TriggerError};
pub use ingest::{IngestError, SelectedFile, UploadedImage, MAX_IMAGE_BYTES};
pub use models::{ItemKind, SearchOutcome, SimilarItem, WorkflowState};
pub use surface::{NullSurface, SearchSurface, TriggerControl};
