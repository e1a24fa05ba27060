//! The host page elements a search widget talks to.
//!
//! A host implements only what it has. Every method defaults to a no-op so a
//! missing preview pane or results container leaves that part of the widget inert
//! instead of failing.

use crate::ingest::UploadedImage;

pub const IDLE_LABEL: &str = "Search Similar Items";
pub const BUSY_LABEL: &str = "Searching...";

/// Visible state of the search button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerControl {
    pub visible: bool,
    pub enabled: bool,
    pub label: &'static str,
}

impl TriggerControl {
    /// Before any image has been ingested.
    pub const HIDDEN: Self = Self { visible: false, enabled: false, label: IDLE_LABEL };
    pub const IDLE: Self = Self { visible: true, enabled: true, label: IDLE_LABEL };
    pub const BUSY: Self = Self { visible: true, enabled: false, label: BUSY_LABEL };
}

pub trait SearchSurface: Send + Sync {
    /// Blocking, user-facing notice (validation and precondition failures).
    fn notify(&self, _message: &str) {}

    fn show_preview(&self, _image: &UploadedImage) {}

    fn set_trigger(&self, _control: TriggerControl) {}

    /// Replaces the whole results container with an HTML fragment.
    fn show_results(&self, _html: &str) {}
}

/// A host page with none of the elements present.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl SearchSurface for NullSurface {}
