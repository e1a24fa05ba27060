use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    client::SearchBackend,
    ingest::{self, IngestError, SelectedFile, UploadedImage},
    models::{SearchOutcome, VisualSearchRequest, WorkflowState},
    render,
    surface::{SearchSurface, TriggerControl},
};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TriggerError {
    #[error("Please upload an image first.")]
    NoImage,
    #[error("A search is already running.")]
    InFlight,
}

/// A validated selection waiting to be encoded, tagged with its generation.
#[derive(Debug)]
pub struct IngestTicket {
    token: u64,
    file: SelectedFile,
}

impl IngestTicket {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub async fn encode(self) -> Result<EncodedImage, IngestError> {
        let image = ingest::encode(self.file).await?;
        Ok(EncodedImage { token: self.token, image })
    }
}

#[derive(Debug)]
pub struct EncodedImage {
    token: u64,
    image: UploadedImage,
}

/// What happened to a finished ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The picker was closed without a file.
    Cancelled,
    Applied,
    /// A newer selection was started before this one finished.
    Stale,
}

#[derive(Debug, Default)]
struct Workflow {
    state: WorkflowState,
    image: Option<UploadedImage>,
    /// Generation of `image`.
    image_token: u64,
}

/// Drives one search widget: holds the current image and the workflow state and
/// keeps the trigger control in step with both.
pub struct SearchController<B: ?Sized, S: ?Sized> {
    id: Uuid,
    backend: Arc<B>,
    surface: Arc<S>,
    workflow: Mutex<Workflow>,
    generation: AtomicU64,
}

impl<B, S> SearchController<B, S>
where
    B: SearchBackend + ?Sized,
    S: SearchSurface + ?Sized,
{
    pub fn new(backend: Arc<B>, surface: Arc<S>) -> Self {
        surface.set_trigger(TriggerControl::HIDDEN);
        Self { id: Uuid::new_v4(), backend, surface, workflow: Mutex::default(), generation: AtomicU64::new(0) }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> WorkflowState {
        self.workflow.lock().state
    }

    pub fn current_image(&self) -> Option<UploadedImage> {
        self.workflow.lock().image.clone()
    }

    /// Validates a selection and reserves a generation for it. Rejections notify
    /// the user and leave everything else as it was.
    pub fn begin_ingest(&self, file: SelectedFile) -> Result<IngestTicket, IngestError> {
        if let Err(e) = ingest::validate(&file) {
            warn!(widget = %self.id, file = %file.name, "Rejected selection: {:?}", e);
            self.surface.notify(&e.to_string());
            return Err(e);
        }
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(widget = %self.id, token, file = %file.name, "Ingestion started");
        Ok(IngestTicket { token, file })
    }

    /// Applies an encoded image unless a newer selection has started since.
    pub fn complete_ingest(&self, encoded: EncodedImage) -> IngestOutcome {
        let EncodedImage { token, image } = encoded;
        let latest = self.generation.load(Ordering::SeqCst);
        let searching = {
            let mut wf = self.workflow.lock();
            if token != latest || token <= wf.image_token {
                debug!(widget = %self.id, token, latest, "Discarding stale ingestion");
                return IngestOutcome::Stale;
            }
            wf.image = Some(image.clone());
            wf.image_token = token;
            if wf.state == WorkflowState::Searching {
                true
            } else {
                wf.state = WorkflowState::Previewed;
                false
            }
        };

        self.surface.show_preview(&image);
        if !searching {
            self.surface.set_trigger(TriggerControl::IDLE);
        }
        info!(widget = %self.id, token, "✅ Image ready for visual search");
        IngestOutcome::Applied
    }

    /// Full ingestion of one picker selection.
    pub async fn select_file(&self, file: Option<SelectedFile>) -> Result<IngestOutcome, IngestError> {
        let Some(file) = file else {
            return Ok(IngestOutcome::Cancelled);
        };
        let ticket = self.begin_ingest(file)?;
        match ticket.encode().await {
            Ok(encoded) => Ok(self.complete_ingest(encoded)),
            Err(e) => {
                error!(widget = %self.id, "❌ Encoding failed: {}", e);
                self.surface.notify(&e.to_string());
                Err(e)
            }
        }
    }

    /// Runs one search with the current image and renders its outcome.
    pub async fn trigger(&self) -> Result<WorkflowState, TriggerError> {
        let (image, image_token) = {
            let mut wf = self.workflow.lock();
            match (wf.state, wf.image.clone()) {
                (WorkflowState::Searching, _) => {
                    debug!(widget = %self.id, "Search already in flight, ignoring trigger");
                    return Err(TriggerError::InFlight);
                }
                (state, Some(image)) if state.can_search() => {
                    wf.state = WorkflowState::Searching;
                    (image, wf.image_token)
                }
                _ => {
                    drop(wf);
                    self.surface.notify(&TriggerError::NoImage.to_string());
                    return Err(TriggerError::NoImage);
                }
            }
        };

        let guard = SearchGuard { controller: self };
        self.surface.set_trigger(TriggerControl::BUSY);
        self.surface.show_results(&render::render_analyzing());

        info!(widget = %self.id, "🔎 Starting visual search");
        let request = VisualSearchRequest::both(image.data_url());
        let outcome = match self.backend.search(&request).await {
            Ok(response) => SearchOutcome::from(response),
            Err(e) => {
                error!(widget = %self.id, "❌ Visual search failed: {}", e);
                SearchOutcome::Unreachable
            }
        };

        let state = {
            let mut wf = self.workflow.lock();
            if wf.image_token != image_token {
                info!(widget = %self.id, "Image replaced during search, dropping results");
                wf.state = WorkflowState::Previewed;
                None
            } else {
                wf.state = match outcome {
                    SearchOutcome::Items(_) => WorkflowState::Succeeded,
                    _ => WorkflowState::Failed,
                };
                Some(wf.state)
            }
        };

        let state = match state {
            Some(state) => {
                if let SearchOutcome::Items(items) = &outcome {
                    info!(widget = %self.id, "✅ {} similar items", items.len());
                }
                self.surface.show_results(&render::render(&outcome));
                state
            }
            None => {
                self.surface.show_results("");
                WorkflowState::Previewed
            }
        };
        drop(guard);
        Ok(state)
    }
}

/// Puts the trigger back to idle on every exit from a search, including panics
/// and a dropped future.
struct SearchGuard<'a, B: ?Sized, S: SearchSurface + ?Sized> {
    controller: &'a SearchController<B, S>,
}

impl<B: ?Sized, S: SearchSurface + ?Sized> Drop for SearchGuard<'_, B, S> {
    fn drop(&mut self) {
        {
            let mut wf = self.controller.workflow.lock();
            if wf.state == WorkflowState::Searching {
                warn!(widget = %self.controller.id, "Search abandoned before a response arrived");
                wf.state = WorkflowState::Previewed;
            }
        }
        self.controller.surface.set_trigger(TriggerControl::IDLE);
    }
}
