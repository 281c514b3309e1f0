//! Upload → edit → identify processing flow.
//!
//! [`Session`] is the single owner of the state the UI renders. A
//! [`ProcessingFlow`] performs the two remote calls for one upload and
//! reports progress as [`FlowEvent`]s, which the session applies.
//!
//! State machine:
//! `Idle` -> `Loading(Editing)` -> `Loading(Identifying)` -> `Done`
//!        \-> `Failed` from either loading stage; `reset` returns to `Idle`.
//!
//! Every upload gets a fresh [`RunId`]. Events carrying an older id are
//! dropped, so a slow answer for a replaced photo can never overwrite the
//! current one. In-flight requests are not cancelled, only ignored.

use crate::config::Config;
use crate::data_url::{self, ImagePayload};
use crate::editor::{GeminiImageEditor, ImageEditor};
use crate::error::{AppError, Result};
use crate::flora::{FloraDetail, FloraExtractor, GeminiFloraExtractor};
use crate::prompts::EDIT_PROMPT;
use std::path::{Path, PathBuf};

/// Media type the edited image is tagged with.
pub const EDITED_MEDIA_TYPE: &str = "image/png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Editing,
    Identifying,
}

impl Stage {
    /// Loader text shown while the stage is running.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Editing => "Analyzing scene & adding flora...",
            Self::Identifying => "Identifying new plants & trees...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProcessingState {
    #[default]
    Idle,
    Loading(Stage),
    Done,
    Failed(String),
}

/// Identifier of one upload's processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u64);

/// The photo the user picked, as a data URL.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub data_url: String,
    pub source: PathBuf,
}

impl UploadedImage {
    pub fn new(data_url: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            data_url: data_url.into(),
            source: source.into(),
        }
    }

    /// Reads and encodes a file from disk.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let data_url = data_url::encode_file(path).await?;
        Ok(Self::new(data_url, path))
    }

    pub fn payload(&self) -> Result<ImagePayload> {
        data_url::decode(&self.data_url)
    }
}

/// The image returned by the edit model.
#[derive(Debug, Clone, PartialEq)]
pub struct EditedImage {
    pub data_url: String,
}

impl EditedImage {
    pub fn from_base64(data: &str) -> Self {
        Self {
            data_url: ImagePayload::new(data, EDITED_MEDIA_TYPE).to_data_url(),
        }
    }

    pub fn payload(&self) -> Result<ImagePayload> {
        data_url::decode(&self.data_url)
    }
}

/// Progress reported by a [`ProcessingFlow`] run.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    Edited { run: RunId, image: EditedImage },
    Identified { run: RunId, flora: Vec<FloraDetail> },
    Failed { run: RunId, message: String },
}

impl FlowEvent {
    pub fn run(&self) -> RunId {
        match self {
            Self::Edited { run, .. } | Self::Identified { run, .. } | Self::Failed { run, .. } => {
                *run
            }
        }
    }
}

/// User-facing text for a failed run.
pub fn failure_message(error: &AppError) -> String {
    format!("Generation failed: {}", error)
}

/// In-memory state of the current upload.
#[derive(Debug, Default)]
pub struct Session {
    next_run: u64,
    current_run: Option<RunId>,
    original: Option<UploadedImage>,
    edited: Option<EditedImage>,
    flora: Option<Vec<FloraDetail>>,
    state: ProcessingState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a run for a new upload, discarding everything from before.
    pub fn start(&mut self, image: UploadedImage) -> RunId {
        let run = self.bump_run();
        self.current_run = Some(run);
        self.original = Some(image);
        self.edited = None;
        self.flora = None;
        self.state = ProcessingState::Loading(Stage::Editing);
        tracing::debug!(run = run.0, "run started");
        run
    }

    /// Applies an event from a flow run.
    ///
    /// Returns `false` when the event was dropped, either because it belongs
    /// to a superseded run or because it does not fit the current state.
    pub fn apply(&mut self, event: FlowEvent) -> bool {
        if self.current_run != Some(event.run()) {
            tracing::warn!(run = event.run().0, "discarding event from superseded run");
            return false;
        }

        let stage = match self.state {
            ProcessingState::Loading(stage) => Some(stage),
            _ => None,
        };

        match event {
            FlowEvent::Edited { image, .. } if stage == Some(Stage::Editing) => {
                self.edited = Some(image);
                self.state = ProcessingState::Loading(Stage::Identifying);
            }
            FlowEvent::Identified { flora, .. } if stage == Some(Stage::Identifying) => {
                self.flora = Some(flora);
                self.state = ProcessingState::Done;
            }
            FlowEvent::Failed { message, .. } if stage.is_some() => {
                // The edited image, if any, stays visible
                self.flora = None;
                self.state = ProcessingState::Failed(message);
            }
            event => {
                tracing::warn!(state = ?self.state, ?event, "ignoring out-of-order flow event");
                return false;
            }
        }
        true
    }

    /// Records a failure that happened before a run could start, such as an
    /// unreadable file.
    pub fn fail_upload(&mut self, message: impl Into<String>) {
        self.clear();
        self.state = ProcessingState::Failed(message.into());
    }

    /// Returns to `Idle` from any state. Results of in-flight runs are ignored.
    pub fn reset(&mut self) {
        self.clear();
        self.state = ProcessingState::Idle;
    }

    fn clear(&mut self) {
        self.bump_run();
        self.current_run = None;
        self.original = None;
        self.edited = None;
        self.flora = None;
    }

    fn bump_run(&mut self) -> RunId {
        self.next_run += 1;
        RunId(self.next_run)
    }

    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.current_run
    }

    pub fn original(&self) -> Option<&UploadedImage> {
        self.original.as_ref()
    }

    pub fn edited(&self) -> Option<&EditedImage> {
        self.edited.as_ref()
    }

    pub fn flora(&self) -> Option<&[FloraDetail]> {
        self.flora.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ProcessingState::Loading(_))
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ProcessingState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// The edit succeeded but identification did not.
    pub fn details_unavailable(&self) -> bool {
        matches!(self.state, ProcessingState::Failed(_)) && self.edited.is_some()
    }
}

/// Runs the two remote calls for one upload.
pub struct ProcessingFlow<E, X> {
    editor: E,
    extractor: X,
}

/// Flow wired to the Gemini backend.
pub type GeminiFlow = ProcessingFlow<GeminiImageEditor, GeminiFloraExtractor>;

impl GeminiFlow {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(ProcessingFlow::new(
            GeminiImageEditor::new(config)?,
            GeminiFloraExtractor::new(config)?,
        ))
    }
}

impl<E: ImageEditor, X: FloraExtractor> ProcessingFlow<E, X> {
    pub fn new(editor: E, extractor: X) -> Self {
        Self { editor, extractor }
    }

    /// Edits the upload, then identifies the added flora.
    ///
    /// Every step is reported through `emit`. On failure a
    /// [`FlowEvent::Failed`] is emitted before the error is returned; an
    /// edit failure means the extraction client is never called.
    pub async fn run<F>(
        &self,
        run: RunId,
        image: &UploadedImage,
        mut emit: F,
    ) -> Result<Vec<FloraDetail>>
    where
        F: FnMut(FlowEvent),
    {
        match self.execute(run, image, &mut emit).await {
            Ok(flora) => Ok(flora),
            Err(err) => {
                tracing::warn!(run = run.0, error = %err, "processing failed");
                emit(FlowEvent::Failed {
                    run,
                    message: failure_message(&err),
                });
                Err(err)
            }
        }
    }

    async fn execute<F>(
        &self,
        run: RunId,
        image: &UploadedImage,
        emit: &mut F,
    ) -> Result<Vec<FloraDetail>>
    where
        F: FnMut(FlowEvent),
    {
        let original = image.payload()?;

        let edited_data = self.editor.edit_image(&original, EDIT_PROMPT).await?;
        let edited = EditedImage::from_base64(&edited_data);
        let edited_payload = ImagePayload::new(edited_data, EDITED_MEDIA_TYPE);
        emit(FlowEvent::Edited { run, image: edited });

        let flora = self.extractor.extract_flora(&original, &edited_payload).await?;
        tracing::info!(run = run.0, count = flora.len(), "run complete");
        emit(FlowEvent::Identified {
            run,
            flora: flora.clone(),
        });

        Ok(flora)
    }
}
