//! End-to-end flow tests with mocked Gemini clients.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use verdant_core::data_url::{self, ImagePayload};
use verdant_core::editor::ImageEditor;
use verdant_core::flora::FloraExtractor;
use verdant_core::flow::{Stage, EDITED_MEDIA_TYPE};
use verdant_core::{
    AppError, Config, FloraDetail, NormalizedRect, ProcessingFlow, ProcessingState, Result,
    Session, UploadedImage, Verdant,
};

const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

enum EditOutcome {
    Image(&'static str),
    Fail(&'static str),
    NoImage,
}

struct MockEditor {
    outcome: EditOutcome,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<(ImagePayload, String)>>>,
}

impl MockEditor {
    fn new(outcome: EditOutcome) -> Self {
        Self {
            outcome,
            calls: Arc::default(),
            seen: Arc::default(),
        }
    }
}

#[async_trait]
impl ImageEditor for MockEditor {
    async fn edit_image(&self, image: &ImagePayload, instruction: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((image.clone(), instruction.to_string()));
        match self.outcome {
            EditOutcome::Image(data) => Ok(data.to_string()),
            EditOutcome::Fail(message) => Err(AppError::upstream(message)),
            EditOutcome::NoImage => Err(AppError::NoImageReturned),
        }
    }
}

struct MockExtractor {
    result: Mutex<Option<Result<Vec<FloraDetail>>>>,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<(ImagePayload, ImagePayload)>>>,
}

impl MockExtractor {
    fn new(result: Result<Vec<FloraDetail>>) -> Self {
        Self {
            result: Mutex::new(Some(result)),
            calls: Arc::default(),
            seen: Arc::default(),
        }
    }
}

#[async_trait]
impl FloraExtractor for MockExtractor {
    async fn extract_flora(
        &self,
        original: &ImagePayload,
        edited: &ImagePayload,
    ) -> Result<Vec<FloraDetail>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((original.clone(), edited.clone()));
        self.result
            .lock()
            .unwrap()
            .take()
            .expect("extractor called more than once")
    }
}

fn lavender() -> FloraDetail {
    FloraDetail {
        name: "Lavender".to_string(),
        description: "A fragrant flowering shrub.".to_string(),
        care_tips: "Full sun, water sparingly.".to_string(),
        bounding_box: NormalizedRect::new(0.2, 0.3, 0.2, 0.1),
    }
}

fn jpeg_upload() -> UploadedImage {
    UploadedImage::new(data_url::encode_bytes(JPEG_BYTES, "image/jpeg"), "patio.jpg")
}

/// Runs the flow, applying every event to the session and recording states.
async fn drive(
    flow: &ProcessingFlow<MockEditor, MockExtractor>,
    session: &mut Session,
    image: UploadedImage,
) -> (Result<Vec<FloraDetail>>, Vec<ProcessingState>) {
    let mut states = vec![session.state().clone()];
    let run = session.start(image.clone());
    states.push(session.state().clone());

    let result = flow
        .run(run, &image, |event| {
            session.apply(event);
            states.push(session.state().clone());
        })
        .await;

    (result, states)
}

#[tokio::test]
async fn successful_run_reaches_done_with_one_detail() {
    let editor = MockEditor::new(EditOutcome::Image("RURJVEVE"));
    let extractor = MockExtractor::new(Ok(vec![lavender()]));
    let extractor_seen = extractor.seen.clone();
    let flow = ProcessingFlow::new(editor, extractor);

    let mut session = Session::new();
    let (result, states) = drive(&flow, &mut session, jpeg_upload()).await;

    assert_eq!(result.unwrap().len(), 1);
    assert_eq!(
        states,
        vec![
            ProcessingState::Idle,
            ProcessingState::Loading(Stage::Editing),
            ProcessingState::Loading(Stage::Identifying),
            ProcessingState::Done,
        ]
    );
    assert_eq!(session.flora().unwrap(), &[lavender()]);
    assert_eq!(
        session.edited().unwrap().data_url,
        "data:image/png;base64,RURJVEVE"
    );
    assert!(session.error().is_none());

    // Extraction sees the untouched original and the edited payload
    let seen = extractor_seen.lock().unwrap();
    let (original, edited) = &seen[0];
    assert_eq!(original.mime_type, "image/jpeg");
    assert_eq!(edited, &ImagePayload::new("RURJVEVE", EDITED_MEDIA_TYPE));
}

#[tokio::test]
async fn edit_failure_skips_extraction() {
    let editor = MockEditor::new(EditOutcome::Fail("quota exceeded"));
    let extractor = MockExtractor::new(Ok(vec![lavender()]));
    let extraction_calls = extractor.calls.clone();
    let flow = ProcessingFlow::new(editor, extractor);

    let mut session = Session::new();
    let (result, states) = drive(&flow, &mut session, jpeg_upload()).await;

    assert!(matches!(result, Err(AppError::Upstream(_))));
    assert_eq!(extraction_calls.load(Ordering::SeqCst), 0);
    assert!(matches!(states.last(), Some(ProcessingState::Failed(_))));

    let error = session.error().unwrap();
    assert!(error.contains("quota exceeded"), "{error}");
    assert!(session.edited().is_none());
    assert!(session.flora().is_none());
}

#[tokio::test]
async fn edit_without_image_fails_the_run() {
    let flow = ProcessingFlow::new(
        MockEditor::new(EditOutcome::NoImage),
        MockExtractor::new(Ok(vec![])),
    );

    let mut session = Session::new();
    let (result, _) = drive(&flow, &mut session, jpeg_upload()).await;

    assert!(matches!(result, Err(AppError::NoImageReturned)));
    assert_eq!(
        session.error(),
        Some("Generation failed: No image was generated in the response.")
    );
}

#[tokio::test]
async fn extraction_failure_keeps_edited_image() {
    let flow = ProcessingFlow::new(
        MockEditor::new(EditOutcome::Image("RURJVEVE")),
        MockExtractor::new(Err(AppError::malformed("expected value at line 1 column 1"))),
    );

    let mut session = Session::new();
    let (result, states) = drive(&flow, &mut session, jpeg_upload()).await;

    assert!(matches!(result, Err(AppError::MalformedResponse(_))));
    assert_eq!(states[2], ProcessingState::Loading(Stage::Identifying));
    assert!(session.details_unavailable());
    assert!(session.edited().is_some());
    assert!(session.flora().is_none());
}

#[tokio::test]
async fn empty_flora_is_a_successful_run() {
    let flow = ProcessingFlow::new(
        MockEditor::new(EditOutcome::Image("RURJVEVE")),
        MockExtractor::new(Ok(vec![])),
    );

    let mut session = Session::new();
    let (result, _) = drive(&flow, &mut session, jpeg_upload()).await;

    assert_eq!(result.unwrap(), vec![]);
    assert_eq!(session.state(), &ProcessingState::Done);
    assert_eq!(session.flora(), Some(&[][..]));
}

#[tokio::test]
async fn malformed_upload_fails_before_any_call() {
    let editor = MockEditor::new(EditOutcome::Image("RURJVEVE"));
    let edit_calls = editor.calls.clone();
    let flow = ProcessingFlow::new(editor, MockExtractor::new(Ok(vec![])));

    let mut session = Session::new();
    let broken = UploadedImage::new("not a data url", "broken.jpg");
    let (result, _) = drive(&flow, &mut session, broken).await;

    assert!(matches!(result, Err(AppError::Format(_))));
    assert_eq!(edit_calls.load(Ordering::SeqCst), 0);
    assert!(session.error().unwrap().starts_with("Generation failed: Invalid data URL"));
}

#[tokio::test]
async fn results_of_a_superseded_run_are_ignored() {
    let flow = ProcessingFlow::new(
        MockEditor::new(EditOutcome::Image("T0xE")),
        MockExtractor::new(Ok(vec![lavender()])),
    );

    let mut session = Session::new();
    let first_image = jpeg_upload();
    let first = session.start(first_image.clone());

    // The user picks another photo before the first run reports back
    let mut late_events = Vec::new();
    let second = session.start(UploadedImage::new(
        data_url::encode_bytes(JPEG_BYTES, "image/jpeg"),
        "lawn.jpg",
    ));
    flow.run(first, &first_image, |event| late_events.push(event))
        .await
        .unwrap();

    for event in late_events {
        assert!(!session.apply(event));
    }
    assert_eq!(session.current_run(), Some(second));
    assert_eq!(session.state(), &ProcessingState::Loading(Stage::Editing));
    assert!(session.edited().is_none());
}

#[tokio::test]
async fn flow_sends_the_scene_prompt_and_upload_payload() {
    let editor = MockEditor::new(EditOutcome::Image("RURJVEVE"));
    let seen = editor.seen.clone();
    let flow = ProcessingFlow::new(editor, MockExtractor::new(Ok(vec![])));

    let mut session = Session::new();
    let image = jpeg_upload();
    let expected = image.payload().unwrap();
    drive(&flow, &mut session, image).await.0.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].0, expected);
    assert_eq!(seen[0].1, verdant_core::prompts::EDIT_PROMPT);
}

#[tokio::test]
async fn uploaded_file_round_trips_through_the_codec() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kitchen.jpg");
    std::fs::write(&path, JPEG_BYTES).unwrap();

    let image = UploadedImage::from_path(&path).await.unwrap();
    assert_eq!(image.source, path);
    assert_eq!(image.payload().unwrap().mime_type, "image/jpeg");
}

#[tokio::test]
async fn missing_api_key_fails_the_run_as_upstream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("balcony.jpg");
    std::fs::write(&path, JPEG_BYTES).unwrap();

    let app = Verdant::with_config(Config::builder().with_api_key("").build());
    let mut states = Vec::new();
    let result = app
        .process_file(&path, |state| states.push(state.clone()))
        .await;

    match result {
        Err(AppError::Upstream(message)) => assert!(message.contains("API key"), "{message}"),
        Err(other) => panic!("expected an upstream error, got {other}"),
        Ok(_) => panic!("run without an API key succeeded"),
    }
    assert!(states.is_empty());
}
