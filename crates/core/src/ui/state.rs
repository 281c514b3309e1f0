//! UI interaction state and worker messages.
//!
//! Processing state lives in [`crate::flow::Session`]; this module only
//! holds what the pointer does: which card is hovered and what the zoom
//! view shows.

use crate::flora::FloraDetail;
use crate::flow::{FlowEvent, ProcessingState, Session, Stage, UploadedImage};
use crate::overlay::ZoomTransform;

/// What the zoom view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoomState {
    #[default]
    Closed,
    /// The whole edited image, no specific item.
    WholeImage,
    /// Magnified around the flora item at this index.
    Item(usize),
}

/// Hover and zoom state of the current session.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    /// Index of the detail card under the pointer.
    pub highlighted: Option<usize>,
    pub zoom: ZoomState,
}

impl Interaction {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn open_whole_image(&mut self) {
        self.zoom = ZoomState::WholeImage;
    }

    pub fn open_item(&mut self, index: usize) {
        self.zoom = ZoomState::Item(index);
    }

    pub fn close_zoom(&mut self) {
        self.zoom = ZoomState::Closed;
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom != ZoomState::Closed
    }

    /// The highlight overlay is hidden while the zoom view is open.
    pub fn visible_highlight<'a>(&self, flora: &'a [FloraDetail]) -> Option<&'a FloraDetail> {
        if self.is_zoomed() {
            return None;
        }
        self.highlighted.and_then(|index| flora.get(index))
    }

    pub fn zoomed_item<'a>(&self, flora: &'a [FloraDetail]) -> Option<&'a FloraDetail> {
        match self.zoom {
            ZoomState::Item(index) => flora.get(index),
            _ => None,
        }
    }

    /// Transform for the zoom view, `None` when it is closed.
    pub fn zoom_transform(&self, flora: &[FloraDetail]) -> Option<ZoomTransform> {
        match self.zoom {
            ZoomState::Closed => None,
            ZoomState::WholeImage => Some(ZoomTransform::identity()),
            ZoomState::Item(_) => Some(
                self.zoomed_item(flora)
                    .map(|detail| ZoomTransform::focus_on(&detail.bounding_box))
                    .unwrap_or_else(ZoomTransform::identity),
            ),
        }
    }
}

/// Messages sent from worker threads to the UI thread.
pub(crate) enum WorkerEvent {
    /// A picked file was read and encoded.
    Loaded { ticket: u64, image: UploadedImage },
    /// A picked file could not be read.
    ReadFailed { ticket: u64, message: String },
    /// Progress of a processing run.
    Flow(FlowEvent),
}

/// What the edited-image panel shows this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditedPanel<'a> {
    Loading(Stage),
    Image,
    /// The model returned an image that could not be decoded for display.
    PreviewUnavailable(&'a str),
    Error(&'a str),
    Placeholder,
}

impl<'a> EditedPanel<'a> {
    /// `texture_error` is the decode failure of the edited image, if any.
    pub(crate) fn select(
        session: &'a Session,
        has_texture: bool,
        texture_error: Option<&'a str>,
    ) -> Self {
        if let ProcessingState::Loading(stage) = session.state() {
            return Self::Loading(*stage);
        }
        if has_texture {
            return Self::Image;
        }
        if let Some(error) = texture_error.filter(|_| session.edited().is_some()) {
            return Self::PreviewUnavailable(error);
        }
        match session.error() {
            Some(error) => Self::Error(error),
            None => Self::Placeholder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::EditedImage;
    use crate::overlay::NormalizedRect;

    fn flora() -> Vec<FloraDetail> {
        vec![FloraDetail {
            name: "Monstera".to_string(),
            description: "Split-leaf philodendron.".to_string(),
            care_tips: "Water weekly.".to_string(),
            bounding_box: NormalizedRect::new(0.2, 0.3, 0.2, 0.1),
        }]
    }

    #[test]
    fn highlight_hidden_while_zoomed() {
        let flora = flora();
        let mut interaction = Interaction {
            highlighted: Some(0),
            ..Default::default()
        };
        assert!(interaction.visible_highlight(&flora).is_some());

        interaction.open_whole_image();
        assert!(interaction.visible_highlight(&flora).is_none());

        interaction.close_zoom();
        assert_eq!(interaction.visible_highlight(&flora).unwrap().name, "Monstera");
    }

    #[test]
    fn item_zoom_centers_on_bounding_box() {
        let flora = flora();
        let mut interaction = Interaction::default();
        assert!(interaction.zoom_transform(&flora).is_none());

        interaction.open_item(0);
        let zoom = interaction.zoom_transform(&flora).unwrap();
        assert!((zoom.origin_x - 30.0).abs() < 1e-4);
        assert!((zoom.origin_y - 35.0).abs() < 1e-4);
        assert_eq!(zoom.scale, 3.0);

        interaction.open_whole_image();
        assert_eq!(interaction.zoom_transform(&flora), Some(ZoomTransform::identity()));
        assert!(interaction.zoomed_item(&flora).is_none());
    }

    #[test]
    fn missing_item_falls_back_to_whole_image() {
        let mut interaction = Interaction::default();
        interaction.open_item(5);
        assert_eq!(interaction.zoom_transform(&[]), Some(ZoomTransform::identity()));
    }

    fn finished_session(flora: Vec<FloraDetail>) -> Session {
        let mut session = Session::new();
        let run = session.start(UploadedImage::new("data:image/png;base64,AAAA", "yard.png"));
        assert!(session.apply(FlowEvent::Edited {
            run,
            image: EditedImage::from_base64("bm90IGFuIGltYWdl"),
        }));
        assert!(session.apply(FlowEvent::Identified { run, flora }));
        session
    }

    #[test]
    fn undecodable_edited_image_is_reported_in_its_panel() {
        let session = finished_session(flora());
        assert_eq!(session.state(), &ProcessingState::Done);

        let panel = EditedPanel::select(&session, false, Some("Image processing failed: bad png"));
        assert_eq!(
            panel,
            EditedPanel::PreviewUnavailable("Image processing failed: bad png")
        );
    }

    #[test]
    fn edited_panel_follows_the_session() {
        let mut session = Session::new();
        assert_eq!(EditedPanel::select(&session, false, None), EditedPanel::Placeholder);

        session.start(UploadedImage::new("data:image/png;base64,AAAA", "yard.png"));
        assert_eq!(
            EditedPanel::select(&session, false, None),
            EditedPanel::Loading(Stage::Editing)
        );

        session.fail_upload("Failed to read file: yard.png");
        assert_eq!(
            EditedPanel::select(&session, false, Some("stale")),
            EditedPanel::Error("Failed to read file: yard.png")
        );

        let session = finished_session(vec![]);
        assert_eq!(EditedPanel::select(&session, true, None), EditedPanel::Image);
    }
}
