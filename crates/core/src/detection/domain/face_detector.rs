use crate::shared::frame::{ChannelOrder, Frame};

use super::detected_face::DetectedFace;

/// Domain interface for face detection.
///
/// Implementations may hold inference sessions that need exclusive access,
/// hence `&mut self`. Results are returned in the detector's own order;
/// callers that only want one face take the first.
pub trait FaceDetector: Send {
    /// Channel order the detector expects its input frame in.
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}
