use std::sync::Mutex;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::region::CropRegion;

use super::crop_geometry::compute_crop_region;
use super::detected_face::DetectedFace;
use super::face_detector::FaceDetector;

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("face detector is not available")]
    DetectorUnavailable,
    #[error("no face detected")]
    NoFaceDetected,
    #[error("face detection failed: {0}")]
    DetectionFailed(String),
}

/// A located face and the padded crop taken around it.
#[derive(Debug)]
pub struct LocatedFace {
    pub face: DetectedFace,
    pub region: CropRegion,
    pub crop: Frame,
}

/// Process-wide face locating service.
///
/// Owns the single detector instance loaded at start-up. Access is
/// serialized through a mutex since inference sessions are not safe to run
/// concurrently. A locator built with [`FaceLocator::unavailable`] reports
/// [`LocateError::DetectorUnavailable`] on every call.
pub struct FaceLocator {
    detector: Option<Mutex<Box<dyn FaceDetector>>>,
}

impl FaceLocator {
    pub fn new(detector: Box<dyn FaceDetector>) -> Self {
        Self {
            detector: Some(Mutex::new(detector)),
        }
    }

    pub fn unavailable() -> Self {
        Self { detector: None }
    }

    pub fn is_available(&self) -> bool {
        self.detector.is_some()
    }

    /// Finds the first face in `frame` and crops it with `padding` margin.
    ///
    /// Only the first detection is used; any others are ignored.
    pub fn locate_and_crop(&self, frame: &Frame, padding: f64) -> Result<LocatedFace, LocateError> {
        let detector = self
            .detector
            .as_ref()
            .ok_or(LocateError::DetectorUnavailable)?;

        let faces = {
            // The detector holds no per-call state, so a panic in an earlier
            // call leaves it usable.
            let mut detector = detector.lock().unwrap_or_else(|poisoned| {
                log::warn!("Recovering face detector after a panic in an earlier call");
                poisoned.into_inner()
            });
            let input = frame.with_channel_order(detector.channel_order());
            detector
                .detect(&input)
                .map_err(|e| LocateError::DetectionFailed(e.to_string()))?
        };

        if faces.len() > 1 {
            log::debug!("{} faces detected, using the first", faces.len());
        }
        let face = faces.into_iter().next().ok_or(LocateError::NoFaceDetected)?;
        let b = face.bbox;
        log::info!(
            "Face detected at [x={}, y={}, w={}, h={}] ({} keypoints)",
            b.x,
            b.y,
            b.width,
            b.height,
            face.keypoints.visible().count()
        );

        let region = compute_crop_region(&face.bbox, frame.width(), frame.height(), padding)
            .ok_or_else(|| {
                log::warn!("Face box {b:?} lies outside the {}x{} image", frame.width(), frame.height());
                LocateError::NoFaceDetected
            })?;
        log::info!(
            "Cropping with padding to [x1={}, y1={}, x2={}, y2={}]",
            region.x1,
            region.y1,
            region.x2,
            region.y2
        );

        let crop = frame.crop(&region);
        Ok(LocatedFace { face, region, crop })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detected_face::FaceKeypoints;
    use crate::shared::frame::ChannelOrder;
    use crate::shared::region::FaceBox;
    use std::sync::{Arc, Mutex as StdMutex};

    // --- Stubs ---

    struct StubDetector {
        faces: Vec<DetectedFace>,
        order: ChannelOrder,
        seen: Arc<StdMutex<Vec<Frame>>>,
    }

    impl StubDetector {
        fn new(boxes: &[FaceBox]) -> Self {
            Self {
                faces: boxes.iter().map(|b| face(*b)).collect(),
                order: ChannelOrder::Rgb,
                seen: Arc::new(StdMutex::new(Vec::new())),
            }
        }
    }

    impl FaceDetector for StubDetector {
        fn channel_order(&self) -> ChannelOrder {
            self.order
        }

        fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
            self.seen.lock().unwrap().push(frame.clone());
            Ok(self.faces.clone())
        }
    }

    struct FailingDetector;

    /// Panics on its first call, then finds one face.
    struct PanicOnceDetector {
        calls: usize,
    }

    impl FaceDetector for PanicOnceDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
            self.calls += 1;
            if self.calls == 1 {
                panic!("inference crashed");
            }
            Ok(vec![face(FaceBox::new(2, 2, 4, 4))])
        }
    }

    impl FaceDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
            Err("session exploded".into())
        }
    }

    // --- Helpers ---

    fn face(bbox: FaceBox) -> DetectedFace {
        DetectedFace {
            bbox,
            keypoints: FaceKeypoints::default(),
            confidence: 0.9,
        }
    }

    fn make_frame(w: u32, h: u32, order: ChannelOrder) -> Frame {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for _ in 0..(w * h) {
            data.extend_from_slice(&[1, 2, 3]);
        }
        Frame::new(data, w, h, order)
    }

    // --- Tests ---

    #[test]
    fn test_crops_first_face_with_padding() {
        let locator = FaceLocator::new(Box::new(StubDetector::new(&[FaceBox::new(
            50, 50, 200, 200,
        )])));
        let located = locator
            .locate_and_crop(&make_frame(500, 500, ChannelOrder::Rgb), 0.25)
            .unwrap();
        assert_eq!(
            located.region,
            CropRegion {
                x1: 25,
                y1: 15,
                x2: 275,
                y2: 265
            }
        );
        assert_eq!(located.crop.width(), 250);
        assert_eq!(located.crop.height(), 250);
    }

    #[test]
    fn test_later_faces_are_ignored() {
        let locator = FaceLocator::new(Box::new(StubDetector::new(&[
            FaceBox::new(10, 10, 20, 20),
            FaceBox::new(100, 100, 80, 80),
        ])));
        let located = locator
            .locate_and_crop(&make_frame(200, 200, ChannelOrder::Rgb), 0.0)
            .unwrap();
        assert_eq!(located.face.bbox, FaceBox::new(10, 10, 20, 20));
    }

    #[test]
    fn test_no_detections_is_not_found() {
        let locator = FaceLocator::new(Box::new(StubDetector::new(&[])));
        let result = locator.locate_and_crop(&make_frame(50, 50, ChannelOrder::Rgb), 0.25);
        assert!(matches!(result, Err(LocateError::NoFaceDetected)));
    }

    #[test]
    fn test_detector_error_is_reported_as_detection_failed() {
        let locator = FaceLocator::new(Box::new(FailingDetector));
        match locator.locate_and_crop(&make_frame(50, 50, ChannelOrder::Rgb), 0.25) {
            Err(LocateError::DetectionFailed(msg)) => assert!(msg.contains("session exploded")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_detector_recovers_after_panic() {
        let locator = Arc::new(FaceLocator::new(Box::new(PanicOnceDetector { calls: 0 })));

        let panicking = {
            let locator = locator.clone();
            std::thread::spawn(move || {
                let _ = locator.locate_and_crop(&make_frame(16, 16, ChannelOrder::Rgb), 0.0);
            })
        };
        assert!(panicking.join().is_err());

        for _ in 0..3 {
            let located = locator
                .locate_and_crop(&make_frame(16, 16, ChannelOrder::Rgb), 0.0)
                .unwrap();
            assert_eq!(located.face.bbox, FaceBox::new(2, 2, 4, 4));
        }
    }

    #[test]
    fn test_unavailable_detector_is_distinct_from_not_found() {
        let locator = FaceLocator::unavailable();
        assert!(!locator.is_available());
        let result = locator.locate_and_crop(&make_frame(50, 50, ChannelOrder::Rgb), 0.25);
        assert!(matches!(result, Err(LocateError::DetectorUnavailable)));
    }

    #[test]
    fn test_box_outside_image_is_not_found() {
        let locator = FaceLocator::new(Box::new(StubDetector::new(&[FaceBox::new(
            400, 400, 50, 50,
        )])));
        let result = locator.locate_and_crop(&make_frame(100, 100, ChannelOrder::Rgb), 0.25);
        assert!(matches!(result, Err(LocateError::NoFaceDetected)));
    }

    #[test]
    fn test_detector_sees_its_channel_order_but_crop_keeps_original() {
        let mut detector = StubDetector::new(&[FaceBox::new(0, 0, 4, 4)]);
        detector.order = ChannelOrder::Rgb;
        let seen = detector.seen.clone();
        let locator = FaceLocator::new(Box::new(detector));

        let located = locator
            .locate_and_crop(&make_frame(4, 4, ChannelOrder::Bgr), 0.0)
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].channel_order(), ChannelOrder::Rgb);
        assert_eq!(&seen[0].data()[..3], &[3, 2, 1]);
        assert_eq!(located.crop.channel_order(), ChannelOrder::Bgr);
        assert_eq!(&located.crop.data()[..3], &[1, 2, 3]);
    }
}
