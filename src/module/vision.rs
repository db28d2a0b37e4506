//! Processing related to visual information.
//!
use image::DynamicImage;

use super::util::init::AppProperty;

pub mod camera;
pub mod detector;
pub mod geometry;
pub mod ocr;
pub mod selector;

/// Errors raised by the camera, the detector and the text extractor.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("onnx runtime: {0}")]
    Ort(#[from] ort::OrtError),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("camera: {0}")]
    Camera(#[from] std::io::Error),
    #[error("unexpected model output: {0}")]
    Shape(String),
}

/// Something that yields the most recent camera frame.
///
/// Used from the thread that created it.
pub trait FrameSource {
    fn grab(&mut self) -> Result<DynamicImage, VisionError>;
}

/// Object detection capability.
///
pub trait ObjectDetector: Send {
    /// Detect objects in a frame. Boxes are in frame pixel coordinates.
    fn detect(&mut self, frame: &DynamicImage) -> Result<Vec<detector::Detection>, VisionError>;
}

/// Text recognition capability.
///
/// An empty string means nothing was found.
pub trait TextExtractor: Send {
    fn extract_text(
        &mut self,
        frame: &DynamicImage,
        region: &detector::BoundingBox,
    ) -> Result<String, VisionError>;
}

/// Provide a means of image processing.
///
pub struct AppVision {
    pub cam: camera::V4l2Camera,
    pub det: detector::CocoDetector,
    pub ocr: Box<dyn TextExtractor>,
}

/// AppVision's methods.
///
impl AppVision {
    /// Open the camera and load the models. Any failure here is fatal to start-up.
    pub fn new(property: &AppProperty) -> Result<Self, VisionError> {
        let vision = &property.conf.vision;
        let det = detector::CocoDetector::new(
            &vision.detector_model,
            vision.detector_imgsz,
            vision.intra_threads,
        )?;
        let ocr: Box<dyn TextExtractor> = if vision.ocr {
            Box::new(ocr::CharOcr::new(
                &vision.ocr_model,
                vision.ocr_imgsz,
                &vision.ocr_charset,
                vision.intra_threads,
            )?)
        } else {
            Box::new(ocr::NoOcr)
        };
        Ok(Self {
            cam: camera::V4l2Camera::new(property)?,
            det,
            ocr,
        })
    }
}
