//! Per-frame processing.
//!
//! One cycle runs, in order: detection, selection, distance estimation, text
//! extraction (only when the cycle is forced or continuous) and narration. A failing
//! detector or extractor degrades the cycle to partial output, it never aborts it.

use image::DynamicImage;

use super::device::throttle::NarrationThrottle;
use super::util::conf::{Config, ConfigError};
use super::vision::detector::Detection;
use super::vision::geometry::{estimate_distance, CameraParameters, KnownHeightTable};
use super::vision::selector::select_best;
use super::vision::{ObjectDetector, TextExtractor};

/// Why a cycle runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// Bounding-box feedback only.
    Idle,
    /// Loop-driven cycle while continuous vision is on.
    ContinuousScan,
    /// Explicitly requested by the operator.
    ManualScanPending,
}

impl PipelineMode {
    pub fn is_forced(&self) -> bool {
        matches!(self, PipelineMode::ManualScanPending)
    }

    /// Text extraction is expensive and only done when someone listens.
    pub fn extracts_text(&self) -> bool {
        matches!(
            self,
            PipelineMode::ContinuousScan | PipelineMode::ManualScanPending
        )
    }
}

/// What the presentation layer draws for one cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderDescription {
    pub selected: Option<Detection>,
    pub distance_cm: Option<u32>,
    pub recognized_text: Option<String>,
}

/// Static parameters of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub min_confidence: f32,
    pub camera: CameraParameters,
    pub heights: KnownHeightTable,
}

impl PipelineSettings {
    pub fn from_config(conf: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            min_confidence: conf.vision.min_confidence,
            camera: CameraParameters {
                focal_length: conf.distance.focal_length,
            },
            heights: KnownHeightTable::from_config(conf)?,
        })
    }
}

/// Detector, extractor and narration wired together.
pub struct FramePipeline {
    detector: Box<dyn ObjectDetector>,
    extractor: Box<dyn TextExtractor>,
    throttle: NarrationThrottle,
    settings: PipelineSettings,
}

impl FramePipeline {
    pub fn new(
        detector: Box<dyn ObjectDetector>,
        extractor: Box<dyn TextExtractor>,
        throttle: NarrationThrottle,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            detector,
            extractor,
            throttle,
            settings,
        }
    }

    /// Speak a message outside of a cycle, e.g. the start-up announcement.
    pub fn announce(&mut self, text: &str) -> bool {
        self.throttle.try_narrate(text)
    }

    /// Run one cycle on `frame`.
    pub fn process_cycle(
        &mut self,
        frame: &DynamicImage,
        mode: PipelineMode,
        muted: bool,
    ) -> RenderDescription {
        let detections = match self.detector.detect(frame) {
            Ok(dets) => dets,
            Err(e) => {
                log::warn!("Detection failed. {}", e);
                vec![]
            }
        };
        let Some(best) = select_best(&detections, self.settings.min_confidence) else {
            log::debug!("No object. detections: {}", detections.len());
            return RenderDescription::default();
        };

        let real_height = self.settings.heights.height_of(&best.label);
        let distance = estimate_distance(
            best.bbox.height,
            real_height,
            self.settings.camera.focal_length,
        );
        log::debug!(
            "Selected. label: {}, score: {:.2}, distance: {}cm, mode: {:?}",
            best.label,
            best.confidence,
            distance,
            mode
        );

        // None when extraction did not run.
        let text = if mode.extracts_text() {
            match self.extractor.extract_text(frame, &best.bbox) {
                Ok(text) => Some(text.trim().to_string()),
                Err(e) => {
                    log::warn!("Text extraction failed. {}", e);
                    Some(String::new())
                }
            }
        } else {
            None
        };

        if let Some(sentence) = compose_narration(
            &best.label,
            distance,
            text.as_deref(),
            mode.is_forced(),
            muted,
        ) {
            self.throttle.try_narrate(&sentence);
        }

        RenderDescription {
            selected: Some(best),
            distance_cm: Some(distance),
            recognized_text: text.filter(|t| !t.is_empty()),
        }
    }
}

/// Sentence to speak for a selected object, if any.
///
/// `text` is `None` when extraction was not attempted and `Some("")` when it found
/// nothing.
pub fn compose_narration(
    label: &str,
    distance_cm: u32,
    text: Option<&str>,
    forced: bool,
    muted: bool,
) -> Option<String> {
    if muted {
        return None;
    }
    // the sentence supplies its own full stop
    let text = text.map(|t| t.trim_end_matches(['.', '!', '?', ' ']));
    match text {
        Some(text) if !text.is_empty() => Some(format!(
            "That is a {} at {} centimeters. It reads: {}.",
            label, distance_cm, text
        )),
        Some(_) if forced => Some(format!("That is a {}. No text found.", label)),
        _ => None,
    }
}
