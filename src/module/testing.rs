//! In-memory collaborators for unit tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use image::DynamicImage;

use super::device::speaker::{Narrator, SpeechError};
use super::device::throttle::Clock;
use super::display::Presenter;
use super::pipeline::RenderDescription;
use super::vision::detector::{BoundingBox, Detection};
use super::vision::{FrameSource, ObjectDetector, TextExtractor, VisionError};

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self(Arc::new(AtomicI64::new(start_ms)))
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Narrator that records calls.
#[derive(Clone, Default)]
pub struct RecordingNarrator {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("speak:").map(str::to_string))
            .collect()
    }
}

impl Narrator for RecordingNarrator {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        self.events.lock().unwrap().push(format!("speak:{}", text));
        Ok(())
    }

    fn cancel_current(&mut self) {
        self.events.lock().unwrap().push("cancel".to_string());
    }
}

/// Narrator whose backend is always unavailable.
pub struct FailingNarrator;

impl Narrator for FailingNarrator {
    fn speak(&mut self, _text: &str) -> Result<(), SpeechError> {
        Err(SpeechError::Spawn {
            command: "missing".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        })
    }

    fn cancel_current(&mut self) {}
}

/// Detector returning a fixed answer and counting calls.
#[derive(Clone)]
pub struct FakeDetector {
    answer: Arc<Mutex<Option<Vec<Detection>>>>,
    pub calls: Arc<Mutex<usize>>,
}

impl FakeDetector {
    /// Always returns `dets`.
    pub fn returning(dets: Vec<Detection>) -> Self {
        Self {
            answer: Arc::new(Mutex::new(Some(dets))),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Always fails.
    pub fn failing() -> Self {
        Self {
            answer: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl ObjectDetector for FakeDetector {
    fn detect(&mut self, _frame: &DynamicImage) -> Result<Vec<Detection>, VisionError> {
        *self.calls.lock().unwrap() += 1;
        match self.answer.lock().unwrap().clone() {
            Some(dets) => Ok(dets),
            None => Err(VisionError::Shape("fake detector failure".to_string())),
        }
    }
}

/// Extractor returning a fixed answer and recording the regions it was given.
#[derive(Clone)]
pub struct FakeExtractor {
    answer: Option<String>,
    pub regions: Arc<Mutex<Vec<BoundingBox>>>,
}

impl FakeExtractor {
    pub fn returning(text: &str) -> Self {
        Self {
            answer: Some(text.to_string()),
            regions: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            regions: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn calls(&self) -> usize {
        self.regions.lock().unwrap().len()
    }
}

impl TextExtractor for FakeExtractor {
    fn extract_text(
        &mut self,
        _frame: &DynamicImage,
        region: &BoundingBox,
    ) -> Result<String, VisionError> {
        self.regions.lock().unwrap().push(*region);
        match &self.answer {
            Some(text) => Ok(text.clone()),
            None => Err(VisionError::Shape("fake extractor failure".to_string())),
        }
    }
}

/// Frame source yielding blank frames, optionally failing first.
pub struct FakeFrames {
    failures_left: usize,
    pub grabs: Arc<Mutex<usize>>,
}

impl FakeFrames {
    pub fn new() -> Self {
        Self {
            failures_left: 0,
            grabs: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing_first(n: usize) -> Self {
        Self {
            failures_left: n,
            grabs: Arc::new(Mutex::new(0)),
        }
    }
}

impl FrameSource for FakeFrames {
    fn grab(&mut self) -> Result<DynamicImage, VisionError> {
        *self.grabs.lock().unwrap() += 1;
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(VisionError::Camera(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "fake camera timeout",
            )));
        }
        Ok(DynamicImage::new_rgb8(64, 48))
    }
}

/// Presenter that keeps every description it receives.
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    pub seen: Arc<Mutex<Vec<RenderDescription>>>,
}

impl RecordingPresenter {
    pub fn seen(&self) -> Vec<RenderDescription> {
        self.seen.lock().unwrap().clone()
    }
}

impl Presenter for RecordingPresenter {
    fn present(&mut self, _frame: &DynamicImage, render: &RenderDescription) {
        self.seen.lock().unwrap().push(render.clone());
    }
}

/// A detection with its box at the origin.
pub fn detection(label: &str, confidence: f32, width: f32, height: f32) -> Detection {
    Detection::new(label, confidence, BoundingBox::new(0.0, 0.0, width, height))
}
