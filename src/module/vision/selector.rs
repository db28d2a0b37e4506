//! Pick the detection of interest.

use super::detector::Detection;

/// Select the most relevant detection.
///
/// Detections scoring below `min_confidence` are ignored. Among the rest, the one with
/// the largest bounding-box area wins, the largest thing in frame being assumed the
/// nearest. On equal areas the earliest detection in input order is kept.
pub fn select_best(detections: &[Detection], min_confidence: f32) -> Option<Detection> {
    detections
        .iter()
        .filter(|det| det.confidence >= min_confidence)
        .reduce(|best, det| {
            if det.bbox.area() > best.bbox.area() {
                det
            } else {
                best
            }
        })
        .cloned()
}
