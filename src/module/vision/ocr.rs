//! Text recognition on a detected region.
//!
//! Characters are found by a small YOLO model; each class id maps to one character of
//! the configured charset. Boxes are then grouped into lines and read left to right.

use image::{DynamicImage, GenericImageView};

use super::detector::{onnx, BoundingBox};
use super::{TextExtractor, VisionError};

/// Regions smaller than this on either side are not worth reading.
const MIN_REGION_PX: u32 = 10;

/// Character detector backed by an ONNX model.
///
pub struct CharOcr {
    yolo: onnx::YoloV8,
    charset: Vec<char>,
}

impl CharOcr {
    pub fn new(
        model_path: &str,
        imgsz: u32,
        charset: &str,
        intra_threads: i16,
    ) -> Result<Self, VisionError> {
        Ok(Self {
            yolo: onnx::YoloV8::new("ocr", model_path, imgsz, intra_threads)?,
            charset: charset.chars().collect(),
        })
    }
}

impl TextExtractor for CharOcr {
    fn extract_text(
        &mut self,
        frame: &DynamicImage,
        region: &BoundingBox,
    ) -> Result<String, VisionError> {
        let (fw, fh) = frame.dimensions();
        let Some((x, y, w, h)) = readable_region(region, fw, fh) else {
            log::debug!("Region not readable. region: {:?}", region);
            return Ok(String::new());
        };
        let crop = frame.crop_imm(x, y, w, h);
        let chars = self.yolo.infer(&crop)?;
        let text = assemble_text(&chars, &self.charset);
        log::debug!("OCR. region: {:?}, text: {:?}", (x, y, w, h), text);
        Ok(text)
    }
}

/// Part of `region` inside a `frame_w` x `frame_h` frame, if at least
/// `MIN_REGION_PX` wide and high.
fn readable_region(
    region: &BoundingBox,
    frame_w: u32,
    frame_h: u32,
) -> Option<(u32, u32, u32, u32)> {
    let (x, y, w, h) = region.clamp_to(frame_w, frame_h)?;
    if w < MIN_REGION_PX || h < MIN_REGION_PX {
        return None;
    }
    Some((x, y, w, h))
}

/// Extractor used when OCR is disabled. Always finds nothing.
pub struct NoOcr;

impl TextExtractor for NoOcr {
    fn extract_text(
        &mut self,
        _frame: &DynamicImage,
        _region: &BoundingBox,
    ) -> Result<String, VisionError> {
        Ok(String::new())
    }
}

/// Turn character boxes into text.
///
/// Boxes whose vertical centers are within half a mean character height belong to the
/// same line. Lines are read top to bottom, characters left to right. A horizontal gap
/// wider than 60% of the mean character width becomes a space.
fn assemble_text(chars: &[onnx::Candidate], charset: &[char]) -> String {
    let mut chars: Vec<&onnx::Candidate> = chars
        .iter()
        .filter(|c| (c.cls as usize) < charset.len())
        .collect();
    if chars.is_empty() {
        return String::new();
    }
    let mean_h = chars.iter().map(|c| c.h).sum::<f32>() / chars.len() as f32;
    let mean_w = chars.iter().map(|c| c.w).sum::<f32>() / chars.len() as f32;

    // sort by top
    chars.sort_by(|a, b| a.yc.total_cmp(&b.yc));
    let mut lines: Vec<Vec<&onnx::Candidate>> = vec![];
    for c in chars {
        match lines.last_mut() {
            Some(line) if (c.yc - line[0].yc).abs() <= mean_h / 2.0 => line.push(c),
            _ => lines.push(vec![c]),
        }
    }

    let mut text_lines = vec![];
    for mut line in lines {
        // sort by left
        line.sort_by(|a, b| a.xc.total_cmp(&b.xc));
        let mut text = String::new();
        let mut prev_x2: Option<f32> = None;
        for c in line {
            if let Some(x2) = prev_x2 {
                if c.x1 - x2 > mean_w * 0.6 {
                    text.push(' ');
                }
            }
            text.push(charset[c.cls as usize]);
            prev_x2 = Some(c.x2);
        }
        text_lines.push(text);
    }
    text_lines.join(" ").trim().to_string()
}
