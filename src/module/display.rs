//! Presentation of cycle results.
//!
//! Status fields go to the log whenever they change. The overlay is drawn on a copy of
//! the frame and saved as an image. It shows the detection box with a tinted caption
//! band (label and distance) and, when text was read, a dashed outline of the region.

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, Blend,
};
use imageproc::rect::Rect;

use super::pipeline::RenderDescription;

const BOX_COLOR: Rgba<u8> = Rgba([0, 242, 255, 255]);
const OCR_COLOR: Rgba<u8> = Rgba([0, 255, 157, 255]);
const BAND_COLOR: Rgba<u8> = Rgba([0, 242, 255, 26]);
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BOX_THICKNESS: u32 = 3;
const DASH: u32 = 5;
const BAND_HEIGHT: u32 = 30;
const TEXT_SCALE: f32 = 16.0;

type Overlay = Blend<RgbaImage>;

/// Consumer of one [`RenderDescription`] per cycle.
pub trait Presenter: Send {
    fn present(&mut self, frame: &DynamicImage, render: &RenderDescription);
}

/// Textual status fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub object: String,
    pub score: String,
    pub distance: String,
    pub text: String,
}

impl StatusLine {
    pub fn from_render(render: &RenderDescription) -> Self {
        match &render.selected {
            Some(det) => Self {
                object: det.label.clone(),
                score: format!("{}%", (det.confidence * 100.0).round() as u32),
                distance: match render.distance_cm {
                    Some(d) => format!("{} cm", d),
                    None => "-- cm".to_string(),
                },
                text: render.recognized_text.clone().unwrap_or_default(),
            },
            None => Self {
                object: "No Object".to_string(),
                score: "--".to_string(),
                distance: "-- cm".to_string(),
                text: String::new(),
            },
        }
    }

    /// Caption drawn next to the box.
    pub fn caption(&self) -> String {
        format!("{} | {}", self.object, self.distance.replace(' ', ""))
    }
}

/// Load the caption font. Without it the caption band is drawn empty.
pub fn load_font(path: &str) -> Option<FontVec> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Can't read caption font. path: {}, {}", path, e);
            return None;
        }
    };
    match FontVec::try_from_vec(data) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("Invalid caption font. path: {}, {}", path, e);
            None
        }
    }
}

/// Logs status changes and writes the overlay image.
pub struct OverlayPresenter {
    overlay_path: String,
    font: Option<FontVec>,
    last_status: Option<StatusLine>,
}

impl OverlayPresenter {
    pub fn new(overlay_path: &str, font_path: &str) -> Self {
        Self {
            overlay_path: overlay_path.to_string(),
            font: load_font(font_path),
            last_status: None,
        }
    }
}

impl Presenter for OverlayPresenter {
    fn present(&mut self, frame: &DynamicImage, render: &RenderDescription) {
        let status = StatusLine::from_render(render);
        if self.last_status.as_ref() != Some(&status) {
            if status.text.is_empty() {
                log::info!("Status: {} ({})", status.caption(), status.score);
            } else {
                log::info!(
                    "Status: {} ({}) text: {}",
                    status.caption(),
                    status.score,
                    status.text
                );
            }
            self.last_status = Some(status);
        }

        let overlay = render_overlay(frame, render, self.font.as_ref());
        if let Err(e) = overlay.save(&self.overlay_path) {
            log::debug!("Can't save overlay. {}", e);
        }
    }
}

/// Draw the description on a copy of the frame.
pub fn render_overlay(
    frame: &DynamicImage,
    render: &RenderDescription,
    font: Option<&FontVec>,
) -> RgbImage {
    let mut canvas = Blend(frame.to_rgba8());
    if let Some(det) = &render.selected {
        let (w, h) = canvas.0.dimensions();
        if let Some((x, y, bw, bh)) = det.bbox.clamp_to(w, h) {
            draw_caption(&mut canvas, (x, y, bw), &StatusLine::from_render(render), font);
            draw_box(&mut canvas, (x, y, bw, bh));
            if render.recognized_text.is_some() {
                draw_dashed_outline(&mut canvas, (x, y, bw, bh));
            }
        }
    }
    DynamicImage::ImageRgba8(canvas.0).to_rgb8()
}

/// Tinted band across the top of the box with `label | distance` in it.
fn draw_caption(
    canvas: &mut Overlay,
    (x, y, bw): (u32, u32, u32),
    status: &StatusLine,
    font: Option<&FontVec>,
) {
    draw_filled_rect_mut(
        canvas,
        Rect::at(x as i32, y as i32).of_size(bw, BAND_HEIGHT),
        BAND_COLOR,
    );
    if let Some(font) = font {
        draw_text_mut(
            canvas,
            TEXT_COLOR,
            x as i32 + 10,
            y as i32 + 7,
            PxScale::from(TEXT_SCALE),
            font,
            &status.caption(),
        );
    }
}

/// Solid box, `BOX_THICKNESS` rings drawn inwards.
fn draw_box(canvas: &mut Overlay, (x, y, bw, bh): (u32, u32, u32, u32)) {
    for t in 0..BOX_THICKNESS {
        let (rw, rh) = (bw.saturating_sub(2 * t), bh.saturating_sub(2 * t));
        if rw == 0 || rh == 0 {
            break;
        }
        let ring = Rect::at((x + t) as i32, (y + t) as i32).of_size(rw, rh);
        draw_hollow_rect_mut(canvas, ring, BOX_COLOR);
    }
}

/// One pixel outline made of `DASH` px segments separated by `DASH` px gaps.
fn draw_dashed_outline(canvas: &mut Overlay, (x, y, bw, bh): (u32, u32, u32, u32)) {
    let (left, top) = (x as f32, y as f32);
    let (right, bottom) = ((x + bw - 1) as f32, (y + bh - 1) as f32);
    for (from, to) in dashes(bw) {
        let (from, to) = (left + from as f32, left + to as f32);
        draw_line_segment_mut(canvas, (from, top), (to, top), OCR_COLOR);
        draw_line_segment_mut(canvas, (from, bottom), (to, bottom), OCR_COLOR);
    }
    for (from, to) in dashes(bh) {
        let (from, to) = (top + from as f32, top + to as f32);
        draw_line_segment_mut(canvas, (left, from), (left, to), OCR_COLOR);
        draw_line_segment_mut(canvas, (right, from), (right, to), OCR_COLOR);
    }
}

/// Inclusive `(start, end)` offsets of the dashes along a side of `len` pixels.
fn dashes(len: u32) -> Vec<(u32, u32)> {
    (0..len)
        .step_by((2 * DASH) as usize)
        .map(|start| (start, (start + DASH - 1).min(len - 1)))
        .collect()
}
