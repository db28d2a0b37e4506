//! Provide Object Detection
//!
pub mod onnx {
    use crate::module::vision::VisionError;
    use image::{imageops::FilterType, DynamicImage, ImageBuffer, Pixel, Rgb};
    use ndarray::{s, Array, Axis, IxDyn};
    use ort::{
        environment::Environment, value::Value, ExecutionProvider, GraphOptimizationLevel,
        LoggingLevel, Session, SessionBuilder,
    };

    /// Raw YOLO rows scoring below this are discarded before merging.
    pub const CANDIDATE_THRESHOLD: f32 = 0.25;

    /// Boxes of the same class overlapping at least this much are merged.
    const MERGE_IOU: f32 = 0.7;

    /// YoloV8 session store.
    ///
    pub struct YoloV8 {
        session: Session,
        pub imgsz: u32,
    }

    /// Methods for yolov8.
    ///
    impl YoloV8 {
        /// yolov8's constructor.
        ///
        pub fn new(
            name: &str,
            model_path: &str,
            imgsz: u32,
            intra_threads: i16,
        ) -> Result<Self, VisionError> {
            Ok(Self {
                session: Self::get_session(name, model_path, intra_threads)?,
                imgsz,
            })
        }
        /// get session
        ///
        pub fn get_session(
            name: &str,
            model_path: &str,
            intra_threads: i16,
        ) -> Result<Session, VisionError> {
            let environment = Environment::builder()
                .with_name(name)
                .with_log_level(LoggingLevel::Warning)
                .with_execution_providers([ExecutionProvider::CPU(Default::default())])
                .build()?
                .into_arc();
            let session = SessionBuilder::new(&environment)?
                .with_optimization_level(GraphOptimizationLevel::Level1)?
                .with_intra_threads(intra_threads)?
                .with_model_from_file(model_path)?;
            log::info!("Model loaded. name: {}, path: {}", name, model_path);
            Ok(session)
        }
        /// Infer
        ///
        /// Returned boxes are in model input coordinates (`imgsz` x `imgsz`).
        pub fn infer(&self, img: &DynamicImage) -> Result<Vec<Candidate>, VisionError> {
            let sz = self.imgsz;
            // Resize to model's shape, converting to RGB format
            let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
                img.resize_exact(sz, sz, FilterType::Nearest).to_rgb8();

            let array = ndarray::CowArray::from(
                ndarray::Array::from_shape_fn((1, 3, sz as usize, sz as usize), |(_, c, j, i)| {
                    let pixel = img.get_pixel(i as u32, j as u32);
                    let channels = pixel.channels();
                    // normalize
                    // range [0, 255] -> range [0, 1]
                    (channels[c] as f32) / 255.0
                })
                .into_dyn(),
            );

            let tensor = vec![Value::from_array(self.session.allocator(), &array)?];

            let outs = self.session.run(tensor)?;
            let out = outs
                .get(0)
                .ok_or_else(|| VisionError::Shape("no output tensor".to_string()))?
                .try_extract::<f32>()?
                .view()
                .t()
                .into_owned();
            convert_yolo_fmt(out, CANDIDATE_THRESHOLD)
        }
    }

    /// One decoded YOLO box in model input coordinates.
    ///
    #[derive(Debug, Clone, PartialEq)]
    pub struct Candidate {
        pub x1: f32,
        pub y1: f32,
        pub x2: f32,
        pub y2: f32,
        pub xc: f32,
        pub yc: f32,
        pub w: f32,
        pub h: f32,
        pub cls: u32,
        pub prob: f32,
    }

    /// Decode a transposed YOLOv8 output of shape `(rows, 4 + classes, 1)`.
    ///
    pub fn convert_yolo_fmt(
        out: Array<f32, IxDyn>,
        threshold: f32,
    ) -> Result<Vec<Candidate>, VisionError> {
        if out.ndim() != 3 || out.shape()[1] <= 4 {
            return Err(VisionError::Shape(format!("{:?}", out.shape())));
        }
        let mut bboxes = vec![];
        let output = out.slice(s![.., .., 0]);
        for row in output.axis_iter(Axis(0)) {
            let row: Vec<_> = row.iter().copied().collect();
            let Some((class_id, prob)) = row
                .iter()
                .skip(4)
                .enumerate()
                .map(|(index, value)| (index, *value))
                .reduce(|accum, row| if row.1 > accum.1 { row } else { accum })
            else {
                continue;
            };
            if prob < threshold {
                continue;
            }
            let (xc, yc, w, h) = (row[0], row[1], row[2], row[3]);
            bboxes.push(Candidate {
                x1: (xc - w / 2.0).max(0.0),
                y1: (yc - h / 2.0).max(0.0),
                x2: xc + w / 2.0,
                y2: yc + h / 2.0,
                xc,
                yc,
                w,
                h,
                cls: class_id as u32,
                prob,
            })
        }
        bboxes.sort_by(|box1, box2| box2.prob.total_cmp(&box1.prob));
        Ok(merge_bboxes(bboxes))
    }

    /// Function to compute the IoU of two rectangles.
    ///
    pub fn iou(r1: &Candidate, r2: &Candidate) -> f32 {
        let x1 = r1.x1.max(r2.x1);
        let y1 = r1.y1.max(r2.y1);
        let x2 = r1.x2.min(r2.x2);
        let y2 = r1.y2.min(r2.y2);
        let w = (x2 - x1).max(0.0);
        let h = (y2 - y1).max(0.0);
        let intersection = w * h;
        let area_r1 = (r1.x2 - r1.x1) * (r1.y2 - r1.y1);
        let area_r2 = (r2.x2 - r2.x1) * (r2.y2 - r2.y1);
        let union = area_r1 + area_r2 - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }

    /// Merges bounding boxes of the same class whose IoU is greater than or equal to 0.7.
    ///
    /// The merged box keeps the class and score of the highest scoring member.
    fn merge_bboxes(bboxes: Vec<Candidate>) -> Vec<Candidate> {
        let mut merged_bboxes = Vec::new();
        let mut used = vec![false; bboxes.len()];
        for i in 0..bboxes.len() {
            if used[i] {
                continue;
            }
            let mut merged_bbox = bboxes[i].clone();
            used[i] = true;
            for j in 0..bboxes.len() {
                if used[j] || bboxes[i].cls != bboxes[j].cls {
                    continue;
                }
                if iou(&bboxes[i], &bboxes[j]) >= MERGE_IOU {
                    let x1 = merged_bbox.x1.min(bboxes[j].x1);
                    let y1 = merged_bbox.y1.min(bboxes[j].y1);
                    let x2 = merged_bbox.x2.max(bboxes[j].x2);
                    let y2 = merged_bbox.y2.max(bboxes[j].y2);
                    let w = x2 - x1;
                    let h = y2 - y1;
                    merged_bbox = Candidate {
                        x1,
                        y1,
                        x2,
                        y2,
                        xc: x1 + w / 2.0,
                        yc: y1 + h / 2.0,
                        w,
                        h,
                        cls: merged_bbox.cls,
                        prob: merged_bbox.prob,
                    };
                    used[j] = true;
                }
            }
            merged_bboxes.push(merged_bbox);
        }
        merged_bboxes
    }
}

use image::{DynamicImage, GenericImageView};

use super::{ObjectDetector, VisionError};
use crate::module::define;

/// Axis-aligned rectangle in frame pixel coordinates.
///
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Integer `(x, y, width, height)` of this box clipped to a `frame_w` x `frame_h` image.
    ///
    /// Returns `None` when nothing of the box lies inside the image.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Option<(u32, u32, u32, u32)> {
        let x1 = self.x.max(0.0).floor();
        let y1 = self.y.max(0.0).floor();
        let x2 = (self.x + self.width).min(frame_w as f32).ceil();
        let y2 = (self.y + self.height).min(frame_h as f32).ceil();
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some((x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32))
    }
}

/// Detection result
///
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: &str, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.to_string(),
            confidence,
            bbox,
        }
    }
}

/// YOLOv8 detector trained on the COCO-80 classes.
///
pub struct CocoDetector {
    yolo: onnx::YoloV8,
}

impl CocoDetector {
    pub fn new(model_path: &str, imgsz: u32, intra_threads: i16) -> Result<Self, VisionError> {
        Ok(Self {
            yolo: onnx::YoloV8::new("coco", model_path, imgsz, intra_threads)?,
        })
    }
}

impl ObjectDetector for CocoDetector {
    fn detect(&mut self, frame: &DynamicImage) -> Result<Vec<Detection>, VisionError> {
        let (fw, fh) = frame.dimensions();
        let candidates = self.yolo.infer(frame)?;
        let dets = to_frame_detections(&candidates, self.yolo.imgsz, fw, fh);
        log::debug!("Detected. count: {}", dets.len());
        Ok(dets)
    }
}

/// Scale candidates from model input size back to frame pixels and attach labels.
///
fn to_frame_detections(
    candidates: &[onnx::Candidate],
    imgsz: u32,
    frame_w: u32,
    frame_h: u32,
) -> Vec<Detection> {
    let sx = frame_w as f32 / imgsz as f32;
    let sy = frame_h as f32 / imgsz as f32;
    candidates
        .iter()
        .map(|c| Detection {
            label: define::label::coco(c.cls).to_string(),
            confidence: c.prob,
            bbox: BoundingBox::new(c.x1 * sx, c.y1 * sy, (c.x2 - c.x1) * sx, (c.y2 - c.y1) * sy),
        })
        .collect()
}
