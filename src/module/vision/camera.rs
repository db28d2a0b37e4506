//! Camera Functions
//!

use image::DynamicImage;
use rscam::{Camera, Config};
use std::io;

use super::{FrameSource, VisionError};
use crate::module::util::init::AppProperty;

/// Represents a V4L2 camera configuration and capture functionality.
///
pub struct V4l2Camera {
    cap: Camera,    // The camera instance for capturing frames.
    grab_times: u8, // Frames grabbed per call, the last one is kept.
}

impl V4l2Camera {
    /// Opens and starts the configured V4L2 device.
    ///
    /// # Arguments
    ///
    /// * `property` - The camera configuration properties.
    ///
    pub fn new(property: &AppProperty) -> Result<Self, VisionError> {
        let conf = &property.conf.camera;
        let mut cap = Camera::new(&conf.device)?;

        // Configure and start the camera with specified settings.
        cap.start(&Config {
            interval: (1, conf.fps),
            resolution: (conf.width as u32, conf.height as u32),
            format: b"MJPG",
            nbuffers: 1,
            ..Default::default()
        })
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{:?}", e)))?;
        log::info!(
            "Camera started. device: {}, {}x{}@{}",
            conf.device,
            conf.width,
            conf.height,
            conf.fps
        );

        Ok(Self {
            cap,
            grab_times: conf.grab_times.max(1),
        })
    }
}

impl FrameSource for V4l2Camera {
    /// Captures the most recent frame.
    ///
    /// Older buffered frames are grabbed and dropped first to reduce delay.
    fn grab(&mut self) -> Result<DynamicImage, VisionError> {
        let mut frame = self.cap.capture()?;
        for _ in 1..self.grab_times {
            frame = self.cap.capture()?;
        }
        Ok(image::load_from_memory(&frame[..])?)
    }
}
