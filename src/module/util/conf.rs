//! Config Handler.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors raised while loading or validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] ::toml::de::Error),
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] ::toml::ser::Error),
    #[error("label {0:?} must be lowercase and trimmed")]
    InvalidLabel(String),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: String, value: f64 },
}

/// Provides TOML config file handling.
pub mod toml {

    use super::{ConfigError, DEFAULT_CONFIG};
    use crate::module::define;
    use std::fs::File;
    use std::io::prelude::*;
    use std::path::Path;

    /// Loads a configuration file from the given directory.
    /// If not found, generates a default config file.
    ///
    /// # Arguments
    ///
    /// * `dir` - The directory where the configuration file is located or should be created.
    ///
    pub fn load(dir: &str) -> Result<super::Config, ConfigError> {
        // Check if the config file exists
        let path = Path::new(dir).join(define::path::CONF_FILE);

        if !path.is_file() {
            // Create the default config if it doesn't exist
            let config: super::Config = toml::from_str(DEFAULT_CONFIG)?;
            let toml_str = toml::to_string(&config)?;
            let mut file = File::create(&path)?;
            file.write_all(toml_str.as_bytes())?;
            log::info!("Default config written. path: {}", path.display());
        }

        // Load the config
        let conf_str: String = std::fs::read_to_string(&path)?;
        let conf: super::Config = toml::from_str(&conf_str)?;
        conf.validate()?;
        Ok(conf)
    }
}

/// Represents the configuration data structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub system: System,
    pub camera: Camera,
    pub vision: Vision,
    pub distance: Distance,
    pub narration: Narration,
    pub scan: Scan,
    pub display: Display,
}

/// Represents system-related configuration parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct System {
    pub log_level: String,
}

/// Represents camera-related configuration parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Camera {
    pub device: String,
    pub grab_times: u8,
    pub width: u16,
    pub height: u16,
    pub fps: u32,
}

/// Represents vision-related configuration parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Vision {
    pub detector_model: String,
    pub detector_imgsz: u32,
    pub ocr: bool,
    pub ocr_model: String,
    pub ocr_imgsz: u32,
    pub ocr_charset: String,
    pub min_confidence: f32,
    pub intra_threads: i16,
}

/// Represents distance estimation parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Distance {
    pub focal_length: f32,
    pub default_height_cm: f32,
    pub known_heights: BTreeMap<String, f32>,
}

/// Represents narration-related configuration parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Narration {
    pub enabled: bool,
    pub command: String,
    pub args: Vec<String>,
    pub cooldown_ms: u64,
}

/// Represents overlay rendering parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Display {
    pub font: String,
}

/// Represents scheduling loop parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Scan {
    pub scan_rate_ms: u64,
    pub continuous: bool,
    pub muted: bool,
}

impl Config {
    /// Check value ranges and label spelling.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min_confidence = self.vision.min_confidence;
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(out_of_range("vision.min_confidence", min_confidence));
        }
        if self.distance.focal_length <= 0.0 {
            return Err(out_of_range(
                "distance.focal_length",
                self.distance.focal_length,
            ));
        }
        if self.distance.default_height_cm <= 0.0 {
            return Err(out_of_range(
                "distance.default_height_cm",
                self.distance.default_height_cm,
            ));
        }
        for (label, height) in self.distance.known_heights.iter() {
            if label.trim() != label || label.to_lowercase() != *label || label.is_empty() {
                return Err(ConfigError::InvalidLabel(label.clone()));
            }
            if *height <= 0.0 {
                return Err(out_of_range(
                    &format!("distance.known_heights.{}", label),
                    *height,
                ));
            }
        }
        Ok(())
    }
}

fn out_of_range(field: &str, value: f32) -> ConfigError {
    ConfigError::OutOfRange {
        field: field.to_string(),
        value: value as f64,
    }
}

impl Config {
    /// The built-in configuration written on first run.
    pub fn builtin() -> Result<Self, ConfigError> {
        Ok(::toml::from_str(DEFAULT_CONFIG)?)
    }
}

// Default configuration data in TOML format
const DEFAULT_CONFIG: &str = r#"
[system]
  log_level = 'INFO' # Log level ('DEBUG', 'INFO', 'WARN', 'ERROR')

[camera]
  device = '/dev/video0' # V4L2 device
  grab_times = 2 # Number of grabs per frame, the last one is kept
  width = 1280 # Image width
  height = 720 # Image height
  fps = 30 # Capture rate

[vision]
  detector_model = 'asset/model/yolov8n_coco_640_640.onnx' # Object detection model
  detector_imgsz = 640 # Model input size
  ocr = true # Enable optical character recognition (OCR)
  ocr_model = 'asset/model/char_yolov8_nano_fixed_96_96.onnx' # Character detection model
  ocr_imgsz = 96 # OCR model input size
  ocr_charset = '0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ' # OCR class id to character
  min_confidence = 0.6 # Detections below this score are ignored
  intra_threads = 4 # ONNX runtime threads

[distance]
  focal_length = 600 # Approximate focal length in pixels (needs calibration)
  default_height_cm = 30 # Height used for labels not listed below

[distance.known_heights]
  'person' = 170
  'bicycle' = 100
  'car' = 150
  'motorcycle' = 120
  'airplane' = 1200
  'bus' = 300
  'train' = 350
  'truck' = 250
  'boat' = 150
  'traffic light' = 70
  'fire hydrant' = 80
  'stop sign' = 75
  'parking meter' = 100
  'bench' = 50
  'bird' = 15
  'cat' = 25
  'dog' = 40
  'horse' = 160
  'sheep' = 60
  'cow' = 120
  'elephant' = 250
  'bear' = 100
  'zebra' = 130
  'giraffe' = 450
  'backpack' = 40
  'umbrella' = 60
  'handbag' = 25
  'tie' = 60
  'suitcase' = 50
  'frisbee' = 25
  'skis' = 150
  'snowboard' = 140
  'sports ball' = 20
  'kite' = 50
  'baseball bat' = 90
  'baseball glove' = 30
  'skateboard' = 80
  'surfboard' = 180
  'tennis racket' = 70
  'bottle' = 22
  'wine glass' = 15
  'cup' = 12
  'fork' = 15
  'knife' = 20
  'spoon' = 15
  'bowl' = 12
  'banana' = 20
  'apple' = 10
  'sandwich' = 8
  'orange' = 10
  'broccoli' = 15
  'carrot' = 15
  'hot dog' = 10
  'pizza' = 25
  'donut' = 10
  'cake' = 15
  'chair' = 90
  'couch' = 80
  'potted plant' = 40
  'bed' = 50
  'dining table' = 75
  'toilet' = 45
  'tv' = 60
  'laptop' = 25
  'mouse' = 4
  'remote' = 18
  'keyboard' = 5
  'cell phone' = 15
  'microwave' = 30
  'oven' = 40
  'toaster' = 20
  'sink' = 30
  'refrigerator' = 150
  'book' = 25
  'clock' = 20
  'vase' = 25
  'scissors' = 15
  'teddy bear' = 30
  'hair drier' = 20
  'toothbrush' = 15

[narration]
  enabled = true # Speak results
  command = 'espeak-ng' # Speech command, receives the sentence as last argument
  args = [] # Extra arguments for the speech command
  cooldown_ms = 2500 # Minimum interval between two narrations

[scan]
  scan_rate_ms = 100 # Loop tick interval
  continuous = false # Continuous vision at start
  muted = false # Audio muted at start

[display]
  font = '/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf' # Caption font, the caption is left out if missing
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_test() {
        let conf = Config::builtin().unwrap();
        assert_eq!(conf.vision.min_confidence, 0.6);
        assert_eq!(conf.distance.focal_length, 600.0);
        assert_eq!(conf.distance.default_height_cm, 30.0);
        assert_eq!(conf.distance.known_heights.len(), 80);
        assert_eq!(conf.distance.known_heights.get("book"), Some(&25.0));
        assert_eq!(conf.narration.cooldown_ms, 2500);
        assert!(conf.display.font.ends_with(".ttf"));
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn run_load() {
        let dir = tempfile::tempdir().unwrap();
        let dir = dir.path().to_str().unwrap();
        // First load writes the default file, second load reads it back.
        let res = toml::load(dir).unwrap();
        assert_eq!(res.system.log_level, "INFO");
        assert!(std::path::Path::new(dir).join("conf.toml").is_file());
        let res = toml::load(dir).unwrap();
        assert_eq!(res.distance.known_heights.get("traffic light"), Some(&70.0));
    }

    #[test]
    fn invalid_label_test() {
        let mut conf = Config::builtin().unwrap();
        conf.distance.known_heights.insert("Book".to_string(), 25.0);
        assert!(matches!(conf.validate(), Err(ConfigError::InvalidLabel(l)) if l == "Book"));

        let mut conf = Config::builtin().unwrap();
        conf.distance.known_heights.insert(" cup".to_string(), 12.0);
        assert!(matches!(conf.validate(), Err(ConfigError::InvalidLabel(_))));
    }

    #[test]
    fn out_of_range_test() {
        let mut conf = Config::builtin().unwrap();
        conf.vision.min_confidence = 1.5;
        assert!(matches!(conf.validate(), Err(ConfigError::OutOfRange { .. })));

        let mut conf = Config::builtin().unwrap();
        conf.distance.focal_length = 0.0;
        assert!(matches!(conf.validate(), Err(ConfigError::OutOfRange { .. })));

        let mut conf = Config::builtin().unwrap();
        conf.distance.known_heights.insert("cup".to_string(), -1.0);
        assert!(matches!(conf.validate(), Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn broken_file_test() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("conf.toml"), "[system\n").unwrap();
        let res = toml::load(dir.path().to_str().unwrap());
        assert!(matches!(res, Err(ConfigError::Parse(_))));
    }
}
