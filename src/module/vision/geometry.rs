//! Monocular distance estimation.
//!
//! Uses the pinhole relation `distance = real_height * focal_length / pixel_height`.
//! The focal length is an uncalibrated estimate, so results are approximate.

use std::collections::BTreeMap;

use crate::module::util::conf::{Config, ConfigError};

/// Estimate the distance to an object in centimeters.
///
/// Returns 0 when the apparent height is not positive. A 170 cm person 100 px tall at a
/// focal length of 600 px is 1020 cm away.
pub fn estimate_distance(pixel_height: f32, real_height_cm: f32, focal_length: f32) -> u32 {
    if pixel_height <= 0.0 {
        return 0;
    }
    let distance = (real_height_cm as f64 * focal_length as f64 / pixel_height as f64).round();
    if distance.is_finite() && distance > 0.0 {
        distance as u32
    } else {
        0
    }
}

/// Real-world heights of known labels, in centimeters.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownHeightTable {
    heights: BTreeMap<String, f32>,
    default_height_cm: f32,
}

impl KnownHeightTable {
    /// Build a table. Labels must be lowercase and trimmed.
    pub fn new(
        heights: BTreeMap<String, f32>,
        default_height_cm: f32,
    ) -> Result<Self, ConfigError> {
        if let Some(label) = heights
            .keys()
            .find(|l| l.is_empty() || l.trim() != l.as_str() || l.to_lowercase() != **l)
        {
            return Err(ConfigError::InvalidLabel(label.clone()));
        }
        Ok(Self {
            heights,
            default_height_cm,
        })
    }

    /// Build the table from the `[distance]` section.
    pub fn from_config(conf: &Config) -> Result<Self, ConfigError> {
        Self::new(
            conf.distance.known_heights.clone(),
            conf.distance.default_height_cm,
        )
    }

    /// Height of a label, falling back to the default height.
    pub fn height_of(&self, label: &str) -> f32 {
        self.heights
            .get(label)
            .copied()
            .unwrap_or(self.default_height_cm)
    }
}

/// Camera intrinsics used by every distance computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParameters {
    pub focal_length: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_distance_test() {
        assert_eq!(estimate_distance(100.0, 170.0, 600.0), 1020);
        assert_eq!(estimate_distance(125.0, 25.0, 600.0), 120);
        // 30 * 600 / 7 = 2571.43
        assert_eq!(estimate_distance(7.0, 30.0, 600.0), 2571);
        // 10 * 600 / 16 = 375.0, 10 * 600 / 11 = 545.45
        assert_eq!(estimate_distance(16.0, 10.0, 600.0), 375);
        assert_eq!(estimate_distance(11.0, 10.0, 600.0), 545);
        // rounding half up: 25 * 3 / 2 = 37.5
        assert_eq!(estimate_distance(2.0, 25.0, 3.0), 38);
    }

    #[test]
    fn degenerate_pixel_height_test() {
        assert_eq!(estimate_distance(0.0, 170.0, 600.0), 0);
        assert_eq!(estimate_distance(-3.0, 170.0, 600.0), 0);
        assert_eq!(estimate_distance(-0.0, 25.0, 600.0), 0);
    }

    #[test]
    fn known_height_table_test() {
        let mut heights = BTreeMap::new();
        heights.insert("book".to_string(), 25.0);
        heights.insert("traffic light".to_string(), 70.0);
        let table = KnownHeightTable::new(heights, 30.0).unwrap();
        assert_eq!(table.height_of("book"), 25.0);
        assert_eq!(table.height_of("traffic light"), 70.0);
        assert_eq!(table.height_of("spaceship"), 30.0);
    }

    #[test]
    fn known_height_table_rejects_labels_test() {
        for bad in ["Book", "book ", "", " cup"] {
            let mut heights = BTreeMap::new();
            heights.insert(bad.to_string(), 25.0);
            assert!(matches!(
                KnownHeightTable::new(heights, 30.0),
                Err(ConfigError::InvalidLabel(_))
            ));
        }
    }

    #[test]
    fn from_config_test() {
        let conf = Config::builtin().unwrap();
        let table = KnownHeightTable::from_config(&conf).unwrap();
        assert_eq!(table.height_of("person"), 170.0);
        assert_eq!(table.height_of("unlisted"), 30.0);
    }
}
