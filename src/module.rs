//! This module contains all the sub-modules of the project.

pub mod com; // Communication module: Reads operator commands.
pub mod define; // Definition module: Contains definitions and constants used throughout the project.
pub mod device; // Device module: Speech output and its throttle.
pub mod display; // Display module: Status fields and overlay rendering.
pub mod pipeline; // Pipeline module: Per-frame detection, distance, text and narration.
pub mod scan; // Scan module: Handles the scheduling loop thread.
pub mod util; // Utility module: Provides various utility functions and helpers.
pub mod vision; // Vision module: Handles computer vision and object detection.

#[cfg(test)]
pub mod testing; // In-memory collaborators shared by unit tests.
