//! This module is responsible for preparing the resources needed by the application, such as directories, configurations, camera and models.
//!

/// Failures that prevent the system from starting.
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("can't create data directories: {0}")]
    Dir(#[from] std::io::Error),
    #[error("can't load config: {0}")]
    Config(#[from] crate::module::util::conf::ConfigError),
    #[error("can't initialize camera or models: {0}")]
    Vision(#[from] crate::module::vision::VisionError),
}

pub mod resource {
    use std::sync::mpsc::Receiver;

    use super::{AcquisitionError, AppProperty};
    use crate::module::com::ScanCommand;
    use crate::module::device;
    use crate::module::display::OverlayPresenter;
    use crate::module::pipeline::{FramePipeline, PipelineSettings};
    use crate::module::scan::ScanLoop;
    use crate::module::vision::AppVision;

    /// Initialize the application resources and return an AppProperty instance containing paths and configurations.
    ///
    pub fn init() -> Result<AppProperty, AcquisitionError> {
        // Prepare the app data directory
        let paths = crate::module::util::path::dir::create_app_sub_dir()?;

        // Load the app configuration file
        let conf = crate::module::util::conf::toml::load(&paths.dir.data)?;

        Ok(AppProperty { path: paths, conf })
    }

    /// Open the camera, load the models and wire the scan loop.
    ///
    /// The returned loop is still stopped.
    pub fn acquire(
        property: &AppProperty,
        rx: Receiver<ScanCommand>,
    ) -> Result<ScanLoop, AcquisitionError> {
        let settings = PipelineSettings::from_config(&property.conf)?;
        let vision = AppVision::new(property)?;
        let pipeline = FramePipeline::new(
            Box::new(vision.det),
            vision.ocr,
            device::build_narration(&property.conf),
            settings,
        );
        Ok(ScanLoop::new(
            Box::new(vision.cam),
            pipeline,
            Box::new(OverlayPresenter::new(
                &property.path.img.overlay,
                &property.conf.display.font,
            )),
            rx,
            &property.conf.scan,
        ))
    }
}

/// This struct represents the properties of the app, such as paths and configurations.
///
#[derive(Debug, Clone)]
pub struct AppProperty {
    pub path: crate::module::util::path::AppPath, // The paths of the app resources
    pub conf: crate::module::util::conf::Config,  // The configurations of the app
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn acquire_rejects_bad_config_test() {
        let base = tempfile::tempdir().unwrap();
        let base = base.path().to_str().unwrap();
        let path = crate::module::util::path::dir::create_app_sub_dir_in(base, base).unwrap();
        let mut conf = crate::module::util::conf::Config::builtin().unwrap();
        conf.distance
            .known_heights
            .insert("Chair".to_string(), 90.0);
        let property = AppProperty { path, conf };

        let (_tx, rx) = mpsc::channel();
        let res = resource::acquire(&property, rx);
        assert!(matches!(res, Err(AcquisitionError::Config(_))));
    }
}
