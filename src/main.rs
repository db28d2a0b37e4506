//! VisionTalk: detects objects in a live camera feed, estimates how far they are and
//! reads out their labels and any text on them.

pub mod module; // Import the module submodule that contains other modules
use crate::module::define; // Import the define module that contains constants and types
use crate::module::util::init::resource; // Import the resource initialization functions
use std::sync::mpsc;

// The main function of VisionTalk
pub fn main() {
    // Prepare the directories and load the configuration
    let property = match resource::init() {
        Ok(property) => property,
        Err(e) => {
            eprintln!("Startup Failed: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize the logging system with the log directory and the system name
    if let Err(e) = init_log(
        property.path.dir.log.as_str(),
        define::system::NAME,
        &property.conf.system.log_level,
    ) {
        eprintln!("Can't initialize logger: {}", e);
    }
    log::info!("Starting VisionTalk...");

    // Open the camera and load the models; the loop never starts without them
    let (tx, rx) = mpsc::channel();
    let scan_loop = match resource::acquire(&property, rx) {
        Ok(scan_loop) => scan_loop,
        Err(e) => {
            log::error!("Startup Failed: {}", e);
            eprintln!("Startup Failed: {}", e);
            std::process::exit(1);
        }
    };

    // Operator commands come from stdin
    let _com_handler = module::com::listen(std::io::stdin(), tx);

    // Scan until shutdown
    module::scan::run(scan_loop, property.conf.scan.scan_rate_ms);
}

/// This function initializes the logger system using the log4rs crate.
///
/// # Arguments
/// * `dir` - A string slice that holds the directory where the log file will be stored
/// * `name` - A string slice that holds the name of the logger and the log file
/// * `level` - Root level such as "INFO", unknown values fall back to INFO
///
/// For example `init_log("/data/visiontalk/log", "visiontalk", "INFO")` writes to
/// `/data/visiontalk/log/visiontalk.log`.
fn init_log(dir: &str, name: &str, level: &str) -> Result<(), Box<dyn std::error::Error>> {
    use crate::module::util::path::join;
    use log::LevelFilter;
    use log4rs::append::console::ConsoleAppender;
    use log4rs::append::file::FileAppender;
    use log4rs::config::{Appender, Config, Root};
    use log4rs::encode::pattern::PatternEncoder;

    const PATTERN: &str = "{h({d} - {l}: {m}{n})}";

    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(join(&[dir, &format!("{}.log", name)]))?;
    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);
    let config = Config::builder()
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .appender(Appender::builder().build("console", Box::new(console)))
        .build(
            Root::builder()
                .appender("logfile")
                .appender("console")
                .build(level),
        )?;
    log4rs::init_config(config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{debug, error, info, warn};
    use std::fs;

    // A simple test case for the init_log function
    #[test]
    fn test_log() {
        let dir = tempfile::tempdir().unwrap();
        let dir = dir.path().to_str().unwrap();
        let name = "test_log";

        init_log(dir, name, "INFO").unwrap();

        // Perform some logging
        debug!("Debug Message");
        info!("Info Message");
        warn!("Warning Message");
        error!("Error Message");

        // Read the contents of the log file
        let log_file_path = module::util::path::join(&[dir, "test_log.log"]);
        let log_contents = fs::read_to_string(log_file_path).expect("Failed to read log file");

        // Assert that log messages are present in the file
        assert!(!log_contents.contains("Debug Message"));
        assert!(log_contents.contains("Info Message"));
        assert!(log_contents.contains("Warning Message"));
        assert!(log_contents.contains("Error Message"));
    }
}
