//! Path Operations Module
//!
//! This module handles path operations for directories and files.

use std::path::PathBuf;

/// Join Paths
///
/// This function takes a slice of strings as input and joins them into a single path string.
/// It uses the PathBuf type to handle platform-specific separators and conversions.
/// Non UTF-8 components are replaced lossily.
pub fn join(paths: &[&str]) -> String {
    let mut path: PathBuf = PathBuf::new();
    for p in paths {
        path.push(p);
    }
    path.to_string_lossy().into_owned()
}

pub mod dir {
    //! Directory Operations Submodule
    //!
    //! This submodule provides functions for directory operations.

    use std::fs;
    use std::io;
    use std::path::Path;

    use super::{AppDir, AppImg, AppPath};
    use crate::module::define;

    /// Create Directory from Path List
    ///
    /// This function takes a slice of strings as input and creates a directory with the joined path.
    /// It returns the created path, or the io error if the creation fails.
    pub fn create_dir_from_path_list(paths: &[&str]) -> io::Result<String> {
        let path = super::join(paths);
        fs::create_dir_all(Path::new(&path))?;
        Ok(path)
    }

    /// Create Subdirectory in Either Directory
    ///
    /// This function takes two directory paths and a subdirectory name as input and creates a subdirectory in one of them.
    /// It checks if the first directory exists and uses it as the parent directory if it does.
    /// Otherwise, it uses the second directory as the parent directory.
    pub fn create_subdir_in_either_dir(dir1: &str, dir2: &str, name: &str) -> io::Result<String> {
        let parent: &str = match Path::new(dir1).is_dir() {
            true => dir1,
            false => dir2,
        };
        create_dir_from_path_list(&[parent, name])
    }

    /// Create Application Subdirectory and Paths
    ///
    /// The data directory lives in `define::path::PERSISTENT_DIR` when it exists,
    /// otherwise in `define::path::EPHEMERAL_DIR`. Logs get their own subdirectory
    /// inside it, the overlay goes to the ephemeral directory.
    pub fn create_app_sub_dir() -> io::Result<AppPath> {
        let data_dir = create_subdir_in_either_dir(
            define::path::PERSISTENT_DIR,
            define::path::EPHEMERAL_DIR,
            define::system::NAME,
        )?;
        let tmp_dir = create_dir_from_path_list(&[define::path::EPHEMERAL_DIR, define::system::NAME])?;
        create_app_sub_dir_in(&data_dir, &tmp_dir)
    }

    /// Same as [`create_app_sub_dir`] with explicit data and temporary directories.
    pub fn create_app_sub_dir_in(data_dir: &str, tmp_dir: &str) -> io::Result<AppPath> {
        let data_dir = create_dir_from_path_list(&[data_dir])?;
        let tmp_dir = create_dir_from_path_list(&[tmp_dir])?;
        let log_dir = create_dir_from_path_list(&[&data_dir, define::path::LOG_DIR])?;
        Ok(AppPath {
            img: AppImg {
                overlay: super::join(&[&tmp_dir, define::path::OVERLAY_IMAGE]),
            },
            dir: AppDir {
                data: data_dir,
                log: log_dir,
            },
        })
    }
}

/// Paths of Resources
///
/// This struct represents the paths of the resources used by the application.
#[derive(Debug, Clone)]
pub struct AppPath {
    /// Directories Paths
    pub dir: AppDir,
    /// Images Paths
    pub img: AppImg,
}

/// Paths of Directories
#[derive(Debug, Clone)]
pub struct AppDir {
    /// Data Directory Path
    pub data: String,
    /// Log Directory Path
    pub log: String,
}

/// Paths of Images
#[derive(Debug, Clone)]
pub struct AppImg {
    /// Rendered Overlay Path
    pub overlay: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_create_dir_from_path_list() {
        let base = tempfile::tempdir().unwrap();
        let base = base.path().to_str().unwrap();
        let res = dir::create_dir_from_path_list(&[base, "visiontalktest", "nested"]).unwrap();

        // Assert that the directory was created
        assert!(Path::new(&res).is_dir());
        assert_eq!(res, join(&[base, "visiontalktest", "nested"]));
    }

    #[test]
    fn test_create_subdir_in_either_dir() {
        let base = tempfile::tempdir().unwrap();
        let base = base.path().to_str().unwrap();
        let missing = join(&[base, "missing"]);

        // The first directory does not exist, so the second one is used.
        let res = dir::create_subdir_in_either_dir(&missing, base, "either").unwrap();
        assert_eq!(res, join(&[base, "either"]));
        assert!(Path::new(&res).is_dir());
        assert!(!Path::new(&missing).exists());
    }

    #[test]
    fn test_create_app_sub_dir_in() {
        let base = tempfile::tempdir().unwrap();
        let base = base.path().to_str().unwrap();
        let data = join(&[base, "data"]);
        let tmp = join(&[base, "tmp"]);
        let res = dir::create_app_sub_dir_in(&data, &tmp).unwrap();

        // Assert that the data and log directories were created
        assert_eq!(res.dir.data, data);
        assert_eq!(res.dir.log, join(&[&data, "log"]));
        assert!(Path::new(&res.dir.log).is_dir());
        assert!(Path::new(&tmp).is_dir());

        // The overlay lives in the temporary directory
        assert_eq!(res.img.overlay, join(&[&tmp, "overlay.jpg"]));
    }

    #[test]
    fn test_path_join() {
        // Assert that joining two paths works as expected
        assert_eq!(join(&["/test/", "test"]), "/test/test");

        // Assert that joining three paths works as expected
        assert_eq!(join(&["test", "test", "test"]), "test/test/test");

        // Assert that joining two paths with trailing slashes works as expected
        assert_eq!(join(&["/test/", "test/"]), "/test/test/");

        // Assert that joining relative paths works as expected
        assert_eq!(
            join(&["./test/", "test/", "test.txt"]),
            "./test/test/test.txt"
        );
    }
}
