use super::PhotoSource;
use crate::Photo;
use anyhow::{ensure, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File extensions recognised as photos (compared case-insensitively).
pub const PHOTO_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PHOTO_EXTENSIONS.iter().any(|p| ext.eq_ignore_ascii_case(p)))
}

fn load_photo(path: &Path) -> Result<Photo> {
    let decoded = image::open(path)
        .with_context(|| format!("Failed to decode photo {}", path.display()))?;
    Ok(Arc::new(decoded.to_rgba8()))
}

/// Every photo in a directory, ordered by file name.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Photo paths in load order.
    pub fn paths(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read photo directory {}", self.dir.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_photo(&path) {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }
}

impl PhotoSource for DirectorySource {
    fn load(&self) -> Result<Vec<Photo>> {
        let paths = self.paths()?;
        ensure!(
            !paths.is_empty(),
            "no photos ({}) in {}",
            PHOTO_EXTENSIONS.join("/"),
            self.dir.display()
        );
        tracing::info!("Loading {} photos from {}", paths.len(), self.dir.display());
        paths.iter().map(|p| load_photo(p)).collect()
    }
}

/// An explicit, ordered list of photo files.
pub struct FileListSource {
    paths: Vec<PathBuf>,
}

impl FileListSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl PhotoSource for FileListSource {
    fn load(&self) -> Result<Vec<Photo>> {
        tracing::info!("Loading {} photos", self.paths.len());
        self.paths.iter().map(|p| load_photo(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_photo(dir: &Path, name: &str, shade: u8) {
        RgbaImage::from_pixel(4, 3, Rgba([shade, shade, shade, 255]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn directory_source_sorts_by_name_and_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        write_photo(dir.path(), "02.png", 20);
        write_photo(dir.path(), "01.PNG", 10);
        write_photo(dir.path(), "03.png", 30);
        std::fs::write(dir.path().join("notes.txt"), b"not a photo").unwrap();
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let photos = DirectorySource::new(dir.path()).load().unwrap();
        let shades: Vec<u8> = photos.iter().map(|p| p.get_pixel(0, 0)[0]).collect();
        assert_eq!(shades, vec![10, 20, 30]);
        assert_eq!(photos[0].dimensions(), (4, 3));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DirectorySource::new(dir.path()).load().is_err());
    }

    #[test]
    fn file_list_keeps_given_order() {
        let dir = tempfile::tempdir().unwrap();
        write_photo(dir.path(), "a.png", 1);
        write_photo(dir.path(), "b.png", 2);
        let source = FileListSource::new(vec![dir.path().join("b.png"), dir.path().join("a.png")]);
        let shades: Vec<u8> = source.load().unwrap().iter().map(|p| p.get_pixel(0, 0)[0]).collect();
        assert_eq!(shades, vec![2, 1]);
    }

    #[test]
    fn undecodable_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.jpg");
        std::fs::write(&bogus, b"garbage").unwrap();
        let err = FileListSource::new(vec![bogus]).load().unwrap_err();
        assert!(format!("{err:#}").contains("bogus.jpg"));
    }
}
