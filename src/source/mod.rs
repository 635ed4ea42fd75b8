mod files;

pub use files::{DirectorySource, FileListSource, PHOTO_EXTENSIONS};

use crate::Photo;
use anyhow::Result;

/// Trait for photo sources
pub trait PhotoSource {
    /// Load every photo, in timeline order.
    fn load(&self) -> Result<Vec<Photo>>;
}
