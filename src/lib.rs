//! Photo-cut transition video generator.
//!
//! Adjacent photo pairs are segmented in parallel, each pair is turned into
//! transition frames by its assigned [`strategy::Strategy`], and the frames
//! are reassembled in photo order and handed to a [`output::VideoEncoder`].

pub mod config;
pub mod error;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod segmentation;
pub mod source;
pub mod strategy;

use image::RgbaImage;
use std::sync::Arc;

/// An input photo. Shared, never mutated.
pub type Photo = Arc<RgbaImage>;

/// One output frame of the timeline.
pub type Frame = Arc<RgbaImage>;
