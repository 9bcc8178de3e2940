//! Image forensics application layer: file loading and report rendering
//! around `forensic_core`.

pub mod loader;
pub mod report;

pub use loader::{collect_files, load_image, LoadedImage, IMAGE_EXTENSIONS};
