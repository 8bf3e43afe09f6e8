//! ZIP archive extraction.

mod extractor;
pub mod path_safety;

pub use extractor::{Extractor, ExtractorOptions};

use crate::error::Result;
use std::path::Path;

/// Expands every entry of `input` under `destination_dir`.
///
/// Entry names with `..` segments or absolute paths are rejected before
/// anything is written.
pub fn unzip(input: impl AsRef<Path>, destination_dir: impl AsRef<Path>) -> Result<()> {
    Extractor::new(input).exdir(destination_dir).extract()
}
