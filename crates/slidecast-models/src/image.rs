//! Image references flowing from the supply resolver into the compositor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which supplier produced an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// Downloaded from Pexels search
    Pexels,
    /// Downloaded from Pixabay search
    Pixabay,
    /// Downloaded from a caller-supplied URL
    Custom,
    /// Synthesized placeholder frame
    Placeholder,
}

impl ImageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSource::Pexels => "pexels",
            ImageSource::Pixabay => "pixabay",
            ImageSource::Custom => "custom",
            ImageSource::Placeholder => "placeholder",
        }
    }
}

/// A resolved local image ready for composition.
///
/// Created by the supply resolver, consumed read-only by the compositor,
/// and deleted with the job's scratch directory after render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageReference {
    /// Local path of the downloaded or synthesized file
    pub local_path: PathBuf,
    /// Supplier that produced the image
    pub source: ImageSource,
    /// Position in the display order
    pub ordinal: usize,
}

impl ImageReference {
    pub fn new(local_path: impl Into<PathBuf>, source: ImageSource, ordinal: usize) -> Self {
        Self {
            local_path: local_path.into(),
            source,
            ordinal,
        }
    }

    /// True when this image was synthesized rather than fetched.
    pub fn is_placeholder(&self) -> bool {
        self.source == ImageSource::Placeholder
    }
}
