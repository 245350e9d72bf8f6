use std::path::{Path, PathBuf};

/// An image could not be turned into texture data.
///
/// No GPU resource exists for a failed load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read image {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image {} has {channels} channel(s); only RGB and RGBA are supported", path.display())]
    UnsupportedChannels { path: PathBuf, channels: u8 },

    #[error("image {} is empty ({width}x{height})", path.display())]
    Empty {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("pixel data for {} is {actual} bytes, expected {expected}", path.display())]
    SizeMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("image {} is {width}x{height}; the device allows at most {max} per side", path.display())]
    TooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },
}

impl LoadError {
    /// The file (or `<memory>`) the failure refers to.
    pub fn path(&self) -> &Path {
        match self {
            LoadError::Io { path, .. }
            | LoadError::Decode { path, .. }
            | LoadError::UnsupportedChannels { path, .. }
            | LoadError::Empty { path, .. }
            | LoadError::SizeMismatch { path, .. }
            | LoadError::TooLarge { path, .. } => path,
        }
    }
}
