use std::path::{Path, PathBuf};

use super::LoadError;

pub(crate) const IN_MEMORY: &str = "<memory>";

/// Upload layout, fixed by the source channel count.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    /// Three channels, opaque.
    Rgb,
    /// Four channels, with alpha.
    Rgba,
}

impl PixelFormat {
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            3 => Some(PixelFormat::Rgb),
            4 => Some(PixelFormat::Rgba),
            _ => None,
        }
    }

    pub fn channels(self) -> u8 {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        self == PixelFormat::Rgba
    }
}

/// Decoded 8-bit pixels, bottom row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelData {
    width: u32,
    height: u32,
    format: PixelFormat,
    bytes: Vec<u8>,
}

impl PixelData {
    /// Reads and decodes an image file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        decode_from(path, &bytes)
    }

    /// Decodes an encoded image (PNG, JPEG, BMP, TGA) held in memory.
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadError> {
        decode_from(Path::new(IN_MEMORY), bytes)
    }

    /// Wraps raw pixels, already bottom row first.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        bytes: Vec<u8>,
    ) -> Result<Self, LoadError> {
        let path = PathBuf::from(IN_MEMORY);
        if width == 0 || height == 0 {
            return Err(LoadError::Empty {
                path,
                width,
                height,
            });
        }
        let expected = width as usize * height as usize * format.channels() as usize;
        if bytes.len() != expected {
            return Err(LoadError::SizeMismatch {
                path,
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            bytes,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Pixel at (`x`, `y`), `y` counted from the bottom row.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        (x < self.width && y < self.height).then(|| self.texel(x, y))
    }

    /// RGBA copy of the pixels; RGB gets an opaque alpha channel.
    pub fn to_rgba8(&self) -> image::RgbaImage {
        let (width, height) = (self.width, self.height);
        match self.format {
            PixelFormat::Rgba => image::RgbaImage::from_fn(width, height, |x, y| {
                let p = self.texel(x, y);
                image::Rgba([p[0], p[1], p[2], p[3]])
            }),
            PixelFormat::Rgb => image::RgbaImage::from_fn(width, height, |x, y| {
                let p = self.texel(x, y);
                image::Rgba([p[0], p[1], p[2], u8::MAX])
            }),
        }
    }

    fn texel(&self, x: u32, y: u32) -> &[u8] {
        let channels = self.format.channels() as usize;
        let start = (y as usize * self.width as usize + x as usize) * channels;
        &self.bytes[start..start + channels]
    }
}

fn decode_from(path: &Path, bytes: &[u8]) -> Result<PixelData, LoadError> {
    let image = image::load_from_memory(bytes).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let channels = image.color().channel_count();
    let Some(format) = PixelFormat::from_channels(channels) else {
        return Err(LoadError::UnsupportedChannels {
            path: path.to_path_buf(),
            channels,
        });
    };
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
            width,
            height,
        });
    }

    // Row 0 of the texture is the bottom of the image.
    let image = image.flipv();
    let bytes = match format {
        PixelFormat::Rgb => image.into_rgb8().into_raw(),
        PixelFormat::Rgba => image.into_rgba8().into_raw(),
    };

    log::debug!("decoded {} ({width}x{height}, {format:?})", path.display());
    Ok(PixelData {
        width,
        height,
        format,
        bytes,
    })
}
