//! 2D textures: decoding, mip generation, sampler state and upload.

mod error;
mod mip;
mod pixels;
mod sampler;
mod texture;

pub use error::LoadError;
pub use mip::{mip_chain, mip_level_count};
pub use pixels::{PixelData, PixelFormat};
pub use sampler::{Filter, SamplerState, Wrap};
pub use texture::{Texture, TEXTURE_FORMAT};
