//! Tessel GPU crate.
//!
//! A small resource layer over wgpu: shader programs compiled from WGSL
//! stages, textures decoded from image files, and geometry bindings over
//! interleaved vertex data. Draws go through an explicit [`DrawState`] that
//! stands in for the "current program / texture unit / vertex array" state
//! of OpenGL-style APIs.
//!
//! ```no_run
//! use tessel_gpu::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let gpu = Gpu::new_blocking(GpuInit::default())?;
//! let ctx = gpu.ctx();
//! let target = gpu.create_offscreen(256, 256, wgpu::TextureFormat::Rgba8Unorm);
//!
//! let source = ProgramSource::from_files("shaders/quad.vert.wgsl", "shaders/quad.frag.wgsl")?;
//! let program = Program::compile_and_link(&ctx, &source)?;
//! let texture = Texture::load(&ctx, "textures/wall.png")?;
//! let quad = Geometry::new(
//!     &ctx,
//!     &[
//!         -1.0, -1.0, 0.0, 0.0, //
//!         1.0, -1.0, 1.0, 0.0, //
//!         1.0, 1.0, 1.0, 1.0, //
//!         -1.0, 1.0, 0.0, 1.0,
//!     ],
//!     Some(&[0, 1, 2, 2, 3, 0]),
//!     AttributeLayout::interleaved(&[2, 2])?,
//! )?;
//!
//! let mut frame = gpu.begin_frame();
//! {
//!     let mut rt = target.target(&mut frame.encoder);
//!     rt.clear([0.1, 0.1, 0.1, 1.0]);
//!
//!     let mut state = DrawState::new();
//!     program.use_program(&mut state);
//!     state.active_texture(0);
//!     texture.bind(&mut state);
//!     quad.bind(&mut state);
//!     program.set_uniform("alpha", 0.5f32);
//!     state.draw(&ctx, &mut rt)?;
//! }
//! gpu.submit(frame);
//! # Ok(())
//! # }
//! ```

pub mod device;
pub mod geometry;
pub mod logging;
pub mod render;
pub mod shader;
pub mod texture;

/// The types most callers need.
pub mod prelude {
    pub use crate::device::{Gpu, GpuInit, OffscreenTarget};
    pub use crate::geometry::{AttributeLayout, DrawMode, Geometry, VertexAttribute};
    pub use crate::render::{Blend, DrawState, GpuCtx, RenderTarget};
    pub use crate::shader::{Program, ProgramSource, StageKind};
    pub use crate::texture::{Filter, Texture, Wrap};
}
