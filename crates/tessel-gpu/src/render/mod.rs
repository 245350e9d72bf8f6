//! Draw-time binding state.
//!
//! OpenGL-style APIs act on an implicitly selected "current" program, texture
//! per unit and vertex array. Here that state lives in an explicit
//! [`DrawState`]: `Program::use_program`, `Texture::bind` and `Geometry::bind`
//! write into it, and [`DrawState::draw`] records one draw call from whatever
//! is bound at that moment.
//!
//! Ordering: a bind is visible to the very next draw and to every later one
//! until it is replaced. Uniform values are captured per draw, so changing a
//! uniform between two draws in the same frame affects only the second.

mod ctx;
mod error;
mod state;

pub use ctx::{GpuCtx, RenderTarget};
pub use error::DrawError;
pub use state::{Blend, DrawState};
