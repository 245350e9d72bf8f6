//! Shader stages and linked programs.
//!
//! Stages are WGSL modules compiled and reflected on the CPU with naga, so
//! compile and link diagnostics never depend on a device. A [`Program`] is
//! the linked pair plus the device objects needed to draw with it.

mod error;
mod interface;
mod program;
mod reflect;
mod source;
mod stage;
mod uniform;

pub use error::{CompileError, LinkError, ProgramError};
pub use interface::ProgramInterface;
pub use program::Program;
pub use reflect::{Resource, ResourceKind, ScalarType, UniformField, ValueType, Varying};
pub use source::ProgramSource;
pub use stage::{ShaderStage, StageKind};
pub use uniform::{UniformUpdate, UniformValue, Uniforms};
