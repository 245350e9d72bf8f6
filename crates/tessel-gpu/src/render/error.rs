use wgpu::TextureFormat;

use crate::shader::ValueType;

/// Reasons a draw call is refused before anything is recorded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error("no program is in use")]
    NoProgram,

    #[error("no geometry is bound")]
    NoGeometry,

    #[error("the program samples texture unit {unit}, which has no texture bound")]
    EmptyTextureUnit { unit: u32 },

    #[error("vertex input at location {location} is not fed by any attribute of the bound geometry")]
    UnfedVertexInput { location: u32 },

    #[error("vertex input at location {location} has type {ty}, but geometry attributes are f32")]
    NonFloatVertexInput { location: u32, ty: ValueType },

    #[error("fragment output @location(0) has type {output}, which cannot be written to a {format:?} target")]
    IncompatibleTarget { format: TextureFormat, output: ValueType },

    #[error("{format:?} targets do not support blending")]
    UnblendableTarget { format: TextureFormat },
}
