/// Invalid vertex layout or vertex/index data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("attribute layout is empty")]
    EmptyLayout,

    #[error("attribute slot {slot} is out of range (max {max})")]
    SlotOutOfRange { slot: u32, max: u32 },

    #[error("attribute slot {slot} is declared twice")]
    DuplicateSlot { slot: u32 },

    #[error("attribute slot {slot} has {components} components; expected 1 to 4 floats")]
    ComponentCount { slot: u32, components: u32 },

    #[error("stride {stride} must be a non-zero multiple of 4 no larger than {max}")]
    InvalidStride { stride: u32, max: u32 },

    #[error("attribute slot {slot} has stride {stride}, other attributes use {expected}")]
    StrideMismatch { slot: u32, stride: u32, expected: u32 },

    #[error("attribute slot {slot} offset {offset} is not a multiple of 4")]
    UnalignedOffset { slot: u32, offset: u32 },

    #[error("attribute slot {slot} reads bytes {offset}..{end}, past the stride of {stride}")]
    PastStride {
        slot: u32,
        offset: u32,
        end: u32,
        stride: u32,
    },

    #[error("vertex data is empty")]
    NoVertices,

    #[error("index data is present but empty")]
    NoIndices,
}
