use super::GeometryError;

/// Attribute slots a layout may use.
pub const MAX_VERTEX_ATTRIBUTES: u32 = 16;
/// Largest vertex record, in bytes.
pub const MAX_STRIDE: u32 = 2048;

const FLOAT_SIZE: u32 = std::mem::size_of::<f32>() as u32;

/// How one shader input slot reads `components` floats from each vertex
/// record of `stride` bytes, starting `offset` bytes into the record.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    pub slot: u32,
    pub components: u32,
    pub stride: u32,
    pub offset: u32,
}

impl VertexAttribute {
    pub const fn new(slot: u32, components: u32, stride: u32, offset: u32) -> Self {
        Self {
            slot,
            components,
            stride,
            offset,
        }
    }

    /// Byte offset just past the last float this attribute reads.
    pub fn end(&self) -> u32 {
        self.offset + self.components * FLOAT_SIZE
    }

    fn format(&self) -> wgpu::VertexFormat {
        match self.components {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// A validated, ordered set of attributes over one interleaved buffer.
///
/// Which slots the shader actually reads is not checked here; a slot the
/// shader does not declare is simply unused.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct AttributeLayout {
    attributes: Vec<VertexAttribute>,
    stride: u32,
}

impl AttributeLayout {
    pub fn new(
        attributes: impl IntoIterator<Item = VertexAttribute>,
    ) -> Result<Self, GeometryError> {
        let attributes: Vec<VertexAttribute> = attributes.into_iter().collect();
        let Some(first) = attributes.first() else {
            return Err(GeometryError::EmptyLayout);
        };
        let stride = first.stride;
        if stride == 0 || stride % FLOAT_SIZE != 0 || stride > MAX_STRIDE {
            return Err(GeometryError::InvalidStride {
                stride,
                max: MAX_STRIDE,
            });
        }

        let mut seen = 0u32;
        for attr in &attributes {
            let slot = attr.slot;
            if slot >= MAX_VERTEX_ATTRIBUTES {
                return Err(GeometryError::SlotOutOfRange {
                    slot,
                    max: MAX_VERTEX_ATTRIBUTES - 1,
                });
            }
            if seen & (1 << slot) != 0 {
                return Err(GeometryError::DuplicateSlot { slot });
            }
            seen |= 1 << slot;

            if !(1..=4).contains(&attr.components) {
                return Err(GeometryError::ComponentCount {
                    slot,
                    components: attr.components,
                });
            }
            if attr.stride != stride {
                return Err(GeometryError::StrideMismatch {
                    slot,
                    stride: attr.stride,
                    expected: stride,
                });
            }
            if attr.offset % FLOAT_SIZE != 0 {
                return Err(GeometryError::UnalignedOffset {
                    slot,
                    offset: attr.offset,
                });
            }
            if attr.end() > stride {
                return Err(GeometryError::PastStride {
                    slot,
                    offset: attr.offset,
                    end: attr.end(),
                    stride,
                });
            }
        }

        Ok(Self { attributes, stride })
    }

    /// Tightly packed attributes on slots `0..n`, in order.
    ///
    /// `interleaved(&[3, 3, 2])` is position, color, uv over a 32-byte record.
    pub fn interleaved(components: &[u32]) -> Result<Self, GeometryError> {
        let stride = components.iter().sum::<u32>() * FLOAT_SIZE;
        let mut offset = 0;
        let attributes = components.iter().zip(0..).map(|(&n, slot)| {
            let attr = VertexAttribute::new(slot, n, stride, offset);
            offset += n * FLOAT_SIZE;
            attr
        });
        Self::new(attributes.collect::<Vec<_>>())
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Whether some attribute feeds shader input `slot`.
    pub fn feeds(&self, slot: u32) -> bool {
        self.attributes.iter().any(|a| a.slot == slot)
    }

    pub(crate) fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: a.format(),
                offset: a.offset as wgpu::BufferAddress,
                shader_location: a.slot,
            })
            .collect()
    }
}
