use wgpu::util::DeviceExt;

use super::{AttributeLayout, GeometryError};
use crate::render::{DrawState, GpuCtx};

/// How a geometry is drawn; fixed when it is created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DrawMode {
    /// Vertices in buffer order.
    Arrays { vertex_count: u32 },
    /// Vertices selected by the index buffer.
    Indexed { index_count: u32 },
}

impl DrawMode {
    /// Mode for the given data, or why the data cannot be uploaded.
    ///
    /// An array draw covers the complete vertices only; trailing floats that
    /// do not fill a whole stride are uploaded but never drawn.
    pub fn for_data(
        vertices: &[f32],
        indices: Option<&[u32]>,
        layout: &AttributeLayout,
    ) -> Result<Self, GeometryError> {
        if vertices.is_empty() {
            return Err(GeometryError::NoVertices);
        }
        let bytes = std::mem::size_of_val(vertices);
        let stride = layout.stride() as usize;
        if bytes % stride != 0 {
            log::warn!(
                "{} trailing bytes of vertex data do not fill a {stride}-byte vertex and are not drawn",
                bytes % stride
            );
        }

        match indices {
            Some([]) => Err(GeometryError::NoIndices),
            Some(indices) => Ok(DrawMode::Indexed {
                index_count: indices.len() as u32,
            }),
            None => Ok(DrawMode::Arrays {
                vertex_count: (bytes / stride) as u32,
            }),
        }
    }
}

/// Vertex data, optional index data and the layout describing the vertices.
///
/// Immutable once created; new data means a new `Geometry`.
pub struct Geometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    mode: DrawMode,
    layout: AttributeLayout,
}

impl Geometry {
    /// Uploads `vertices` verbatim and, if given, `indices`.
    pub fn new(
        ctx: &GpuCtx<'_>,
        vertices: &[f32],
        indices: Option<&[u32]>,
        layout: AttributeLayout,
    ) -> Result<Self, GeometryError> {
        let mode = DrawMode::for_data(vertices, indices, &layout)
            .inspect_err(|err| log::error!("geometry rejected: {err}"))?;

        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("tessel geometry vbo"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = indices.map(|indices| {
            ctx.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("tessel geometry ibo"),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
        });

        let vertex_count = (std::mem::size_of_val(vertices) / layout.stride() as usize) as u32;
        log::debug!(
            "created geometry: {vertex_count} vertices, stride {}, {mode:?}",
            layout.stride()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            vertex_count,
            mode,
            layout,
        })
    }

    /// Makes this the geometry the next draw on `state` consumes.
    pub fn bind<'a>(&'a self, state: &mut DrawState<'a>) {
        state.set_geometry(self);
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.mode
    }

    pub fn layout(&self) -> &AttributeLayout {
        &self.layout
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub(crate) fn record(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match (self.mode, &self.index_buffer) {
            (DrawMode::Indexed { index_count }, Some(ibo)) => {
                rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..index_count, 0, 0..1);
            }
            _ => rpass.draw(0..self.vertex_count, 0..1),
        }
    }
}
