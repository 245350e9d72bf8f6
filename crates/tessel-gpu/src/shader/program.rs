use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashMap};

use wgpu::util::DeviceExt;

use super::reflect::ResourceKind;
use super::{
    LinkError, ProgramError, ProgramInterface, ProgramSource, ShaderStage, StageKind,
    UniformUpdate, UniformValue, Uniforms,
};
use crate::geometry::AttributeLayout;
use crate::render::{Blend, DrawError, DrawState, GpuCtx};
use crate::texture::Texture;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    layout: AttributeLayout,
    format: wgpu::TextureFormat,
    blend: Blend,
}

/// A linked vertex + fragment program.
///
/// Stage sources are compiled and linked on the CPU; the device objects
/// (shader modules, bind group layout, pipeline layout) exist only for a
/// program that linked. Render pipelines are created on first use for each
/// vertex layout / target format / blend combination and cached.
///
/// Uniform values live on the CPU until a draw snapshots them, so a value
/// set between two draws is seen by the second draw only.
pub struct Program {
    interface: ProgramInterface,
    uniforms: RefCell<Uniforms>,

    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: RefCell<HashMap<PipelineKey, wgpu::RenderPipeline>>,
}

impl Program {
    /// Compiles every stage, then links.
    ///
    /// The first stage that fails to compile aborts before any link attempt.
    /// Failures are also written to the error log.
    pub fn compile_and_link(ctx: &GpuCtx<'_>, source: &ProgramSource) -> Result<Self, ProgramError> {
        let stages = source.compile().inspect_err(|err| log::error!("{err}"))?;
        let interface = ProgramInterface::link(&stages).inspect_err(|err| log::error!("{err}"))?;

        let vertex_module = stage_module(ctx.device, &stages, StageKind::Vertex)?;
        let fragment_module = stage_module(ctx.device, &stages, StageKind::Fragment)?;

        let entries: Vec<wgpu::BindGroupLayoutEntry> = interface
            .resources()
            .iter()
            .filter_map(|res| {
                let ty = match res.kind {
                    ResourceKind::Uniform { size, .. } => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(size as u64),
                    },
                    ResourceKind::Texture => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    ResourceKind::Sampler => {
                        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                    }
                    ResourceKind::Unsupported(_) => return None,
                };
                Some(wgpu::BindGroupLayoutEntry {
                    binding: res.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty,
                    count: None,
                })
            })
            .collect();

        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tessel program bgl"),
                entries: &entries,
            });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("tessel program pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        log::debug!(
            "linked program {} + {}: {} resources, {} vertex inputs",
            interface.vertex_entry(),
            interface.fragment_entry(),
            interface.resources().len(),
            interface.vertex_inputs().len()
        );

        let uniforms = RefCell::new(interface.new_uniforms());
        Ok(Self {
            interface,
            uniforms,
            vertex_module,
            fragment_module,
            bind_group_layout,
            pipeline_layout,
            pipelines: RefCell::new(HashMap::new()),
        })
    }

    /// Makes this the program the next draw on `state` runs.
    pub fn use_program<'a>(&'a self, state: &mut DrawState<'a>) {
        state.set_program(self);
    }

    /// Sets a uniform for subsequent draws.
    ///
    /// Names the program does not use are ignored; see [`Uniforms::set`].
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> UniformUpdate {
        self.uniforms.borrow_mut().set(name, value)
    }

    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    pub fn uniforms(&self) -> Ref<'_, Uniforms> {
        self.uniforms.borrow()
    }

    /// Bind group for one draw: a fresh copy of every uniform buffer plus the
    /// textures bound to the units the program samples.
    pub(crate) fn bind_group(
        &self,
        device: &wgpu::Device,
        units: &BTreeMap<u32, &Texture>,
    ) -> Result<wgpu::BindGroup, DrawError> {
        let uniforms = self.uniforms.borrow();
        let resources = self.interface.resources();

        let buffers: BTreeMap<u32, wgpu::Buffer> = resources
            .iter()
            .filter_map(|res| {
                let block = uniforms.block(res.binding)?;
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("tessel uniform ubo"),
                    contents: block,
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                Some((res.binding, buffer))
            })
            .collect();

        let mut entries = Vec::with_capacity(resources.len());
        for res in resources {
            let resource = match res.kind {
                ResourceKind::Uniform { .. } => {
                    let Some(buffer) = buffers.get(&res.binding) else {
                        continue;
                    };
                    buffer.as_entire_binding()
                }
                ResourceKind::Texture => {
                    let texture = texture_on_unit(&uniforms, units, res.binding)?;
                    wgpu::BindingResource::TextureView(texture.view())
                }
                ResourceKind::Sampler => {
                    let texture = texture_on_unit(&uniforms, units, res.binding)?;
                    wgpu::BindingResource::Sampler(texture.sampler())
                }
                ResourceKind::Unsupported(_) => continue,
            };
            entries.push(wgpu::BindGroupEntry {
                binding: res.binding,
                resource,
            });
        }

        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessel program bind group"),
            layout: &self.bind_group_layout,
            entries: &entries,
        }))
    }

    pub(crate) fn pipeline(
        &self,
        device: &wgpu::Device,
        layout: &AttributeLayout,
        format: wgpu::TextureFormat,
        blend: Blend,
    ) -> wgpu::RenderPipeline {
        let key = PipelineKey {
            layout: layout.clone(),
            format,
            blend,
        };
        if let Some(pipeline) = self.pipelines.borrow().get(&key) {
            return pipeline.clone();
        }

        let attributes = layout.wgpu_attributes();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tessel program pipeline"),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.vertex_module,
                entry_point: Some(self.interface.vertex_entry()),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: layout.stride() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.fragment_module,
                entry_point: Some(self.interface.fragment_entry()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: blend.state(),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("created pipeline for {format:?}, {blend:?}, stride {}", layout.stride());
        self.pipelines.borrow_mut().insert(key, pipeline.clone());
        pipeline
    }
}

fn stage_module(
    device: &wgpu::Device,
    stages: &[ShaderStage],
    kind: StageKind,
) -> Result<wgpu::ShaderModule, LinkError> {
    let stage = stages
        .iter()
        .find(|stage| stage.kind() == kind)
        .ok_or_else(|| LinkError {
            log: format!("no {kind} stage attached"),
        })?;

    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(match kind {
            StageKind::Vertex => "tessel vertex stage",
            StageKind::Fragment => "tessel fragment stage",
        }),
        source: wgpu::ShaderSource::Wgsl(stage.source().into()),
    }))
}

fn texture_on_unit<'t>(
    uniforms: &Uniforms,
    units: &BTreeMap<u32, &'t Texture>,
    binding: u32,
) -> Result<&'t Texture, DrawError> {
    let unit = uniforms.unit(binding).unwrap_or(0);
    units
        .get(&unit)
        .copied()
        .ok_or(DrawError::EmptyTextureUnit { unit })
}
