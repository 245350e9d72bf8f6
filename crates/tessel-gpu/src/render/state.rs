use std::collections::BTreeMap;

use super::{DrawError, GpuCtx, RenderTarget};
use crate::geometry::Geometry;
use crate::shader::Program;
use crate::texture::Texture;

/// Color blending applied by the next draw.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Blend {
    /// Source replaces destination (blending disabled).
    #[default]
    Replace,
    /// `src * src.a + dst * (1 - src.a)` on every channel, alpha included.
    Alpha,
}

impl Blend {
    pub(crate) fn state(self) -> Option<wgpu::BlendState> {
        match self {
            Blend::Replace => None,
            Blend::Alpha => Some(straight_alpha_blend()),
        }
    }
}

/// Whether `format` accepts a blend state on every device with `features`.
pub(crate) fn blendable(format: wgpu::TextureFormat, features: wgpu::Features) -> bool {
    let flags = format.guaranteed_format_features(features).flags;
    flags.contains(wgpu::TextureFormatFeatureFlags::BLENDABLE | wgpu::TextureFormatFeatureFlags::FILTERABLE)
}

fn straight_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

/// The "current" program, geometry and texture units for the next draw.
///
/// Binding borrows the resource, so nothing can be destroyed while it is
/// bound. Create one per frame (or per batch of draws) and rebind whatever
/// may have changed since the last draw.
#[derive(Default)]
pub struct DrawState<'a> {
    program: Option<&'a Program>,
    geometry: Option<&'a Geometry>,
    active_unit: u32,
    units: BTreeMap<u32, &'a Texture>,
    blend: Blend,
}

impl<'a> DrawState<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the texture unit the next `Texture::bind` targets.
    pub fn active_texture(&mut self, unit: u32) {
        self.active_unit = unit;
    }

    pub fn active_unit(&self) -> u32 {
        self.active_unit
    }

    pub fn set_blend(&mut self, blend: Blend) {
        self.blend = blend;
    }

    pub fn blend(&self) -> Blend {
        self.blend
    }

    pub fn program(&self) -> Option<&'a Program> {
        self.program
    }

    pub fn geometry(&self) -> Option<&'a Geometry> {
        self.geometry
    }

    /// Texture currently bound to `unit`, if any.
    pub fn texture(&self, unit: u32) -> Option<&'a Texture> {
        self.units.get(&unit).copied()
    }

    pub(crate) fn set_program(&mut self, program: &'a Program) {
        self.program = Some(program);
    }

    pub(crate) fn set_geometry(&mut self, geometry: &'a Geometry) {
        self.geometry = Some(geometry);
    }

    pub(crate) fn bind_texture(&mut self, texture: &'a Texture) {
        self.units.insert(self.active_unit, texture);
    }

    /// Records one draw of the bound geometry with the current program.
    ///
    /// Geometry created with indices is drawn indexed, other geometry as a
    /// plain vertex array. Nothing is recorded when an error is returned.
    pub fn draw(&self, ctx: &GpuCtx<'_>, target: &mut RenderTarget<'_>) -> Result<(), DrawError> {
        let program = self.program.ok_or(DrawError::NoProgram)?;
        let geometry = self.geometry.ok_or(DrawError::NoGeometry)?;

        program.interface().check_vertex_layout(geometry.layout())?;
        program.interface().check_target(target.format)?;
        if self.blend == Blend::Alpha && !blendable(target.format, ctx.device.features()) {
            return Err(DrawError::UnblendableTarget {
                format: target.format,
            });
        }
        let bind_group = program.bind_group(ctx.device, &self.units)?;
        let pipeline = program.pipeline(ctx.device, geometry.layout(), target.format, self.blend);

        let mut rpass = target.begin_pass(wgpu::LoadOp::Load);
        rpass.set_pipeline(&pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        geometry.record(&mut rpass);

        log::trace!("draw recorded: {:?}", geometry.draw_mode());
        Ok(())
    }
}
