use std::path::{Path, PathBuf};

use super::pixels::IN_MEMORY;
use super::{Filter, LoadError, PixelData, PixelFormat, SamplerState, Wrap, mip_chain};
use crate::render::{DrawState, GpuCtx};

/// Upload format of every texture; RGB sources get an opaque alpha channel.
pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A sampled 2D texture with its full mip chain and its own sampler.
pub struct Texture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    sampler_state: SamplerState,
    device: wgpu::Device,

    width: u32,
    height: u32,
    format: PixelFormat,
}

impl Texture {
    /// Loads an image file.
    ///
    /// Nothing is allocated on the device unless decoding succeeds and the
    /// image fits the device's texture limits.
    pub fn load(ctx: &GpuCtx<'_>, path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let pixels = PixelData::load(path).inspect_err(|err| log::error!("{err}"))?;
        Self::upload(ctx, &pixels, path)
    }

    /// Uploads decoded pixels and every mip level.
    pub fn from_pixels(ctx: &GpuCtx<'_>, pixels: &PixelData) -> Result<Self, LoadError> {
        Self::upload(ctx, pixels, Path::new(IN_MEMORY))
    }

    fn upload(ctx: &GpuCtx<'_>, pixels: &PixelData, path: &Path) -> Result<Self, LoadError> {
        let (width, height) = (pixels.width(), pixels.height());
        let max = ctx.device.limits().max_texture_dimension_2d;
        check_size(width, height, max, path).inspect_err(|err| log::error!("{err}"))?;

        let levels = mip_chain(&pixels.to_rgba8());

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tessel texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in levels.iter().enumerate() {
            let (w, h) = level.dimensions();
            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                level.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * w),
                    rows_per_image: Some(h),
                },
                wgpu::Extent3d {
                    width: w,
                    height: h,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler_state = SamplerState::default();
        let sampler = ctx
            .device
            .create_sampler(&sampler_state.descriptor(ctx.device.features()));

        log::debug!(
            "uploaded {width}x{height} {:?} texture, {} mip levels",
            pixels.format(),
            levels.len()
        );

        Ok(Self {
            texture,
            view,
            sampler,
            sampler_state,
            device: ctx.device.clone(),
            width,
            height,
            format: pixels.format(),
        })
    }

    /// Sets wrapping on both axes; `t` defaults to `s`. Applies immediately.
    pub fn set_wrap(&mut self, s: Wrap, t: Option<Wrap>) {
        self.sampler_state.set_wrap(s, t);
        self.rebuild_sampler();
    }

    /// Sets filtering; `mag` defaults to `min`. Applies immediately.
    ///
    /// Returns `false` when the magnification filter was a mipmap filter and
    /// was left unchanged.
    pub fn set_filter(&mut self, min: Filter, mag: Option<Filter>) -> bool {
        let accepted = self.sampler_state.set_filter(min, mag);
        self.rebuild_sampler();
        accepted
    }

    /// Samples the active texture unit of `state` from this texture.
    pub fn bind<'a>(&'a self, state: &mut DrawState<'a>) {
        state.bind_texture(self);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Format of the source pixels.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn mip_levels(&self) -> u32 {
        self.texture.mip_level_count()
    }

    pub fn sampler_state(&self) -> SamplerState {
        self.sampler_state
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub(crate) fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub(crate) fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    fn rebuild_sampler(&mut self) {
        let desc = self.sampler_state.descriptor(self.device.features());
        self.sampler = self.device.create_sampler(&desc);
    }
}

fn check_size(width: u32, height: u32, max: u32, path: &Path) -> Result<(), LoadError> {
    if width > max || height > max {
        return Err(LoadError::TooLarge {
            path: PathBuf::from(path),
            width,
            height,
            max,
        });
    }
    Ok(())
}
