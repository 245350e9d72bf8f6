/// Texture coordinate wrapping, per axis.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Wrap {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    /// Transparent black outside `[0, 1]`; needs
    /// `Features::ADDRESS_MODE_CLAMP_TO_BORDER`, otherwise behaves as
    /// `ClampToEdge`.
    ClampToBorder,
}

/// Texel filtering. The mipmap variants are valid for minification only.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl Filter {
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, Filter::Nearest | Filter::Linear)
    }

    fn texel(self) -> wgpu::FilterMode {
        match self {
            Filter::Nearest | Filter::NearestMipmapNearest | Filter::NearestMipmapLinear => {
                wgpu::FilterMode::Nearest
            }
            Filter::Linear | Filter::LinearMipmapNearest | Filter::LinearMipmapLinear => {
                wgpu::FilterMode::Linear
            }
        }
    }

    fn mipmap(self) -> wgpu::MipmapFilterMode {
        match self {
            Filter::NearestMipmapLinear | Filter::LinearMipmapLinear => {
                wgpu::MipmapFilterMode::Linear
            }
            _ => wgpu::MipmapFilterMode::Nearest,
        }
    }
}

/// Wrap and filter configuration of a texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SamplerState {
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
    pub min_filter: Filter,
    pub mag_filter: Filter,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            wrap_s: Wrap::Repeat,
            wrap_t: Wrap::Repeat,
            min_filter: Filter::LinearMipmapLinear,
            mag_filter: Filter::Linear,
        }
    }
}

impl SamplerState {
    /// Sets wrapping; `t` defaults to `s`.
    pub fn set_wrap(&mut self, s: Wrap, t: Option<Wrap>) {
        self.wrap_s = s;
        self.wrap_t = t.unwrap_or(s);
    }

    /// Sets filtering; `mag` defaults to `min`.
    ///
    /// A mipmap filter cannot magnify: the magnification filter is then left
    /// as it was and `false` is returned.
    pub fn set_filter(&mut self, min: Filter, mag: Option<Filter>) -> bool {
        self.min_filter = min;
        let mag = mag.unwrap_or(min);
        if mag.uses_mipmaps() {
            log::warn!("{mag:?} is not a magnification filter; keeping {:?}", self.mag_filter);
            return false;
        }
        self.mag_filter = mag;
        true
    }

    pub(crate) fn descriptor(&self, features: wgpu::Features) -> wgpu::SamplerDescriptor<'static> {
        let border = features.contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER);
        let address_mode = |wrap: Wrap| match wrap {
            Wrap::Repeat => wgpu::AddressMode::Repeat,
            Wrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
            Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            Wrap::ClampToBorder if border => wgpu::AddressMode::ClampToBorder,
            Wrap::ClampToBorder => {
                log::warn!("device lacks clamp-to-border; clamping to edge");
                wgpu::AddressMode::ClampToEdge
            }
        };
        let uses_border = border
            && (self.wrap_s == Wrap::ClampToBorder || self.wrap_t == Wrap::ClampToBorder);

        wgpu::SamplerDescriptor {
            label: Some("tessel texture sampler"),
            address_mode_u: address_mode(self.wrap_s),
            address_mode_v: address_mode(self.wrap_t),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: self.mag_filter.texel(),
            min_filter: self.min_filter.texel(),
            mipmap_filter: self.min_filter.mipmap(),
            // Without a mipmap filter only the base level is sampled.
            lod_max_clamp: if self.min_filter.uses_mipmaps() { 32.0 } else { 0.0 },
            border_color: uses_border.then_some(wgpu::SamplerBorderColor::TransparentBlack),
            ..Default::default()
        }
    }
}
