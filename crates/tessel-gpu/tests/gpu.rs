//! Device-backed tests. Each test skips when no adapter is available.

use tessel_gpu::device::{Gpu, GpuInit, OffscreenTarget};
use tessel_gpu::geometry::{AttributeLayout, DrawMode, Geometry, VertexAttribute};
use tessel_gpu::logging::{LoggingConfig, init_logging};
use tessel_gpu::render::{Blend, DrawError, DrawState};
use tessel_gpu::shader::{
    Program, ProgramError, ProgramSource, ScalarType, StageKind, UniformUpdate, ValueType,
};
use tessel_gpu::texture::{
    Filter, LoadError, PixelData, PixelFormat, SamplerState, Texture, Wrap,
};

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const SOLID_VS: &str = "
    @vertex
    fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
        return vec4<f32>(position, 1.0);
    }
";

const SOLID_FS: &str = "
    @fragment
    fn fs_main() -> @location(0) vec4<f32> {
        return vec4<f32>(1.0, 0.5, 0.0, 1.0);
    }
";

const TEXTURED_VS: &str = "
    struct VertexOutput {
        @builtin(position) clip: vec4<f32>,
        @location(0) uv: vec2<f32>,
    };

    @vertex
    fn vs_main(@location(0) position: vec2<f32>, @location(1) uv: vec2<f32>) -> VertexOutput {
        var out: VertexOutput;
        out.clip = vec4<f32>(position, 0.0, 1.0);
        out.uv = uv;
        return out;
    }
";

const TEXTURED_FS: &str = "
    @group(0) @binding(0) var wall: texture_2d<f32>;
    @group(0) @binding(1) var wall_sampler: sampler;
    @group(0) @binding(2) var<uniform> alpha: f32;

    @fragment
    fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
        let texel = textureSample(wall, wall_sampler, uv);
        return vec4<f32>(texel.rgb, texel.a * alpha);
    }
";

const TRIANGLE: [f32; 9] = [-0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.0, 0.5, 0.0];

const QUAD: [f32; 16] = [
    -1.0, -1.0, 0.0, 0.0, //
    1.0, -1.0, 1.0, 0.0, //
    1.0, 1.0, 1.0, 1.0, //
    -1.0, 1.0, 0.0, 1.0,
];
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

fn gpu() -> Option<Gpu> {
    init_logging(LoggingConfig::for_tests());
    match Gpu::new_blocking(GpuInit::default()) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping: no GPU adapter available ({err:#})");
            None
        }
    }
}

fn red_pixels() -> PixelData {
    PixelData::new(2, 2, PixelFormat::Rgb, [255, 0, 0].repeat(4)).unwrap()
}

fn textured_program(gpu: &Gpu) -> Program {
    let source = ProgramSource::vertex_fragment(TEXTURED_VS, TEXTURED_FS);
    Program::compile_and_link(&gpu.ctx(), &source).unwrap()
}

fn quad(gpu: &Gpu) -> Geometry {
    let layout = AttributeLayout::interleaved(&[2, 2]).unwrap();
    Geometry::new(&gpu.ctx(), &QUAD, Some(&QUAD_INDICES[..]), layout).unwrap()
}

fn offscreen(gpu: &Gpu) -> OffscreenTarget {
    gpu.create_offscreen(16, 16, FORMAT)
}

/// Copies an RGBA8 target back to the CPU, top row first.
fn read_pixels(gpu: &Gpu, target: &OffscreenTarget) -> Vec<Vec<[u8; 4]>> {
    let (width, height) = target.size();
    let padded = (width * 4).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
    let buffer = gpu.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback"),
        size: u64::from(padded * height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut frame = gpu.begin_frame();
    frame.encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: target.texture(),
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    gpu.submit(frame);

    let slice = buffer.slice(..);
    slice.map_async(wgpu::MapMode::Read, |result| result.unwrap());
    gpu.device()
        .poll(wgpu::PollType::wait_indefinitely())
        .unwrap();
    let data = slice.get_mapped_range();
    data.chunks(padded as usize)
        .map(|row| {
            row[..(width * 4) as usize]
                .chunks_exact(4)
                .map(|px| [px[0], px[1], px[2], px[3]])
                .collect()
        })
        .collect()
}

/// Draws `texture` over the whole of `target` with blending off.
fn draw_fullscreen(gpu: &Gpu, texture: &Texture, target: &OffscreenTarget) {
    let ctx = gpu.ctx();
    let program = textured_program(gpu);
    let quad = quad(gpu);
    assert_eq!(program.set_uniform("alpha", 1.0f32), UniformUpdate::Written);

    let mut frame = gpu.begin_frame();
    {
        let mut rt = target.target(&mut frame.encoder);
        rt.clear([0.0, 0.0, 1.0, 1.0]);

        let mut state = DrawState::new();
        program.use_program(&mut state);
        texture.bind(&mut state);
        quad.bind(&mut state);
        state.draw(&ctx, &mut rt).unwrap();
    }
    gpu.submit(frame);
}

#[test]
fn triangle_array_draw() {
    let Some(gpu) = gpu() else { return };
    let ctx = gpu.ctx();

    let source = ProgramSource::vertex_fragment(SOLID_VS, SOLID_FS);
    let program = Program::compile_and_link(&ctx, &source).unwrap();
    let layout = AttributeLayout::new([VertexAttribute::new(0, 3, 12, 0)]).unwrap();
    let triangle = Geometry::new(&ctx, &TRIANGLE, None, layout).unwrap();
    assert_eq!(triangle.draw_mode(), DrawMode::Arrays { vertex_count: 3 });

    let target = offscreen(&gpu);
    let mut frame = gpu.begin_frame();
    {
        let mut rt = target.target(&mut frame.encoder);
        rt.clear([0.0, 0.0, 0.0, 1.0]);

        let mut state = DrawState::new();
        program.use_program(&mut state);
        triangle.bind(&mut state);
        state.draw(&ctx, &mut rt).unwrap();
    }
    gpu.submit(frame);
}

#[test]
fn textured_quad_indexed_draw_with_blending() {
    let Some(gpu) = gpu() else { return };
    let ctx = gpu.ctx();

    let program = textured_program(&gpu);
    let mut texture = Texture::from_pixels(&ctx, &red_pixels()).unwrap();
    texture.set_wrap(Wrap::ClampToEdge, None);
    texture.set_filter(Filter::Nearest, Some(Filter::Linear));
    let quad = quad(&gpu);
    assert_eq!(quad.draw_mode(), DrawMode::Indexed { index_count: 6 });

    let target = offscreen(&gpu);
    let mut frame = gpu.begin_frame();
    {
        let mut rt = target.target(&mut frame.encoder);
        rt.clear([0.0, 0.0, 1.0, 1.0]);

        let mut state = DrawState::new();
        state.set_blend(Blend::Alpha);
        program.use_program(&mut state);
        state.active_texture(0);
        texture.bind(&mut state);
        quad.bind(&mut state);

        assert_eq!(program.set_uniform("alpha", 0.25f32), UniformUpdate::Written);
        state.draw(&ctx, &mut rt).unwrap();
        assert_eq!(program.set_uniform("alpha", 1.0f32), UniformUpdate::Written);
        state.draw(&ctx, &mut rt).unwrap();
    }
    gpu.submit(frame);
}

#[test]
fn textures_move_between_units() {
    let Some(gpu) = gpu() else { return };
    let ctx = gpu.ctx();

    let program = textured_program(&gpu);
    let texture = Texture::from_pixels(&ctx, &red_pixels()).unwrap();
    let quad = quad(&gpu);

    let target = offscreen(&gpu);
    let mut frame = gpu.begin_frame();
    {
        let mut rt = target.target(&mut frame.encoder);
        let mut state = DrawState::new();
        program.use_program(&mut state);
        quad.bind(&mut state);
        state.active_texture(3);
        texture.bind(&mut state);

        assert_eq!(
            state.draw(&ctx, &mut rt),
            Err(DrawError::EmptyTextureUnit { unit: 0 })
        );

        assert_eq!(program.set_uniform("wall", 3i32), UniformUpdate::TextureUnit(3));
        state.draw(&ctx, &mut rt).unwrap();
    }
    gpu.submit(frame);
}

#[test]
fn draw_requires_program_and_geometry() {
    let Some(gpu) = gpu() else { return };
    let ctx = gpu.ctx();
    let program = textured_program(&gpu);

    let target = offscreen(&gpu);
    let mut frame = gpu.begin_frame();
    let mut rt = target.target(&mut frame.encoder);

    let mut state = DrawState::new();
    assert_eq!(state.draw(&ctx, &mut rt), Err(DrawError::NoProgram));

    program.use_program(&mut state);
    assert_eq!(state.draw(&ctx, &mut rt), Err(DrawError::NoGeometry));
}

#[test]
fn unfed_vertex_input_is_refused() {
    let Some(gpu) = gpu() else { return };
    let ctx = gpu.ctx();
    let program = textured_program(&gpu);
    let texture = Texture::from_pixels(&ctx, &red_pixels()).unwrap();

    // Position only: nothing feeds the uv input at location 1.
    let layout = AttributeLayout::new([VertexAttribute::new(0, 2, 16, 0)]).unwrap();
    let geometry = Geometry::new(&ctx, &QUAD, None, layout).unwrap();

    let target = offscreen(&gpu);
    let mut frame = gpu.begin_frame();
    let mut rt = target.target(&mut frame.encoder);

    let mut state = DrawState::new();
    program.use_program(&mut state);
    texture.bind(&mut state);
    geometry.bind(&mut state);
    assert_eq!(
        state.draw(&ctx, &mut rt),
        Err(DrawError::UnfedVertexInput { location: 1 })
    );
}

#[test]
fn unused_uniform_is_ignored() {
    let Some(gpu) = gpu() else { return };
    let program = textured_program(&gpu);

    assert_eq!(program.set_uniform("brightness", 2.0f32), UniformUpdate::NotFound);
    assert!(!program.uniforms().contains("brightness"));
}

#[test]
fn broken_stage_fails_before_linking() {
    let Some(gpu) = gpu() else { return };
    let source = ProgramSource::vertex_fragment(SOLID_VS, "@fragment fn fs_main( {");

    match Program::compile_and_link(&gpu.ctx(), &source) {
        Err(ProgramError::Compile(err)) => assert_eq!(err.stage, StageKind::Fragment),
        Err(other) => panic!("expected a compile error, got {other}"),
        Ok(_) => panic!("broken fragment stage linked"),
    }
}

#[test]
fn mismatched_stages_fail_to_link() {
    let Some(gpu) = gpu() else { return };
    // The fragment stage reads a uv the solid vertex stage never writes.
    let source = ProgramSource::vertex_fragment(SOLID_VS, TEXTURED_FS);

    match Program::compile_and_link(&gpu.ctx(), &source) {
        Err(ProgramError::Link(err)) => assert!(err.log.contains("@location(0)"), "{}", err.log),
        Err(other) => panic!("expected a link error, got {other}"),
        Ok(_) => panic!("mismatched stages linked"),
    }
}

#[test]
fn texture_loads_from_file() {
    let Some(gpu) = gpu() else { return };
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("red.png");
    image::RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0]))
        .save(&path)
        .unwrap();

    let texture = Texture::load(&gpu.ctx(), &path).unwrap();
    assert_eq!((texture.width(), texture.height()), (2, 2));
    assert_eq!(texture.format(), PixelFormat::Rgb);
    assert_eq!(texture.mip_levels(), 2);
    assert_eq!(texture.sampler_state(), SamplerState::default());
}

#[test]
fn unsupported_image_allocates_nothing() {
    let Some(gpu) = gpu() else { return };
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gray.png");
    image::GrayImage::from_pixel(2, 2, image::Luma([7]))
        .save(&path)
        .unwrap();

    let err = Texture::load(&gpu.ctx(), &path).err().unwrap();
    assert!(matches!(err, LoadError::UnsupportedChannels { channels: 1, .. }));
}

#[test]
fn solid_red_texture_samples_opaque_red_everywhere() {
    let Some(gpu) = gpu() else { return };
    let texture = Texture::from_pixels(&gpu.ctx(), &red_pixels()).unwrap();
    assert_eq!(texture.mip_levels(), 2);

    let target = offscreen(&gpu);
    draw_fullscreen(&gpu, &texture, &target);

    let pixels = read_pixels(&gpu, &target);
    assert_eq!(pixels.len(), 16);
    for row in &pixels {
        assert_eq!(row.len(), 16);
        assert!(row.iter().all(|px| *px == [255, 0, 0, 255]), "{row:?}");
    }
}

#[test]
fn image_top_row_lands_at_the_top_of_the_target() {
    let Some(gpu) = gpu() else { return };
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stripe.png");
    let mut image = image::RgbImage::new(1, 2);
    image.put_pixel(0, 0, image::Rgb([255, 255, 255]));
    image.put_pixel(0, 1, image::Rgb([0, 0, 0]));
    image.save(&path).unwrap();

    let mut texture = Texture::load(&gpu.ctx(), &path).unwrap();
    texture.set_wrap(Wrap::ClampToEdge, None);
    texture.set_filter(Filter::Nearest, None);

    let target = gpu.create_offscreen(4, 4, FORMAT);
    draw_fullscreen(&gpu, &texture, &target);

    let pixels = read_pixels(&gpu, &target);
    for row in &pixels[..2] {
        assert!(row.iter().all(|px| *px == [255, 255, 255, 255]), "{pixels:?}");
    }
    for row in &pixels[2..] {
        assert!(row.iter().all(|px| *px == [0, 0, 0, 255]), "{pixels:?}");
    }
}

#[test]
fn oversized_image_allocates_nothing() {
    let Some(gpu) = gpu() else { return };
    let max = gpu.device().limits().max_texture_dimension_2d;
    let pixels = PixelData::new(max + 1, 1, PixelFormat::Rgb, vec![0; 3 * (max as usize + 1)]).unwrap();

    match Texture::from_pixels(&gpu.ctx(), &pixels) {
        Err(LoadError::TooLarge { width, max: limit, .. }) => {
            assert_eq!(width, max + 1);
            assert_eq!(limit, max);
        }
        Err(other) => panic!("expected a size error, got {other}"),
        Ok(_) => panic!("oversized texture was allocated"),
    }
}

#[test]
fn mismatched_interpolation_fails_to_link() {
    let Some(gpu) = gpu() else { return };
    let vs = "
        struct VertexOutput {
            @builtin(position) clip: vec4<f32>,
            @location(0) @interpolate(flat) c: vec4<f32>,
        };

        @vertex
        fn vs_main(@location(0) p: vec4<f32>) -> VertexOutput {
            var out: VertexOutput;
            out.clip = p;
            out.c = p;
            return out;
        }
    ";
    let fs = "
        @fragment
        fn fs_main(@location(0) @interpolate(linear) c: vec4<f32>) -> @location(0) vec4<f32> {
            return c;
        }
    ";
    let source = ProgramSource::vertex_fragment(vs, fs);

    match Program::compile_and_link(&gpu.ctx(), &source) {
        Err(ProgramError::Link(err)) => assert!(err.log.contains("interpolation"), "{}", err.log),
        Err(other) => panic!("expected a link error, got {other}"),
        Ok(_) => panic!("stages with different interpolation linked"),
    }
}

#[test]
fn float_output_is_refused_by_integer_target() {
    let Some(gpu) = gpu() else { return };
    let ctx = gpu.ctx();

    let solid = Program::compile_and_link(&ctx, &ProgramSource::vertex_fragment(SOLID_VS, SOLID_FS))
        .unwrap();
    let uint_fs = "
        @fragment
        fn fs_main() -> @location(0) vec4<u32> { return vec4<u32>(7u); }
    ";
    let uint = Program::compile_and_link(&ctx, &ProgramSource::vertex_fragment(SOLID_VS, uint_fs))
        .unwrap();
    let layout = AttributeLayout::new([VertexAttribute::new(0, 3, 12, 0)]).unwrap();
    let triangle = Geometry::new(&ctx, &TRIANGLE, None, layout).unwrap();

    let target = gpu.create_offscreen(4, 4, wgpu::TextureFormat::R32Uint);
    let mut frame = gpu.begin_frame();
    {
        let mut rt = target.target(&mut frame.encoder);
        let mut state = DrawState::new();
        triangle.bind(&mut state);

        solid.use_program(&mut state);
        assert_eq!(
            state.draw(&ctx, &mut rt),
            Err(DrawError::IncompatibleTarget {
                format: wgpu::TextureFormat::R32Uint,
                output: ValueType::Vector(ScalarType::F32, 4),
            })
        );

        uint.use_program(&mut state);
        state.set_blend(Blend::Alpha);
        assert_eq!(
            state.draw(&ctx, &mut rt),
            Err(DrawError::UnblendableTarget {
                format: wgpu::TextureFormat::R32Uint,
            })
        );

        state.set_blend(Blend::Replace);
        state.draw(&ctx, &mut rt).unwrap();
    }
    gpu.submit(frame);
}
