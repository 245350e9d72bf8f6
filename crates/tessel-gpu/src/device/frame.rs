/// Command recording for one frame.
///
/// Draws and clears are recorded into `encoder`; nothing reaches the GPU until
/// the frame is handed back to [`Gpu::submit`](super::Gpu::submit).
pub struct GpuFrame {
    pub encoder: wgpu::CommandEncoder,
}
