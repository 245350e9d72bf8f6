//! Headless GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue (no window surface)
//! - handing out the borrowed `GpuCtx` every resource constructor takes
//! - creating offscreen color targets and per-frame command encoders

mod frame;
mod gpu;
mod init;
mod target;

pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use target::OffscreenTarget;
