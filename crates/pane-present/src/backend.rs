// SPDX-License-Identifier: CEPL-1.0
use crate::error::BackendError;
use crate::types::{
    PresentMode, RenderTargetDesc, SurfaceCapabilities, SurfaceFormat, SwapchainDesc,
};

/// Invoked once the GPU has finished the work of a flush.
pub type FinishedCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    Acquired { index: u32, suboptimal: bool },
    /// Zero-timeout miss: no image is available yet.
    NotReady,
    OutOfDate,
    Failed(BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentOutcome {
    Success,
    Suboptimal,
    OutOfDate,
    Failed(BackendError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    Submitted,
    NotSubmitted,
}

/// A drawable wrapped around one swapchain image.
pub trait DrawSurface {
    type Canvas;

    fn canvas(&mut self) -> &mut Self::Canvas;
}

pub type CanvasOf<B> = <<B as GpuBackend>::Surface as DrawSurface>::Canvas;

/// The per-surface view of a GPU device that the presentation engine drives.
///
/// One implementation exists per window; the device and queue behind it may be
/// shared by several windows.
///
/// # Completion callbacks
///
/// A callback handed to [`GpuBackend::flush`] must run exactly once: when the
/// GPU finishes the flushed work, or right away when nothing was submitted.
///
/// Swapchains, render targets, surfaces and semaphores must be `Send`: a
/// presenter torn down with frames in flight hands them to a
/// [`DeferredReclaimer`](crate::DeferredReclaimer), and the completion callback
/// that drops them may run on any thread.
pub trait GpuBackend {
    type Swapchain: Send + 'static;
    type Image: Copy + Send + 'static;
    type RenderTarget: Send + 'static;
    type Surface: DrawSurface + Send + 'static;
    type Semaphore: Send + 'static;

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities, BackendError>;
    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>, BackendError>;
    fn present_modes(&self) -> Result<Vec<PresentMode>, BackendError>;

    /// Block until the device is idle and fire every pending completion callback.
    fn wait_idle(&mut self);

    /// `previous` is retired by the driver once the new swapchain exists.
    fn create_swapchain(
        &mut self,
        desc: &SwapchainDesc,
        previous: Option<&Self::Swapchain>,
    ) -> Result<Self::Swapchain, BackendError>;
    fn swapchain_images(&self, swapchain: &Self::Swapchain) -> Result<Vec<Self::Image>, BackendError>;
    fn create_render_target(&mut self, image: Self::Image, desc: &RenderTargetDesc) -> Self::RenderTarget;
    /// `None` when the backend cannot wrap the target.
    fn create_draw_surface(&mut self, target: &Self::RenderTarget) -> Option<Self::Surface>;
    fn create_semaphore(&mut self) -> Result<Self::Semaphore, BackendError>;

    fn acquire_next_image(
        &mut self,
        swapchain: &Self::Swapchain,
        timeout_ns: u64,
        signal: &Self::Semaphore,
    ) -> AcquireOutcome;
    /// Make later work on `surface` wait for `semaphore`. Returns `false` if the
    /// wait could not be scheduled yet; callers poll until it succeeds.
    fn wait(&mut self, surface: &mut Self::Surface, semaphore: &Self::Semaphore) -> bool;
    fn flush(&mut self, signal: Option<&Self::Semaphore>, finished: Option<FinishedCallback>) -> FlushOutcome;
    fn submit(&mut self) -> bool;
    /// Declare that `target` will next be used as a presentation source.
    fn set_present_layout(&mut self, target: &Self::RenderTarget) -> bool;
    fn present(
        &mut self,
        swapchain: &Self::Swapchain,
        image_index: u32,
        wait: &Self::Semaphore,
    ) -> PresentOutcome;
}
