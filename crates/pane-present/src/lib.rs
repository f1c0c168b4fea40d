// SPDX-License-Identifier: CEPL-1.0
//! Backend-agnostic presentation engine: swapchain rebuilds, per-image
//! semaphore pools, frame pacing and deferred semaphore reclamation.

mod backend;
mod error;
mod pacer;
mod reclaim;
mod swapchain;
mod sync_pool;
mod types;

#[cfg(test)]
mod mock_backend;

pub use backend::{
    AcquireOutcome, CanvasOf, DrawSurface, FinishedCallback, FlushOutcome, GpuBackend,
    PresentOutcome,
};
pub use error::{BackendError, PresentError, SwapchainError};
pub use pacer::{DrawHandler, HandlerId, Presenter};
pub use reclaim::{DeferredReclaimer, PresenterId};
pub use swapchain::{FrameSlot, Rebuilt, SwapchainBuilder, SwapchainState};
pub use sync_pool::SyncPool;
pub use types::{
    ColorSpace, Extent2D, Format, ImageUsage, PresentMode, RenderTargetDesc, SurfaceCapabilities,
    SurfaceFormat, SwapchainDesc, NO_IMAGE,
};
