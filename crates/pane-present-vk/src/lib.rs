// SPDX-License-Identifier: CEPL-1.0
//! Vulkan backend for `pane-present`, built on ash.
//!
//! One [`VkContext`] owns the instance, device and queue. Every window gets a
//! [`VkBackend`] around its own surface; command recording, fences and
//! completion callbacks live in the context and are driven by
//! [`VkContext::poll_completions`].

mod backend;
mod canvas;
mod context;
mod convert;
mod device;
mod error;
mod resources;

pub use backend::VkBackend;
pub use canvas::{VkCanvas, VkDrawSurface};
pub use context::VkContext;
pub use device::{device_type_score, REQUIRED_DEVICE_EXTENSIONS};
pub use error::VkError;
pub use resources::{VkRenderTarget, VkSemaphore, VkSurface, VkSwapchain};
