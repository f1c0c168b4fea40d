// SPDX-License-Identifier: CEPL-1.0
//! RAII wrappers for the Vulkan objects a presenter owns.
//!
//! Each holds an `Arc` of the context, so the device and instance outlive
//! every object created from them regardless of drop order elsewhere.

use std::any::Any;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::context::VkContext;

pub struct VkSurface {
    ctx: Arc<VkContext>,
    raw: vk::SurfaceKHR,
    // Released after the surface is destroyed.
    _owner: Option<Arc<dyn Any + Send + Sync>>,
}

impl VkSurface {
    pub(crate) fn from_raw(ctx: Arc<VkContext>, raw: vk::SurfaceKHR) -> Self {
        Self {
            ctx,
            raw,
            _owner: None,
        }
    }

    /// Keep `owner` (usually the platform window) alive for as long as the
    /// surface exists, which may be past the window's own teardown while a
    /// parked swapchain still targets it.
    pub fn keep_alive(mut self, owner: Arc<dyn Any + Send + Sync>) -> Self {
        self._owner = Some(owner);
        self
    }

    pub fn raw(&self) -> vk::SurfaceKHR {
        self.raw
    }

    pub fn context(&self) -> &Arc<VkContext> {
        &self.ctx
    }
}

impl Drop for VkSurface {
    fn drop(&mut self) {
        unsafe { self.ctx.surface_loader().destroy_surface(self.raw, None) };
    }
}

/// Keeps its surface alive: a swapchain parked after its window closed is
/// destroyed later, and the surface must outlive it.
pub struct VkSwapchain {
    ctx: Arc<VkContext>,
    surface: Arc<VkSurface>,
    raw: vk::SwapchainKHR,
}

impl VkSwapchain {
    pub(crate) fn from_raw(surface: Arc<VkSurface>, raw: vk::SwapchainKHR) -> Self {
        Self {
            ctx: Arc::clone(surface.context()),
            surface,
            raw,
        }
    }

    pub fn raw(&self) -> vk::SwapchainKHR {
        self.raw
    }

    pub fn surface(&self) -> &Arc<VkSurface> {
        &self.surface
    }
}

impl Drop for VkSwapchain {
    // Callers guarantee no pending work references it: rebuilds go through
    // `wait_idle` and teardown parks it until the last frame completes.
    fn drop(&mut self) {
        unsafe { self.ctx.swapchain_loader().destroy_swapchain(self.raw, None) };
        debug!("swapchain destroyed");
    }
}

pub struct VkSemaphore {
    ctx: Arc<VkContext>,
    raw: vk::Semaphore,
}

impl VkSemaphore {
    pub(crate) fn from_raw(ctx: Arc<VkContext>, raw: vk::Semaphore) -> Self {
        Self { ctx, raw }
    }

    pub fn raw(&self) -> vk::Semaphore {
        self.raw
    }
}

impl Drop for VkSemaphore {
    fn drop(&mut self) {
        unsafe { self.ctx.device().destroy_semaphore(self.raw, None) };
    }
}

/// Last layout recorded for an image, shared by its render target and canvas.
#[derive(Clone, Debug)]
pub struct LayoutCell(Arc<AtomicI32>);

impl LayoutCell {
    pub fn new() -> Self {
        Self(Arc::new(AtomicI32::new(vk::ImageLayout::UNDEFINED.as_raw())))
    }

    pub fn get(&self) -> vk::ImageLayout {
        vk::ImageLayout::from_raw(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, layout: vk::ImageLayout) {
        self.0.store(layout.as_raw(), Ordering::Release);
    }
}

impl Default for LayoutCell {
    fn default() -> Self {
        Self::new()
    }
}

/// A swapchain image wrapped for drawing. The view is null when it could not
/// be created; such a target cannot back a draw surface.
pub struct VkRenderTarget {
    ctx: Arc<VkContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    pub(crate) extent: vk::Extent2D,
    pub(crate) layout: LayoutCell,
}

impl VkRenderTarget {
    pub(crate) fn new(
        ctx: Arc<VkContext>,
        image: vk::Image,
        view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> Self {
        Self {
            ctx,
            image,
            view,
            extent,
            layout: LayoutCell::new(),
        }
    }

    pub fn image(&self) -> vk::Image {
        self.image
    }

    pub fn view(&self) -> vk::ImageView {
        self.view
    }
}

impl Drop for VkRenderTarget {
    fn drop(&mut self) {
        if self.view != vk::ImageView::null() {
            unsafe { self.ctx.device().destroy_image_view(self.view, None) };
        }
    }
}

pub(crate) const COLOR_RANGE: vk::ImageSubresourceRange = vk::ImageSubresourceRange {
    aspect_mask: vk::ImageAspectFlags::COLOR,
    base_mip_level: 0,
    level_count: 1,
    base_array_layer: 0,
    layer_count: 1,
};

/// Record a full-image layout change.
pub(crate) unsafe fn record_transition(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    image: vk::Image,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) {
    let barrier = vk::ImageMemoryBarrier {
        s_type: vk::StructureType::IMAGE_MEMORY_BARRIER,
        src_access_mask: vk::AccessFlags::MEMORY_WRITE,
        dst_access_mask: vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE,
        old_layout,
        new_layout,
        src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
        dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
        image,
        subresource_range: COLOR_RANGE,
        ..Default::default()
    };
    device.cmd_pipeline_barrier(
        cmd,
        vk::PipelineStageFlags::ALL_COMMANDS,
        vk::PipelineStageFlags::ALL_COMMANDS,
        vk::DependencyFlags::empty(),
        &[],
        &[],
        std::slice::from_ref(&barrier),
    );
}
