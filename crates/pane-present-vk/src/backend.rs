// SPDX-License-Identifier: CEPL-1.0
use std::sync::Arc;

use ash::vk;
use pane_present::{
    AcquireOutcome, BackendError, FinishedCallback, FlushOutcome, GpuBackend, PresentMode,
    PresentOutcome, RenderTargetDesc, SurfaceCapabilities, SurfaceFormat, SwapchainDesc,
};
use tracing::{debug, error, warn};

use crate::canvas::VkDrawSurface;
use crate::context::VkContext;
use crate::convert::{
    acquire_outcome, capabilities_from_vk, color_space_to_vk, extent_to_vk, format_to_vk,
    present_mode_from_vk, present_mode_to_vk, present_outcome, surface_format_from_vk,
    usage_to_vk,
};
use crate::error::VkResultExt;
use crate::resources::{
    record_transition, VkRenderTarget, VkSemaphore, VkSurface, VkSwapchain, COLOR_RANGE,
};

/// One window's view of the shared Vulkan device.
pub struct VkBackend {
    ctx: Arc<VkContext>,
    surface: Arc<VkSurface>,
}

impl VkBackend {
    pub fn new(surface: VkSurface) -> Self {
        Self {
            ctx: Arc::clone(surface.context()),
            surface: Arc::new(surface),
        }
    }

    pub fn context(&self) -> &Arc<VkContext> {
        &self.ctx
    }

    fn caps_raw(&self) -> Result<vk::SurfaceCapabilitiesKHR, BackendError> {
        unsafe {
            self.ctx
                .surface_loader()
                .get_physical_device_surface_capabilities(self.ctx.phys(), self.surface.raw())
        }
        .op("get_physical_device_surface_capabilities")
        .map_err(BackendError::from)
    }
}

impl GpuBackend for VkBackend {
    type Swapchain = VkSwapchain;
    type Image = vk::Image;
    type RenderTarget = VkRenderTarget;
    type Surface = VkDrawSurface;
    type Semaphore = VkSemaphore;

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities, BackendError> {
        Ok(capabilities_from_vk(&self.caps_raw()?))
    }

    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>, BackendError> {
        let formats = unsafe {
            self.ctx
                .surface_loader()
                .get_physical_device_surface_formats(self.ctx.phys(), self.surface.raw())
        }
        .op("get_physical_device_surface_formats")?;
        Ok(formats.iter().map(surface_format_from_vk).collect())
    }

    fn present_modes(&self) -> Result<Vec<PresentMode>, BackendError> {
        let modes = unsafe {
            self.ctx
                .surface_loader()
                .get_physical_device_surface_present_modes(self.ctx.phys(), self.surface.raw())
        }
        .op("get_physical_device_surface_present_modes")?;
        Ok(modes.into_iter().map(present_mode_from_vk).collect())
    }

    fn wait_idle(&mut self) {
        self.ctx.wait_idle();
    }

    fn create_swapchain(
        &mut self,
        desc: &SwapchainDesc,
        previous: Option<&VkSwapchain>,
    ) -> Result<VkSwapchain, BackendError> {
        let caps = self.caps_raw()?;
        let swap_info = vk::SwapchainCreateInfoKHR {
            s_type: vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR,
            surface: self.surface.raw(),
            min_image_count: desc.min_image_count,
            image_format: format_to_vk(desc.format.format),
            image_color_space: color_space_to_vk(desc.format.color_space),
            image_extent: extent_to_vk(desc.extent),
            image_array_layers: 1,
            image_usage: usage_to_vk(desc.usage),
            image_sharing_mode: vk::SharingMode::EXCLUSIVE,
            pre_transform: caps.current_transform,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode: present_mode_to_vk(desc.present_mode),
            clipped: vk::TRUE,
            old_swapchain: previous.map_or(vk::SwapchainKHR::null(), VkSwapchain::raw),
            ..Default::default()
        };
        let raw = unsafe { self.ctx.swapchain_loader().create_swapchain(&swap_info, None) }
            .op("create_swapchain")?;
        debug!(
            "created swapchain ({}, {} requested images, {})",
            desc.extent, desc.min_image_count, desc.present_mode
        );
        Ok(VkSwapchain::from_raw(Arc::clone(&self.surface), raw))
    }

    fn swapchain_images(&self, swapchain: &VkSwapchain) -> Result<Vec<vk::Image>, BackendError> {
        let images = unsafe { self.ctx.swapchain_loader().get_swapchain_images(swapchain.raw()) }
            .op("get_swapchain_images")?;
        Ok(images)
    }

    fn create_render_target(&mut self, image: vk::Image, desc: &RenderTargetDesc) -> VkRenderTarget {
        let iv_info = vk::ImageViewCreateInfo {
            s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
            image,
            view_type: vk::ImageViewType::TYPE_2D,
            format: format_to_vk(desc.format.format),
            subresource_range: COLOR_RANGE,
            ..Default::default()
        };
        let view = match unsafe { self.ctx.device().create_image_view(&iv_info, None) } {
            Ok(view) => view,
            Err(result) => {
                warn!("cannot create image view: {result:?}");
                vk::ImageView::null()
            }
        };
        VkRenderTarget::new(Arc::clone(&self.ctx), image, view, extent_to_vk(desc.extent))
    }

    fn create_draw_surface(&mut self, target: &VkRenderTarget) -> Option<VkDrawSurface> {
        VkDrawSurface::new(Arc::clone(&self.ctx), target)
    }

    fn create_semaphore(&mut self) -> Result<VkSemaphore, BackendError> {
        let info = vk::SemaphoreCreateInfo::default();
        let raw = unsafe { self.ctx.device().create_semaphore(&info, None) }
            .op("create_semaphore")?;
        Ok(VkSemaphore::from_raw(Arc::clone(&self.ctx), raw))
    }

    fn acquire_next_image(
        &mut self,
        swapchain: &VkSwapchain,
        timeout_ns: u64,
        signal: &VkSemaphore,
    ) -> AcquireOutcome {
        let result = unsafe {
            self.ctx.swapchain_loader().acquire_next_image(
                swapchain.raw(),
                timeout_ns,
                signal.raw(),
                vk::Fence::null(),
            )
        };
        acquire_outcome(result)
    }

    fn wait(&mut self, _surface: &mut VkDrawSurface, semaphore: &VkSemaphore) -> bool {
        self.ctx.add_wait(semaphore.raw());
        true
    }

    fn flush(&mut self, signal: Option<&VkSemaphore>, finished: Option<FinishedCallback>) -> FlushOutcome {
        self.ctx.flush(signal.map(VkSemaphore::raw), finished)
    }

    fn submit(&mut self) -> bool {
        self.ctx.submit()
    }

    fn set_present_layout(&mut self, target: &VkRenderTarget) -> bool {
        let old = target.layout.get();
        let image = target.image;
        let recorded = self.ctx.record(|device, cmd| unsafe {
            record_transition(device, cmd, image, old, vk::ImageLayout::PRESENT_SRC_KHR);
        });
        match recorded {
            Ok(()) => {
                target.layout.set(vk::ImageLayout::PRESENT_SRC_KHR);
                true
            }
            Err(e) => {
                error!("cannot record present transition: {e}");
                false
            }
        }
    }

    fn present(&mut self, swapchain: &VkSwapchain, image_index: u32, wait: &VkSemaphore) -> PresentOutcome {
        present_outcome(self.ctx.present(swapchain.raw(), image_index, wait.raw()))
    }
}
